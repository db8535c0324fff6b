use alloy_primitives::{Address, hex};
use od_chain_client::{PendingTx, ReadTransport, SubmitTxRequest, TxSubmitter};
use od_coin_codec::{AddressError, ContentHashError, decode_content_hash};
use od_name_codec::{DomainName, NameError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

pub mod availability;
mod batch;
pub mod migrate;
mod schema;

pub use batch::{CallBatch, ReadBatch, build_read_batch, build_write_batch, decode_read_batch, encode_multicall};
pub use od_api_types::{RecordEntry, RecordKind};
pub use schema::{ADDRESS_COIN_TYPES, PROFILE_KEYS, RecordSchema, SOCIAL_KEYS};

/// A record change in the text form users enter.
pub type RecordEdit = RecordEntry;

/// Decoded records of one name, rebuilt from scratch on every read.
pub type RecordSet = HashMap<RecordKind, RecordValue>;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    InvalidName(#[from] NameError),
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    #[error(transparent)]
    InvalidContentHash(#[from] ContentHashError),
    #[error("invalid label {0:?}, expected a single non-empty label")]
    InvalidLabel(String),
    #[error("batch transport failed: {0:#}")]
    BatchTransport(anyhow::Error),
    #[error("batch returned {actual} results for {expected} calls")]
    DecodeMismatch { expected: usize, actual: usize },
    #[error("result {index} does not decode")]
    AbiDecode {
        index: usize,
        #[source]
        source: alloy_sol_types::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValue {
    /// Coin-specific text form, empty when unset.
    Address(String),
    Text(String),
    ContentHash(Vec<u8>),
    Data(Vec<u8>),
}

impl RecordValue {
    /// The string a form field shows for this value.
    pub fn text_form(&self) -> String {
        match self {
            Self::Address(text) | Self::Text(text) => text.clone(),
            Self::ContentHash(raw) => decode_content_hash(raw),
            Self::Data(raw) => match std::str::from_utf8(raw) {
                Ok(text) if data_hex(text).is_none() => text.to_owned(),
                _ => hex::encode_prefixed(raw),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Address(text) | Self::Text(text) => text.is_empty(),
            Self::ContentHash(raw) | Self::Data(raw) => raw.is_empty(),
        }
    }
}

/// Bytes of a `0x`-prefixed hex data value, `None` for plain text.
pub(crate) fn data_hex(text: &str) -> Option<Vec<u8>> {
    hex::decode(text.strip_prefix("0x")?).ok()
}

/// Inverse of [`RecordValue::text_form`] for data blobs.
pub(crate) fn data_bytes(text: &str) -> Vec<u8> {
    data_hex(text).unwrap_or_else(|| text.as_bytes().to_vec())
}

/// Reads and writes a name's records in single aggregated round trips.
pub struct RecordBatchClient<R, W> {
    reader: R,
    submitter: W,
}

impl<R, W> RecordBatchClient<R, W>
where
    R: ReadTransport,
    W: TxSubmitter,
{
    pub fn new(reader: R, submitter: W) -> Self {
        Self { reader, submitter }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn submitter(&self) -> &W {
        &self.submitter
    }

    pub async fn read_records(
        &self,
        resolver: Address,
        name: &DomainName,
        schema: &RecordSchema,
    ) -> Result<RecordSet, RecordError> {
        let batch = build_read_batch(name, schema)?;
        if batch.is_empty() {
            return Ok(RecordSet::new());
        }

        debug!(%name, %resolver, calls = batch.len(), "reading records");
        let results = self
            .reader
            .aggregate(resolver, batch.calls().to_vec())
            .await
            .map_err(RecordError::BatchTransport)?;
        decode_read_batch(&batch, &results)
    }

    /// Submits every changed record as one multicall transaction.
    ///
    /// Returns `None` without touching the submitter when nothing changed.
    pub async fn write_records(
        &self,
        chain_id: u64,
        resolver: Address,
        name: &DomainName,
        edits: &[RecordEdit],
        baseline: Option<&RecordSet>,
    ) -> Result<Option<PendingTx>, RecordError> {
        let batch = build_write_batch(name, edits, baseline)?;
        if batch.is_empty() {
            debug!(%name, "no record changes to submit");
            return Ok(None);
        }

        let pending = self
            .submitter
            .submit_transaction(SubmitTxRequest {
                chain_id,
                to: resolver,
                data: encode_multicall(&batch),
            })
            .await
            .map_err(RecordError::BatchTransport)?;
        info!(%name, tx_hash = %pending.tx_hash, calls = batch.len(), "record batch submitted");
        Ok(Some(pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, Bytes, U256};
    use alloy_sol_types::{SolCall, SolValue};
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use od_api_types::CoinType;
    use od_api_types::abi::{IMulticall, IRecordResolver};
    use od_chain_client::TxStatus;
    use std::sync::Mutex;

    const EVM_TEXT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const BTC_TEXT: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
    const BTC_SCRIPT: &str = "76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac";
    const SOL_TEXT: &str = "US517G5965aydkZ46HS38QLi7UQiSojurfbQfKCELFx";

    /// Resolver holding raw address bytes per coin type for `x.eth`.
    #[derive(Default)]
    struct StubResolver {
        addresses: HashMap<U256, Vec<u8>>,
        calls: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl ReadTransport for StubResolver {
        async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                bail!("connection refused");
            }
            let batch = IMulticall::multicallCall::abi_decode(&data)?;
            let results: Vec<Bytes> = batch
                .data
                .iter()
                .map(|call| -> Result<Bytes> {
                    let call = IRecordResolver::addrCall::abi_decode(call)?;
                    assert_eq!(call.dnsEncoded, Bytes::from(od_name_codec::encode("x.eth")?));
                    let raw = self.addresses.get(&call.coinType).cloned().unwrap_or_default();
                    Ok(Bytes::from(raw).abi_encode().into())
                })
                .collect::<Result<_>>()?;
            Ok(results.abi_encode().into())
        }
    }

    #[derive(Default)]
    struct RecordingSubmitter {
        submitted: Mutex<Vec<SubmitTxRequest>>,
    }

    #[async_trait]
    impl TxSubmitter for RecordingSubmitter {
        async fn submit_transaction(&self, req: SubmitTxRequest) -> Result<PendingTx> {
            let chain_id = req.chain_id;
            self.submitted.lock().unwrap().push(req);
            Ok(PendingTx {
                chain_id,
                tx_hash: B256::repeat_byte(0x11),
            })
        }

        async fn get_transaction_status(&self, _tx_hash: B256) -> Result<TxStatus> {
            Ok(TxStatus::Pending)
        }
    }

    fn x_eth() -> DomainName {
        DomainName::parse("x.eth").unwrap()
    }

    fn stub_resolver() -> Result<StubResolver> {
        let mut addresses = HashMap::new();
        addresses.insert(U256::from(60), od_coin_codec::to_raw(CoinType::ETHEREUM, EVM_TEXT)?);
        addresses.insert(U256::from(0), hex::decode(BTC_SCRIPT)?);
        addresses.insert(U256::from(501), vec![7_u8; 32]);
        Ok(StubResolver {
            addresses,
            ..StubResolver::default()
        })
    }

    #[tokio::test]
    async fn reads_mixed_coin_types() -> Result<()> {
        let client = RecordBatchClient::new(stub_resolver()?, RecordingSubmitter::default());
        let records = client
            .read_records(Address::ZERO, &x_eth(), &RecordSchema::addresses())
            .await?;

        assert_eq!(records.len(), 3);
        assert_eq!(records[&RecordKind::address(60)], RecordValue::Address(EVM_TEXT.to_owned()));
        assert_eq!(records[&RecordKind::address(0)], RecordValue::Address(BTC_TEXT.to_owned()));
        assert_eq!(records[&RecordKind::address(501)], RecordValue::Address(SOL_TEXT.to_owned()));
        assert_eq!(*client.reader().calls.lock().unwrap(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn empty_schema_skips_transport() -> Result<()> {
        let client = RecordBatchClient::new(StubResolver::default(), RecordingSubmitter::default());
        let records = client
            .read_records(Address::ZERO, &x_eth(), &RecordSchema::default())
            .await?;
        assert!(records.is_empty());
        assert_eq!(*client.reader().calls.lock().unwrap(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_name_fails_even_with_empty_schema() -> Result<()> {
        let client = RecordBatchClient::new(StubResolver::default(), RecordingSubmitter::default());
        let long = DomainName::parse(&format!("{}.eth", "a".repeat(300)))?;
        let err = client
            .read_records(Address::ZERO, &long, &RecordSchema::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidName(NameError::LabelTooLong { .. })));
        assert_eq!(*client.reader().calls.lock().unwrap(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_fails_whole_read() -> Result<()> {
        let reader = StubResolver {
            fail: true,
            ..StubResolver::default()
        };
        let client = RecordBatchClient::new(reader, RecordingSubmitter::default());
        let err = client
            .read_records(Address::ZERO, &x_eth(), &RecordSchema::addresses())
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::BatchTransport(_)));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_name_fails_before_transport() -> Result<()> {
        let client = RecordBatchClient::new(StubResolver::default(), RecordingSubmitter::default());
        let long = DomainName::parse(&format!("{}.eth", "a".repeat(300)))?;
        let err = client
            .read_records(Address::ZERO, &long, &RecordSchema::addresses())
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidName(NameError::LabelTooLong { .. })));
        assert_eq!(*client.reader().calls.lock().unwrap(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn writes_mixed_coin_types_in_one_transaction() -> Result<()> {
        let client = RecordBatchClient::new(StubResolver::default(), RecordingSubmitter::default());
        let resolver = Address::repeat_byte(0x22);
        let edits = vec![
            RecordEntry { kind: RecordKind::address(60), value: EVM_TEXT.to_owned() },
            RecordEntry { kind: RecordKind::address(0), value: BTC_TEXT.to_owned() },
            RecordEntry { kind: RecordKind::address(501), value: SOL_TEXT.to_owned() },
        ];

        let pending = client
            .write_records(31337, resolver, &x_eth(), &edits, None)
            .await?
            .expect("non-empty batch is submitted");
        assert_eq!(pending.chain_id, 31337);

        let submitted = client.submitter().submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].to, resolver);

        let batch = IMulticall::multicallCall::abi_decode(&submitted[0].data)?;
        let raw: Vec<Bytes> = batch
            .data
            .iter()
            .map(|call| -> Result<Bytes> { Ok(IRecordResolver::setAddrCall::abi_decode(call)?.addr) })
            .collect::<Result<_>>()?;
        assert_eq!(raw[0].len(), 20);
        assert_eq!(hex::encode(&raw[1]), BTC_SCRIPT);
        assert_eq!(&raw[2][..], &[7_u8; 32]);
        Ok(())
    }

    #[tokio::test]
    async fn all_empty_edits_submit_nothing() -> Result<()> {
        let client = RecordBatchClient::new(StubResolver::default(), RecordingSubmitter::default());
        let edits = vec![
            RecordEntry { kind: RecordKind::text("display"), value: String::new() },
            RecordEntry { kind: RecordKind::address(60), value: "  ".to_owned() },
        ];
        let pending = client
            .write_records(31337, Address::ZERO, &x_eth(), &edits, None)
            .await?;
        assert!(pending.is_none());
        assert!(client.submitter().submitted.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn invalid_address_never_reaches_submitter() -> Result<()> {
        let client = RecordBatchClient::new(StubResolver::default(), RecordingSubmitter::default());
        let edits = vec![
            RecordEntry { kind: RecordKind::text("display"), value: "Alice".to_owned() },
            RecordEntry { kind: RecordKind::address(60), value: "not-an-address".to_owned() },
        ];
        let err = client
            .write_records(31337, Address::ZERO, &x_eth(), &edits, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidAddress(_)));
        assert!(client.submitter().submitted.lock().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn text_forms() {
        assert_eq!(RecordValue::Data(b"[]".to_vec()).text_form(), "[]");
        assert_eq!(RecordValue::Data(vec![0xff, 0xfe]).text_form(), "0xfffe");
        assert_eq!(RecordValue::Data(b"0xab".to_vec()).text_form(), "0x30786162");
        assert_eq!(RecordValue::Data(b"0xno".to_vec()).text_form(), "0xno");
        assert_eq!(RecordValue::ContentHash(Vec::new()).text_form(), "");
        assert!(RecordValue::Address(String::new()).is_empty());
        assert!(!RecordValue::Text("x".to_owned()).is_empty());
    }
}
