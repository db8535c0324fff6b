//! Pure batch construction and decoding. Nothing here touches a transport.

use alloy_primitives::{Bytes, U256, hex};
use alloy_sol_types::{SolCall, SolValue};
use od_api_types::abi::{IMulticall, IRecordResolver};
use od_api_types::{CoinType, RecordKind};
use od_coin_codec::encode_content_hash;
use od_name_codec::DomainName;
use tracing::{debug, warn};

use crate::{RecordEdit, RecordError, RecordSchema, RecordSet, RecordValue, data_bytes};

/// Ordered call payloads, one per record.
pub type CallBatch = Vec<Bytes>;

/// Read calls together with the kinds they answer, so results zip back by
/// position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadBatch {
    kinds: Vec<RecordKind>,
    calls: CallBatch,
}

impl ReadBatch {
    pub(crate) fn from_parts(kinds: Vec<RecordKind>, calls: CallBatch) -> Self {
        debug_assert_eq!(kinds.len(), calls.len());
        Self { kinds, calls }
    }

    pub fn kinds(&self) -> &[RecordKind] {
        &self.kinds
    }

    pub fn calls(&self) -> &[Bytes] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

pub fn build_read_batch(name: &DomainName, schema: &RecordSchema) -> Result<ReadBatch, RecordError> {
    let encoded = Bytes::from(name.encode()?);
    let calls = schema
        .iter()
        .map(|kind| read_call(&encoded, kind))
        .collect();
    Ok(ReadBatch::from_parts(schema.kinds().to_vec(), calls))
}

fn read_call(name: &Bytes, kind: &RecordKind) -> Bytes {
    let dns_encoded = name.clone();
    let call = match kind {
        RecordKind::Address { coin_type } => IRecordResolver::addrCall {
            dnsEncoded: dns_encoded,
            coinType: U256::from(coin_type.0),
        }
        .abi_encode(),
        RecordKind::Text { key } => IRecordResolver::textCall {
            dnsEncoded: dns_encoded,
            key: key.clone(),
        }
        .abi_encode(),
        RecordKind::ContentHash => IRecordResolver::contenthashCall {
            dnsEncoded: dns_encoded,
        }
        .abi_encode(),
        RecordKind::Data { key } => IRecordResolver::dataCall {
            dnsEncoded: dns_encoded,
            key: key.clone(),
        }
        .abi_encode(),
    };
    call.into()
}

pub fn decode_read_batch(batch: &ReadBatch, results: &[Bytes]) -> Result<RecordSet, RecordError> {
    if results.len() != batch.len() {
        return Err(RecordError::DecodeMismatch {
            expected: batch.len(),
            actual: results.len(),
        });
    }

    batch
        .kinds
        .iter()
        .zip(results)
        .enumerate()
        .map(|(index, (kind, raw))| -> Result<(RecordKind, RecordValue), RecordError> {
            let value = decode_value(kind, raw)
                .map_err(|source| RecordError::AbiDecode { index, source })?;
            Ok((kind.clone(), value))
        })
        .collect()
}

fn decode_value(kind: &RecordKind, raw: &[u8]) -> Result<RecordValue, alloy_sol_types::Error> {
    Ok(match kind {
        RecordKind::Address { coin_type } => {
            RecordValue::Address(address_text(*coin_type, &Bytes::abi_decode(raw)?))
        }
        RecordKind::Text { .. } => RecordValue::Text(String::abi_decode(raw)?),
        RecordKind::ContentHash => RecordValue::ContentHash(Bytes::abi_decode(raw)?.to_vec()),
        RecordKind::Data { .. } => RecordValue::Data(Bytes::abi_decode(raw)?.to_vec()),
    })
}

fn address_text(coin_type: CoinType, raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }
    od_coin_codec::to_text(coin_type, raw).unwrap_or_else(|err| {
        warn!(%coin_type, error = %err, "stored address does not decode, showing hex");
        hex::encode_prefixed(raw)
    })
}

/// Turns edits into setter calls.
///
/// Empty values, values that convert to no bytes (such as a bare `0x` content
/// hash) and values equal to the baseline are skipped. Every value is
/// converted before the batch is returned, so one bad edit rejects the
/// whole batch.
pub fn build_write_batch(
    name: &DomainName,
    edits: &[RecordEdit],
    baseline: Option<&RecordSet>,
) -> Result<CallBatch, RecordError> {
    let encoded = Bytes::from(name.encode()?);
    let mut batch = CallBatch::with_capacity(edits.len());

    for edit in edits {
        let value = edit.value.trim();
        if value.is_empty() {
            continue;
        }
        let unchanged = baseline
            .and_then(|current| current.get(&edit.kind))
            .is_some_and(|current| current.text_form() == value);
        if unchanged {
            debug!(kind = %edit.kind, "value unchanged, skipping");
            continue;
        }
        match write_call(&encoded, &edit.kind, value)? {
            Some(call) => batch.push(call),
            None => debug!(kind = %edit.kind, "value converts to nothing, skipping"),
        }
    }

    Ok(batch)
}

fn write_call(name: &Bytes, kind: &RecordKind, value: &str) -> Result<Option<Bytes>, RecordError> {
    let dns_encoded = name.clone();
    let call = match kind {
        RecordKind::Address { coin_type } => {
            let addr = od_coin_codec::to_raw(*coin_type, value)?;
            if addr.is_empty() {
                return Ok(None);
            }
            IRecordResolver::setAddrCall {
                dnsEncoded: dns_encoded,
                coinType: U256::from(coin_type.0),
                addr: addr.into(),
            }
            .abi_encode()
        }
        RecordKind::Text { key } => IRecordResolver::setTextCall {
            dnsEncoded: dns_encoded,
            key: key.clone(),
            value: value.to_owned(),
        }
        .abi_encode(),
        RecordKind::ContentHash => {
            let hash = encode_content_hash(value)?;
            if hash.is_empty() {
                return Ok(None);
            }
            IRecordResolver::setContenthashCall {
                dnsEncoded: dns_encoded,
                hash: hash.into(),
            }
            .abi_encode()
        }
        RecordKind::Data { key } => {
            let value = data_bytes(value);
            if value.is_empty() {
                return Ok(None);
            }
            IRecordResolver::setDataCall {
                dnsEncoded: dns_encoded,
                key: key.clone(),
                value: value.into(),
            }
            .abi_encode()
        }
    };
    Ok(Some(call.into()))
}

/// `multicall(bytes[])` calldata wrapping the whole batch.
pub fn encode_multicall(batch: &[Bytes]) -> Bytes {
    IMulticall::multicallCall {
        data: batch.to_vec(),
    }
    .abi_encode()
    .into()
}
