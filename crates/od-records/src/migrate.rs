//! Moving a name's records from its L1 resolver onto the L2 record store.
//!
//! L1 contracts are keyed by namehash. The check reads the registry, the
//! record copy reads whatever resolver the name currently points at, and the
//! resulting writes go through the normal L2 write path.

use alloy_primitives::{Address, B256, Bytes, U256, address};
use alloy_sol_types::{SolCall, SolValue};
use od_api_types::RecordKind;
use od_api_types::abi::{IL1Resolver, INameWrapper, IParentDomain, IRegistry};
use od_chain_client::ReadTransport;
use od_name_codec::{DomainName, namehash};
use tracing::debug;

use crate::{
    CallBatch, ReadBatch, RecordEdit, RecordError, RecordSchema, RecordSet, build_write_batch,
    decode_read_batch,
};

/// ENS registry, deployed at the same address on mainnet and testnets.
pub const ENS_REGISTRY: Address = address!("0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L1Contracts {
    pub registry: Address,
    pub name_wrapper: Address,
    /// Resolver a migrated name should point at.
    pub resolver: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverCheck {
    pub node: B256,
    pub current_resolver: Address,
    pub owner: Address,
    pub is_resolver_correct: bool,
    pub is_name_wrapped: bool,
    registry: Address,
    name_wrapper: Address,
}

impl ResolverCheck {
    pub async fn fetch<T>(transport: &T, contracts: &L1Contracts, name: &DomainName) -> Result<Self, RecordError>
    where
        T: ReadTransport + ?Sized,
    {
        let node = namehash(name);
        let current_resolver: Address = call_single(
            transport,
            contracts.registry,
            IRegistry::resolverCall { node }.abi_encode(),
        )
        .await?;
        let owner: Address = call_single(
            transport,
            contracts.registry,
            IRegistry::ownerCall { node }.abi_encode(),
        )
        .await?;

        let check = Self {
            node,
            current_resolver,
            owner,
            is_resolver_correct: current_resolver == contracts.resolver,
            is_name_wrapped: owner == contracts.name_wrapper,
            registry: contracts.registry,
            name_wrapper: contracts.name_wrapper,
        };
        debug!(%name, resolver = %current_resolver, %owner, wrapped = check.is_name_wrapped, "checked L1 resolver");
        Ok(check)
    }

    /// `setResolver` call pointing the name at `resolver`, sent to the name
    /// wrapper when it owns the name and to the registry otherwise.
    pub fn set_resolver_call(&self, resolver: Address) -> (Address, Bytes) {
        if self.is_name_wrapped {
            let call = INameWrapper::setResolverCall {
                node: self.node,
                resolver,
            };
            (self.name_wrapper, call.abi_encode().into())
        } else {
            let call = IRegistry::setResolverCall {
                node: self.node,
                resolver,
            };
            (self.registry, call.abi_encode().into())
        }
    }
}

async fn call_single<T, V>(transport: &T, to: Address, data: Vec<u8>) -> Result<V, RecordError>
where
    T: ReadTransport + ?Sized,
    V: SolValue + From<<V::SolType as alloy_sol_types::SolType>::RustType>,
{
    let raw = transport
        .call(to, data.into())
        .await
        .map_err(RecordError::BatchTransport)?;
    V::abi_decode(&raw).map_err(|source| RecordError::AbiDecode { index: 0, source })
}

/// Reads `schema` from an L1 resolver in one multicall.
pub async fn read_l1_records<T>(
    transport: &T,
    l1_resolver: Address,
    name: &DomainName,
    schema: &RecordSchema,
) -> Result<RecordSet, RecordError>
where
    T: ReadTransport + ?Sized,
{
    if schema.is_empty() {
        return Ok(RecordSet::new());
    }

    let node = namehash(name);
    let calls = schema.iter().map(|kind| l1_read_call(node, kind)).collect();
    let batch = ReadBatch::from_parts(schema.kinds().to_vec(), calls);

    let results = transport
        .aggregate(l1_resolver, batch.calls().to_vec())
        .await
        .map_err(RecordError::BatchTransport)?;
    decode_read_batch(&batch, &results)
}

fn l1_read_call(node: B256, kind: &RecordKind) -> Bytes {
    let call = match kind {
        RecordKind::Address { coin_type } => IL1Resolver::addrCall {
            node,
            coinType: U256::from(coin_type.0),
        }
        .abi_encode(),
        RecordKind::Text { key } => IL1Resolver::textCall {
            node,
            key: key.clone(),
        }
        .abi_encode(),
        RecordKind::ContentHash => IL1Resolver::contenthashCall { node }.abi_encode(),
        RecordKind::Data { key } => IL1Resolver::dataCall {
            node,
            key: key.clone(),
        }
        .abi_encode(),
    };
    call.into()
}

/// L2 writes recreating every non-empty L1 record, in schema order.
pub fn build_migration_batch(
    name: &DomainName,
    schema: &RecordSchema,
    records: &RecordSet,
) -> Result<CallBatch, RecordError> {
    let edits: Vec<RecordEdit> = schema
        .iter()
        .filter_map(|kind| {
            let value = records.get(kind)?;
            (!value.is_empty()).then(|| RecordEdit {
                kind: kind.clone(),
                value: value.text_form(),
            })
        })
        .collect();
    build_write_batch(name, &edits, None)
}

/// The L2 resolver a parent domain contract hands its names to.
pub async fn l2_resolver<T>(transport: &T, parent_domain: Address) -> Result<Address, RecordError>
where
    T: ReadTransport + ?Sized,
{
    call_single(
        transport,
        parent_domain,
        IParentDomain::resolverCall {}.abi_encode(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordValue;
    use alloy_primitives::hex;
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use od_api_types::abi::{IMulticall, IRecordResolver};

    const L1_RESOLVER: Address = address!("0x1111111111111111111111111111111111111111");
    const L2_RESOLVER: Address = address!("0x2222222222222222222222222222222222222222");
    const WRAPPER: Address = address!("0x3333333333333333333333333333333333333333");
    const PARENT: Address = address!("0x4444444444444444444444444444444444444444");

    fn contracts() -> L1Contracts {
        L1Contracts {
            registry: ENS_REGISTRY,
            name_wrapper: WRAPPER,
            resolver: L1_RESOLVER,
        }
    }

    /// L1 registry, L1 resolver and parent domain behind one transport.
    struct StubL1 {
        owner: Address,
        resolver: Address,
    }

    impl StubL1 {
        fn answer_resolver(&self, call: &[u8]) -> Result<Bytes> {
            let encoded = if let Ok(call) = IL1Resolver::textCall::abi_decode(call) {
                match call.key.as_str() {
                    "com.twitter" => "alice".to_owned().abi_encode(),
                    _ => String::new().abi_encode(),
                }
            } else if let Ok(call) = IL1Resolver::addrCall::abi_decode(call) {
                if call.coinType == U256::from(60) {
                    Bytes::from(vec![0xaa; 20]).abi_encode()
                } else {
                    Bytes::new().abi_encode()
                }
            } else if IL1Resolver::contenthashCall::abi_decode(call).is_ok() {
                Bytes::new().abi_encode()
            } else {
                bail!("unexpected resolver call")
            };
            Ok(encoded.into())
        }
    }

    #[async_trait]
    impl ReadTransport for StubL1 {
        async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
            let encoded = if to == ENS_REGISTRY {
                if IRegistry::resolverCall::abi_decode(&data).is_ok() {
                    self.resolver.abi_encode()
                } else {
                    IRegistry::ownerCall::abi_decode(&data)?;
                    self.owner.abi_encode()
                }
            } else if to == L1_RESOLVER {
                let batch = IMulticall::multicallCall::abi_decode(&data)?;
                let results = batch
                    .data
                    .iter()
                    .map(|call| self.answer_resolver(call))
                    .collect::<Result<Vec<Bytes>>>()?;
                results.abi_encode()
            } else if to == PARENT {
                L2_RESOLVER.abi_encode()
            } else {
                bail!("call to unknown contract {to}")
            };
            Ok(encoded.into())
        }
    }

    #[tokio::test]
    async fn resolver_check_targets_registry_or_wrapper() -> Result<()> {
        let name = DomainName::parse("alice.eth")?;

        let unwrapped = StubL1 {
            owner: Address::repeat_byte(0x99),
            resolver: Address::repeat_byte(0x55),
        };
        let check = ResolverCheck::fetch(&unwrapped, &contracts(), &name).await?;
        assert_eq!(check.node, namehash(&name));
        assert!(!check.is_resolver_correct);
        assert!(!check.is_name_wrapped);
        let (target, data) = check.set_resolver_call(L1_RESOLVER);
        assert_eq!(target, ENS_REGISTRY);
        let call = IRegistry::setResolverCall::abi_decode(&data)?;
        assert_eq!(call.node, check.node);
        assert_eq!(call.resolver, L1_RESOLVER);

        let wrapped = StubL1 {
            owner: WRAPPER,
            resolver: L1_RESOLVER,
        };
        let check = ResolverCheck::fetch(&wrapped, &contracts(), &name).await?;
        assert!(check.is_resolver_correct);
        assert!(check.is_name_wrapped);
        assert_eq!(check.set_resolver_call(L1_RESOLVER).0, WRAPPER);
        Ok(())
    }

    #[tokio::test]
    async fn copies_non_empty_l1_records_to_l2_writes() -> Result<()> {
        let name = DomainName::parse("alice.eth")?;
        let l1 = StubL1 {
            owner: Address::ZERO,
            resolver: L1_RESOLVER,
        };
        let schema = RecordSchema::migration();

        let records = read_l1_records(&l1, L1_RESOLVER, &name, &schema).await?;
        assert_eq!(records.len(), schema.len());
        assert_eq!(
            records[&RecordKind::text("com.twitter")],
            RecordValue::Text("alice".to_owned())
        );

        let batch = build_migration_batch(&name, &schema, &records)?;
        assert_eq!(batch.len(), 2);

        let text = IRecordResolver::setTextCall::abi_decode(&batch[0])?;
        assert_eq!(text.dnsEncoded, Bytes::from(name.encode()?));
        assert_eq!(text.key, "com.twitter");
        assert_eq!(text.value, "alice");

        let addr = IRecordResolver::setAddrCall::abi_decode(&batch[1])?;
        assert_eq!(addr.coinType, U256::from(60));
        assert_eq!(hex::encode(&addr.addr), "aa".repeat(20));
        Ok(())
    }

    #[test]
    fn migration_keeps_binary_data_bytes() -> Result<()> {
        let name = DomainName::parse("x.eth")?;
        let schema = RecordSchema::new([RecordKind::data("abi"), RecordKind::ContentHash]);
        let mut records = RecordSet::new();
        records.insert(RecordKind::data("abi"), RecordValue::Data(vec![0xff, 0xfe]));
        records.insert(RecordKind::ContentHash, RecordValue::ContentHash(Vec::new()));

        let batch = build_migration_batch(&name, &schema, &records)?;
        assert_eq!(batch.len(), 1);
        let data = IRecordResolver::setDataCall::abi_decode(&batch[0])?;
        assert_eq!(data.key, "abi");
        assert_eq!(data.value, Bytes::from_static(&[0xff, 0xfe]));
        Ok(())
    }

    #[tokio::test]
    async fn reads_l2_resolver_from_parent_domain() -> Result<()> {
        let l1 = StubL1 {
            owner: Address::ZERO,
            resolver: Address::ZERO,
        };
        assert_eq!(l2_resolver(&l1, PARENT).await?, L2_RESOLVER);

        let err = l2_resolver(&l1, Address::repeat_byte(0x77)).await.unwrap_err();
        assert!(matches!(err, RecordError::BatchTransport(_)));
        Ok(())
    }
}
