use alloy_primitives::{Address, address};
use anyhow::{Context, Result};
use od_records::migrate::ENS_REGISTRY;
use std::net::SocketAddr;

/// NameWrapper on Ethereum mainnet.
const NAME_WRAPPER: Address = address!("0xD4416b13d2b3a9aBae7AcD5D6C2BbDBE25686401");
const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Debug, Clone)]
pub(crate) struct ServiceConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) l2_rpc_url: String,
    pub(crate) l2_chain_id: u64,
    pub(crate) l1_rpc_url: Option<String>,
    pub(crate) l1_chain_id: u64,
    /// L2 record store the record routes read from and write to.
    pub(crate) resolver: Option<Address>,
    pub(crate) parent_domain: Option<Address>,
    /// L1 resolver migrated names should point at.
    pub(crate) l1_resolver: Option<Address>,
    pub(crate) name_wrapper: Address,
    pub(crate) registry: Address,
    pub(crate) sender: Option<Address>,
}

impl ServiceConfig {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty());
        let address = |key: &str| -> Result<Option<Address>> {
            var(key)
                .map(|value| value.parse::<Address>().with_context(|| format!("{key} is not an address")))
                .transpose()
        };
        let chain_id = |key: &str, default: u64| -> Result<u64> {
            var(key)
                .map(|value| value.parse::<u64>().with_context(|| format!("{key} is not a chain id")))
                .transpose()
                .map(|id| id.unwrap_or(default))
        };

        Ok(Self {
            bind_addr: var("OD_BIND_ADDR")
                .unwrap_or_else(|| "0.0.0.0:8080".to_owned())
                .parse()
                .context("OD_BIND_ADDR is not a socket address")?,
            l2_rpc_url: var("OD_L2_RPC_URL").unwrap_or_else(|| LOCAL_RPC_URL.to_owned()),
            l2_chain_id: chain_id("OD_L2_CHAIN_ID", 31337)?,
            l1_rpc_url: var("OD_L1_RPC_URL"),
            l1_chain_id: chain_id("OD_L1_CHAIN_ID", 1)?,
            resolver: address("OD_RESOLVER_ADDRESS")?,
            parent_domain: address("OD_PARENT_DOMAIN_ADDRESS")?,
            l1_resolver: address("OD_L1_RESOLVER_ADDRESS")?,
            name_wrapper: address("OD_NAME_WRAPPER_ADDRESS")?.unwrap_or(NAME_WRAPPER),
            registry: address("OD_REGISTRY_ADDRESS")?.unwrap_or(ENS_REGISTRY),
            sender: address("OD_SENDER_ADDRESS")?,
        })
    }
}
