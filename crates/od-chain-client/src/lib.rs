use alloy_primitives::{Address, B256, Bytes};
use alloy_sol_types::{SolCall, SolValue};
use anyhow::{Context, Result};
use async_trait::async_trait;
use od_api_types::abi::IMulticall;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SubmitTxRequest {
    pub chain_id: u64,
    pub to: Address,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTx {
    pub chain_id: u64,
    pub tx_hash: B256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read side of a chain: plain `eth_call`s and aggregated batches.
///
/// `aggregate` is atomic. It yields one result per call in request order,
/// or an error for the whole batch.
#[async_trait]
pub trait ReadTransport: Send + Sync {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    async fn aggregate(&self, to: Address, calls: Vec<Bytes>) -> Result<Vec<Bytes>> {
        let payload = IMulticall::multicallCall { data: calls }.abi_encode();
        let raw = self.call(to, payload.into()).await.context("multicall")?;
        Vec::<Bytes>::abi_decode(&raw).context("decode multicall results")
    }
}

/// Hands transactions to whatever holds the signing key.
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn submit_transaction(&self, req: SubmitTxRequest) -> Result<PendingTx>;
    async fn get_transaction_status(&self, tx_hash: B256) -> Result<TxStatus>;
}

pub trait ChainAdapter: ReadTransport + TxSubmitter {
    fn chain_id(&self) -> u64;
}

#[async_trait]
impl<T: ReadTransport + ?Sized> ReadTransport for Arc<T> {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        (**self).call(to, data).await
    }

    async fn aggregate(&self, to: Address, calls: Vec<Bytes>) -> Result<Vec<Bytes>> {
        (**self).aggregate(to, calls).await
    }
}

#[async_trait]
impl<T: TxSubmitter + ?Sized> TxSubmitter for Arc<T> {
    async fn submit_transaction(&self, req: SubmitTxRequest) -> Result<PendingTx> {
        (**self).submit_transaction(req).await
    }

    async fn get_transaction_status(&self, tx_hash: B256) -> Result<TxStatus> {
        (**self).get_transaction_status(tx_hash).await
    }
}

#[derive(Default)]
pub struct ChainRegistry {
    adapters: HashMap<u64, Arc<dyn ChainAdapter>>,
}

impl ChainRegistry {
    pub fn register(&mut self, adapter: Arc<dyn ChainAdapter>) {
        self.adapters.insert(adapter.chain_id(), adapter);
    }

    pub fn adapter(&self, chain_id: u64) -> Option<Arc<dyn ChainAdapter>> {
        self.adapters.get(&chain_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    /// Answers `multicall` by echoing every inner call back as its result.
    struct EchoResolver;

    #[async_trait]
    impl ReadTransport for EchoResolver {
        async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes> {
            let call = IMulticall::multicallCall::abi_decode(&data)?;
            Ok(call.data.abi_encode().into())
        }
    }

    #[async_trait]
    impl TxSubmitter for EchoResolver {
        async fn submit_transaction(&self, _req: SubmitTxRequest) -> Result<PendingTx> {
            bail!("read only")
        }

        async fn get_transaction_status(&self, _tx_hash: B256) -> Result<TxStatus> {
            Ok(TxStatus::Pending)
        }
    }

    impl ChainAdapter for EchoResolver {
        fn chain_id(&self) -> u64 {
            31337
        }
    }

    #[tokio::test]
    async fn aggregate_wraps_calls_in_multicall() -> Result<()> {
        let calls = vec![
            Bytes::from_static(&[1, 2, 3]),
            Bytes::new(),
            Bytes::from_static(&[4]),
        ];
        let results = EchoResolver.aggregate(Address::ZERO, calls.clone()).await?;
        assert_eq!(results, calls);
        Ok(())
    }

    #[tokio::test]
    async fn registry_resolves_by_chain_id() -> Result<()> {
        let mut registry = ChainRegistry::default();
        registry.register(Arc::new(EchoResolver));

        let adapter = registry.adapter(31337).expect("registered adapter");
        let results = adapter
            .aggregate(Address::ZERO, vec![Bytes::from_static(&[9])])
            .await?;
        assert_eq!(results, vec![Bytes::from_static(&[9])]);
        assert_eq!(
            adapter.get_transaction_status(B256::ZERO).await?,
            TxStatus::Pending
        );
        assert!(registry.adapter(1).is_none());
        Ok(())
    }
}
