use alloy_primitives::{Address, B256, Bytes};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use od_chain_client::{ChainAdapter, PendingTx, ReadTransport, SubmitTxRequest, TxStatus, TxSubmitter};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Ethereum JSON-RPC adapter.
///
/// Reads `OD_RPC_URL` from environment when no endpoint is given
/// (default: the local Anvil node at `http://127.0.0.1:8545`).
/// Transactions go out through `eth_sendTransaction`, so the node must hold
/// the sender's key, as dev chains do for their unlocked accounts.
pub struct JsonRpcAdapter {
    endpoint: String,
    chain_id: u64,
    sender: Option<Address>,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcAdapter {
    pub fn new(endpoint: Option<String>, chain_id: u64) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("OD_RPC_URL").ok())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            chain_id,
            sender: None,
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The chain id the node reports, for comparing against the configured one.
    pub async fn remote_chain_id(&self) -> Result<u64> {
        let quantity: String = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&quantity)
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{method} transport"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("{method} HTTP {status}: {text}");
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .with_context(|| format!("{method} parse"))?;

        if let Some(err) = envelope.error {
            bail!("{method} failed ({}): {}", err.code, err.message);
        }

        serde_json::from_value(envelope.result).with_context(|| format!("{method} result"))
    }
}

// ── JSON-RPC wire types ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: serde_json::Value,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct CallObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<Address>,
    to: Address,
    data: Bytes,
}

#[derive(Debug, Deserialize)]
struct ReceiptResponse {
    status: Option<String>,
}

#[async_trait]
impl ReadTransport for JsonRpcAdapter {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        debug!(%to, len = data.len(), "eth_call");
        let call = CallObject {
            from: None,
            to,
            data,
        };
        self.request("eth_call", json!([call, "latest"])).await
    }
}

#[async_trait]
impl TxSubmitter for JsonRpcAdapter {
    async fn submit_transaction(&self, req: SubmitTxRequest) -> Result<PendingTx> {
        if req.chain_id != self.chain_id {
            bail!(
                "adapter is connected to chain {}, transaction targets chain {}",
                self.chain_id,
                req.chain_id
            );
        }
        let from = self
            .sender
            .ok_or_else(|| anyhow!("no sender account configured"))?;

        let tx = CallObject {
            from: Some(from),
            to: req.to,
            data: req.data,
        };
        let tx_hash: B256 = self.request("eth_sendTransaction", json!([tx])).await?;
        info!(%tx_hash, chain_id = self.chain_id, to = %req.to, "transaction submitted");

        Ok(PendingTx {
            chain_id: self.chain_id,
            tx_hash,
        })
    }

    async fn get_transaction_status(&self, tx_hash: B256) -> Result<TxStatus> {
        let receipt: Option<ReceiptResponse> = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;

        let Some(receipt) = receipt else {
            return Ok(TxStatus::Pending);
        };
        match receipt.status.as_deref().map(parse_quantity).transpose()? {
            Some(1) => Ok(TxStatus::Confirmed),
            Some(_) => Ok(TxStatus::Failed),
            // pre-Byzantium receipts carry no status; inclusion is all we know
            None => Ok(TxStatus::Confirmed),
        }
    }
}

impl ChainAdapter for JsonRpcAdapter {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

fn parse_quantity(quantity: &str) -> Result<u64> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| anyhow!("quantity {quantity:?} lacks 0x prefix"))?;
    u64::from_str_radix(digits, 16).with_context(|| format!("quantity {quantity:?}"))
}
