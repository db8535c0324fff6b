use serde::{Deserialize, Serialize};
use std::fmt;

pub mod abi;

/// SLIP-44 style coin type identifying which address format a record holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoinType(pub u64);

impl CoinType {
    pub const BITCOIN: CoinType = CoinType(0);
    pub const ETHEREUM: CoinType = CoinType(60);
    pub const SOLANA: CoinType = CoinType(501);

    /// ENSIP-11 coin types for EVM chains carry the high bit of a u32.
    pub fn is_evm(self) -> bool {
        self == Self::ETHEREUM || (self.0 & 0x8000_0000 != 0 && self.0 <= u64::from(u32::MAX))
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordKind {
    Address { coin_type: CoinType },
    Text { key: String },
    ContentHash,
    Data { key: String },
}

impl RecordKind {
    pub fn address(coin_type: u64) -> Self {
        Self::Address {
            coin_type: CoinType(coin_type),
        }
    }

    pub fn text(key: impl Into<String>) -> Self {
        Self::Text { key: key.into() }
    }

    pub fn data(key: impl Into<String>) -> Self {
        Self::Data { key: key.into() }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address { coin_type } => write!(f, "addr[{coin_type}]"),
            Self::Text { key } => write!(f, "text[{key}]"),
            Self::ContentHash => f.write_str("contenthash"),
            Self::Data { key } => write!(f, "data[{key}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Claimed,
    Unclaimed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelStatus {
    pub label: String,
    pub status: ClaimStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordEntry {
    #[serde(flatten)]
    pub kind: RecordKind,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadRecordsResponse {
    pub name: String,
    pub resolver: String,
    pub records: Vec<RecordEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRecordsRequest {
    pub edits: Vec<RecordEntry>,
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallPayload {
    pub to: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteBatchResponse {
    pub to: String,
    pub chain_id: u64,
    pub call_count: usize,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRecordsResponse {
    pub submitted: bool,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxStatusResponse {
    pub tx_hash: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckNamesRequest {
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckNamesResponse {
    pub results: Vec<LabelStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnamesResponse {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResponse {
    pub name: String,
    pub l1_resolver: String,
    pub is_resolver_correct: bool,
    pub is_name_wrapped: bool,
    pub set_resolver: Option<CallPayload>,
    pub records: Vec<RecordEntry>,
    pub batch: WriteBatchResponse,
}
