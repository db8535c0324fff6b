//! Conversion between the text form of an address and the raw bytes a
//! resolver stores for its coin type.

use alloy_primitives::{Address, hex};
use anyhow::{Result, anyhow, bail};
use od_api_types::CoinType;
use thiserror::Error;

mod bitcoin;
pub mod contenthash;

pub use bitcoin::BitcoinCodec;
pub use contenthash::{ContentHashError, decode_content_hash, encode_content_hash};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address for coin type {coin_type}: {reason}")]
pub struct AddressError {
    pub coin_type: CoinType,
    pub reason: String,
}

/// Converts between the raw bytes a resolver stores for a coin type and the
/// text form users type and read.
pub trait AddressCodec: Send + Sync {
    fn name(&self) -> &'static str;
    fn to_text(&self, raw: &[u8]) -> Result<String>;
    fn to_raw(&self, text: &str) -> Result<Vec<u8>>;
}

/// 20-byte accounts shown as EIP-55 checksummed hex.
pub struct EvmCodec;

impl AddressCodec for EvmCodec {
    fn name(&self) -> &'static str {
        "evm"
    }

    fn to_text(&self, raw: &[u8]) -> Result<String> {
        if raw.len() != 20 {
            bail!("expected 20 bytes, got {}", raw.len());
        }
        Ok(Address::from_slice(raw).to_checksum(None))
    }

    fn to_raw(&self, text: &str) -> Result<Vec<u8>> {
        let body = strip_hex_prefix(text).ok_or_else(|| anyhow!("missing 0x prefix"))?;
        if body.len() != 40 {
            bail!("expected 40 hex digits, got {}", body.len());
        }
        let raw = hex::decode(body).map_err(|err| anyhow!("not hex: {err}"))?;

        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower {
            let checksummed = Address::from_slice(&raw).to_checksum(None);
            if checksummed[2..] != *body {
                bail!("checksum mismatch, expected {checksummed}");
            }
        }

        Ok(raw)
    }
}

/// 32-byte ed25519 public keys shown as base58.
pub struct SolanaCodec;

impl AddressCodec for SolanaCodec {
    fn name(&self) -> &'static str {
        "solana"
    }

    fn to_text(&self, raw: &[u8]) -> Result<String> {
        if raw.len() != 32 {
            bail!("expected 32 bytes, got {}", raw.len());
        }
        Ok(bs58::encode(raw).into_string())
    }

    fn to_raw(&self, text: &str) -> Result<Vec<u8>> {
        let raw = bs58::decode(text)
            .into_vec()
            .map_err(|err| anyhow!("not base58: {err}"))?;
        if raw.len() != 32 {
            bail!("expected 32 bytes, got {}", raw.len());
        }
        Ok(raw)
    }
}

/// Fallback for coin types without a dedicated format.
pub struct HexCodec;

impl AddressCodec for HexCodec {
    fn name(&self) -> &'static str {
        "hex"
    }

    fn to_text(&self, raw: &[u8]) -> Result<String> {
        Ok(hex::encode_prefixed(raw))
    }

    fn to_raw(&self, text: &str) -> Result<Vec<u8>> {
        let body = strip_hex_prefix(text).ok_or_else(|| anyhow!("missing 0x prefix"))?;
        if body.is_empty() {
            bail!("empty address");
        }
        hex::decode(body).map_err(|err| anyhow!("not hex: {err}"))
    }
}

pub fn codec_for(coin_type: CoinType) -> &'static dyn AddressCodec {
    match coin_type {
        CoinType::BITCOIN => &BitcoinCodec,
        CoinType::SOLANA => &SolanaCodec,
        coin if coin.is_evm() => &EvmCodec,
        _ => &HexCodec,
    }
}

pub fn to_text(coin_type: CoinType, raw: &[u8]) -> Result<String, AddressError> {
    codec_for(coin_type)
        .to_text(raw)
        .map_err(|err| AddressError {
            coin_type,
            reason: err.to_string(),
        })
}

pub fn to_raw(coin_type: CoinType, text: &str) -> Result<Vec<u8>, AddressError> {
    codec_for(coin_type)
        .to_raw(text.trim())
        .map_err(|err| AddressError {
            coin_type,
            reason: err.to_string(),
        })
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}
