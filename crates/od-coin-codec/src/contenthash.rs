//! ENSIP-7 content hashes: a multicodec namespace prefix followed by the
//! storage system's own identifier.

use alloy_primitives::hex;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

/// `ipfs-ns` varint, CIDv1, `dag-pb`.
const IPFS_PREFIX: [u8; 4] = [0xe3, 0x01, 0x01, 0x70];
/// sha2-256 multihash header for a 32-byte digest.
const SHA2_256_MULTIHASH: [u8; 2] = [0x12, 0x20];
/// `arweave-ns` (0xb29910) as a varint.
const ARWEAVE_PREFIX: [u8; 4] = [0x90, 0xb2, 0xca, 0x05];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentHashError {
    #[error("invalid ipfs hash {0:?}")]
    InvalidIpfs(String),
    #[error("invalid arweave transaction id {0:?}")]
    InvalidArweave(String),
    #[error("invalid hex content hash {0:?}")]
    InvalidHex(String),
    #[error("unsupported content hash {0:?}, expected ipfs://, ar:// or 0x")]
    Unsupported(String),
}

/// Parses the text a user enters into the bytes stored on-chain.
pub fn encode_content_hash(text: &str) -> Result<Vec<u8>, ContentHashError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(cid) = text.strip_prefix("ipfs://") {
        return encode_ipfs(cid, text);
    }
    if text.starts_with("Qm") {
        return encode_ipfs(text, text);
    }
    if let Some(id) = text.strip_prefix("ar://") {
        let raw = URL_SAFE_NO_PAD
            .decode(id)
            .map_err(|_| ContentHashError::InvalidArweave(text.to_owned()))?;
        if raw.len() != 32 {
            return Err(ContentHashError::InvalidArweave(text.to_owned()));
        }
        let mut out = ARWEAVE_PREFIX.to_vec();
        out.extend_from_slice(&raw);
        return Ok(out);
    }
    if let Some(body) = text.strip_prefix("0x") {
        return hex::decode(body).map_err(|_| ContentHashError::InvalidHex(text.to_owned()));
    }

    Err(ContentHashError::Unsupported(text.to_owned()))
}

fn encode_ipfs(cid: &str, original: &str) -> Result<Vec<u8>, ContentHashError> {
    let multihash = bs58::decode(cid)
        .into_vec()
        .map_err(|_| ContentHashError::InvalidIpfs(original.to_owned()))?;
    if multihash.len() != 34 || multihash[..2] != SHA2_256_MULTIHASH {
        return Err(ContentHashError::InvalidIpfs(original.to_owned()));
    }

    let mut out = IPFS_PREFIX.to_vec();
    out.extend_from_slice(&multihash);
    Ok(out)
}

/// Renders stored bytes for display. Unknown encodings fall back to hex.
pub fn decode_content_hash(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }

    if let Some(multihash) = raw.strip_prefix(&IPFS_PREFIX) {
        if multihash.len() == 34 && multihash.starts_with(&SHA2_256_MULTIHASH) {
            return format!("ipfs://{}", bs58::encode(multihash).into_string());
        }
    }
    if let Some(id) = raw.strip_prefix(&ARWEAVE_PREFIX) {
        if id.len() == 32 {
            return format!("ar://{}", URL_SAFE_NO_PAD.encode(id));
        }
    }

    hex::encode_prefixed(raw)
}
