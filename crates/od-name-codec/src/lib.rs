//! DNS wire-format encoding of dotted domain names.
//!
//! The encoded form is the only key the L2 record store accepts: each label
//! is written as a one-byte length followed by its UTF-8 bytes, most specific
//! label first, and the sequence ends with a single zero byte.

use alloy_primitives::{B256, Bytes, keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest label a one-byte length prefix can describe.
pub const MAX_LABEL_LEN: usize = u8::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("invalid name {name:?}: empty label")]
    EmptyLabel { name: String },
    #[error("label {label:?} is {len} bytes, at most 255 fit a length prefix")]
    LabelTooLong { label: String, len: usize },
    #[error("encoded name truncated at offset {offset}")]
    Truncated { offset: usize },
    #[error("encoded name has {0} bytes after the terminator")]
    TrailingBytes(usize),
    #[error("encoded name holds no labels")]
    Root,
    #[error("label at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
    #[error("label at offset {offset} contains a '.'")]
    DottedLabel { offset: usize },
}

/// A dotted domain name with no empty labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainName(String);

impl DomainName {
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if name.split('.').any(str::is_empty) {
            return Err(NameError::EmptyLabel {
                name: name.to_owned(),
            });
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn labels(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.split('.')
    }

    /// The most specific label, e.g. `sub` for `sub.example.eth`.
    pub fn label(&self) -> &str {
        self.labels().next().unwrap_or_default()
    }

    /// The name with its first label removed, `None` for a single label.
    pub fn parent(&self) -> Option<DomainName> {
        self.0
            .split_once('.')
            .map(|(_, parent)| DomainName(parent.to_owned()))
    }

    /// The labels left of `parent`, when this name sits strictly below it.
    pub fn strip_suffix(&self, parent: &DomainName) -> Option<DomainName> {
        self.0
            .strip_suffix(parent.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
            .filter(|rest| !rest.is_empty())
            .map(|rest| DomainName(rest.to_owned()))
    }

    pub fn child(&self, label: &str) -> Result<DomainName, NameError> {
        DomainName::parse(&format!("{label}.{}", self.0))
    }

    pub fn encode(&self) -> Result<EncodedName, NameError> {
        let mut out = Vec::with_capacity(self.0.len() + 2);
        for label in self.labels() {
            let len = u8::try_from(label.len()).map_err(|_| NameError::LabelTooLong {
                label: label.to_owned(),
                len: label.len(),
            })?;
            out.push(len);
            out.extend_from_slice(label.as_bytes());
        }
        out.push(0);
        Ok(EncodedName(out))
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DomainName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// DNS wire-format bytes of a [`DomainName`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedName(Vec<u8>);

impl EncodedName {
    /// Wraps bytes received from elsewhere; [`EncodedName::decode`] validates them.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn decode(&self) -> Result<DomainName, NameError> {
        let bytes = &self.0;
        let mut labels = Vec::new();
        let mut offset = 0;

        loop {
            let Some(&len) = bytes.get(offset) else {
                return Err(NameError::Truncated { offset });
            };
            if len == 0 {
                offset += 1;
                break;
            }

            let start = offset + 1;
            let end = start + usize::from(len);
            let raw = bytes
                .get(start..end)
                .ok_or(NameError::Truncated { offset })?;
            let label = std::str::from_utf8(raw).map_err(|_| NameError::InvalidUtf8 { offset })?;
            if label.contains('.') {
                return Err(NameError::DottedLabel { offset });
            }
            labels.push(label);
            offset = end;
        }

        if offset != bytes.len() {
            return Err(NameError::TrailingBytes(bytes.len() - offset));
        }
        if labels.is_empty() {
            return Err(NameError::Root);
        }

        Ok(DomainName(labels.join(".")))
    }
}

impl AsRef<[u8]> for EncodedName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<EncodedName> for Bytes {
    fn from(name: EncodedName) -> Self {
        Bytes::from(name.0)
    }
}

/// Parses and encodes in one step.
pub fn encode(name: &str) -> Result<EncodedName, NameError> {
    DomainName::parse(name)?.encode()
}

/// EIP-137 node hash, the key format of the L1 registry.
pub fn namehash(name: &DomainName) -> B256 {
    namehash_labels(name.labels())
}

pub fn namehash_labels<'a, I>(labels: I) -> B256
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut node = B256::ZERO;
    for label in labels.into_iter().rev() {
        let mut preimage = [0_u8; 64];
        preimage[..32].copy_from_slice(node.as_slice());
        preimage[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        node = keccak256(preimage);
    }
    node
}
