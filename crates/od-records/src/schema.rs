use od_api_types::{CoinType, RecordKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const SOCIAL_KEYS: [&str; 5] = [
    "com.twitter",
    "com.github",
    "org.telegram",
    "com.discord",
    "xyz.farcaster",
];

pub const PROFILE_KEYS: [&str; 5] = ["display", "description", "avatar", "email", "url"];

pub const ADDRESS_COIN_TYPES: [CoinType; 3] =
    [CoinType::ETHEREUM, CoinType::BITCOIN, CoinType::SOLANA];

/// Ordered list of record kinds to read or migrate.
///
/// Duplicates are collapsed when the schema is built, so every kind maps to
/// exactly one call and one result slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RecordKind>", into = "Vec<RecordKind>")]
pub struct RecordSchema(Vec<RecordKind>);

impl RecordSchema {
    pub const PRESETS: [&'static str; 5] = ["addresses", "socials", "profile", "general", "migration"];

    pub fn new(kinds: impl IntoIterator<Item = RecordKind>) -> Self {
        let mut seen = HashSet::new();
        Self(
            kinds
                .into_iter()
                .filter(|kind| seen.insert(kind.clone()))
                .collect(),
        )
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "addresses" => Some(Self::addresses()),
            "socials" => Some(Self::socials()),
            "profile" => Some(Self::profile()),
            "general" => Some(Self::general()),
            "migration" => Some(Self::migration()),
            _ => None,
        }
    }

    pub fn addresses() -> Self {
        Self::new(
            ADDRESS_COIN_TYPES
                .into_iter()
                .map(|coin_type| RecordKind::Address { coin_type }),
        )
    }

    pub fn socials() -> Self {
        Self::new(SOCIAL_KEYS.into_iter().map(RecordKind::text))
    }

    pub fn profile() -> Self {
        Self::new(
            std::iter::once(RecordKind::ContentHash)
                .chain(PROFILE_KEYS.into_iter().map(RecordKind::text)),
        )
    }

    pub fn general() -> Self {
        Self::new([RecordKind::ContentHash, RecordKind::data("abi")])
    }

    /// Everything carried over when a name moves from L1 to L2.
    pub fn migration() -> Self {
        let profile = ["display", "description", "avatar", "email"]
            .into_iter()
            .map(RecordKind::text);
        Self::new(
            Self::socials()
                .0
                .into_iter()
                .chain(Self::addresses().0)
                .chain(std::iter::once(RecordKind::ContentHash))
                .chain(profile),
        )
    }

    pub fn kinds(&self) -> &[RecordKind] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecordKind> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<RecordKind>> for RecordSchema {
    fn from(kinds: Vec<RecordKind>) -> Self {
        Self::new(kinds)
    }
}

impl From<RecordSchema> for Vec<RecordKind> {
    fn from(schema: RecordSchema) -> Self {
        schema.0
    }
}

impl<'a> IntoIterator for &'a RecordSchema {
    type Item = &'a RecordKind;
    type IntoIter = std::slice::Iter<'a, RecordKind>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
