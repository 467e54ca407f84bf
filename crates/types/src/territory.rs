use crate::amount::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied territory identifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TerritoryId(pub u64);

impl TerritoryId {
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl From<u64> for TerritoryId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TerritoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A minted unit of the network state.
///
/// Lookups of unknown identifiers return [`Territory::default`], whose
/// `exists` flag is `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub price: Amount,
    pub exists: bool,
}

impl Territory {
    /// Build the record stored by a successful mint.
    pub fn minted(id: TerritoryId, name: impl Into<String>, price: Amount) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            exists: true,
        }
    }
}
