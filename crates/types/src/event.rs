use crate::address::Address;
use crate::amount::Amount;
use crate::territory::TerritoryId;
use serde::{Deserialize, Serialize};

/// Entry of the registry's append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEvent {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    pub kind: RegistryEventKind,
}

/// Successful state transitions recorded by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEventKind {
    Deployed {
        owner: Address,
        address: Address,
    },
    TerritoryMinted {
        id: TerritoryId,
        name: String,
        price: Amount,
    },
    MemberJoined {
        member: Address,
    },
}
