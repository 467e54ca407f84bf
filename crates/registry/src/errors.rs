//! Error types for the NetworkState registry

use netstate_types::{Address, TerritoryId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Ownable: caller is not the owner")]
    NotOwner,

    #[error("Territory already exists: {id}")]
    DuplicateTerritory { id: TerritoryId },

    #[error("Member already exists")]
    DuplicateMember { member: Address },

    #[error("Invalid call signature")]
    InvalidSignature,

    #[error("Registry already deployed by {owner}")]
    AlreadyDeployed { owner: Address },

    #[error("Registry has not been deployed")]
    NotDeployed,

    #[error("Registry storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl RegistryError {
    /// Stable short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::NotOwner => "not_owner",
            RegistryError::DuplicateTerritory { .. } => "duplicate_territory",
            RegistryError::DuplicateMember { .. } => "duplicate_member",
            RegistryError::InvalidSignature => "invalid_signature",
            RegistryError::AlreadyDeployed { .. } => "already_deployed",
            RegistryError::NotDeployed => "not_deployed",
            RegistryError::Storage(_) => "storage",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
