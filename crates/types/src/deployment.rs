use crate::address::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const DEPLOYMENT_DOMAIN: &[u8] = b"NETSTATE_DEPLOYMENT";

/// Record written once when a registry is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Identity that performed construction.
    pub owner: Address,
    /// Handle the deployer records for later calls.
    pub address: Address,
    /// UNIX seconds of construction.
    pub deployed_at: u64,
}

impl Deployment {
    pub fn new(owner: Address, deployed_at: u64) -> Self {
        Self {
            owner,
            address: Self::derive_address(&owner, deployed_at),
            deployed_at,
        }
    }

    /// Deterministic registry handle derived from the deployer and time.
    pub fn derive_address(owner: &Address, deployed_at: u64) -> Address {
        let mut h = Sha256::new();
        h.update(DEPLOYMENT_DOMAIN);
        h.update(owner.as_bytes());
        h.update(deployed_at.to_be_bytes());
        Address(h.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_depends_on_owner_and_time() {
        let owner = Address([3u8; 32]);
        let a = Deployment::new(owner, 100);
        assert_eq!(a.address, Deployment::new(owner, 100).address);
        assert_ne!(a.address, Deployment::new(owner, 101).address);
        assert_ne!(a.address, Deployment::new(Address([4u8; 32]), 100).address);
        assert_ne!(a.address, owner);
    }
}
