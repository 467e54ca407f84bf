use crate::address::Address;
use crate::amount::Amount;
use crate::territory::TerritoryId;
use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Domain tag prefixed to every signed call.
pub const CALL_DOMAIN: &[u8] = b"NETSTATE_CALL";

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

const MINT_TERRITORY_TAG: u8 = 0x01;
const JOIN_COMMUNITY_TAG: u8 = 0x02;

/// State-mutating operations a caller can submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryCall {
    MintTerritory {
        id: TerritoryId,
        name: String,
        price: Amount,
    },
    JoinCommunity,
}

impl RegistryCall {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryCall::MintTerritory { .. } => "mintTerritory",
            RegistryCall::JoinCommunity => "joinCommunity",
        }
    }
}

/// A call together with the identity that claims to send it.
///
/// The sender is only trusted once `signature` verifies against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall {
    pub sender: Address,
    pub call: RegistryCall,
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
}

impl SignedCall {
    /// Sign `call` with `key`; the sender becomes the key's identity.
    pub fn sign(key: &SigningKey, call: RegistryCall) -> Self {
        let sender = Address::from(&key.verifying_key());
        let digest = signing_digest(&sender, &call);
        let signature = key.sign(&digest);
        Self {
            sender,
            call,
            signature: signature.to_bytes().to_vec(),
        }
    }
}

/// Digest covered by the signature of a [`SignedCall`].
///
/// Layout: `CALL_DOMAIN || sender || tag`, and for a mint also
/// `id (u64 BE) || name length (u64 BE) || name || price (u128 BE)`.
pub fn signing_digest(sender: &Address, call: &RegistryCall) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(CALL_DOMAIN);
    hasher.update(sender.as_bytes());
    match call {
        RegistryCall::MintTerritory { id, name, price } => {
            hasher.update([MINT_TERRITORY_TAG]);
            hasher.update(id.to_be_bytes());
            hasher.update((name.len() as u64).to_be_bytes());
            hasher.update(name.as_bytes());
            hasher.update(price.base_units().to_be_bytes());
        }
        RegistryCall::JoinCommunity => hasher.update([JOIN_COMMUNITY_TAG]),
    }
    hasher.finalize().into()
}
