//! Authenticated entry point for signed calls.
//!
//! The caller identity of a mutation is the `sender` of a [`SignedCall`],
//! trusted only after its Ed25519 signature verifies.

use crate::errors::*;
use crate::registry::NetworkStateRegistry;
use ed25519_dalek::{Signature, Verifier};
use netstate_types::{signing_digest, RegistryCall, SignedCall, SIGNATURE_LENGTH};
use tracing::warn;

/// Check that `signed.signature` was produced by `signed.sender` over its call.
pub fn verify_call_signature(signed: &SignedCall) -> bool {
    if signed.signature.len() != SIGNATURE_LENGTH {
        return false;
    }

    let Some(verifying_key) = signed.sender.verifying_key() else {
        return false;
    };

    let Ok(signature) = Signature::from_slice(&signed.signature) else {
        return false;
    };

    let digest = signing_digest(&signed.sender, &signed.call);
    verifying_key.verify(&digest, &signature).is_ok()
}

impl NetworkStateRegistry {
    /// Verify and apply a signed call with its sender as the caller.
    pub fn submit(&self, signed: &SignedCall) -> Result<()> {
        if !verify_call_signature(signed) {
            warn!(
                sender = %signed.sender,
                call = signed.call.name(),
                "rejecting call with invalid signature"
            );
            return Err(RegistryError::InvalidSignature);
        }

        match &signed.call {
            RegistryCall::MintTerritory { id, name, price } => {
                self.mint_territory(&signed.sender, *id, name.clone(), *price)
            }
            RegistryCall::JoinCommunity => self.join_community(&signed.sender),
        }
    }
}
