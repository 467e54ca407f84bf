//! Caller identities.
//!
//! Every caller is named by the 32 bytes of its Ed25519 verifying key. Humans
//! see those bytes as `n` plus 64 lowercase hex digits.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Leading character of a printed identity.
pub const ADDRESS_PREFIX: char = 'n';
/// Raw identity width.
pub const ADDRESS_BYTES: usize = 32;
/// Printed identity width.
pub const ADDRESS_STRING_LENGTH: usize = 1 + ADDRESS_BYTES * 2;

/// Why a printed identity was refused.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AddressError {
    #[error("identity must begin with '{ADDRESS_PREFIX}'")]
    MissingPrefix,
    #[error("identity has {actual} characters, expected {expected}")]
    WrongLength { expected: usize, actual: usize },
    #[error("identity is not hexadecimal: {0}")]
    NotHex(#[from] hex::FromHexError),
}

/// Print raw identity bytes.
pub fn encode_address(bytes: &[u8; ADDRESS_BYTES]) -> String {
    format!("{ADDRESS_PREFIX}{}", hex::encode(bytes))
}

/// Parse a printed identity back into its bytes.
pub fn decode_address(address: &str) -> Result<[u8; ADDRESS_BYTES], AddressError> {
    let payload = address
        .strip_prefix(ADDRESS_PREFIX)
        .ok_or(AddressError::MissingPrefix)?;
    if address.len() != ADDRESS_STRING_LENGTH {
        return Err(AddressError::WrongLength {
            expected: ADDRESS_STRING_LENGTH,
            actual: address.len(),
        });
    }

    let mut bytes = [0u8; ADDRESS_BYTES];
    hex::decode_to_slice(payload, &mut bytes)?;
    Ok(bytes)
}

/// Identity of a caller; JSON carries the printed form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_BYTES]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    /// Interpret the address as an Ed25519 verifying key.
    pub fn verifying_key(&self) -> Option<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0).ok()
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(value: [u8; ADDRESS_BYTES]) -> Self {
        Address(value)
    }
}

impl From<&VerifyingKey> for Address {
    fn from(key: &VerifyingKey) -> Self {
        Address(key.to_bytes())
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        encode_address(&value.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        decode_address(&value).map(Address)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_address(s.trim()).map(Address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_address(&self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", encode_address(&self.0))
    }
}
