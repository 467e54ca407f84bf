//! Hex-encoded Ed25519 secret key files.

use anyhow::{anyhow, Context, Result};
use ed25519_dalek::SigningKey;
use rand_core::OsRng;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Generate a new key and write it to `path`. Existing files are never replaced.
pub fn generate_key_file(path: &Path) -> Result<SigningKey> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("failed to create key file {}", path.display()))?;
    let key = SigningKey::generate(&mut OsRng);
    file.write_all(hex::encode(key.to_bytes()).as_bytes())
        .with_context(|| format!("failed to write key file {}", path.display()))?;
    Ok(key)
}

pub fn load_key_file(path: &Path) -> Result<SigningKey> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    let mut secret = [0u8; 32];
    hex::decode_to_slice(raw.trim(), &mut secret)
        .map_err(|e| anyhow!("key file {} is not a 32-byte hex secret: {e}", path.display()))?;
    Ok(SigningKey::from_bytes(&secret))
}
