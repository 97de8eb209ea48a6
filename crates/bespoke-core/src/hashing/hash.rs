//! Digest SHA-512 en hexadecimal.

use serde_json::Value;
use sha2::{Digest, Sha512};

use super::to_canonical_json;

pub fn hash_str(input: &str) -> String {
    let digest = Sha512::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Fingerprint de un valor: SHA-512 de su forma canónica.
pub fn fingerprint(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}
