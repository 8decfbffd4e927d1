//! Opaque link tokens for email verification and password reset.
//!
//! Tokens carry no embedded structure; validity is determined solely by
//! store lookup plus expiry comparison. Only the SHA-256 digest of a token
//! is persisted, the raw value exists exclusively inside the emailed link.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

/// Generate an unguessable token: 256 bits from the OS CSPRNG, URL-safe
/// base64 encoded.
pub fn generate() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest a token for storage.
pub fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
