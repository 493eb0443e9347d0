// Opaque session token codec.
//
// Tokens carry no decodable structure; the store only ever sees the SHA-256
// lookup key, so a leaked database cannot be replayed as live sessions.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes per token.
pub const TOKEN_BYTES: usize = 20;

/// Generate a raw session token: 20 CSPRNG bytes, lowercase hex.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Derive the storage lookup key for a raw token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
