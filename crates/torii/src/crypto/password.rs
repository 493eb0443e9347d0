// Password hashing — scrypt over the password peppered with the server
// secret, random 16-byte salt, stored as "hex(salt):hex(key)".
//
// The secret reaches this module only through a validated AuthContext; a
// missing secret is rejected at startup.

use rand::RngCore;
use scrypt::{scrypt, Params};

use torii_core::error::AuthError;

const SALT_BYTES: usize = 16;
const KEY_BYTES: usize = 64;

fn scrypt_params() -> Result<Params, AuthError> {
    // N = 2^14, r = 16, p = 1
    Params::new(14, 16, 1, KEY_BYTES)
        .map_err(|e| AuthError::Crypto(format!("invalid scrypt params: {e}")))
}

fn derive_key(password: &str, secret: &str, salt_hex: &str) -> Result<Vec<u8>, AuthError> {
    let params = scrypt_params()?;
    let peppered = format!("{password}{secret}");

    let mut output = vec![0u8; KEY_BYTES];
    scrypt(peppered.as_bytes(), salt_hex.as_bytes(), &params, &mut output)
        .map_err(|e| AuthError::Crypto(format!("scrypt failed: {e}")))?;
    Ok(output)
}

/// Hash a password for storage.
pub fn hash_password(password: &str, secret: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt_hex = hex::encode(salt_bytes);

    let key = derive_key(password, secret, &salt_hex)?;
    Ok(format!("{}:{}", salt_hex, hex::encode(key)))
}

/// Verify a password against a stored hash. The final comparison is
/// constant-time regardless of where a mismatch occurs.
pub fn verify_password(password: &str, secret: &str, stored: &str) -> Result<bool, AuthError> {
    let (salt_hex, key_hex) = stored
        .split_once(':')
        .ok_or_else(|| AuthError::Crypto("invalid password hash format".into()))?;

    let expected = hex::decode(key_hex)
        .map_err(|e| AuthError::Crypto(format!("invalid hex in password hash: {e}")))?;

    let derived = derive_key(password, secret, salt_hex)?;
    Ok(super::constant_time_equal(&derived, &expected))
}
