//! Password-based key derivation.
//!
//! Provides PBKDF2-HMAC-SHA256 (RFC 8018). A passphrase and a per-envelope
//! random salt are stretched into a [`SymmetricKey`]. The derivation is
//! deterministic, which is what lets decryption rebuild the key from the
//! passphrase and the salt stored in the envelope.

use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::SymmetricKey;
use crate::params::{KEY_SIZE, PBKDF2_ITERATIONS, SALT_SIZE};

/// Derives an AES-256 key from a passphrase with [`PBKDF2_ITERATIONS`] rounds.
///
/// # Arguments
///
/// * `passphrase` - The user's passphrase (UTF-8 bytes are used as-is)
/// * `salt` - The salt stored alongside the ciphertext
pub fn derive_key(passphrase: &str, salt: &[u8; SALT_SIZE]) -> Result<SymmetricKey, CryptoError> {
    derive_key_with_iterations(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS)
}

/// Derives an AES-256 key with an explicit iteration count.
///
/// Only [`derive_key`] produces keys compatible with stored envelopes.
pub fn derive_key_with_iterations(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<SymmetricKey, CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::KeyDerivationFailed(
            "iteration count must be > 0".to_string(),
        ));
    }

    let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut *okm)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    SymmetricKey::from_bytes(&*okm)
}
