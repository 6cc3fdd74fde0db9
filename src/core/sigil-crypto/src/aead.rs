//! AES-256-GCM authenticated encryption.
//!
//! This is the cipher behind every Sigil envelope. Each call draws a fresh
//! nonce from the OS CSPRNG, so two encryptions of the same plaintext under
//! the same key never share a nonce.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::SymmetricKey;
use crate::random::generate_nonce;

pub use crate::params::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// Encrypts plaintext using AES-256-GCM.
///
/// The nonce is generated per call and prepended to the ciphertext.
/// Format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let nonce_bytes = generate_nonce();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut token = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    token.extend_from_slice(&nonce_bytes);
    token.extend_from_slice(&ciphertext);

    Ok(token)
}

/// Decrypts a token produced by [`encrypt`].
///
/// The tag is verified before any plaintext is returned. A wrong key, any
/// modified byte, or a token too short to hold a nonce and tag all yield
/// [`CryptoError::AuthenticationFailed`].
pub fn decrypt(key: &SymmetricKey, token: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if token.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    let (nonce, encrypted) = token.split_at(NONCE_SIZE);

    cipher
        .decrypt(Nonce::from_slice(nonce), encrypted)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::AuthenticationFailed)
}
