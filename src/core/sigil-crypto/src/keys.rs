//! Secure key types with automatic memory zeroization.
//!
//! [`SymmetricKey`] implements `Zeroize` and `ZeroizeOnDrop` so key material
//! is erased from memory when dropped. Its text form is URL-safe base64 with
//! padding, [`ENCODED_KEY_LEN`] characters long.

use base64::{engine::general_purpose::URL_SAFE, Engine};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::params::{ENCODED_KEY_LEN, KEY_SIZE};
use crate::random::generate_key;

/// A 256-bit AES key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Fresh random key.
    pub fn generate() -> Self {
        Self {
            bytes: *generate_key(),
        }
    }

    /// Wraps raw key bytes.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidKey`] unless `bytes` is exactly [`KEY_SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "key must be {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Parses a key from its text form.
    ///
    /// The input must be exactly [`ENCODED_KEY_LEN`] characters of URL-safe
    /// base64 decoding to [`KEY_SIZE`] bytes. No trimming is done here.
    pub fn from_encoded(encoded: &str) -> Result<Self, CryptoError> {
        if encoded.len() != ENCODED_KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} characters, got {}",
                ENCODED_KEY_LEN,
                encoded.len()
            )));
        }

        let decoded = Zeroizing::new(
            URL_SAFE
                .decode(encoded)
                .map_err(|e| CryptoError::InvalidKey(e.to_string()))?,
        );

        Self::from_bytes(&decoded)
    }

    /// Returns the text form of this key.
    pub fn to_encoded(&self) -> Zeroizing<String> {
        Zeroizing::new(URL_SAFE.encode(&self.bytes))
    }

    /// Raw key bytes. Copies taken from this slice are not wiped.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Reports whether every character of `s` belongs to the key text alphabet.
///
/// Says nothing about whether it actually decodes; used to spot likely typos.
pub fn uses_key_alphabet(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'='))
}
