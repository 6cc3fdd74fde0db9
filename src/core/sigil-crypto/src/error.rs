//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key format or size.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivationFailed(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// The authentication tag did not verify.
    ///
    /// Raised alike for a wrong key, a corrupted token and a truncated token.
    #[error("authentication failed")]
    AuthenticationFailed,
}
