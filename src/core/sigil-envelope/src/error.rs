//! Envelope and file operation error types.

use std::io;
use std::path::{Path, PathBuf};

use sigil_crypto::CryptoError;
use thiserror::Error;

/// Errors that can occur while sealing, opening or comparing files.
#[derive(Debug, Error)]
pub enum SigilError {
    /// A file could not be read, written or inspected.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The envelope text is malformed.
    #[error("malformed envelope: {0}")]
    Format(String),

    /// The credential cannot be used at all (e.g. it is empty).
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The credential kind does not fit the envelope's derivation kind.
    #[error("credential mismatch: {0}")]
    CredentialMismatch(String),

    /// Tag verification failed.
    #[error("authentication failed: wrong key or password, or the file was modified")]
    Authentication,

    /// Any other cryptographic failure.
    #[error("crypto error: {0}")]
    Crypto(CryptoError),
}

impl SigilError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        SigilError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<CryptoError> for SigilError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::AuthenticationFailed => SigilError::Authentication,
            other => SigilError::Crypto(other),
        }
    }
}

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, SigilError>;
