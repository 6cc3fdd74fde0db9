//! # Sigil Crypto
//!
//! Core cryptographic primitives for Sigil.
//!
//! This crate provides the low-level operations the envelope format is built on:
//! - Authenticated symmetric encryption (AES-256-GCM)
//! - Password-based key derivation (PBKDF2-HMAC-SHA256)
//! - Key material with automatic zeroization and a text form
//! - Secure random generation
//!
//! Every fixed size and cost parameter lives in [`params`] so the cipher and
//! the deriver agree by construction.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aead;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod params;
pub mod random;

pub use error::CryptoError;
pub use keys::SymmetricKey;
