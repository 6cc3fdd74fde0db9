//! # Sigil Envelope
//!
//! File-level encryption on top of `sigil-crypto`.
//!
//! ## Data flow
//!
//! Encrypting: credential string → [`Credential::classify`] →
//! [`Credential::resolve_for_encrypt`] → AES-256-GCM → [`Envelope`] → text
//! written atomically.
//!
//! Decrypting: text → [`Envelope::from_text`] (all validation happens here) →
//! [`Credential::resolve_for_decrypt`] → AES-256-GCM → plaintext written
//! atomically, or [`SigilError::Authentication`] and no output at all.
//!
//! ## Envelope Format
//!
//! See [`codec`]. Envelopes carry the derivation kind and salt, never the key.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod compare;
pub mod credential;
pub mod error;
pub mod file;
pub mod fs;

pub use codec::{DerivationKind, DerivationSpec, Envelope, EnvelopeSummary};
pub use compare::{compare_files, Comparison};
pub use credential::Credential;
pub use error::{Result, SigilError};
pub use file::{decrypt_file, default_output_path, encrypt_file, open, seal, Mode};
