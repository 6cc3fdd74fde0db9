//! Credential classification and key resolution.
//!
//! A user-supplied credential string means one of three things: a literal
//! key, the path of a file holding a key, or a passphrase. It is classified
//! once into a [`Credential`], and every later step matches on that variant.

use std::fs;
use std::path::{Path, PathBuf};

use sigil_crypto::keys::uses_key_alphabet;
use sigil_crypto::params::ENCODED_KEY_LEN;
use sigil_crypto::{kdf, random, SymmetricKey};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::codec::DerivationSpec;
use crate::error::{Result, SigilError};

/// A classified credential.
#[derive(Clone)]
pub enum Credential {
    /// A key given directly in its text form.
    LiteralKey(SymmetricKey),
    /// A key read from a file.
    KeyFile {
        /// Where the key was read from.
        path: PathBuf,
        /// The key the file holds.
        key: SymmetricKey,
    },
    /// Anything else: a passphrase to stretch with PBKDF2.
    Passphrase(Zeroizing<String>),
}

impl Credential {
    /// Classifies a credential string.
    ///
    /// In order: a string that parses as a key is a [`Credential::LiteralKey`]
    /// (no I/O); a string naming an existing regular file is read, and is a
    /// [`Credential::KeyFile`] if the file holds a key; everything else is a
    /// [`Credential::Passphrase`]. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// [`SigilError::InvalidCredential`] for an empty string and
    /// [`SigilError::Io`] for a file that exists but cannot be read.
    pub fn classify(input: &str) -> Result<Self> {
        let value = input.trim();
        if value.is_empty() {
            return Err(SigilError::InvalidCredential("credential is empty".into()));
        }

        if let Ok(key) = SymmetricKey::from_encoded(value) {
            debug!("credential classified as literal key");
            return Ok(Self::LiteralKey(key));
        }

        let path = Path::new(value);
        if path.is_file() {
            return Self::from_key_file(path);
        }

        if looks_like_mistyped_key(value) {
            warn!(
                length = value.len(),
                expected = ENCODED_KEY_LEN,
                "credential resembles a key but does not decode as one; using it as a passphrase"
            );
        }

        debug!("credential classified as passphrase");
        Ok(Self::Passphrase(Zeroizing::new(value.to_string())))
    }

    /// Loads a credential from a file named explicitly as a key file.
    ///
    /// The trimmed content is a [`Credential::KeyFile`] when it parses as a
    /// key and a [`Credential::Passphrase`] otherwise.
    ///
    /// # Errors
    ///
    /// [`SigilError::Io`] when the file is missing or unreadable, and
    /// [`SigilError::InvalidCredential`] when it is empty.
    pub fn from_key_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            Zeroizing::new(fs::read_to_string(path).map_err(|e| SigilError::io(path, e))?);
        let value = content.trim();

        if value.is_empty() {
            return Err(SigilError::InvalidCredential(format!(
                "{} is empty",
                path.display()
            )));
        }

        match SymmetricKey::from_encoded(value) {
            Ok(key) => {
                debug!(path = %path.display(), "credential classified as key file");
                Ok(Self::KeyFile {
                    path: path.to_path_buf(),
                    key,
                })
            },
            Err(_) => {
                warn!(
                    path = %path.display(),
                    "key file does not contain a key; using its content as a passphrase"
                );
                Ok(Self::Passphrase(Zeroizing::new(value.to_string())))
            },
        }
    }

    /// Creates a passphrase credential without classification.
    ///
    /// Used for values that are passphrases by declaration (`--password`),
    /// even when they happen to look like a key.
    pub fn passphrase(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SigilError::InvalidCredential("passphrase is empty".into()));
        }
        Ok(Self::Passphrase(Zeroizing::new(value.to_string())))
    }

    /// Creates a passphrase credential from a `--password` value.
    ///
    /// A value naming an existing regular file is replaced by the file's
    /// trimmed content. Either way the result is a passphrase; it is never
    /// classified as a key.
    ///
    /// # Errors
    ///
    /// [`SigilError::Io`] for a file that exists but cannot be read, and
    /// [`SigilError::InvalidCredential`] for an empty value or file.
    pub fn password(value: &str) -> Result<Self> {
        let value = value.trim();
        let path = Path::new(value);
        if value.is_empty() || !path.is_file() {
            return Self::passphrase(value);
        }

        let content =
            Zeroizing::new(fs::read_to_string(path).map_err(|e| SigilError::io(path, e))?);
        if content.trim().is_empty() {
            return Err(SigilError::InvalidCredential(format!(
                "{} is empty",
                path.display()
            )));
        }

        debug!(path = %path.display(), "password read from file");
        Self::passphrase(&content)
    }

    /// Short name of the variant, safe to log.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::LiteralKey(_) => "literal-key",
            Self::KeyFile { .. } => "key-file",
            Self::Passphrase(_) => "passphrase",
        }
    }

    /// Produces the key and derivation metadata for a new envelope.
    ///
    /// Keys are used as-is. A passphrase gets a fresh random salt and is
    /// stretched with PBKDF2-HMAC-SHA256.
    pub fn resolve_for_encrypt(&self) -> Result<(SymmetricKey, DerivationSpec)> {
        match self {
            Self::LiteralKey(key) | Self::KeyFile { key, .. } => {
                Ok((key.clone(), DerivationSpec::None))
            },
            Self::Passphrase(passphrase) => {
                let salt = random::generate_salt();
                let key = kdf::derive_key(passphrase, &salt)?;
                Ok((key, DerivationSpec::Pbkdf2Sha256 { salt }))
            },
        }
    }

    /// Rebuilds the key for an existing envelope.
    ///
    /// # Errors
    ///
    /// [`SigilError::CredentialMismatch`] when a passphrase is given for a
    /// key-encrypted envelope or a key for a passphrase-encrypted one.
    pub fn resolve_for_decrypt(&self, derivation: &DerivationSpec) -> Result<SymmetricKey> {
        match (self, derivation) {
            (Self::LiteralKey(key) | Self::KeyFile { key, .. }, DerivationSpec::None) => {
                Ok(key.clone())
            },
            (Self::Passphrase(passphrase), DerivationSpec::Pbkdf2Sha256 { salt }) => {
                Ok(kdf::derive_key(passphrase, salt)?)
            },
            (Self::Passphrase(_), DerivationSpec::None) => Err(SigilError::CredentialMismatch(
                "this file was encrypted with a key; decrypt it with --key or --key-file".into(),
            )),
            (_, DerivationSpec::Pbkdf2Sha256 { .. }) => Err(SigilError::CredentialMismatch(
                "this file was encrypted with a password; decrypt it with --password".into(),
            )),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LiteralKey(_) => f.debug_tuple("LiteralKey").field(&"[REDACTED]").finish(),
            Self::KeyFile { path, .. } => f
                .debug_struct("KeyFile")
                .field("path", path)
                .field("key", &"[REDACTED]")
                .finish(),
            Self::Passphrase(_) => f.debug_tuple("Passphrase").field(&"[REDACTED]").finish(),
        }
    }
}

/// Key alphabet only, and within a few characters of a key's length.
fn looks_like_mistyped_key(value: &str) -> bool {
    value.len().abs_diff(ENCODED_KEY_LEN) <= 4 && uses_key_alphabet(value)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use sigil_crypto::params::SALT_SIZE;
    use tempfile::TempDir;

    fn literal(key: &SymmetricKey) -> String {
        key.to_encoded().to_string()
    }

    #[test]
    fn test_classify_literal_key() {
        let key = SymmetricKey::generate();
        let credential = Credential::classify(&format!("  {}\n", literal(&key))).unwrap();

        match credential {
            Credential::LiteralKey(parsed) => assert_eq!(parsed.as_bytes(), key.as_bytes()),
            other => panic!("expected literal key, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_key_file() {
        let tmp = TempDir::new().unwrap();
        let key = SymmetricKey::generate();
        let path = tmp.path().join("sigil.key");
        fs::write(&path, format!("{}\n", literal(&key))).unwrap();

        let credential = Credential::classify(path.to_str().unwrap()).unwrap();

        match credential {
            Credential::KeyFile { path: p, key: parsed } => {
                assert_eq!(p, path);
                assert_eq!(parsed.as_bytes(), key.as_bytes());
            },
            other => panic!("expected key file, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_file_without_key_is_passphrase() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("secret.txt");
        fs::write(&path, "  correct horse \n").unwrap();

        let credential = Credential::classify(path.to_str().unwrap()).unwrap();

        match credential {
            Credential::Passphrase(p) => assert_eq!(p.as_str(), "correct horse"),
            other => panic!("expected passphrase, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_passphrase_fallback() {
        for input in [
            "correct horse",
            "short",
            // One character short of a key.
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            // Non-canonical trailing bits.
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAB=",
            "/definitely/not/an/existing/file",
        ] {
            let credential = Credential::classify(input).unwrap();
            assert_eq!(credential.kind_name(), "passphrase", "input {:?}", input);
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let key = literal(&SymmetricKey::generate());
        for input in [key.as_str(), "correct horse"] {
            let a = Credential::classify(input).unwrap();
            let b = Credential::classify(input).unwrap();
            assert_eq!(a.kind_name(), b.kind_name());
        }
    }

    #[test]
    fn test_classify_empty_fails() {
        assert!(matches!(
            Credential::classify("   "),
            Err(SigilError::InvalidCredential(_))
        ));
        assert!(matches!(
            Credential::passphrase(""),
            Err(SigilError::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_from_key_file_missing_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = Credential::from_key_file(tmp.path().join("missing.key"));
        assert!(matches!(result, Err(SigilError::Io { .. })));
    }

    #[test]
    fn test_passphrase_is_never_classified() {
        let key = literal(&SymmetricKey::generate());
        let credential = Credential::passphrase(&key).unwrap();
        assert_eq!(credential.kind_name(), "passphrase");
    }

    #[test]
    fn test_password_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("password.txt");
        fs::write(&path, "  correct horse\n").unwrap();

        match Credential::password(path.to_str().unwrap()).unwrap() {
            Credential::Passphrase(p) => assert_eq!(p.as_str(), "correct horse"),
            other => panic!("expected passphrase, got {:?}", other),
        }
    }

    #[test]
    fn test_password_file_holding_key_stays_passphrase() {
        let tmp = TempDir::new().unwrap();
        let key = literal(&SymmetricKey::generate());
        let path = tmp.path().join("password.txt");
        fs::write(&path, &key).unwrap();

        match Credential::password(path.to_str().unwrap()).unwrap() {
            Credential::Passphrase(p) => assert_eq!(p.as_str(), key),
            other => panic!("expected passphrase, got {:?}", other),
        }
    }

    #[test]
    fn test_password_literal_and_empty() {
        match Credential::password(" correct horse ").unwrap() {
            Credential::Passphrase(p) => assert_eq!(p.as_str(), "correct horse"),
            other => panic!("expected passphrase, got {:?}", other),
        }

        let tmp = TempDir::new().unwrap();
        let empty = tmp.path().join("empty.txt");
        fs::write(&empty, " \n").unwrap();

        assert!(matches!(
            Credential::password(""),
            Err(SigilError::InvalidCredential(_))
        ));
        assert!(matches!(
            Credential::password(empty.to_str().unwrap()),
            Err(SigilError::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_resolve_literal_key_for_encrypt() {
        let key = SymmetricKey::generate();
        let credential = Credential::LiteralKey(key.clone());

        let (resolved, spec) = credential.resolve_for_encrypt().unwrap();

        assert_eq!(resolved.as_bytes(), key.as_bytes());
        assert_eq!(spec, DerivationSpec::None);
    }

    #[test]
    fn test_resolve_passphrase_roundtrip() {
        let credential = Credential::passphrase("correct horse").unwrap();

        let (key, spec) = credential.resolve_for_encrypt().unwrap();
        let salt = *spec.salt().unwrap();
        assert_eq!(salt.len(), SALT_SIZE);

        let again = credential.resolve_for_decrypt(&spec).unwrap();
        assert_eq!(key.as_bytes(), again.as_bytes());
    }

    #[test]
    fn test_resolve_passphrase_uses_fresh_salt() {
        let credential = Credential::passphrase("correct horse").unwrap();

        let (key1, spec1) = credential.resolve_for_encrypt().unwrap();
        let (key2, spec2) = credential.resolve_for_encrypt().unwrap();

        assert_ne!(spec1, spec2);
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_resolve_for_decrypt_mismatch() {
        let key = Credential::LiteralKey(SymmetricKey::generate());
        let passphrase = Credential::passphrase("correct horse").unwrap();
        let salted = DerivationSpec::Pbkdf2Sha256 { salt: [0u8; SALT_SIZE] };

        assert!(matches!(
            passphrase.resolve_for_decrypt(&DerivationSpec::None),
            Err(SigilError::CredentialMismatch(_))
        ));
        assert!(matches!(
            key.resolve_for_decrypt(&salted),
            Err(SigilError::CredentialMismatch(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let passphrase = Credential::passphrase("hunter2").unwrap();
        let debug_str = format!("{:?}", passphrase);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_looks_like_mistyped_key() {
        assert!(looks_like_mistyped_key(
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
        ));
        assert!(!looks_like_mistyped_key("correct horse"));
        assert!(!looks_like_mistyped_key("short"));
    }
}
