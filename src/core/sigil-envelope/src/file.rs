//! Whole-file encryption and decryption.
//!
//! Inputs are read fully into memory. Outputs go through
//! [`crate::fs::write_atomic`], so a failed operation never leaves a partial
//! or corrupt output file behind.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use sigil_crypto::aead;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::codec::Envelope;
use crate::credential::Credential;
use crate::error::Result;
use crate::fs::{read_file, write_atomic};

/// Suffix appended to encrypted output by default.
pub const ENCRYPTED_SUFFIX: &str = ".enc";

/// Suffix used for decrypted output by default.
pub const DECRYPTED_SUFFIX: &str = ".dec";

const ENCRYPTED_EXTENSION: &str = "enc";
const DECRYPTED_EXTENSION: &str = "dec";

/// Direction of a file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Plaintext to envelope.
    Encrypt,
    /// Envelope to plaintext.
    Decrypt,
}

/// Output path used when none is given.
///
/// Encrypting appends `.enc`. Decrypting replaces a trailing `.enc` with
/// `.dec`, or appends `.dec` when there is none.
pub fn default_output_path(input: &Path, mode: Mode) -> PathBuf {
    match mode {
        Mode::Encrypt => with_suffix(input, ENCRYPTED_SUFFIX),
        Mode::Decrypt if input.extension() == Some(OsStr::new(ENCRYPTED_EXTENSION)) => {
            input.with_extension(DECRYPTED_EXTENSION)
        },
        Mode::Decrypt => with_suffix(input, DECRYPTED_SUFFIX),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Encrypts bytes into an envelope.
pub fn seal(plaintext: &[u8], credential: &Credential) -> Result<Envelope> {
    let (key, derivation) = credential.resolve_for_encrypt()?;
    let token = aead::encrypt(&key, plaintext)?;
    drop(key);

    debug!(
        credential = credential.kind_name(),
        kdf = %derivation.kind(),
        plaintext_bytes = plaintext.len(),
        "sealed envelope"
    );

    Ok(Envelope::new(derivation, &token))
}

/// Decrypts an envelope.
///
/// # Errors
///
/// [`crate::SigilError::CredentialMismatch`] when the credential kind does
/// not fit the envelope, [`crate::SigilError::Authentication`] for a wrong
/// key or password or a modified token, including one that no longer decodes.
pub fn open(envelope: &Envelope, credential: &Credential) -> Result<Zeroizing<Vec<u8>>> {
    let key = credential.resolve_for_decrypt(&envelope.derivation)?;
    let token = envelope.token_bytes()?;
    let plaintext = aead::decrypt(&key, &token)?;

    debug!(
        credential = credential.kind_name(),
        kdf = %envelope.derivation.kind(),
        plaintext_bytes = plaintext.len(),
        "opened envelope"
    );

    Ok(plaintext)
}

/// Encrypts the file at `input` into an envelope file at `output`.
pub fn encrypt_file(input: &Path, output: &Path, credential: &Credential) -> Result<()> {
    let plaintext = Zeroizing::new(read_file(input)?);
    let envelope = seal(&plaintext, credential)?;

    write_atomic(output, envelope.to_text().as_bytes())?;

    info!(
        input = %input.display(),
        output = %output.display(),
        kdf = %envelope.derivation.kind(),
        "file encrypted"
    );
    Ok(())
}

/// Decrypts the envelope file at `input` into `output`.
///
/// The envelope is parsed and validated before any key is derived.
pub fn decrypt_file(input: &Path, output: &Path, credential: &Credential) -> Result<()> {
    let data = read_file(input)?;
    let envelope = Envelope::from_bytes(&data)?;
    let plaintext = open(&envelope, credential)?;

    write_atomic(output, &plaintext)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        kdf = %envelope.derivation.kind(),
        "file decrypted"
    );
    Ok(())
}
