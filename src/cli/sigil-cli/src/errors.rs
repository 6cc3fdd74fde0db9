//! Exit codes for the `sigil` binary.
//!
//! Every failure kind gets its own code so calling scripts can tell a wrong
//! password from a damaged file without parsing messages.

use sigil_envelope::SigilError;

/// Process exit codes.
pub mod exit_codes {
    /// Success, or `SAME` for compare.
    pub const SUCCESS: u8 = 0;
    /// I/O or any other failure.
    pub const FAILURE: u8 = 1;
    /// Bad command line or unusable credential.
    pub const USAGE: u8 = 2;
    /// `DIFF` for compare.
    pub const DIFF: u8 = 3;
    /// Malformed envelope.
    pub const FORMAT: u8 = 4;
    /// Credential kind does not fit the envelope.
    pub const CREDENTIAL_MISMATCH: u8 = 5;
    /// Wrong key or password, or a modified file.
    pub const AUTHENTICATION: u8 = 6;
}

/// Maps an error to the exit code the process should end with.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SigilError>() {
        Some(SigilError::Io { .. }) | Some(SigilError::Crypto(_)) | None => exit_codes::FAILURE,
        Some(SigilError::InvalidCredential(_)) => exit_codes::USAGE,
        Some(SigilError::Format(_)) => exit_codes::FORMAT,
        Some(SigilError::CredentialMismatch(_)) => exit_codes::CREDENTIAL_MISMATCH,
        Some(SigilError::Authentication) => exit_codes::AUTHENTICATION,
    }
}
