//! Envelope text format.
//!
//! An envelope couples an authenticated-ciphertext token with what is needed
//! to rebuild the key: the derivation kind and, for passphrases, the salt.
//!
//! ```text
//! SIGIL1
//! kdf=pbkdf2-sha256
//! salt=<base64url, empty when kdf=none>
//! token=<base64url>
//! ```
//!
//! Every field is URL-safe base64 or a fixed tag, so the file is plain ASCII,
//! diffs cleanly, and survives copy and paste. Header, kdf and salt are
//! validated here and a damaged one never reaches the cipher. The token is
//! kept as opaque text: only the cipher can tell a damaged token from a
//! wrong key, so both surface as [`SigilError::Authentication`].

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE, Engine};
use serde::Serialize;
use sigil_crypto::params::{NONCE_SIZE, PBKDF2_ITERATIONS, SALT_SIZE, TAG_SIZE};

use crate::error::{Result, SigilError};

/// First line of every envelope.
pub const FORMAT_HEADER: &str = "SIGIL1";

const FIELD_KDF: &str = "kdf";
const FIELD_SALT: &str = "salt";
const FIELD_TOKEN: &str = "token";

// ============================================================================
// Types
// ============================================================================

/// How the key for an envelope is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DerivationKind {
    /// The key is used as-is.
    None,
    /// The key is derived from a passphrase with PBKDF2-HMAC-SHA256.
    Pbkdf2Sha256,
}

impl fmt::Display for DerivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Pbkdf2Sha256 => write!(f, "pbkdf2-sha256"),
        }
    }
}

impl FromStr for DerivationKind {
    type Err = SigilError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "pbkdf2-sha256" => Ok(Self::Pbkdf2Sha256),
            _ => Err(SigilError::Format(format!("unknown kdf '{}'", s))),
        }
    }
}

/// Derivation metadata stored in an envelope.
///
/// A salt exists exactly when the kind is PBKDF2, so a salt-less PBKDF2 spec
/// or a salted `None` spec cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivationSpec {
    /// Literal key, nothing to derive.
    None,
    /// Passphrase stretched with the given salt.
    Pbkdf2Sha256 {
        /// Random salt drawn at encryption time.
        salt: [u8; SALT_SIZE],
    },
}

impl DerivationSpec {
    /// Returns the derivation kind tag.
    pub fn kind(&self) -> DerivationKind {
        match self {
            Self::None => DerivationKind::None,
            Self::Pbkdf2Sha256 { .. } => DerivationKind::Pbkdf2Sha256,
        }
    }

    /// Returns the salt, if this kind carries one.
    pub fn salt(&self) -> Option<&[u8; SALT_SIZE]> {
        match self {
            Self::None => None,
            Self::Pbkdf2Sha256 { salt } => Some(salt),
        }
    }
}

/// A serialized unit of derivation metadata plus ciphertext token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// How to obtain the key.
    pub derivation: DerivationSpec,
    /// Authenticated ciphertext in its encoded text form, exactly as stored.
    pub token: String,
}

/// Metadata view of an envelope, shown by `sigil inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeSummary {
    /// Format header.
    pub format: &'static str,
    /// Derivation kind.
    pub kdf: DerivationKind,
    /// Encoded salt, when present.
    pub salt: Option<String>,
    /// PBKDF2 iteration count, when a passphrase is involved.
    pub iterations: Option<u32>,
    /// Size of the decoded token; `None` when the token does not decode.
    pub token_bytes: Option<usize>,
    /// Size of the encrypted payload, without nonce and tag.
    pub ciphertext_bytes: Option<usize>,
}

impl Envelope {
    /// Creates an envelope around a raw cipher token.
    pub fn new(derivation: DerivationSpec, token: &[u8]) -> Self {
        Self {
            derivation,
            token: URL_SAFE.encode(token),
        }
    }

    /// Decodes the token for the cipher.
    ///
    /// # Errors
    ///
    /// [`SigilError::Authentication`] when the text is not valid base64; a
    /// token damaged in transit is indistinguishable from one the cipher
    /// rejects.
    pub fn token_bytes(&self) -> Result<Vec<u8>> {
        URL_SAFE
            .decode(&self.token)
            .map_err(|_| SigilError::Authentication)
    }

    /// Serializes this envelope; see [`serialize`].
    pub fn to_text(&self) -> String {
        serialize(self)
    }

    /// Parses an envelope; see [`deserialize`].
    pub fn from_text(text: &str) -> Result<Self> {
        deserialize(text)
    }

    /// Parses an envelope from raw file content.
    ///
    /// Invalid UTF-8 is replaced rather than rejected: in the header or a
    /// metadata field it still fails as [`SigilError::Format`], in the token
    /// it fails authentication.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        deserialize(&String::from_utf8_lossy(data))
    }

    /// Returns a metadata view of this envelope.
    pub fn summary(&self) -> EnvelopeSummary {
        let kdf = self.derivation.kind();
        let token_bytes = self.token_bytes().ok().map(|t| t.len());
        EnvelopeSummary {
            format: FORMAT_HEADER,
            kdf,
            salt: self.derivation.salt().map(|s| URL_SAFE.encode(s)),
            iterations: match kdf {
                DerivationKind::None => None,
                DerivationKind::Pbkdf2Sha256 => Some(PBKDF2_ITERATIONS),
            },
            token_bytes,
            ciphertext_bytes: token_bytes.map(|n| n.saturating_sub(NONCE_SIZE + TAG_SIZE)),
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Serializes an envelope to its text form, ending with a newline.
pub fn serialize(envelope: &Envelope) -> String {
    let salt = envelope
        .derivation
        .salt()
        .map(|s| URL_SAFE.encode(s))
        .unwrap_or_default();

    format!(
        "{}\n{}={}\n{}={}\n{}={}\n",
        FORMAT_HEADER,
        FIELD_KDF,
        envelope.derivation.kind(),
        FIELD_SALT,
        salt,
        FIELD_TOKEN,
        envelope.token,
    )
}

/// Parses the text form of an envelope.
///
/// Blank lines and whitespace around keys and values are ignored, and the
/// three fields may come in any order. Anything else unexpected is a
/// [`SigilError::Format`]: a missing header, an unknown, duplicated or
/// missing field, an unknown kdf, a salt that is present for `none`, absent
/// for `pbkdf2-sha256` or not valid base64, or an empty token.
///
/// The token is not decoded. Lines following the token that do not start
/// another field are kept as part of it, so a line break inside a damaged
/// token fails authentication instead of parsing.
pub fn deserialize(text: &str) -> Result<Envelope> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    match lines.next() {
        Some((_, FORMAT_HEADER)) => {},
        _ => {
            return Err(SigilError::Format(format!(
                "not a {} envelope (bad header)",
                FORMAT_HEADER
            )))
        },
    }

    let mut kdf = None;
    let mut salt = None;
    let mut token: Option<String> = None;
    let mut in_token = false;

    for (number, line) in lines {
        let field = line.split_once('=').map(|(k, v)| (k.trim(), v.trim()));

        if in_token && !matches!(field, Some((FIELD_KDF | FIELD_SALT | FIELD_TOKEN, _))) {
            if let Some(token) = token.as_mut() {
                token.push('\n');
                token.push_str(line);
            }
            continue;
        }
        in_token = false;

        let (key, value) = field.ok_or_else(|| {
            SigilError::Format(format!("line {} is not a key=value pair", number))
        })?;

        match key {
            FIELD_KDF => set_once(&mut kdf, value, key, number)?,
            FIELD_SALT => set_once(&mut salt, value, key, number)?,
            FIELD_TOKEN => {
                set_once(&mut token, value.to_string(), key, number)?;
                in_token = true;
            },
            other => {
                return Err(SigilError::Format(format!(
                    "unknown field '{}' on line {}",
                    other, number
                )))
            },
        }
    }

    let kdf = kdf.ok_or_else(|| missing(FIELD_KDF))?;
    let salt = salt.ok_or_else(|| missing(FIELD_SALT))?;
    let token = token.ok_or_else(|| missing(FIELD_TOKEN))?;

    let derivation = match kdf.parse::<DerivationKind>()? {
        DerivationKind::None => {
            if !salt.is_empty() {
                return Err(SigilError::Format("kdf 'none' must not carry a salt".into()));
            }
            DerivationSpec::None
        },
        DerivationKind::Pbkdf2Sha256 => {
            if salt.is_empty() {
                return Err(SigilError::Format(
                    "kdf 'pbkdf2-sha256' requires a salt".into(),
                ));
            }
            let bytes = decode_field(FIELD_SALT, salt)?;
            let salt: [u8; SALT_SIZE] = bytes.as_slice().try_into().map_err(|_| {
                SigilError::Format(format!(
                    "salt must be {} bytes, got {}",
                    SALT_SIZE,
                    bytes.len()
                ))
            })?;
            DerivationSpec::Pbkdf2Sha256 { salt }
        },
    };

    if token.is_empty() {
        return Err(SigilError::Format("token is empty".into()));
    }

    Ok(Envelope { derivation, token })
}

fn set_once<T>(slot: &mut Option<T>, value: T, key: &str, number: usize) -> Result<()> {
    if slot.replace(value).is_some() {
        return Err(SigilError::Format(format!(
            "duplicate field '{}' on line {}",
            key, number
        )));
    }
    Ok(())
}

fn missing(field: &str) -> SigilError {
    SigilError::Format(format!("missing field '{}'", field))
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>> {
    URL_SAFE
        .decode(value)
        .map_err(|e| SigilError::Format(format!("field '{}' is not valid base64: {}", field, e)))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn pbkdf2_envelope() -> Envelope {
        Envelope::new(
            DerivationSpec::Pbkdf2Sha256 { salt: [9u8; SALT_SIZE] },
            b"0123456789abcdefghijklmnopqrstuvwxyz",
        )
    }

    fn none_envelope() -> Envelope {
        Envelope::new(DerivationSpec::None, &[0xFF, 0x00, 0x7F, 0x80])
    }

    fn assert_format_error(text: &str) {
        let result = deserialize(text);
        assert!(
            matches!(result, Err(SigilError::Format(_))),
            "expected format error for {:?}, got {:?}",
            text,
            result
        );
    }

    #[test]
    fn test_roundtrip_both_kinds() {
        for envelope in [none_envelope(), pbkdf2_envelope()] {
            let text = serialize(&envelope);
            assert_eq!(deserialize(&text).unwrap(), envelope);
        }
    }

    #[test]
    fn test_serialized_layout() {
        let text = none_envelope().to_text();
        assert_eq!(text, "SIGIL1\nkdf=none\nsalt=\ntoken=_wB_gA==\n");

        let text = pbkdf2_envelope().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "SIGIL1");
        assert_eq!(lines[1], "kdf=pbkdf2-sha256");
        assert_eq!(lines[2], "salt=CQkJCQkJCQkJCQkJCQkJCQ==");
        assert!(lines[3].starts_with("token="));
    }

    #[test]
    fn test_serialized_text_is_plain_ascii() {
        let text = pbkdf2_envelope().to_text();
        assert!(text
            .bytes()
            .all(|b| b == b'\n' || (b.is_ascii() && !b.is_ascii_control())));
    }

    #[test]
    fn test_tolerates_whitespace_crlf_and_order() {
        let text = "\r\n  SIGIL1 \r\ntoken = _wB_gA== \r\n\r\nsalt=\r\n kdf=none\r\n";
        assert_eq!(deserialize(text).unwrap(), none_envelope());
    }

    #[test]
    fn test_rejects_bad_header() {
        assert_format_error("");
        assert_format_error("SIGIL2\nkdf=none\nsalt=\ntoken=_wB_gA==\n");
        assert_format_error("kdf=none\nsalt=\ntoken=_wB_gA==\n");
    }

    #[test]
    fn test_rejects_missing_fields() {
        assert_format_error("SIGIL1\n");
        assert_format_error("SIGIL1\nsalt=\ntoken=_wB_gA==\n");
        assert_format_error("SIGIL1\nkdf=none\ntoken=_wB_gA==\n");
        assert_format_error("SIGIL1\nkdf=none\nsalt=\n");
    }

    #[test]
    fn test_rejects_truncated_file() {
        let text = pbkdf2_envelope().to_text();
        let cut = text.find("token=").unwrap();
        assert_format_error(&text[..cut]);
        assert_format_error(&text[..cut + "token=".len()]);
    }

    #[test]
    fn test_rejects_unknown_kdf() {
        assert_format_error("SIGIL1\nkdf=argon2id\nsalt=\ntoken=_wB_gA==\n");
        assert!(matches!(
            "scrypt".parse::<DerivationKind>(),
            Err(SigilError::Format(_))
        ));
    }

    #[test]
    fn test_rejects_salt_presence_mismatch() {
        assert_format_error("SIGIL1\nkdf=none\nsalt=CQkJCQkJCQkJCQkJCQkJCQ==\ntoken=_wB_gA==\n");
        assert_format_error("SIGIL1\nkdf=pbkdf2-sha256\nsalt=\ntoken=_wB_gA==\n");
    }

    #[test]
    fn test_rejects_wrong_salt_length() {
        assert_format_error("SIGIL1\nkdf=pbkdf2-sha256\nsalt=CQkJCQ==\ntoken=_wB_gA==\n");
    }

    #[test]
    fn test_rejects_empty_token() {
        assert_format_error("SIGIL1\nkdf=none\nsalt=\ntoken=\n");
        assert_format_error("SIGIL1\nkdf=none\nsalt=\ntoken=  \n");
    }

    #[test]
    fn test_undecodable_token_fails_authentication() {
        for token in ["not base64!", "/wB/gA==", "_wB_gB=="] {
            let text = format!("SIGIL1\nkdf=none\nsalt=\ntoken={}\n", token);
            let envelope = deserialize(&text).unwrap();

            assert_eq!(envelope.token, token);
            assert!(
                matches!(envelope.token_bytes(), Err(SigilError::Authentication)),
                "token {:?} decoded",
                token
            );
        }
    }

    #[test]
    fn test_lines_after_token_belong_to_token() {
        let envelope = deserialize("SIGIL1\nkdf=none\nsalt=\ntoken=_wB\n_gA==\n").unwrap();
        assert_eq!(envelope.token, "_wB\n_gA==");
        assert!(matches!(envelope.token_bytes(), Err(SigilError::Authentication)));

        // A known field ends the token.
        let envelope = deserialize("SIGIL1\ntoken=_wB_gA==\nkdf=none\nsalt=\n").unwrap();
        assert_eq!(envelope, none_envelope());
        assert_format_error("SIGIL1\ntoken=_wB_gA==\nkdf=none\ngarbage\nsalt=\n");
    }

    #[test]
    fn test_rejects_unknown_duplicate_and_garbage_lines() {
        assert_format_error("SIGIL1\nnote=hi\nkdf=none\nsalt=\ntoken=_wB_gA==\n");
        assert_format_error("SIGIL1\nkdf=none\nkdf=none\nsalt=\ntoken=_wB_gA==\n");
        assert_format_error("SIGIL1\nkdf=none\ngarbage\nsalt=\ntoken=_wB_gA==\n");
        assert_format_error("SIGIL1\nkdf=none\nsalt=\ntoken=_wB_gA==\ntoken=_wB_gA==\n");
    }

    #[test]
    fn test_from_bytes_with_non_utf8() {
        let result = Envelope::from_bytes(&[0xFF, 0xFE, 0x00]);
        assert!(matches!(result, Err(SigilError::Format(_))));

        let result = Envelope::from_bytes(b"SIGIL1\nkdf=n\xFFne\nsalt=\ntoken=_wB_gA==\n");
        assert!(matches!(result, Err(SigilError::Format(_))));

        let envelope = Envelope::from_bytes(b"SIGIL1\nkdf=none\nsalt=\ntoken=_wB\xFFgA==\n").unwrap();
        assert!(matches!(envelope.token_bytes(), Err(SigilError::Authentication)));
    }

    #[test]
    fn test_derivation_spec_accessors() {
        assert_eq!(DerivationSpec::None.kind(), DerivationKind::None);
        assert!(DerivationSpec::None.salt().is_none());

        let spec = DerivationSpec::Pbkdf2Sha256 { salt: [1u8; SALT_SIZE] };
        assert_eq!(spec.kind(), DerivationKind::Pbkdf2Sha256);
        assert_eq!(spec.salt(), Some(&[1u8; SALT_SIZE]));
    }

    #[test]
    fn test_summary() {
        let summary = pbkdf2_envelope().summary();
        assert_eq!(summary.format, FORMAT_HEADER);
        assert_eq!(summary.kdf, DerivationKind::Pbkdf2Sha256);
        assert_eq!(summary.salt.as_deref(), Some("CQkJCQkJCQkJCQkJCQkJCQ=="));
        assert_eq!(summary.iterations, Some(PBKDF2_ITERATIONS));
        assert_eq!(summary.token_bytes, Some(36));
        assert_eq!(summary.ciphertext_bytes, Some(36 - NONCE_SIZE - TAG_SIZE));

        let json = serde_json::to_value(none_envelope().summary()).unwrap();
        assert_eq!(json["kdf"], "none");
        assert!(json["salt"].is_null());
        assert!(json["iterations"].is_null());
        assert_eq!(json["token_bytes"], 4);
        assert_eq!(json["ciphertext_bytes"], 0);

        let damaged = Envelope {
            derivation: DerivationSpec::None,
            token: "not base64!".into(),
        };
        assert_eq!(damaged.summary().token_bytes, None);
        assert_eq!(damaged.summary().ciphertext_bytes, None);
    }
}
