//! Fixed algorithm parameters.
//!
//! Changing any of these breaks every envelope written before the change.

/// Size of an AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Size of a PBKDF2 salt in bytes.
pub const SALT_SIZE: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count.
///
/// Not stored in the envelope, so encrypt and decrypt must use the same value.
pub const PBKDF2_ITERATIONS: u32 = 390_000;

/// Length of a key in its text form (URL-safe base64 with padding).
pub const ENCODED_KEY_LEN: usize = 4 * KEY_SIZE.div_ceil(3);
