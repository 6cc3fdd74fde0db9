//! Random keys, nonces and salts from the OS CSPRNG.

use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::params::{KEY_SIZE, NONCE_SIZE, SALT_SIZE};

fn random_array<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    OsRng.fill_bytes(&mut out);
    out
}

/// Fresh 256-bit key material, wiped on drop.
pub fn generate_key() -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(key.as_mut_slice());
    key
}

/// Fresh 96-bit AES-GCM nonce. Never reuse one under the same key.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    random_array()
}

/// Fresh salt for a single password derivation.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    random_array()
}
