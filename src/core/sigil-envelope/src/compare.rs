//! Byte-for-byte file comparison.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SigilError};

const CHUNK_SIZE: usize = 1024 * 1024;

/// Outcome of [`compare_files`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Contents are identical.
    Same,
    /// Contents differ.
    Diff,
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Same => write!(f, "SAME"),
            Self::Diff => write!(f, "DIFF"),
        }
    }
}

/// Compares the complete contents of two files.
///
/// Both paths resolving to the same file is `Same` without reading; different
/// sizes are `Diff` without reading. Otherwise both files are read in chunks.
pub fn compare_files(a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<Comparison> {
    let (a, b) = (a.as_ref(), b.as_ref());

    let canonical_a = fs::canonicalize(a).map_err(|e| SigilError::io(a, e))?;
    let canonical_b = fs::canonicalize(b).map_err(|e| SigilError::io(b, e))?;
    if canonical_a == canonical_b {
        debug!(path = %a.display(), "compare: same path");
        return Ok(Comparison::Same);
    }

    let mut file_a = File::open(a).map_err(|e| SigilError::io(a, e))?;
    let mut file_b = File::open(b).map_err(|e| SigilError::io(b, e))?;

    let len_a = file_a.metadata().map_err(|e| SigilError::io(a, e))?.len();
    let len_b = file_b.metadata().map_err(|e| SigilError::io(b, e))?.len();
    if len_a != len_b {
        debug!(len_a, len_b, "compare: sizes differ");
        return Ok(Comparison::Diff);
    }

    let mut buf_a = vec![0u8; CHUNK_SIZE];
    let mut buf_b = vec![0u8; CHUNK_SIZE];

    loop {
        let n_a = read_full(&mut file_a, &mut buf_a).map_err(|e| SigilError::io(a, e))?;
        let n_b = read_full(&mut file_b, &mut buf_b).map_err(|e| SigilError::io(b, e))?;

        if buf_a[..n_a] != buf_b[..n_b] {
            return Ok(Comparison::Diff);
        }
        if n_a == 0 {
            return Ok(Comparison::Same);
        }
    }
}

/// Fills `buf` as far as the reader allows; returns the bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
