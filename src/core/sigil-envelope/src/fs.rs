//! Filesystem helpers with all-or-nothing writes.
//!
//! Output is written to a temporary sibling file, synced, then renamed over
//! the destination. A failure at any step removes the temporary file and
//! leaves the destination as it was.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SigilError};

/// Reads a whole file into memory.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| SigilError::io(path, e))
}

/// Writes `data` to `path` atomically, creating parent directories.
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    write_with(path.as_ref(), data, false)
}

/// Like [`write_atomic`], but the file is readable by its owner only (Unix).
pub fn write_secret_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    write_with(path.as_ref(), data, true)
}

fn write_with(path: &Path, data: &[u8], private: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SigilError::io(parent, e))?;
    }

    let temp_path = temp_path_for(path);

    let written = write_temp(&temp_path, data, private)
        .and_then(|()| rename_with_fallback(&temp_path, path));

    written.map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        SigilError::io(path, e)
    })
}

fn write_temp(temp_path: &Path, data: &[u8], private: bool) -> io::Result<()> {
    let mut file = File::create(temp_path)?;

    if private {
        set_owner_only(temp_path)?;
    }

    file.write_all(data)?;
    file.flush()?;
    // Sync to disk before rename
    file.sync_all()
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Temporary sibling of `path`, hidden and tagged with the process id.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

/// Renames `temp_path` over `destination`.
///
/// On platforms where rename fails if the destination exists, the
/// destination is removed and the rename retried.
fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        if !destination.exists() {
            return Err(initial_err);
        }
        fs::remove_file(destination)?;
        fs::rename(temp_path, destination).map_err(|retry_err| {
            io::Error::new(
                retry_err.kind(),
                format!(
                    "rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}
