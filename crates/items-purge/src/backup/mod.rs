//! Backup rotation and atomic replacement of the target file.
//!
//! Backups live beside the target as `<stem><NN>.<ext>`, slot `00` being the
//! newest. A run shifts every slot up by one, drops the oldest, moves the
//! current target into slot `00`, and renames the new content into place.
//!
//! The new content is written to `<target>.tmp` before any slot moves, so a
//! failing write (full disk, permissions) changes nothing. After that only
//! renames and the removal of the oldest slot happen; the pre-run content
//! is never truncated. Between moving the target into slot `00` and renaming
//! the temporary file onto it, the target is briefly absent while the
//! original sits safely in slot `00`.

pub mod storage;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub use storage::{FsStorage, MemoryStorage, Storage, StorageOp};

use crate::error::CleanError;
use crate::limits::TEMP_SUFFIX;

/// Returns the path of backup `slot` for `target`.
///
/// `items.txt` becomes `items00.txt`, `items01.txt`, ...; a target without
/// an extension just gets the number appended.
pub fn backup_path(target: &Path, slot: usize) -> PathBuf {
    let stem = target.file_stem().unwrap_or_default();
    let mut name = OsString::from(stem);
    name.push(format!("{slot:02}"));
    if let Some(ext) = target.extension() {
        name.push(".");
        name.push(ext);
    }
    target.with_file_name(name)
}

/// Returns the temporary path written before the final rename.
pub fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(TEMP_SUFFIX);
    target.with_file_name(name)
}

/// Result of a rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    /// Backup holding the content the target had before this run.
    pub newest: PathBuf,
    /// Oldest backup deleted to stay within the retention bound.
    pub dropped: Option<PathBuf>,
}

/// Rotates backups of `target` and replaces it with `new_bytes`.
///
/// Keeps at most `max_backups` slots (values below 1 are treated as 1).
pub fn rotate_and_write<S: Storage + ?Sized>(
    storage: &S,
    target: &Path,
    new_bytes: &[u8],
    max_backups: usize,
) -> Result<Rotation, CleanError> {
    let max_backups = max_backups.max(1);

    if !storage.exists(target) {
        return Err(CleanError::io(
            "find",
            target,
            std::io::Error::new(std::io::ErrorKind::NotFound, "target file does not exist"),
        ));
    }

    let temp = temp_path(target);
    if let Err(e) = storage.write(&temp, new_bytes) {
        discard_temp(storage, &temp);
        return Err(CleanError::io("write", temp, e));
    }

    let rotation = match rotate(storage, target, max_backups) {
        Ok(rotation) => rotation,
        Err(e) => {
            discard_temp(storage, &temp);
            return Err(e);
        }
    };

    storage
        .rename(&temp, target)
        .map_err(|e| CleanError::io("rename", &temp, e))?;
    log::debug!("replaced {}", target.display());

    Ok(rotation)
}

/// Shifts every slot up by one and moves the target into slot 0.
fn rotate<S: Storage + ?Sized>(
    storage: &S,
    target: &Path,
    max_backups: usize,
) -> Result<Rotation, CleanError> {
    let oldest = backup_path(target, max_backups - 1);
    let dropped = if storage.exists(&oldest) {
        storage
            .remove(&oldest)
            .map_err(|e| CleanError::io("remove", &oldest, e))?;
        log::debug!("dropped {}", oldest.display());
        Some(oldest)
    } else {
        None
    };

    for slot in (0..max_backups - 1).rev() {
        let from = backup_path(target, slot);
        if storage.exists(&from) {
            let to = backup_path(target, slot + 1);
            storage
                .rename(&from, &to)
                .map_err(|e| CleanError::io("rename", &from, e))?;
            log::debug!("moved {} -> {}", from.display(), to.display());
        }
    }

    let newest = backup_path(target, 0);
    storage
        .rename(target, &newest)
        .map_err(|e| CleanError::io("rename", target, e))?;

    Ok(Rotation { newest, dropped })
}

fn discard_temp<S: Storage + ?Sized>(storage: &S, temp: &Path) {
    if storage.exists(temp) {
        if let Err(e) = storage.remove(temp) {
            log::warn!("could not remove {}: {e}", temp.display());
        }
    }
}
