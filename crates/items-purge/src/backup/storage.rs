//! File access used by the cleaner.
//!
//! The rotator only needs whole-file reads and writes, renames and
//! removals. [`FsStorage`] is the real file system; [`MemoryStorage`] keeps
//! files in memory and can fail a chosen operation, which is how the
//! crash-safety of the rotation is tested.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Byte source and sink for the target file and its backups.
pub trait Storage {
    /// Reads a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Creates or truncates a file and writes `bytes` durably.
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Renames `from` onto `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Removes a file.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Returns true if a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// The local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)?;
        if let Some(parent) = to.parent() {
            fsync_directory(parent);
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Best-effort directory sync so a rename survives a crash. Not every
/// platform can open a directory; failures are ignored.
fn fsync_directory(path: &Path) {
    let dir = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    if let Ok(dir) = File::open(dir) {
        let _ = dir.sync_all();
    }
}

/// Operations [`MemoryStorage`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Read,
    Write,
    Rename,
    Remove,
}

/// In-memory files with optional fault injection.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    fail: RefCell<Option<(StorageOp, PathBuf)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(path.into(), bytes.into());
    }

    /// Returns a copy of a file's contents.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    /// Returns all file paths in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }

    /// Returns a snapshot of every file.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        self.files.borrow().clone()
    }

    /// Makes the next `op` whose source path is `path` fail once.
    pub fn fail_on(&self, op: StorageOp, path: impl Into<PathBuf>) {
        *self.fail.borrow_mut() = Some((op, path.into()));
    }

    fn check(&self, op: StorageOp, path: &Path) -> io::Result<()> {
        let mut fail = self.fail.borrow_mut();
        if matches!(&*fail, Some((o, p)) if *o == op && p == path) {
            *fail = None;
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected {op:?} failure on {}", path.display()),
            ));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.check(StorageOp::Read, path)?;
        self.get(path).ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.check(StorageOp::Write, path)?;
        self.insert(path, bytes);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check(StorageOp::Rename, from)?;
        let mut files = self.files.borrow_mut();
        let bytes = files.remove(from).ok_or_else(|| not_found(from))?;
        files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.check(StorageOp::Remove, path)?;
        self.files
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
}
