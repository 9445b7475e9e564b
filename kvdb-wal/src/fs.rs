//! Filesystem facade the WAL writes and reads through.
//!
//! Indirecting segment I/O behind a small capability trait lets the reader/writer
//! test suite run against an in-memory backend instead of touching disk, while
//! production code uses `StdFs` directly.

use crate::error::WalError;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Capability interface a segment reader/writer needs from the filesystem.
pub trait SegmentFs: Send + Sync {
    /// Creates `dir` and all missing parent directories. No-op if it already exists.
    fn mkdir_all(&self, dir: &Path) -> Result<(), WalError>;

    /// Opens `path` for appending, creating it if absent.
    fn open_append(&self, path: &Path) -> Result<Box<dyn AppendFile>, WalError>;

    /// Returns the current size in bytes of `path`, or 0 if it does not exist.
    fn file_size(&self, path: &Path) -> Result<u64, WalError>;

    /// Lists the regular files directly under `dir` (non-recursive). Returns an
    /// empty list if `dir` does not exist.
    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, WalError>;

    /// Reads the entire contents of `path`.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, WalError>;
}

/// A handle to an open append-mode file.
pub trait AppendFile: Send {
    fn append(&mut self, buf: &[u8]) -> Result<(), WalError>;
    fn sync(&mut self) -> Result<(), WalError>;
}

/// Production backend: direct `std::fs`/`std::io` calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFs;

impl SegmentFs for StdFs {
    fn mkdir_all(&self, dir: &Path) -> Result<(), WalError> {
        std::fs::create_dir_all(dir)?;
        Ok(())
    }

    fn open_append(&self, path: &Path) -> Result<Box<dyn AppendFile>, WalError> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Box::new(StdAppendFile(file)))
    }

    fn file_size(&self, path: &Path) -> Result<u64, WalError> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, WalError> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, WalError> {
        Ok(std::fs::read(path)?)
    }
}

struct StdAppendFile(std::fs::File);

impl AppendFile for StdAppendFile {
    fn append(&mut self, buf: &[u8]) -> Result<(), WalError> {
        self.0.write_all(buf)?;
        Ok(())
    }

    fn sync(&mut self) -> Result<(), WalError> {
        self.0.sync_all()?;
        Ok(())
    }
}

/// In-memory backend for deterministic tests: a map of path to bytes shared
/// between the facade and every file handle it hands out, guarded by one lock.
#[derive(Default, Clone)]
pub struct MemFs {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SegmentFs for MemFs {
    fn mkdir_all(&self, _dir: &Path) -> Result<(), WalError> {
        Ok(())
    }

    fn open_append(&self, path: &Path) -> Result<Box<dyn AppendFile>, WalError> {
        self.files
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default();
        Ok(Box::new(MemAppendFile {
            path: path.to_path_buf(),
            files: self.files.clone(),
        }))
    }

    fn file_size(&self, path: &Path) -> Result<u64, WalError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(path)
            .map(|b| b.len() as u64)
            .unwrap_or(0))
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, WalError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, WalError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default())
    }
}

struct MemAppendFile {
    path: PathBuf,
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl AppendFile for MemAppendFile {
    fn append(&mut self, buf: &[u8]) -> Result<(), WalError> {
        self.files
            .lock()
            .unwrap()
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), WalError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_fs_roundtrips_append_and_read() {
        let fs = MemFs::new();
        let path = PathBuf::from("/data/a.log");
        {
            let mut f = fs.open_append(&path).unwrap();
            f.append(b"hello").unwrap();
            f.append(b" world").unwrap();
            f.sync().unwrap();
        }
        assert_eq!(fs.read_all(&path).unwrap(), b"hello world");
        assert_eq!(fs.file_size(&path).unwrap(), 11);
    }

    #[test]
    fn mem_fs_read_dir_is_non_recursive() {
        let fs = MemFs::new();
        fs.open_append(&PathBuf::from("/data/a.log")).unwrap();
        fs.open_append(&PathBuf::from("/data/sub/b.log")).unwrap();
        let listed = fs.read_dir(&PathBuf::from("/data")).unwrap();
        assert_eq!(listed, vec![PathBuf::from("/data/a.log")]);
    }

    #[test]
    fn mem_fs_missing_dir_reads_empty() {
        let fs = MemFs::new();
        assert!(fs.read_dir(&PathBuf::from("/nope")).unwrap().is_empty());
    }
}
