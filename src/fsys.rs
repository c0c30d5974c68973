//! Filesystem collaborator interface
//!
//! Failure-explicit, synchronous reads. The engine owns a `Box<dyn
//! Filesystem>` so tests can substitute an in-memory tree.

use std::path::Path;

use thiserror::Error;

/// Errors surfaced by filesystem reads
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not valid UTF-8: {0}")]
    NotUtf8(String),
}

/// Read-only filesystem access for the engine
pub trait Filesystem: Send + Sync {
    /// Read a file as UTF-8 text
    fn read(&self, path: &Path) -> Result<String, FsError>;

    /// Whether the path exists
    fn exists(&self, path: &Path) -> bool;
}

/// `Filesystem` backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn read(&self, path: &Path) -> Result<String, FsError> {
        match std::fs::read_to_string(path) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                Err(FsError::NotUtf8(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_file_is_io_error() {
        let fs = OsFilesystem;
        let err = fs.read(Path::new("/definitely/not/here.ts")).unwrap_err();
        assert!(matches!(err, FsError::Io(_)));
    }

    #[test]
    fn test_read_and_exists() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "export const x = 1;\n").unwrap();

        let fs = OsFilesystem;
        assert!(fs.exists(&file));
        assert_eq!(fs.read(&file).unwrap(), "export const x = 1;\n");
        assert!(!fs.exists(&dir.path().join("b.ts")));
    }
}
