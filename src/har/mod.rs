pub mod types;

pub use types::*;

use crate::error::PersistError;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Serialize a HAR document to pretty-printed UTF-8 JSON
pub fn to_json(har: &Har) -> Result<Vec<u8>, PersistError> {
    let bytes = serde_json::to_vec_pretty(har)?;
    Ok(bytes)
}

/// Write bytes to `path` without ever leaving a partial file behind.
///
/// The bytes go to a sibling temp file first and are renamed over the
/// target once fully flushed. Parent directories are not created; a
/// missing directory surfaces as a `PersistError`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let io_err = |source: std::io::Error| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp_name = path
        .file_name()
        .ok_or_else(|| {
            io_err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no file name",
            ))
        })?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.har");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");
    }

    #[test]
    fn test_write_atomic_truncates_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.har");
        fs::write(&path, "old contents that are much longer").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_write_atomic_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.har");
        let err = write_atomic(&path, b"{}").unwrap_err();
        assert!(matches!(err, PersistError::Io { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_no_temp_file_left_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        write_atomic(&missing.join("out.har"), b"{}").unwrap_err();
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
