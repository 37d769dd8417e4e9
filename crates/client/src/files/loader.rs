//! Capturing local files as [`FileHandle`]s and reading them back.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use protocol::{FileHandle, FileSource};
use thiserror::Error;
use tokio::fs;

/// Errors that can occur while capturing or reading a file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The requested file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// The requested path is a directory, not a file.
    #[error("path is a directory: {0}")]
    IsADirectory(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Captures one local file, recording its current size.
pub async fn capture_path(path: &Path) -> Result<FileHandle, LoadError> {
    let metadata = fs::metadata(path).await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            LoadError::FileNotFound(path.to_path_buf())
        } else {
            LoadError::Io(e)
        }
    })?;

    if metadata.is_dir() {
        return Err(LoadError::IsADirectory(path.to_path_buf()));
    }

    Ok(FileHandle::from_path(path, metadata.len()))
}

/// Captures several local files in the given order.
pub async fn capture_paths(paths: &[PathBuf]) -> Result<Vec<FileHandle>, LoadError> {
    let mut handles = Vec::with_capacity(paths.len());
    for path in paths {
        handles.push(capture_path(path).await?);
    }
    Ok(handles)
}

/// Reads the full contents of a file handle.
pub async fn read_all(file: &FileHandle) -> io::Result<Bytes> {
    match file.source() {
        FileSource::Memory(bytes) => Ok(bytes.clone()),
        FileSource::Path(path) => fs::read(path).await.map(Bytes::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::FileKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_capture_path_reads_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scan.pdf");
        std::fs::write(&path, b"%PDF-1.4 hello").unwrap();

        let handle = capture_path(&path).await.unwrap();
        assert_eq!(handle.name(), "scan.pdf");
        assert_eq!(handle.byte_size(), 14);
        assert_eq!(handle.kind(), FileKind::Pdf);

        let bytes = read_all(&handle).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 hello");
    }

    #[tokio::test]
    async fn test_capture_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = capture_path(&temp_dir.path().join("missing.pdf")).await;
        assert!(matches!(result, Err(LoadError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_capture_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = capture_path(temp_dir.path()).await;
        assert!(matches!(result, Err(LoadError::IsADirectory(_))));
    }

    #[tokio::test]
    async fn test_capture_paths_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for name in ["b.png", "a.png", "c.png"] {
            let path = temp_dir.path().join(name);
            std::fs::write(&path, name.as_bytes()).unwrap();
            paths.push(path);
        }

        let handles = capture_paths(&paths).await.unwrap();
        let names: Vec<_> = handles.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["b.png", "a.png", "c.png"]);
    }

    #[tokio::test]
    async fn test_read_all_memory() {
        let handle = FileHandle::from_bytes("a.txt", "text/plain", b"abc".to_vec());
        assert_eq!(&read_all(&handle).await.unwrap()[..], b"abc");
    }
}
