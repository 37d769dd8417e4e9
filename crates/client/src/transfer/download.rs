//! Delivery of artifacts to the local filesystem.

use std::io;
use std::path::{Path, PathBuf};

use protocol::Artifact;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Highest collision suffix tried before giving up.
const MAX_COLLISION_SUFFIX: u32 = 9999;

/// Destination artifacts are saved to.
#[allow(async_fn_in_trait)]
pub trait ArtifactSink {
    /// Saves `artifact`, returning where it was written.
    async fn save(&self, artifact: &Artifact) -> io::Result<PathBuf>;
}

/// Saves artifacts into a directory, never overwriting existing files.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Returns `name` with ` (n)` inserted before its extension.
pub fn numbered_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({n}){}", &name[..dot], &name[dot..]),
        _ => format!("{name} ({n})"),
    }
}

impl ArtifactSink for DirectorySink {
    async fn save(&self, artifact: &Artifact) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        for n in 0..=MAX_COLLISION_SUFFIX {
            let path = self.dir.join(numbered_name(&artifact.filename, n));
            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };
            file.write_all(&artifact.bytes).await?;
            file.flush().await?;
            info!(path = %path.display(), bytes = artifact.bytes.len(), "Artifact saved");
            return Ok(path);
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name for {} in {}", artifact.filename, self.dir.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tempfile::TempDir;

    use super::*;

    fn artifact(name: &str, body: &'static [u8]) -> Artifact {
        Artifact {
            filename: name.to_string(),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(body),
        }
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("merged.pdf", 0), "merged.pdf");
        assert_eq!(numbered_name("merged.pdf", 2), "merged (2).pdf");
        assert_eq!(numbered_name("archive.tar.gz", 1), "archive.tar (1).gz");
        assert_eq!(numbered_name("README", 1), "README (1)");
        assert_eq!(numbered_name(".hidden", 1), ".hidden (1)");
    }

    #[tokio::test]
    async fn test_save_writes_bytes() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path().join("out"));

        let path = sink.save(&artifact("merged.pdf", b"%PDF")).await.unwrap();

        assert_eq!(path, temp.path().join("out").join("merged.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_collisions_get_suffix() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());

        let first = sink.save(&artifact("merged.pdf", b"one")).await.unwrap();
        let second = sink.save(&artifact("merged.pdf", b"two")).await.unwrap();
        let third = sink.save(&artifact("merged.pdf", b"three")).await.unwrap();

        assert_eq!(first.file_name().unwrap(), "merged.pdf");
        assert_eq!(second.file_name().unwrap(), "merged (1).pdf");
        assert_eq!(third.file_name().unwrap(), "merged (2).pdf");
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
    }
}
