//! File handles captured from the user's selection.
//!
//! A [`FileHandle`] is an immutable reference to a local blob plus the
//! metadata the platform reported for it. Two handles with the same name are
//! still different files; identity is the [`FileId`] assigned at capture.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// MIME types that carry no information about the content.
const GENERIC_MIME_TYPES: &[&str] = &["", "application/octet-stream", "binary/octet-stream"];

/// Image extensions recognised when the MIME type is absent or generic.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"];

/// Unique identity of a captured file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(Uuid);

impl FileId {
    /// Generates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse content classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Image,
    Other,
}

impl FileKind {
    /// Classifies a file from its name and reported MIME type.
    ///
    /// A specific MIME type decides; the extension decides when the MIME type
    /// is absent or generic.
    pub fn classify(name: &str, mime_type: &str) -> Self {
        let mime = mime_type.trim().to_ascii_lowercase();
        if !GENERIC_MIME_TYPES.contains(&mime.as_str()) {
            if mime == "application/pdf" {
                return FileKind::Pdf;
            }
            if mime.starts_with("image/") {
                return FileKind::Image;
            }
            return FileKind::Other;
        }
        Self::from_extension(name)
    }

    /// Classifies a file from its extension alone.
    pub fn from_extension(name: &str) -> Self {
        match extension(name).as_deref() {
            Some("pdf") => FileKind::Pdf,
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => FileKind::Image,
            _ => FileKind::Other,
        }
    }
}

/// Lower-cased extension of a file name, if it has one.
fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// Guesses a MIME type from a file name, empty when unknown.
pub fn mime_from_name(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some("txt") => "text/plain",
        _ => "",
    }
}

/// Where a file's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A file on the local filesystem, read when uploaded.
    Path(PathBuf),
    /// Bytes already held in memory.
    Memory(Bytes),
}

/// Immutable reference to a user-selected blob and its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    id: FileId,
    name: String,
    byte_size: u64,
    mime_type: String,
    kind: FileKind,
    source: FileSource,
}

impl FileHandle {
    /// Captures a file from the local filesystem with already-known size.
    pub fn from_path(path: impl Into<PathBuf>, byte_size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_from_name(&name).to_string();
        Self::new(name, byte_size, mime_type, FileSource::Path(path))
    }

    /// Captures an in-memory blob.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        let size = bytes.len() as u64;
        Self::new(name.into(), size, mime_type.into(), FileSource::Memory(bytes))
    }

    fn new(name: String, byte_size: u64, mime_type: String, source: FileSource) -> Self {
        let kind = FileKind::classify(&name, &mime_type);
        Self {
            id: FileId::new(),
            name,
            byte_size,
            mime_type,
            kind,
            source,
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// MIME type as reported at capture; may be empty.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Size rounded to whole kibibytes, as shown in file lists.
    pub fn size_kb(&self) -> u64 {
        (self.byte_size + 512) / 1024
    }
}
