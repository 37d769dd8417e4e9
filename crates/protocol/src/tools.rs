//! Tool catalog for the remote processing service.
//!
//! Each tool is a `POST {base}/{tool_id}` endpoint. The catalog records what
//! the endpoint expects (single or repeated file field, extra parameters),
//! what it returns, and how large the upload may be.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::files::FileKind;

/// Cumulative upload ceiling for most tools (25 MiB).
pub const DEFAULT_SIZE_CEILING: u64 = 25 * 1024 * 1024;

/// Cumulative upload ceiling for tools that accept large documents (50 MiB).
pub const ELEVATED_SIZE_CEILING: u64 = 50 * 1024 * 1024;

/// Identifier of a processing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    MergePdf,
    SplitPdf,
    RotatePdf,
    ProtectPdf,
    UnlockPdf,
    CompressPdf,
    PdfToJpg,
    JpgToPdf,
    PdfToWord,
    WordToPdf,
    PptToPdf,
    ExtractText,
}

/// Kind of artifact a tool returns on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Pdf,
    Archive,
    Document,
    /// Text wrapped in a JSON document.
    Text,
}

impl ArtifactKind {
    /// MIME type used when the service does not supply one.
    pub fn default_content_type(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "application/pdf",
            ArtifactKind::Archive => "application/zip",
            ArtifactKind::Document => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ArtifactKind::Text => "text/plain",
        }
    }
}

/// An extra form field a tool accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Field name on the wire.
    pub name: &'static str,
    /// Whether an empty value must be rejected before sending.
    pub required: bool,
    /// Value format checked locally.
    pub format: ParamFormat,
}

/// Local validation applied to a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamFormat {
    /// Any text.
    Text,
    /// A signed integer (degrees for rotation).
    Integer,
    /// A page list, see [`crate::pages::validate_pages`].
    PageList,
}

const RANGES: ParamSpec = ParamSpec {
    name: "ranges",
    required: true,
    format: ParamFormat::Text,
};
const ANGLE: ParamSpec = ParamSpec {
    name: "angle",
    required: true,
    format: ParamFormat::Integer,
};
const PASSWORD: ParamSpec = ParamSpec {
    name: "password",
    required: true,
    format: ParamFormat::Text,
};
const LEVEL: ParamSpec = ParamSpec {
    name: "level",
    required: false,
    format: ParamFormat::Text,
};
const PAGES: ParamSpec = ParamSpec {
    name: "pages",
    required: false,
    format: ParamFormat::PageList,
};

impl ToolId {
    /// Every tool in catalog order.
    pub const ALL: [ToolId; 12] = [
        ToolId::MergePdf,
        ToolId::SplitPdf,
        ToolId::RotatePdf,
        ToolId::ProtectPdf,
        ToolId::UnlockPdf,
        ToolId::CompressPdf,
        ToolId::PdfToJpg,
        ToolId::JpgToPdf,
        ToolId::PdfToWord,
        ToolId::WordToPdf,
        ToolId::PptToPdf,
        ToolId::ExtractText,
    ];

    /// The identifier as used in URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            ToolId::MergePdf => "merge-pdf",
            ToolId::SplitPdf => "split-pdf",
            ToolId::RotatePdf => "rotate-pdf",
            ToolId::ProtectPdf => "protect-pdf",
            ToolId::UnlockPdf => "unlock-pdf",
            ToolId::CompressPdf => "compress-pdf",
            ToolId::PdfToJpg => "pdf-to-jpg",
            ToolId::JpgToPdf => "jpg-to-pdf",
            ToolId::PdfToWord => "pdf-to-word",
            ToolId::WordToPdf => "word-to-pdf",
            ToolId::PptToPdf => "ppt-to-pdf",
            ToolId::ExtractText => "extract-text",
        }
    }

    /// Heading shown on the tool page, e.g. `MERGE PDF`.
    pub fn display_name(self) -> String {
        self.as_str().replace('-', " ").to_uppercase()
    }

    /// Whether the tool takes several files in a repeated `files` field.
    pub fn accepts_multiple(self) -> bool {
        matches!(self, ToolId::MergePdf | ToolId::JpgToPdf)
    }

    /// Multipart field name carrying the input files.
    pub fn file_field(self) -> &'static str {
        if self.accepts_multiple() {
            "files"
        } else {
            "file"
        }
    }

    /// Whether the order of the inputs changes the result.
    ///
    /// Only these tools commit a reordered gallery back into the selection.
    pub fn is_order_sensitive(self) -> bool {
        self.accepts_multiple()
    }

    /// The kind of input that makes a multi-file selection reorderable.
    pub fn reorderable_kind(self) -> Option<FileKind> {
        match self {
            ToolId::MergePdf => Some(FileKind::Pdf),
            ToolId::JpgToPdf => Some(FileKind::Image),
            _ => None,
        }
    }

    /// Extra form fields the tool declares.
    pub fn parameters(self) -> &'static [ParamSpec] {
        match self {
            ToolId::SplitPdf => &[RANGES],
            ToolId::RotatePdf => &[ANGLE],
            ToolId::ProtectPdf | ToolId::UnlockPdf => &[PASSWORD],
            ToolId::CompressPdf => &[LEVEL],
            ToolId::PdfToJpg => &[PAGES],
            _ => &[],
        }
    }

    /// Cumulative upload ceiling in bytes.
    pub fn size_ceiling(self) -> u64 {
        match self {
            ToolId::CompressPdf => ELEVATED_SIZE_CEILING,
            _ => DEFAULT_SIZE_CEILING,
        }
    }

    /// What the service returns on success.
    pub fn artifact_kind(self) -> ArtifactKind {
        match self {
            ToolId::SplitPdf | ToolId::PdfToJpg => ArtifactKind::Archive,
            ToolId::PdfToWord => ArtifactKind::Document,
            ToolId::ExtractText => ArtifactKind::Text,
            _ => ArtifactKind::Pdf,
        }
    }

    /// Suffix used to derive a download name from the first input.
    ///
    /// Suffixes starting with `_` or `.` extend the input's base name; the
    /// others are complete file names.
    pub fn filename_suffix(self) -> &'static str {
        match self {
            ToolId::MergePdf => "merged.pdf",
            ToolId::SplitPdf => "split.zip",
            ToolId::RotatePdf => "_rotated.pdf",
            ToolId::CompressPdf => "_compressed.pdf",
            ToolId::PdfToJpg => "_images.zip",
            ToolId::PdfToWord => ".docx",
            ToolId::ExtractText => ".txt",
            ToolId::ProtectPdf
            | ToolId::UnlockPdf
            | ToolId::JpgToPdf
            | ToolId::WordToPdf
            | ToolId::PptToPdf => ".pdf",
        }
    }

    /// Derives the download name for an artifact made from `first_input`.
    pub fn derive_filename(self, first_input: &str) -> String {
        let suffix = self.filename_suffix();
        if !(suffix.starts_with('_') || suffix.starts_with('.')) {
            return suffix.to_string();
        }
        let base = base_name(first_input);
        let base = if base.is_empty() { "output" } else { base };
        format!("{base}{suffix}")
    }
}

/// Strips any directory part and the final extension from a file name.
fn base_name(name: &str) -> &str {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolId::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| PipelineError::UnknownTool(s.to_string()))
    }
}
