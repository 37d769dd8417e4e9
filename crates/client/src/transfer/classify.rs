//! Classification of service responses into transfer outcomes.
//!
//! A response is classified without any knowledge of how it was received,
//! so the same rules apply to the HTTP transport and to recorded responses.

use std::sync::OnceLock;

use bytes::Bytes;
use protocol::{
    Artifact, ArtifactKind, PipelineError, Result, ToolId, TransferRequest,
    GENERIC_FAILURE_MESSAGE,
};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

/// Fields of a structured error body, in lookup order.
const ERROR_FIELDS: [&str; 3] = ["error", "message", "detail"];

/// A response received from the processing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    /// HTTP status code.
    pub status: u16,
    /// Filename supplied by the response headers, already sanitized.
    pub filename: Option<String>,
    /// Value of the `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// Raw response body.
    pub body: Bytes,
}

impl ServiceResponse {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            filename: None,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Resolves the download name supplied by response headers.
///
/// `Content-Disposition` wins over `X-Filename`. Directory components are
/// stripped so a hostile name can never point outside the output directory.
pub fn filename_from_headers(
    content_disposition: Option<&str>,
    x_filename: Option<&str>,
) -> Option<String> {
    content_disposition
        .and_then(parse_content_disposition)
        .or_else(|| x_filename.and_then(sanitize_filename))
}

/// Extracts the `filename=` parameter of a `Content-Disposition` value.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, raw) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let raw = raw.trim();
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(raw);
        sanitize_filename(unquoted)
    })
}

fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}

fn markup_pattern() -> &'static Regex {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    MARKUP.get_or_init(|| Regex::new(r"<[^>]+>").expect("markup pattern is valid"))
}

fn whitespace_pattern() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Extracts the human-readable message from a failed response body.
///
/// Priority: a structured error field, then the body text with markup
/// stripped, then the generic fallback.
pub fn extract_error_message(body: &[u8]) -> String {
    if let Some(message) = structured_error(body) {
        return message;
    }

    let text = String::from_utf8_lossy(body);
    let stripped = markup_pattern().replace_all(&text, " ");
    let collapsed = whitespace_pattern().replace_all(&stripped, " ");
    let clean = collapsed.trim();
    if clean.is_empty() {
        GENERIC_FAILURE_MESSAGE.to_string()
    } else {
        clean.to_string()
    }
}

/// The first non-empty string among the known error fields of a JSON object.
fn structured_error(body: &[u8]) -> Option<String> {
    let value = serde_json::from_slice::<serde_json::Value>(body).ok()?;
    let object = value.as_object()?;
    ERROR_FIELDS.iter().find_map(|field| {
        object
            .get(*field)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    })
}

#[derive(Debug, Deserialize)]
struct ExtractedText {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    filename: Option<String>,
}

/// Classifies a response to `request` into an artifact or an error.
pub fn classify(request: &TransferRequest, response: ServiceResponse) -> Result<Artifact> {
    let tool = request.tool();

    if !response.is_success() {
        let message = extract_error_message(&response.body);
        warn!(tool = %tool, status = response.status, %message, "Service rejected request");
        return Err(PipelineError::Service {
            status: response.status,
            message,
        });
    }

    let derived = || tool.derive_filename(request.first_file_name());

    if tool.artifact_kind() == ArtifactKind::Text {
        return classify_text(tool, response, derived);
    }

    if response.body.is_empty() {
        return Err(PipelineError::EmptyArtifact);
    }

    let filename = response.filename.unwrap_or_else(derived);
    let content_type = response
        .content_type
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or_else(|| tool.artifact_kind().default_content_type().to_string());
    debug!(tool = %tool, %filename, bytes = response.body.len(), "Artifact received");

    Ok(Artifact {
        filename,
        content_type,
        bytes: response.body,
    })
}

fn classify_text(
    tool: ToolId,
    response: ServiceResponse,
    derived: impl FnOnce() -> String,
) -> Result<Artifact> {
    let parsed: ExtractedText = serde_json::from_slice(&response.body)?;
    let text = parsed
        .text
        .filter(|text| !text.trim().is_empty())
        .ok_or(PipelineError::NoTextFound)?;

    let filename = parsed
        .filename
        .as_deref()
        .and_then(sanitize_filename)
        .or(response.filename)
        .unwrap_or_else(derived);
    debug!(tool = %tool, %filename, chars = text.len(), "Text extracted");

    Ok(Artifact {
        filename,
        content_type: ArtifactKind::Text.default_content_type().to_string(),
        bytes: Bytes::from(text),
    })
}
