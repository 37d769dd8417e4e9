//! HTTP transport: multipart POST to `{base_url}/{tool}`.
//!
//! File parts are streamed in fixed-size chunks so upload progress can be
//! reported as the body is consumed by the connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use protocol::{mime_from_name, FileHandle, PipelineError, Result, ToolId, TransferRequest};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::classify::{filename_from_headers, ServiceResponse};
use super::transport::{ProgressReporter, Transport};
use crate::config::ServiceConfig;
use crate::files::read_all;

/// Size of the chunks file parts are streamed in (64KB).
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Response header carrying a download name when `Content-Disposition` is absent.
pub const X_FILENAME: &str = "x-filename";

/// Errors that can occur while constructing the HTTP transport.
#[derive(Debug, Error)]
pub enum HttpTransportError {
    /// The base URL is not an absolute http(s) URL.
    #[error("invalid service URL '{0}'")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Sends requests to the processing service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for `base_url` with an overall request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> std::result::Result<Self, HttpTransportError> {
        let trimmed = base_url.trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .map_err(|_| HttpTransportError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpTransportError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    pub fn from_config(config: &ServiceConfig) -> std::result::Result<Self, HttpTransportError> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint a tool is posted to.
    pub fn endpoint(&self, tool: ToolId) -> String {
        format!("{}/{}", self.base_url, tool)
    }

    async fn build_form(
        &self,
        request: &TransferRequest,
        progress: &ProgressReporter,
    ) -> Result<Form> {
        let sent = Arc::new(AtomicU64::new(0));
        let mut form = Form::new();

        for file in request.files() {
            let part = file_part(file, Arc::clone(&sent), progress.clone()).await?;
            form = form.part(request.file_field(), part);
        }
        for (name, value) in request.parameters() {
            form = form.text(*name, value.clone());
        }
        Ok(form)
    }
}

async fn file_part(
    file: &FileHandle,
    sent: Arc<AtomicU64>,
    progress: ProgressReporter,
) -> Result<Part> {
    let bytes = read_all(file).await.map_err(|e| {
        warn!(file = %file.name(), "Failed to read file for upload: {}", e);
        PipelineError::Network(format!("failed to read {}: {e}", file.name()))
    })?;
    let length = bytes.len() as u64;

    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_SIZE).min(bytes.len())))
        .collect();
    let body = stream::iter(chunks).map(move |chunk| {
        let total = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
        progress.report(total);
        Ok::<Bytes, std::io::Error>(chunk)
    });

    let mime = if file.mime_type().is_empty() {
        mime_from_name(file.name())
    } else {
        file.mime_type()
    };
    Part::stream_with_length(Body::wrap_stream(body), length)
        .file_name(file.name().to_string())
        .mime_str(mime)
        .map_err(|e| PipelineError::Network(e.to_string()))
}

fn header_str(response: &reqwest::Response, name: impl reqwest::header::AsHeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &TransferRequest,
        progress: ProgressReporter,
    ) -> Result<ServiceResponse> {
        let endpoint = self.endpoint(request.tool());
        let form = self.build_form(request, &progress).await?;
        debug!(%endpoint, files = request.files().len(), "Posting multipart request");

        let response = self
            .client
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(%endpoint, "Request failed: {}", e);
                PipelineError::Network(e.to_string())
            })?;

        let status = response.status().as_u16();
        let disposition = header_str(&response, CONTENT_DISPOSITION);
        let x_filename = header_str(&response, X_FILENAME);
        let content_type = header_str(&response, CONTENT_TYPE);
        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Network(e.to_string()))?;
        debug!(status, bytes = body.len(), "Response received");

        Ok(ServiceResponse {
            status,
            filename: filename_from_headers(disposition.as_deref(), x_filename.as_deref()),
            content_type,
            body,
        })
    }
}
