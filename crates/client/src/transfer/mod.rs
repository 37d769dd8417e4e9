//! Transfer module.
//!
//! This module turns a committed selection into a service request and its
//! result into a download:
//! - The transport seam and its HTTP implementation
//! - The upload state machine with monotonic progress
//! - Response classification into artifacts or user-facing errors
//! - Saving artifacts without overwriting existing files

pub mod classify;
pub mod download;
pub mod http;
pub mod pipeline;
pub mod transport;

pub use classify::{
    classify, extract_error_message, filename_from_headers, parse_content_disposition,
    ServiceResponse,
};
pub use download::{numbered_name, ArtifactSink, DirectorySink};
pub use http::{HttpTransport, HttpTransportError, UPLOAD_CHUNK_SIZE, X_FILENAME};
pub use pipeline::{ProgressMeter, TransferPipeline, TransferState};
pub use transport::{ProgressReporter, Transport};
