//! Error types for the protocol crate.
//!
//! Every variant's `Display` text is the message shown to the user, so the
//! wording here is part of the user-facing contract.

use thiserror::Error;

/// Generic message used when a failed response carries nothing readable.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";

/// Message used when no response was received at all.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error";

/// The four classes of failure a submission can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Detected locally before any network call.
    Validation,
    /// No response was received.
    Transport,
    /// A response was received with a non-success status.
    Service,
    /// A success status with a payload that is unusable for the tool.
    Content,
}

/// Pipeline error type covering all possible failure modes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    // Validation errors
    /// Nothing is selected.
    #[error("Please select a file.")]
    NoFile,

    /// The cumulative size of the selection is above the ceiling.
    #[error("Maximum allowed size is {} MB", mebibytes(.ceiling))]
    SizeExceeded {
        /// Cumulative size at the point the ceiling was crossed.
        total: u64,
        /// Active ceiling in bytes.
        ceiling: u64,
    },

    /// A page list did not match the accepted pattern.
    #[error("Invalid format. Example: 1,3,5-7")]
    InvalidPages(String),

    /// More than one file was selected for a tool that takes one.
    #[error("Please select only one file.")]
    SingleFileOnly {
        /// Number of files in the rejected selection.
        selected: usize,
    },

    /// A parameter the tool requires is empty or missing.
    #[error("Please enter the {name}.")]
    MissingParameter {
        /// Field name as sent to the service.
        name: &'static str,
    },

    /// A parameter is present but cannot be interpreted.
    #[error("Invalid {name}: {value}")]
    InvalidParameter {
        /// Field name as sent to the service.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The tool identifier is not part of the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A submission was attempted while another is still uploading.
    #[error("A file is already being processed.")]
    TransferInProgress,

    // Transport errors
    /// No response was received.
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(String),

    /// The submission was abandoned before a response arrived.
    #[error("The request was cancelled.")]
    Abandoned,

    // Service errors
    /// The service answered with a non-success status.
    #[error("{message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    // Content errors
    /// The text extraction returned no text.
    #[error("No text found in the document.")]
    NoTextFound,

    /// The response body could not be decoded for this tool.
    #[error("The service returned an invalid response.")]
    MalformedResponse(String),

    /// The service answered with success but sent no bytes.
    #[error("The service returned an empty file.")]
    EmptyArtifact,
}

impl PipelineError {
    /// Returns which class of failure this is.
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::NoFile
            | PipelineError::SizeExceeded { .. }
            | PipelineError::SingleFileOnly { .. }
            | PipelineError::InvalidPages(_)
            | PipelineError::MissingParameter { .. }
            | PipelineError::InvalidParameter { .. }
            | PipelineError::UnknownTool(_)
            | PipelineError::TransferInProgress => ErrorClass::Validation,
            PipelineError::Network(_) | PipelineError::Abandoned => ErrorClass::Transport,
            PipelineError::Service { .. } => ErrorClass::Service,
            PipelineError::NoTextFound
            | PipelineError::MalformedResponse(_)
            | PipelineError::EmptyArtifact => ErrorClass::Content,
        }
    }

    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::Transport | ErrorClass::Service | ErrorClass::Content
        )
    }
}

/// Formats a byte count as MiB with one decimal place.
fn mebibytes(bytes: &u64) -> String {
    format!("{:.1}", *bytes as f64 / 1024.0 / 1024.0)
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::MalformedResponse(err.to_string())
    }
}
