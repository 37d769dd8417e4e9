//! Event and outcome types exchanged between the pipeline components.
//!
//! User gestures and transfer progress are plain values rather than
//! callbacks, so any host environment can translate its native events into
//! these types and feed them to the state machines.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A position in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Pointer and touch gestures directed at rendered gallery items.
///
/// Indices are the position attribute each rendered item carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GestureEvent {
    // Pointer drag
    /// A drag started on the item at `index`.
    DragStart { index: usize },
    /// A drag is hovering the item at `index`.
    DragOver { index: usize },
    /// The dragged item was dropped on the item at `index`.
    Drop { index: usize },
    /// The drag ended without a drop on an item.
    DragEnd,

    // Touch
    /// A finger went down on the item at `index`.
    TouchStart { index: usize, point: Point },
    /// The finger moved.
    TouchMove { point: Point },
    /// The finger was lifted.
    TouchEnd { point: Point },
    /// The platform cancelled the touch.
    TouchCancel,
}

/// Progress and completion notifications of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TransferEvent {
    /// Upload started; the indicator is reset to zero.
    Started { total_bytes: u64 },
    /// Upload progress in whole percent, never decreasing.
    ProgressTick { percent: u8 },
    /// The artifact is ready for download.
    Succeeded { filename: String, byte_size: u64 },
    /// The submission failed with a user-facing message.
    Failed { message: String },
}

/// Binary result returned by the processing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Name the artifact should be saved under.
    pub filename: String,
    /// MIME type of the payload.
    pub content_type: String,
    /// The payload.
    pub bytes: Bytes,
}

/// Result of exactly one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Success(Artifact),
    Failure { message: String },
}

impl TransferOutcome {
    /// Builds a failure carrying the error's user-facing message.
    pub fn failure(err: &crate::PipelineError) -> Self {
        TransferOutcome::Failure {
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success(_))
    }

    /// The failure message, if this is a failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            TransferOutcome::Failure { message } => Some(message),
            TransferOutcome::Success(_) => None,
        }
    }

    /// The completion event announcing this outcome.
    pub fn to_event(&self) -> TransferEvent {
        match self {
            TransferOutcome::Success(artifact) => TransferEvent::Succeeded {
                filename: artifact.filename.clone(),
                byte_size: artifact.bytes.len() as u64,
            },
            TransferOutcome::Failure { message } => TransferEvent::Failed {
                message: message.clone(),
            },
        }
    }
}
