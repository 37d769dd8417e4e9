//! The transport seam between the pipeline and the processing service.

use protocol::{Result, TransferRequest};
use tokio::sync::mpsc;

use super::classify::ServiceResponse;

/// Reports cumulative upload progress in bytes.
///
/// Reports after the pipeline stopped listening are dropped silently.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<u64>,
}

impl ProgressReporter {
    /// Creates a reporter and the receiver the pipeline listens on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Records that `sent` bytes of file content have been sent so far.
    pub fn report(&self, sent: u64) {
        let _ = self.tx.send(sent);
    }
}

/// Delivers a request to the processing service.
///
/// Implementations return `PipelineError::Network` when no response was
/// received; any response, whatever its status, is returned as-is for
/// classification.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends `request`, reporting file bytes sent through `progress`.
    async fn send(
        &self,
        request: &TransferRequest,
        progress: ProgressReporter,
    ) -> Result<ServiceResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    async fn send(
        &self,
        request: &TransferRequest,
        progress: ProgressReporter,
    ) -> Result<ServiceResponse> {
        (**self).send(request, progress).await
    }
}
