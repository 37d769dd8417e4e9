//! The upload state machine.
//!
//! A pipeline moves `Idle -> Uploading -> {Succeeded | Failed}` once per
//! submission and produces exactly one [`TransferOutcome`] for it. Progress
//! and completion are published as [`TransferEvent`]s on a broadcast
//! channel so any number of observers can follow along.

use protocol::{
    Artifact, PipelineError, TransferEvent, TransferOutcome, TransferRequest,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::classify::classify;
use super::transport::{ProgressReporter, Transport};

/// Capacity of the event channel; slow observers miss older ticks.
const EVENT_CAPACITY: usize = 64;

/// State of the transfer pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// No submission has been made since the last reset.
    Idle,
    /// A submission is in flight; re-submission is refused.
    Uploading,
    /// The last submission produced an artifact.
    Succeeded,
    /// The last submission failed.
    Failed,
}

/// Upload percentage that never moves backwards within a submission.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgressMeter {
    percent: u8,
}

impl ProgressMeter {
    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn reset(&mut self) {
        self.percent = 0;
    }

    /// Records `sent` of `total` bytes, returning the new percentage when it
    /// increased. The percentage rounds down, so 100 means every byte went out.
    pub fn update(&mut self, sent: u64, total: u64) -> Option<u8> {
        let percent = if total == 0 {
            100
        } else {
            let sent = u128::from(sent.min(total));
            let total = u128::from(total);
            (sent * 100 / total) as u8
        };
        if percent > self.percent {
            self.percent = percent;
            Some(percent)
        } else {
            None
        }
    }

    pub fn complete(&mut self) {
        self.percent = 100;
    }
}

/// Submits requests through a [`Transport`] and tracks their progress.
pub struct TransferPipeline<T: Transport> {
    transport: T,
    state: TransferState,
    meter: ProgressMeter,
    events: broadcast::Sender<TransferEvent>,
    cancel: CancellationToken,
    download: Option<Artifact>,
}

impl<T: Transport> TransferPipeline<T> {
    pub fn new(transport: T) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            state: TransferState::Idle,
            meter: ProgressMeter::default(),
            events,
            cancel: CancellationToken::new(),
            download: None,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Current value of the progress indicator.
    pub fn progress(&self) -> u8 {
        self.meter.percent()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Subscribes to progress and completion events.
    pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.events.subscribe()
    }

    /// Token that abandons the in-flight submission when cancelled.
    ///
    /// Cancellation is permanent: every later submission is abandoned too.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The artifact of the last successful submission.
    pub fn download_offer(&self) -> Option<&Artifact> {
        self.download.as_ref()
    }

    /// Returns to `Idle`, clearing progress and any download offer.
    pub fn reset(&mut self) {
        self.state = TransferState::Idle;
        self.meter.reset();
        self.download = None;
    }

    /// Ends the current submission at `Failed` with `err`'s message.
    pub fn fail(&mut self, err: &PipelineError) -> TransferOutcome {
        warn!(class = ?err.class(), "Transfer failed: {}", err);
        self.state = TransferState::Failed;
        self.meter.reset();
        self.download = None;
        let outcome = TransferOutcome::failure(err);
        self.emit(outcome.to_event());
        outcome
    }

    /// Sends `request` and classifies the response.
    pub async fn submit(&mut self, request: TransferRequest) -> TransferOutcome {
        if self.state == TransferState::Uploading {
            warn!(tool = %request.tool(), "Submission refused while uploading");
            return TransferOutcome::failure(&PipelineError::TransferInProgress);
        }

        let total = request.total_bytes();
        info!(
            tool = %request.tool(),
            files = request.files().len(),
            total_bytes = total,
            "Upload started"
        );
        self.state = TransferState::Uploading;
        self.meter.reset();
        self.download = None;
        self.emit(TransferEvent::Started { total_bytes: total });

        let result = {
            let (reporter, mut progress) = ProgressReporter::channel();
            let cancel = self.cancel.clone();
            let send = self.transport.send(&request, reporter);
            tokio::pin!(send);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break Err(PipelineError::Abandoned),
                    Some(sent) = progress.recv() => {
                        if let Some(percent) = self.meter.update(sent, total) {
                            debug!(percent, "Upload progress");
                            let _ = self.events.send(TransferEvent::ProgressTick { percent });
                        }
                    }
                    result = &mut send => break result,
                }
            }
        };

        match result.and_then(|response| classify(&request, response)) {
            Ok(artifact) => {
                self.state = TransferState::Succeeded;
                if self.meter.percent() < 100 {
                    self.meter.complete();
                    self.emit(TransferEvent::ProgressTick { percent: 100 });
                }
                info!(
                    tool = %request.tool(),
                    filename = %artifact.filename,
                    bytes = artifact.bytes.len(),
                    "Upload succeeded"
                );
                self.download = Some(artifact.clone());
                let outcome = TransferOutcome::Success(artifact);
                self.emit(outcome.to_event());
                outcome
            }
            Err(err) => self.fail(&err),
        }
    }

    fn emit(&self, event: TransferEvent) {
        let _ = self.events.send(event);
    }
}
