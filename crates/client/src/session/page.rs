//! The tool page: one tool's selection, viewer and transfer pipeline.
//!
//! The page is the explicit owner of all per-page state. The tool is
//! resolved once into a [`ToolContext`] and every component receives it from
//! here rather than re-deriving it.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use protocol::{
    FileHandle, ParamSpec, PipelineError, ToolId, TransferEvent, TransferOutcome, TransferRequest,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use super::viewer::{ViewerMode, ViewerSession};
use crate::config::GalleryConfig;
use crate::files::{
    FileListEntry, LocalObjectUrls, ObjectUrls, Selection, EMPTY_LIST_PLACEHOLDER,
    OVERSIZE_LIST_PLACEHOLDER,
};
use crate::gallery::GalleryOrder;
use crate::transfer::{ArtifactSink, TransferPipeline, TransferState, Transport};

/// Query parameter naming the tool.
pub const TOOL_QUERY_PARAM: &str = "tool";

/// The tool a page was opened for, resolved once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolContext {
    tool: ToolId,
}

impl ToolContext {
    pub fn new(tool: ToolId) -> Self {
        Self { tool }
    }

    /// Resolves the tool from a query string such as `?tool=merge-pdf`.
    pub fn from_query(query: &str) -> Result<Self, PipelineError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let value = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == TOOL_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        let tool = value.trim().parse::<ToolId>()?;
        debug!(tool = %tool, "Tool context resolved");
        Ok(Self::new(tool))
    }

    /// Resolves the tool from a page URL.
    pub fn from_url(url: &Url) -> Result<Self, PipelineError> {
        Self::from_query(url.query().unwrap_or_default())
    }

    pub fn tool(&self) -> ToolId {
        self.tool
    }

    /// Heading shown on the page, e.g. `MERGE PDF`.
    pub fn display_name(&self) -> String {
        self.tool.display_name()
    }

    /// Whether the selection control accepts several files.
    pub fn multi_select(&self) -> bool {
        self.tool.accepts_multiple()
    }

    /// Parameter inputs revealed for the tool.
    pub fn parameter_inputs(&self) -> &'static [ParamSpec] {
        self.tool.parameters()
    }

    /// Cumulative size ceiling in bytes.
    pub fn ceiling(&self) -> u64 {
        self.tool.size_ceiling()
    }
}

/// What the file list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileListView {
    /// Nothing is selected.
    Empty,
    /// The last selection was rejected for size.
    Oversize,
    /// One row per selected file.
    Files {
        entries: Vec<FileListEntry>,
        /// Whether the multi-file reorder hint is shown.
        reorder_hint: bool,
    },
}

impl FileListView {
    /// Placeholder text shown instead of rows, if any.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            FileListView::Empty => Some(EMPTY_LIST_PLACEHOLDER),
            FileListView::Oversize => Some(OVERSIZE_LIST_PLACEHOLDER),
            FileListView::Files { .. } => None,
        }
    }

    /// The "view" affordance is offered only when files are listed.
    pub fn shows_view_button(&self) -> bool {
        matches!(self, FileListView::Files { .. })
    }
}

/// All state of one tool page.
pub struct ToolPage<T: Transport, U: ObjectUrls + Default = LocalObjectUrls> {
    context: ToolContext,
    gallery: GalleryConfig,
    selection: Selection,
    rejected: bool,
    viewer: Option<ViewerSession<U>>,
    pending_order: Option<GalleryOrder>,
    pipeline: TransferPipeline<T>,
    status: Option<String>,
}

impl<T: Transport, U: ObjectUrls + Default> ToolPage<T, U> {
    pub fn new(context: ToolContext, transport: T, gallery: GalleryConfig) -> Self {
        info!(tool = %context.tool(), "Tool page opened");
        Self {
            context,
            gallery,
            selection: Selection::new(context.ceiling()),
            rejected: false,
            viewer: None,
            pending_order: None,
            pipeline: TransferPipeline::new(transport),
            status: None,
        }
    }

    pub fn context(&self) -> ToolContext {
        self.context
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Replaces the selection with `files`.
    ///
    /// Any open viewer and any uncommitted order are discarded first. A
    /// rejected selection leaves the page with nothing selected and the
    /// error in the status slot.
    pub fn select(&mut self, files: Vec<FileHandle>) -> Result<(), PipelineError> {
        self.discard_viewer();
        if !self.context.multi_select() && files.len() > 1 {
            let err = PipelineError::SingleFileOnly {
                selected: files.len(),
            };
            warn!(tool = %self.context.tool(), selected = files.len(), "Selection rejected: {}", err);
            self.selection.clear();
            self.rejected = false;
            self.status = Some(err.to_string());
            return Err(err);
        }

        match self.selection.set_from(files) {
            Ok(()) => {
                self.rejected = false;
                Ok(())
            }
            Err(err) => {
                self.rejected = true;
                self.status = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Removes the file at `index` from the selection.
    pub fn remove(&mut self, index: usize) -> Option<FileHandle> {
        self.discard_viewer();
        self.rejected = false;
        self.selection.remove_at(index)
    }

    pub fn file_list_view(&self) -> FileListView {
        if self.selection.is_empty() {
            return if self.rejected {
                FileListView::Oversize
            } else {
                FileListView::Empty
            };
        }
        FileListView::Files {
            entries: self.selection.file_list(),
            reorder_hint: self
                .selection
                .classify()
                .shows_reorder_hint(self.context.tool()),
        }
    }

    /// Opens a fresh viewer over the selection, replacing any open one.
    pub fn open_viewer(&mut self) -> Result<&ViewerMode, PipelineError> {
        self.discard_viewer();
        let session = ViewerSession::open(
            self.context.tool(),
            &self.selection,
            U::default(),
            &self.gallery,
        )?;
        Ok(self.viewer.insert(session).mode())
    }

    pub fn viewer(&self) -> Option<&ViewerSession<U>> {
        self.viewer.as_ref()
    }

    pub fn viewer_mut(&mut self) -> Option<&mut ViewerSession<U>> {
        self.viewer.as_mut()
    }

    /// Closes the viewer, releasing its preview URLs.
    ///
    /// For order-sensitive tools the gallery order is kept pending until
    /// the next submission commits it.
    pub fn close_viewer(&mut self) {
        let Some(viewer) = self.viewer.take() else {
            return;
        };
        let keep = viewer.is_gallery() && self.context.tool().is_order_sensitive();
        let order = viewer.close();
        if keep {
            self.pending_order = Some(order);
        }
    }

    /// Whether a gallery order is waiting to be committed.
    pub fn has_pending_order(&self) -> bool {
        self.pending_order.is_some()
    }

    /// Commits the pending gallery order into the selection.
    pub fn commit_order(&mut self) -> bool {
        let Some(order) = self.pending_order.take() else {
            return false;
        };
        info!(files = order.len(), "Gallery order committed");
        self.selection.commit_order(order.into_files());
        true
    }

    /// Switches the page to another tool, dropping all per-tool state.
    pub fn navigate(&mut self, context: ToolContext) {
        self.discard_viewer();
        self.selection = Selection::new(context.ceiling());
        self.rejected = false;
        self.status = None;
        self.pipeline.reset();
        info!(from = %self.context.tool(), to = %context.tool(), "Tool changed");
        self.context = context;
    }

    /// Commits any reorder, validates, uploads and classifies.
    ///
    /// Every failure ends in the status slot; none escapes as an error.
    pub async fn submit(&mut self, params: &BTreeMap<String, String>) -> TransferOutcome {
        self.close_viewer();
        self.commit_order();
        self.status = None;

        let request =
            match TransferRequest::build(self.context.tool(), self.selection.files(), params) {
                Ok(request) => request,
                Err(err) => {
                    let outcome = self.pipeline.fail(&err);
                    self.status = outcome.message().map(str::to_string);
                    return outcome;
                }
            };

        let outcome = self.pipeline.submit(request).await;
        self.status = outcome.message().map(str::to_string);
        outcome
    }

    /// The dismissable inline message, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn dismiss_status(&mut self) {
        self.status = None;
    }

    pub fn transfer_state(&self) -> TransferState {
        self.pipeline.state()
    }

    /// Current value of the progress indicator.
    pub fn progress(&self) -> u8 {
        self.pipeline.progress()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.pipeline.subscribe()
    }

    pub fn pipeline(&self) -> &TransferPipeline<T> {
        &self.pipeline
    }

    /// The persistent download offer.
    pub fn download_offer(&self) -> Option<&protocol::Artifact> {
        self.pipeline.download_offer()
    }

    /// Saves the offered artifact through `sink`.
    pub async fn save_download<S: ArtifactSink>(&self, sink: &S) -> io::Result<Option<PathBuf>> {
        match self.pipeline.download_offer() {
            Some(artifact) => sink.save(artifact).await.map(Some),
            None => Ok(None),
        }
    }

    /// Tears the page down: the in-flight result is abandoned and every
    /// preview URL is released.
    pub fn teardown(&mut self) {
        self.pipeline.cancel_token().cancel();
        self.discard_viewer();
        info!(tool = %self.context.tool(), "Tool page torn down");
    }

    fn discard_viewer(&mut self) {
        if let Some(viewer) = self.viewer.take() {
            viewer.close();
        }
        self.pending_order = None;
    }
}
