//! The preview viewer session.
//!
//! A viewer session owns everything that exists only while the preview is
//! open: the working gallery order, the renderer, the reorder controller and
//! the tracker of every preview URL handed out. Closing the session releases
//! those URLs and hands the order back to the page.

use protocol::{FileKind, GestureEvent, PipelineError, ToolId};
use tracing::{debug, info};

use crate::config::GalleryConfig;
use crate::files::{LocalObjectUrls, ObjectUrls, ResourceTracker, Selection};
use crate::gallery::{
    FrameScheduler, GalleryLayout, GalleryOrder, GalleryRenderer, GallerySink, GestureResponse,
    HitTest, ReorderController, ReorderMode, RenderStep,
};

/// What the viewer shows for the selection it was opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerMode {
    /// A reorderable gallery of every selected file.
    Gallery(GalleryLayout),
    /// The first file previewed as a document.
    SingleDocument { url: String },
    /// The first file previewed as an image.
    SingleImage { url: String },
    /// Nothing can be previewed.
    Unsupported { message: String },
}

impl ViewerMode {
    /// Galleries show the reorder toggle; single previews do not.
    pub fn shows_reorder_toggle(&self) -> bool {
        matches!(self, ViewerMode::Gallery(_))
    }
}

/// State of one open preview.
#[derive(Debug)]
pub struct ViewerSession<U: ObjectUrls = LocalObjectUrls> {
    tool: ToolId,
    mode: ViewerMode,
    order: GalleryOrder,
    renderer: GalleryRenderer,
    controller: ReorderController,
    tracker: ResourceTracker<U>,
    swaps: usize,
}

impl<U: ObjectUrls> ViewerSession<U> {
    /// Opens a viewer over the current selection.
    ///
    /// Galleries start rendering immediately; single previews acquire the
    /// first file's URL.
    pub fn open(
        tool: ToolId,
        selection: &Selection,
        urls: U,
        config: &GalleryConfig,
    ) -> Result<Self, PipelineError> {
        let first = selection.files().first().ok_or(PipelineError::NoFile)?;
        let class = selection.classify();
        let mut tracker = ResourceTracker::new(urls);

        let mode = if tool == ToolId::MergePdf && class.all_pdfs && class.len > 1 {
            ViewerMode::Gallery(GalleryLayout::PdfRows)
        } else if first.kind() == FileKind::Pdf {
            ViewerMode::SingleDocument {
                url: tracker.acquire(first),
            }
        } else if class.all_images && class.len > 1 {
            ViewerMode::Gallery(GalleryLayout::Thumbnails)
        } else if first.kind() == FileKind::Image {
            ViewerMode::SingleImage {
                url: tracker.acquire(first),
            }
        } else {
            ViewerMode::Unsupported {
                message: format!("Preview not supported for {}", first.name()),
            }
        };

        let layout = match mode {
            ViewerMode::Gallery(layout) => layout,
            _ => GalleryLayout::Thumbnails,
        };
        let mut renderer = GalleryRenderer::new(layout, config.batch_size);
        if mode.shows_reorder_toggle() {
            renderer.request();
        }

        info!(tool = %tool, files = selection.len(), mode = ?mode, "Viewer opened");
        Ok(Self {
            tool,
            mode,
            order: GalleryOrder::from_selection(selection),
            renderer,
            controller: ReorderController::new(config.touch_threshold),
            tracker,
            swaps: 0,
        })
    }

    pub fn tool(&self) -> ToolId {
        self.tool
    }

    pub fn mode(&self) -> &ViewerMode {
        &self.mode
    }

    pub fn is_gallery(&self) -> bool {
        self.mode.shows_reorder_toggle()
    }

    /// The working order.
    pub fn order(&self) -> &GalleryOrder {
        &self.order
    }

    pub fn reorder_mode(&self) -> ReorderMode {
        self.controller.mode()
    }

    pub fn controller(&self) -> &ReorderController {
        &self.controller
    }

    pub fn renderer(&self) -> &GalleryRenderer {
        &self.renderer
    }

    /// Number of swaps applied since the viewer opened.
    pub fn swaps(&self) -> usize {
        self.swaps
    }

    /// Number of preview URLs currently held.
    pub fn tracked_resources(&self) -> usize {
        self.tracker.len()
    }

    /// Flips the reorder toggle and re-renders so items pick up the new
    /// draggable state. Single previews have no toggle.
    pub fn toggle_reorder(&mut self) -> Option<ReorderMode> {
        if !self.is_gallery() {
            return None;
        }
        let mode = self.controller.toggle();
        self.rerender();
        Some(mode)
    }

    /// Feeds a gesture to the controller, applying any swap it produces.
    pub fn handle_gesture<H: HitTest + ?Sized>(
        &mut self,
        event: GestureEvent,
        hit: &H,
    ) -> GestureResponse {
        let response = self.controller.handle(event, hit);
        if let Some((a, b)) = response.swap {
            self.swap(a, b);
        }
        response
    }

    /// Exchanges two positions in the working order and re-renders.
    ///
    /// Only galleries can be reordered; single previews refuse every swap.
    pub fn swap(&mut self, a: usize, b: usize) -> bool {
        if !self.is_gallery() {
            debug!(from = a, to = b, mode = ?self.mode, "Swap ignored outside gallery");
            return false;
        }
        if !self.order.swap(a, b) {
            return false;
        }
        self.swaps += 1;
        info!(from = a, to = b, swaps = self.swaps, "Gallery items swapped");
        self.rerender();
        true
    }

    fn rerender(&mut self) {
        self.controller.unbind();
        if self.is_gallery() {
            self.renderer.request();
        }
    }

    /// Renders the next batch into `sink`.
    ///
    /// When the pass completes with reorder armed, gestures are bound to
    /// the freshly rendered items.
    pub fn render_step<S: GallerySink + ?Sized>(&mut self, sink: &mut S) -> RenderStep {
        let step = self.renderer.step(
            &self.order,
            self.controller.is_armed(),
            &mut self.tracker,
            sink,
        );
        if let RenderStep::Complete { total } = step {
            if self.controller.is_armed() {
                self.controller.bind(total);
            }
        }
        step
    }

    /// Runs the pending render pass to completion, one batch per frame.
    ///
    /// Returns the number of items rendered, or zero when nothing was
    /// pending.
    pub async fn render<S, F>(&mut self, sink: &mut S, frames: &mut F) -> usize
    where
        S: GallerySink + ?Sized,
        F: FrameScheduler,
    {
        loop {
            if !self.renderer.is_rendering() {
                return 0;
            }
            frames.next_frame().await;
            match self.render_step(sink) {
                RenderStep::Rendered { .. } => continue,
                RenderStep::Complete { total } => return total,
                RenderStep::Idle => return 0,
            }
        }
    }

    /// Preview URL for the item at `index`, created on demand.
    pub fn view_item(&mut self, index: usize) -> Option<String> {
        let file = self.order.get(index)?;
        debug!(index, file = %file.name(), "Viewing gallery item");
        Some(self.tracker.acquire(file))
    }

    /// Closes the viewer, releasing every preview URL, and returns the
    /// working order.
    pub fn close(mut self) -> GalleryOrder {
        let released = self.tracker.release_all();
        info!(
            tool = %self.tool,
            released,
            swaps = self.swaps,
            "Viewer closed"
        );
        self.order
    }
}
