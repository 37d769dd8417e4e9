//! Incremental gallery rendering.
//!
//! A render pass clears the sink and appends the gallery order in fixed-size
//! batches, yielding to the frame scheduler between batches so input and
//! layout can interleave. Requesting a render while a pass is in flight
//! abandons that pass and starts over from the current order; passes are
//! never patched.

use std::time::Duration;

use protocol::FileHandle;
use tracing::{debug, trace};

use super::item::{GalleryItem, GalleryLayout, GallerySink, ItemContent};
use super::order::GalleryOrder;
use crate::files::{ObjectUrls, ResourceTracker};

/// Frame duration used by [`IntervalFrames`] (about 60 frames per second).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Platform facility that resumes work on the next frame.
#[allow(async_fn_in_trait)]
pub trait FrameScheduler {
    /// Suspends until the next frame.
    async fn next_frame(&mut self);
}

/// Yields to the async runtime between batches without waiting.
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldFrames;

impl FrameScheduler for YieldFrames {
    async fn next_frame(&mut self) {
        tokio::task::yield_now().await;
    }
}

/// Paces batches on a fixed frame interval.
pub struct IntervalFrames {
    interval: tokio::time::Interval,
}

impl IntervalFrames {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl Default for IntervalFrames {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}

impl FrameScheduler for IntervalFrames {
    async fn next_frame(&mut self) {
        self.interval.tick().await;
    }
}

/// Result of rendering one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStep {
    /// A batch was appended and more remain.
    Rendered { items: usize },
    /// The final batch was appended; the pass is finished.
    Complete { total: usize },
    /// No pass is in flight.
    Idle,
}

#[derive(Debug, Clone, Copy)]
struct RenderPass {
    generation: u64,
    next: usize,
    cleared: bool,
}

/// Schedules gallery render passes in batches.
#[derive(Debug)]
pub struct GalleryRenderer {
    layout: GalleryLayout,
    batch_size: usize,
    pass: Option<RenderPass>,
    generation: u64,
}

impl GalleryRenderer {
    pub fn new(layout: GalleryLayout, batch_size: usize) -> Self {
        Self {
            layout,
            batch_size: batch_size.max(1),
            pass: None,
            generation: 0,
        }
    }

    pub fn layout(&self) -> GalleryLayout {
        self.layout
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Starts a fresh pass, replacing any pass in flight.
    pub fn request(&mut self) {
        self.generation += 1;
        if let Some(stale) = self.pass {
            debug!(
                generation = stale.generation,
                rendered = stale.next,
                "Superseding in-flight render pass"
            );
        }
        self.pass = Some(RenderPass {
            generation: self.generation,
            next: 0,
            cleared: false,
        });
    }

    /// Whether a pass is in flight.
    pub fn is_rendering(&self) -> bool {
        self.pass.is_some()
    }

    /// Number of passes requested so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Renders the next batch of the current pass into `sink`.
    ///
    /// The first batch of a pass clears the sink before appending.
    pub fn step<U, S>(
        &mut self,
        order: &GalleryOrder,
        draggable: bool,
        tracker: &mut ResourceTracker<U>,
        sink: &mut S,
    ) -> RenderStep
    where
        U: ObjectUrls,
        S: GallerySink + ?Sized,
    {
        let Some(mut pass) = self.pass else {
            return RenderStep::Idle;
        };

        if !pass.cleared {
            sink.clear();
            pass.cleared = true;
            debug!(
                generation = pass.generation,
                items = order.len(),
                batch_size = self.batch_size,
                "Render pass started"
            );
        }

        let start = pass.next.min(order.len());
        let end = (start + self.batch_size).min(order.len());
        let batch: Vec<GalleryItem> = order.files()[start..end]
            .iter()
            .enumerate()
            .map(|(offset, file)| self.render_item(start + offset, file, draggable, tracker))
            .collect();
        let items = batch.len();
        sink.append(batch);
        pass.next = end;
        trace!(generation = pass.generation, start, end, "Rendered batch");

        if end >= order.len() {
            self.pass = None;
            debug!(generation = pass.generation, total = end, "Render pass complete");
            RenderStep::Complete { total: end }
        } else {
            self.pass = Some(pass);
            RenderStep::Rendered { items }
        }
    }

    fn render_item<U: ObjectUrls>(
        &self,
        index: usize,
        file: &FileHandle,
        draggable: bool,
        tracker: &mut ResourceTracker<U>,
    ) -> GalleryItem {
        let content = match self.layout {
            GalleryLayout::PdfRows => ItemContent::PdfRow {
                name: file.name().to_string(),
                size_kb: file.size_kb(),
            },
            GalleryLayout::Thumbnails => ItemContent::Thumbnail {
                url: tracker.acquire(file),
                lazy_load: true,
                async_decode: true,
            },
        };
        GalleryItem {
            index,
            file_id: file.id(),
            draggable,
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::LocalObjectUrls;

    fn images(n: usize) -> GalleryOrder {
        GalleryOrder::new(
            (0..n)
                .map(|i| FileHandle::from_bytes(format!("{i}.png"), "image/png", vec![0u8; 4]))
                .collect(),
        )
    }

    fn drain<S: GallerySink>(
        renderer: &mut GalleryRenderer,
        order: &GalleryOrder,
        tracker: &mut ResourceTracker<LocalObjectUrls>,
        sink: &mut S,
    ) -> usize {
        let mut steps = 0;
        loop {
            steps += 1;
            match renderer.step(order, false, tracker, sink) {
                RenderStep::Rendered { .. } => continue,
                RenderStep::Complete { .. } | RenderStep::Idle => return steps,
            }
        }
    }

    #[test]
    fn test_idle_without_request() {
        let mut renderer = GalleryRenderer::new(GalleryLayout::Thumbnails, 20);
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let mut sink = Vec::new();
        assert_eq!(
            renderer.step(&images(3), false, &mut tracker, &mut sink),
            RenderStep::Idle
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_renders_in_batches() {
        let order = images(45);
        let mut renderer = GalleryRenderer::new(GalleryLayout::Thumbnails, 20);
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let mut sink = Vec::new();

        renderer.request();
        assert_eq!(
            renderer.step(&order, false, &mut tracker, &mut sink),
            RenderStep::Rendered { items: 20 }
        );
        assert_eq!(sink.len(), 20);
        assert_eq!(
            renderer.step(&order, false, &mut tracker, &mut sink),
            RenderStep::Rendered { items: 20 }
        );
        assert_eq!(
            renderer.step(&order, false, &mut tracker, &mut sink),
            RenderStep::Complete { total: 45 }
        );
        assert!(!renderer.is_rendering());

        let indices: Vec<_> = sink.iter().map(|item| item.index).collect();
        assert_eq!(indices, (0..45).collect::<Vec<_>>());
        assert_eq!(tracker.len(), 45);
    }

    #[test]
    fn test_empty_order_completes_immediately() {
        let mut renderer = GalleryRenderer::new(GalleryLayout::PdfRows, 20);
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let mut sink = Vec::new();
        renderer.request();
        assert_eq!(
            renderer.step(&images(0), false, &mut tracker, &mut sink),
            RenderStep::Complete { total: 0 }
        );
    }

    #[test]
    fn test_rerender_clears_and_rebuilds() {
        let order = images(5);
        let mut renderer = GalleryRenderer::new(GalleryLayout::Thumbnails, 2);
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let mut sink = Vec::new();

        renderer.request();
        drain(&mut renderer, &order, &mut tracker, &mut sink);
        let first: Vec<_> = sink.clone();

        renderer.request();
        drain(&mut renderer, &order, &mut tracker, &mut sink);

        assert_eq!(sink, first);
        assert_eq!(tracker.len(), 5);
    }

    #[test]
    fn test_request_during_pass_restarts() {
        let mut order = images(6);
        let mut renderer = GalleryRenderer::new(GalleryLayout::Thumbnails, 2);
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let mut sink = Vec::new();

        renderer.request();
        renderer.step(&order, false, &mut tracker, &mut sink);
        assert_eq!(sink.len(), 2);

        order.swap(0, 5);
        renderer.request();
        drain(&mut renderer, &order, &mut tracker, &mut sink);

        assert_eq!(sink.len(), 6);
        let ids: Vec<_> = sink.iter().map(|item| item.file_id).collect();
        let expected: Vec<_> = order.files().iter().map(|f| f.id()).collect();
        assert_eq!(ids, expected);
        assert_eq!(renderer.generation(), 2);
    }

    #[test]
    fn test_pdf_rows_do_not_acquire_urls() {
        let order = GalleryOrder::new(vec![
            FileHandle::from_path("/x/a.pdf", 2048),
            FileHandle::from_path("/x/b.pdf", 4096),
        ]);
        let mut renderer = GalleryRenderer::new(GalleryLayout::PdfRows, 20);
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let mut sink = Vec::new();

        renderer.request();
        renderer.step(&order, true, &mut tracker, &mut sink);

        assert!(tracker.is_empty());
        assert_eq!(
            sink[1].content,
            ItemContent::PdfRow {
                name: "b.pdf".into(),
                size_kb: 4
            }
        );
        assert!(sink.iter().all(|item| item.draggable));
    }

    #[test]
    fn test_thumbnails_are_lazy() {
        let order = images(1);
        let mut renderer = GalleryRenderer::new(GalleryLayout::Thumbnails, 20);
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let mut sink = Vec::new();

        renderer.request();
        renderer.step(&order, false, &mut tracker, &mut sink);

        match &sink[0].content {
            ItemContent::Thumbnail {
                url,
                lazy_load,
                async_decode,
            } => {
                assert_eq!(tracker.get(&order.files()[0]), Some(url.as_str()));
                assert!(*lazy_load && *async_decode);
            }
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_yield_frames_resumes() {
        let mut frames = YieldFrames;
        frames.next_frame().await;
        frames.next_frame().await;
    }
}
