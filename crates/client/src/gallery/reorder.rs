//! Gesture interpretation for reordering gallery items.
//!
//! The controller is either `Locked` (gestures are ignored so scrolling and
//! tapping behave normally) or `Armed` (gestures produce swaps). It never
//! touches the gallery order itself; it reports which positions to swap.

use protocol::{GestureEvent, Point};
use tracing::{debug, trace};

use crate::config::DEFAULT_TOUCH_THRESHOLD;

/// Reorder toggle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderMode {
    Locked,
    Armed,
}

/// Resolves which rendered item lies under a viewport point.
pub trait HitTest {
    fn item_at(&self, point: Point) -> Option<usize>;
}

impl<F> HitTest for F
where
    F: Fn(Point) -> Option<usize>,
{
    fn item_at(&self, point: Point) -> Option<usize> {
        self(point)
    }
}

/// Hit-testing for hosts that only ever deliver pointer-drag events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHitTest;

impl HitTest for NoHitTest {
    fn item_at(&self, _point: Point) -> Option<usize> {
        None
    }
}

/// What the host should do in response to a gesture event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureResponse {
    /// Positions to exchange in the gallery order.
    pub swap: Option<(usize, usize)>,
    /// Whether the platform's default action (scrolling, drag rejection)
    /// must be suppressed for this event.
    pub suppress_default: bool,
}

impl GestureResponse {
    fn suppress() -> Self {
        Self {
            swap: None,
            suppress_default: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TouchIntent {
    Undecided,
    Scroll,
    Reorder,
}

#[derive(Debug, Clone, Copy)]
struct TouchTrack {
    origin: usize,
    start: Point,
    intent: TouchIntent,
}

/// Interprets drag and touch gestures against rendered gallery items.
#[derive(Debug)]
pub struct ReorderController {
    mode: ReorderMode,
    pointer_origin: Option<usize>,
    touch: Option<TouchTrack>,
    bound_items: usize,
    threshold: f32,
}

impl Default for ReorderController {
    fn default() -> Self {
        Self::new(DEFAULT_TOUCH_THRESHOLD)
    }
}

impl ReorderController {
    /// Creates a locked controller with the given touch threshold in pixels.
    pub fn new(threshold: f32) -> Self {
        Self {
            mode: ReorderMode::Locked,
            pointer_origin: None,
            touch: None,
            bound_items: 0,
            threshold,
        }
    }

    pub fn mode(&self) -> ReorderMode {
        self.mode
    }

    pub fn is_armed(&self) -> bool {
        self.mode == ReorderMode::Armed
    }

    /// Index recorded by the last drag start, if a drag is in progress.
    pub fn pointer_origin(&self) -> Option<usize> {
        self.pointer_origin
    }

    /// Number of rendered items gestures are currently bound to.
    pub fn bound_items(&self) -> usize {
        self.bound_items
    }

    /// Flips between `Locked` and `Armed`, discarding any gesture in progress.
    pub fn toggle(&mut self) -> ReorderMode {
        self.mode = match self.mode {
            ReorderMode::Locked => ReorderMode::Armed,
            ReorderMode::Armed => ReorderMode::Locked,
        };
        self.pointer_origin = None;
        self.touch = None;
        debug!(mode = ?self.mode, "Reorder mode toggled");
        self.mode
    }

    /// Binds gestures to a freshly rendered set of `items`.
    pub fn bind(&mut self, items: usize) {
        self.bound_items = items;
        trace!(items, "Gestures bound to rendered items");
    }

    /// Detaches from the current item set; called when a new render starts.
    pub fn unbind(&mut self) {
        self.bound_items = 0;
        self.pointer_origin = None;
        self.touch = None;
    }

    fn is_bound(&self, index: usize) -> bool {
        index < self.bound_items
    }

    /// Interprets one gesture event.
    pub fn handle<H: HitTest + ?Sized>(&mut self, event: GestureEvent, hit: &H) -> GestureResponse {
        if !self.is_armed() {
            return GestureResponse::default();
        }

        match event {
            GestureEvent::DragStart { index } => {
                if self.is_bound(index) {
                    self.pointer_origin = Some(index);
                }
                GestureResponse::default()
            }
            GestureEvent::DragOver { index } => {
                if self.pointer_origin.is_some() && self.is_bound(index) {
                    GestureResponse::suppress()
                } else {
                    GestureResponse::default()
                }
            }
            GestureEvent::Drop { index } => {
                let Some(origin) = self.pointer_origin.take() else {
                    return GestureResponse::default();
                };
                if !self.is_bound(index) {
                    return GestureResponse::default();
                }
                GestureResponse {
                    swap: (origin != index).then_some((origin, index)),
                    suppress_default: true,
                }
            }
            GestureEvent::DragEnd => {
                self.pointer_origin = None;
                GestureResponse::default()
            }
            GestureEvent::TouchStart { index, point } => {
                self.touch = self.is_bound(index).then_some(TouchTrack {
                    origin: index,
                    start: point,
                    intent: TouchIntent::Undecided,
                });
                GestureResponse::default()
            }
            GestureEvent::TouchMove { point } => self.touch_move(point),
            GestureEvent::TouchEnd { point } => self.touch_end(point, hit),
            GestureEvent::TouchCancel => {
                self.touch = None;
                GestureResponse::default()
            }
        }
    }

    fn touch_move(&mut self, point: Point) -> GestureResponse {
        let threshold = self.threshold;
        let Some(track) = self.touch.as_mut() else {
            return GestureResponse::default();
        };

        if track.intent == TouchIntent::Undecided {
            let dx = (point.x - track.start.x).abs();
            let dy = (point.y - track.start.y).abs();
            if dx.hypot(dy) > threshold {
                track.intent = if dy > dx {
                    TouchIntent::Reorder
                } else {
                    TouchIntent::Scroll
                };
                trace!(origin = track.origin, intent = ?track.intent, "Touch intent decided");
            }
        }

        if track.intent == TouchIntent::Reorder {
            GestureResponse::suppress()
        } else {
            GestureResponse::default()
        }
    }

    fn touch_end<H: HitTest + ?Sized>(&mut self, point: Point, hit: &H) -> GestureResponse {
        let Some(track) = self.touch.take() else {
            return GestureResponse::default();
        };
        if track.intent != TouchIntent::Reorder {
            return GestureResponse::default();
        }

        let swap = hit
            .item_at(point)
            .filter(|&target| self.is_bound(target) && target != track.origin)
            .map(|target| (track.origin, target));
        GestureResponse {
            swap,
            suppress_default: true,
        }
    }
}
