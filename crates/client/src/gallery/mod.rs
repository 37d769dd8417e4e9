//! Preview gallery module.
//!
//! This module handles everything shown inside the preview viewer:
//! - The working order of the files being previewed
//! - Batched, cancellable render passes
//! - Drag and touch gestures that swap items

pub mod item;
pub mod order;
pub mod renderer;
pub mod reorder;

pub use item::{GalleryItem, GalleryLayout, GallerySink, ItemContent};
pub use order::GalleryOrder;
pub use renderer::{
    FrameScheduler, GalleryRenderer, IntervalFrames, RenderStep, YieldFrames, FRAME_INTERVAL,
};
pub use reorder::{GestureResponse, HitTest, NoHitTest, ReorderController, ReorderMode};
