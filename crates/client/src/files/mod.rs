//! File selection module.
//!
//! This module provides the client-side view of the user's files:
//! - Capturing local files as immutable handles
//! - The ordered selection with its cumulative size ceiling
//! - Preview URL tracking with guaranteed release

pub mod loader;
pub mod selection;
pub mod tracker;

pub use loader::{capture_path, capture_paths, read_all, LoadError};
pub use selection::{
    FileListEntry, Selection, SelectionClass, EMPTY_LIST_PLACEHOLDER, OVERSIZE_LIST_PLACEHOLDER,
};
pub use tracker::{LocalObjectUrls, ObjectUrls, ResourceTracker, LOCAL_URL_PREFIX};
