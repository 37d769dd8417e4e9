//! Session module.
//!
//! This module provides the explicit owners of per-page state. A tool page
//! owns the selection and the transfer pipeline; a viewer session owns the
//! preview gallery and is created and torn down by explicit open/close
//! calls.

pub mod page;
pub mod viewer;

pub use page::{FileListView, ToolContext, ToolPage, TOOL_QUERY_PARAM};
pub use viewer::{ViewerMode, ViewerSession};
