//! # PandaTools Client Library
//!
//! This crate provides the client-side file pipeline for PandaTools: the
//! user picks local files, previews and reorders them, and sends them to a
//! remote processing service that returns a single artifact to download.
//!
//! ## Overview
//!
//! - **Resource Tracking**: Preview URLs created on demand and always released
//! - **Selection**: Ordered multi-file selection with a cumulative size ceiling
//! - **Gallery**: Batched rendering that yields between frames
//! - **Reordering**: Drag and touch gestures that swap gallery items
//! - **Transfer**: Streaming multipart upload with progress and response
//!   classification
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Tool Page                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌─────────────┐      ┌──────────────────────────────────┐   │
//! │  │  Selection  │─────▶│          Viewer Session          │   │
//! │  └─────────────┘      │  ┌────────┐ ┌────────┐ ┌───────┐ │   │
//! │         ▲             │  │Renderer│ │Reorder │ │Tracker│ │   │
//! │         │ commit      │  └────────┘ └────────┘ └───────┘ │   │
//! │         └─────────────┴──────────────────────────────────┘   │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          Transfer Pipeline ──▶ Transport (HTTP)        │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::path::PathBuf;
//!
//! use client::{Config, HttpTransport, ToolContext, ToolPage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let transport = HttpTransport::from_config(&config.service)?;
//!
//!     let context = ToolContext::from_query("?tool=merge-pdf")?;
//!     let mut page: ToolPage<_> = ToolPage::new(context, transport, config.gallery.clone());
//!
//!     let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//!     let files = client::files::capture_paths(&paths).await?;
//!     page.select(files)?;
//!
//!     let outcome = page.submit(&BTreeMap::new()).await;
//!     println!("{:?}", outcome.message());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`files`]: File capture, selection and preview URL tracking
//! - [`gallery`]: Gallery order, renderer and reorder controller
//! - [`session`]: Tool page and viewer session lifecycles
//! - [`transfer`]: Upload pipeline, HTTP transport and downloads

pub mod config;
pub mod files;
pub mod gallery;
pub mod session;
pub mod transfer;

// Re-export protocol for convenience
pub use protocol;

// Re-export config types for convenience
pub use config::{Config, ConfigError};

// Re-export file types for convenience
pub use files::{LocalObjectUrls, ObjectUrls, ResourceTracker, Selection};

// Re-export gallery types for convenience
pub use gallery::{
    FrameScheduler, GalleryItem, GalleryLayout, GalleryOrder, GalleryRenderer, GallerySink,
    GestureResponse, HitTest, ItemContent, ReorderController, ReorderMode, RenderStep,
};

// Re-export session types for convenience
pub use session::{FileListView, ToolContext, ToolPage, ViewerMode, ViewerSession};

// Re-export transfer types for convenience
pub use transfer::{
    ArtifactSink, DirectorySink, HttpTransport, ServiceResponse, TransferPipeline, TransferState,
    Transport,
};
