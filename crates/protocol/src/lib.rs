//! # PandaTools Protocol Library
//!
//! This crate describes the contract between the PandaTools client and the
//! remote document processing service, and the data model shared by every
//! stage of the client pipeline.
//!
//! ## Overview
//!
//! - **Tool Catalog**: every endpoint, its form fields, size ceiling and result
//! - **File Handles**: immutable references to user-selected blobs
//! - **Requests**: validated submissions built from a selection
//! - **Messages**: gesture and transfer events, submission outcomes
//! - **Errors**: the validation / transport / service / content taxonomy
//!
//! ## Service Contract
//!
//! ```text
//! POST {base}/{tool}            multipart/form-data
//! ├── file | files (repeated)   input blobs, in selection order
//! └── ranges | angle | password | level | pages   (tool specific)
//!
//! 2xx  → binary artifact (extract-text: JSON {"text", "filename"?})
//! else → {"error": "..."} or a text/HTML body
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use protocol::{FileHandle, ToolId, TransferRequest};
//!
//! let files = vec![
//!     FileHandle::from_bytes("a.pdf", "application/pdf", b"%PDF-a".to_vec()),
//!     FileHandle::from_bytes("b.pdf", "application/pdf", b"%PDF-b".to_vec()),
//! ];
//! let tool: ToolId = "merge-pdf".parse().unwrap();
//! let request = TransferRequest::build(tool, &files, &BTreeMap::new()).unwrap();
//! assert_eq!(request.file_field(), "files");
//! assert_eq!(tool.derive_filename(request.first_file_name()), "merged.pdf");
//! ```
//!
//! ## Modules
//!
//! - [`tools`]: Tool catalog and filename derivation
//! - [`files`]: File handles and content classification
//! - [`request`]: Request construction and size checks
//! - [`pages`]: Page list validation
//! - [`messages`]: Events and outcomes
//! - [`error`]: Error types

pub mod error;
pub mod files;
pub mod messages;
pub mod pages;
pub mod request;
pub mod tools;

pub use error::{ErrorClass, PipelineError, Result, GENERIC_FAILURE_MESSAGE, NETWORK_ERROR_MESSAGE};
pub use files::{mime_from_name, FileHandle, FileId, FileKind, FileSource};
pub use messages::{Artifact, GestureEvent, Point, TransferEvent, TransferOutcome};
pub use pages::validate_pages;
pub use request::{check_cumulative_size, TransferRequest};
pub use tools::{
    ArtifactKind, ParamFormat, ParamSpec, ToolId, DEFAULT_SIZE_CEILING, ELEVATED_SIZE_CEILING,
};
