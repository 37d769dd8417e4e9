//! The ordered multi-file selection.

use protocol::{check_cumulative_size, FileHandle, FileKind, PipelineError, ToolId};
use tracing::{info, warn};

/// Placeholder shown in the file list when nothing is selected.
pub const EMPTY_LIST_PLACEHOLDER: &str = "No files selected";

/// Placeholder shown in the file list after an oversize selection.
pub const OVERSIZE_LIST_PLACEHOLDER: &str = "File too large. Reduce size.";

/// Derived facts about the selection's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionClass {
    pub len: usize,
    pub all_images: bool,
    pub all_pdfs: bool,
}

impl SelectionClass {
    /// Whether every entry is of `kind` (false for an empty selection).
    pub fn is_all(&self, kind: FileKind) -> bool {
        match kind {
            FileKind::Pdf => self.all_pdfs,
            FileKind::Image => self.all_images,
            FileKind::Other => false,
        }
    }

    /// Whether the multi-file reorder hint applies for `tool`.
    ///
    /// A single entry never shows a reorder hint.
    pub fn shows_reorder_hint(&self, tool: ToolId) -> bool {
        self.len > 1
            && tool
                .reorderable_kind()
                .is_some_and(|kind| self.is_all(kind))
    }
}

/// One row of the file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileListEntry {
    /// Position in the selection; the remove affordance targets this index.
    pub index: usize,
    pub name: String,
    pub size_kb: u64,
}

/// Ordered sequence of selected files; the single source of truth for order.
#[derive(Debug, Clone)]
pub struct Selection {
    files: Vec<FileHandle>,
    ceiling: u64,
}

impl Selection {
    /// Creates an empty selection limited to `ceiling` cumulative bytes.
    pub fn new(ceiling: u64) -> Self {
        Self {
            files: Vec::new(),
            ceiling,
        }
    }

    /// Replaces the selection wholesale.
    ///
    /// When the running total crosses the ceiling the whole input is rejected
    /// and the selection is left empty, mirroring a reset selection control.
    pub fn set_from(&mut self, raw: Vec<FileHandle>) -> Result<(), PipelineError> {
        match check_cumulative_size(&raw, self.ceiling) {
            Ok(total) => {
                info!(files = raw.len(), total_bytes = total, "Selection replaced");
                self.files = raw;
                Ok(())
            }
            Err(err) => {
                warn!(files = raw.len(), ceiling = self.ceiling, "Selection rejected: {}", err);
                self.files.clear();
                Err(err)
            }
        }
    }

    /// Removes the entry at `index`, returning it if it existed.
    pub fn remove_at(&mut self, index: usize) -> Option<FileHandle> {
        if index >= self.files.len() {
            return None;
        }
        let removed = self.files.remove(index);
        info!(index, file = %removed.name(), remaining = self.files.len(), "Removed file from selection");
        Some(removed)
    }

    /// Replaces the order with a committed gallery order.
    pub(crate) fn commit_order(&mut self, order: Vec<FileHandle>) {
        self.files = order;
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[FileHandle] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Active cumulative size ceiling in bytes.
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Cumulative size of the selected files.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(FileHandle::byte_size).sum()
    }

    /// Classifies the selection's contents.
    pub fn classify(&self) -> SelectionClass {
        let non_empty = !self.files.is_empty();
        SelectionClass {
            len: self.files.len(),
            all_images: non_empty && self.files.iter().all(|f| f.kind() == FileKind::Image),
            all_pdfs: non_empty && self.files.iter().all(|f| f.kind() == FileKind::Pdf),
        }
    }

    /// Rows for the file list view.
    pub fn file_list(&self) -> Vec<FileListEntry> {
        self.files
            .iter()
            .enumerate()
            .map(|(index, file)| FileListEntry {
                index,
                name: file.name().to_string(),
                size_kb: file.size_kb(),
            })
            .collect()
    }
}
