//! Working copy of the selection's order while the viewer is open.

use protocol::FileHandle;

use crate::files::Selection;

/// Ordered working copy of the selection used by the preview gallery.
///
/// Positions are the only identity the gallery exposes; every render pass
/// assigns item indices from this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryOrder {
    files: Vec<FileHandle>,
}

impl GalleryOrder {
    pub fn new(files: Vec<FileHandle>) -> Self {
        Self { files }
    }

    /// Copies the selection's current order.
    pub fn from_selection(selection: &Selection) -> Self {
        Self::new(selection.files().to_vec())
    }

    /// Exchanges the files at `a` and `b`.
    ///
    /// Returns `false` without changing anything when `a == b` or either
    /// index is out of range.
    pub fn swap(&mut self, a: usize, b: usize) -> bool {
        if a == b || a >= self.files.len() || b >= self.files.len() {
            return false;
        }
        self.files.swap(a, b);
        true
    }

    pub fn files(&self) -> &[FileHandle] {
        &self.files
    }

    pub fn get(&self, index: usize) -> Option<&FileHandle> {
        self.files.get(index)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<FileHandle> {
        self.files
    }
}
