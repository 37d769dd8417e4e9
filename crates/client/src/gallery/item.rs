//! Rendered gallery items.

use protocol::FileId;
use serde::Serialize;

/// How the gallery presents its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GalleryLayout {
    /// Compact metadata rows for documents, previewed on demand.
    PdfRows,
    /// Image thumbnails backed by preview URLs.
    Thumbnails,
}

/// Visual content of one gallery item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemContent {
    /// Name and size with a "view" affordance; no URL until viewed.
    PdfRow { name: String, size_kb: u64 },
    /// Thumbnail image.
    Thumbnail {
        url: String,
        /// Load only when scrolled into view.
        lazy_load: bool,
        /// Decode off the main thread.
        async_decode: bool,
    },
}

/// One item produced by a render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryItem {
    /// Position in the gallery order when this item was rendered.
    pub index: usize,
    #[serde(skip)]
    pub file_id: FileId,
    /// Whether pointer-drag is enabled on the item.
    pub draggable: bool,
    pub content: ItemContent,
}

/// Target that receives rendered batches.
pub trait GallerySink {
    /// Removes every item.
    fn clear(&mut self);

    /// Appends a batch after the items already present.
    fn append(&mut self, batch: Vec<GalleryItem>);
}

impl GallerySink for Vec<GalleryItem> {
    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn append(&mut self, batch: Vec<GalleryItem>) {
        self.extend(batch);
    }
}
