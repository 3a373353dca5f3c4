//! Where collection items come from.
//!
//! A source lists its items, resolves each one to raw content on demand, and describes
//! the payload stored next to the item's vector.

mod colors;
mod images;

pub use colors::ColorSource;
pub use images::{ImageSourceConfig, ImageStorage, ObjectStoreImageSource, image_format};

use async_trait::async_trait;

use crate::error::VectorSearchResult;
use crate::models::Payload;

/// One entry of a source, identified by name (a color, a file or blob path)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    pub name: String,
}

impl SourceItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Raw content handed to the embedding provider
#[derive(Debug, Clone, PartialEq)]
pub enum SourceContent {
    Text(String),
    Image { bytes: Vec<u8>, format: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Every item to embed, in insertion order
    async fn list(&self) -> VectorSearchResult<Vec<SourceItem>>;

    /// Load the item's content; a missing file or blob is `ContentNotFound`
    async fn resolve(&self, item: &SourceItem) -> VectorSearchResult<SourceContent>;

    /// Payload for the point at 1-based `position` among embedded items
    fn payload(&self, item: &SourceItem, content: &SourceContent, position: u64) -> Payload;
}
