//! Rendering result with metadata and statistics.

use crate::model::{Block, ContentModel, Metadata};
use serde::{Deserialize, Serialize};

/// Result of rendering a document, including content and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// The rendered markup
    pub content: String,

    /// Document metadata (copied from the content model)
    pub metadata: Metadata,

    /// Content statistics
    pub stats: ExtractionStats,
}

impl RenderResult {
    /// Create a new render result.
    pub fn new(content: String, metadata: Metadata, stats: ExtractionStats) -> Self {
        Self {
            content,
            metadata,
            stats,
        }
    }
}

/// Statistics about extracted content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Number of paragraphs (list item paragraphs included)
    pub paragraph_count: u32,

    /// Number of headings
    pub heading_count: u32,

    /// Number of level-1 headings
    pub chapter_count: u32,

    /// Number of tables
    pub table_count: u32,

    /// Number of retained images
    pub image_count: u32,

    /// Number of list items
    pub list_item_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl ExtractionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect statistics from a content model.
    pub fn from_model(model: &ContentModel) -> Self {
        let mut stats = Self::new();
        for block in model.walk() {
            match block {
                Block::Heading { level, .. } => {
                    stats.heading_count += 1;
                    if *level == 1 {
                        stats.chapter_count += 1;
                    }
                }
                Block::Paragraph { .. } => stats.paragraph_count += 1,
                Block::List { items, .. } => stats.list_item_count += items.len() as u32,
                Block::Table { .. } => stats.table_count += 1,
                Block::Image { .. } => {}
            }
            stats.count_text(&block_text(block));
        }
        stats.image_count = model.images.len() as u32;
        stats
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Number of content blocks counted, images excluded.
    pub fn block_count(&self) -> u32 {
        self.paragraph_count + self.heading_count + self.table_count
    }
}

/// Text owned directly by a block; list text is counted through the
/// walked item blocks instead.
fn block_text(block: &Block) -> String {
    match block {
        Block::List { .. } => String::new(),
        other => other.plain_text(),
    }
}
