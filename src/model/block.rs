//! Block-level content types.

use super::span::{spans_text, StyleSpan};
use super::TableGrid;
use serde::{Deserialize, Serialize};

/// A block-level element of the content model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A heading that opens a section
    Heading {
        /// Heading level (1 = chapter)
        level: u8,
        /// Heading text
        spans: Vec<StyleSpan>,
    },

    /// A text paragraph
    Paragraph {
        /// Paragraph text
        spans: Vec<StyleSpan>,
    },

    /// An ordered or unordered list
    List {
        /// Whether items are numbered
        ordered: bool,
        /// List items, each a sequence of blocks
        items: Vec<Vec<Block>>,
    },

    /// A table
    Table {
        /// Merge-resolved cell grid
        grid: TableGrid,
    },

    /// A reference to an entry of the model's image map
    Image {
        /// Image id
        id: String,
    },
}

impl Block {
    /// Create a plain-text heading.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            spans: vec![StyleSpan::plain(text)],
        }
    }

    /// Create a plain-text paragraph.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            spans: vec![StyleSpan::plain(text)],
        }
    }

    /// Create a list of single-paragraph items.
    pub fn list<S: Into<String>>(ordered: bool, items: impl IntoIterator<Item = S>) -> Self {
        Block::List {
            ordered,
            items: items
                .into_iter()
                .map(|text| vec![Block::paragraph(text)])
                .collect(),
        }
    }

    /// Get the heading level, if this is a heading.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Block::Heading { level, .. } => Some(*level),
            _ => None,
        }
    }

    /// Get plain text content.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading { spans, .. } | Block::Paragraph { spans } => spans_text(spans),
            Block::List { items, .. } => items
                .iter()
                .map(|item| {
                    item.iter()
                        .map(Block::plain_text)
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Table { grid } => grid.plain_text(),
            Block::Image { .. } => String::new(),
        }
    }
}
