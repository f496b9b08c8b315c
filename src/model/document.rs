//! Document-level types.

use super::{Block, ImageAsset};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical in-memory representation of an extracted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentModel {
    /// Document title
    pub title: String,

    /// Document metadata (authors, dates, etc.)
    pub metadata: Metadata,

    /// Content blocks in reading order
    pub blocks: Vec<Block>,

    /// Retained images keyed by stable image id
    pub images: BTreeMap<String, ImageAsset>,
}

impl ContentModel {
    /// Create a new empty model with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Add a block to the model.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Add an image to the model.
    pub fn add_image(&mut self, id: impl Into<String>, image: ImageAsset) {
        self.images.insert(id.into(), image);
    }

    /// Get an image by ID.
    pub fn get_image(&self, id: &str) -> Option<&ImageAsset> {
        self.images.get(id)
    }

    /// Check if the model has no content blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Image ids referenced by blocks, in reading order (lists included).
    pub fn image_refs(&self) -> Vec<&str> {
        fn collect<'a>(blocks: &'a [Block], out: &mut Vec<&'a str>) {
            for block in blocks {
                match block {
                    Block::Image { id } => out.push(id),
                    Block::List { items, .. } => {
                        for item in items {
                            collect(item, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        let mut refs = Vec::new();
        collect(&self.blocks, &mut refs);
        refs
    }

    /// Verify that every image block resolves to an entry in `images`.
    pub fn check_references(&self) -> Result<()> {
        match self
            .image_refs()
            .into_iter()
            .find(|id| !self.images.contains_key(*id))
        {
            Some(id) => Err(Error::Generation(format!(
                "image block references unknown image '{}'",
                id
            ))),
            None => Ok(()),
        }
    }

    /// Number of table blocks (lists included).
    pub fn table_count(&self) -> usize {
        self.walk().filter(|b| matches!(b, Block::Table { .. })).count()
    }

    /// Number of heading blocks.
    pub fn heading_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Heading { .. }))
            .count()
    }

    /// Iterate over every block, descending into list items.
    pub fn walk(&self) -> impl Iterator<Item = &Block> {
        let mut stack: Vec<&Block> = self.blocks.iter().rev().collect();
        std::iter::from_fn(move || {
            let block = stack.pop()?;
            if let Block::List { items, .. } = block {
                for item in items.iter().rev() {
                    stack.extend(item.iter().rev());
                }
            }
            Some(block)
        })
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Document metadata from the package core properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document authors
    pub authors: Vec<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Description
    pub description: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Keywords split on commas and semicolons.
    pub fn keyword_list(&self) -> Vec<&str> {
        self.keywords
            .as_deref()
            .map(|k| {
                k.split([',', ';'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
