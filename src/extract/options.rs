//! Extraction options.

use serde::{Deserialize, Serialize};

/// Default minimum pixel size for retained images.
pub const DEFAULT_MIN_IMAGE_SIZE: u32 = 50;

/// Options for DOCX extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Load embedded images and emit image blocks
    pub extract_images: bool,

    /// Emit tables as grids (otherwise cell text becomes paragraphs)
    pub extract_tables: bool,

    /// Images with a width or height below this many pixels are discarded
    pub min_image_size: u32,

    /// Title used when the package has no core-properties title
    pub fallback_title: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            extract_images: true,
            extract_tables: true,
            min_image_size: DEFAULT_MIN_IMAGE_SIZE,
            fallback_title: None,
        }
    }
}

impl ExtractOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable table extraction.
    pub fn with_tables(mut self, extract: bool) -> Self {
        self.extract_tables = extract;
        self
    }

    /// Set the minimum image size in pixels.
    pub fn with_min_image_size(mut self, size: u32) -> Self {
        self.min_image_size = size;
        self
    }

    /// Set the fallback title.
    pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
        self.fallback_title = Some(title.into());
        self
    }

    /// Text-only extraction: no images, tables flattened.
    pub fn text_only() -> Self {
        Self::default().with_images(false).with_tables(false)
    }
}
