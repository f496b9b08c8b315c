//! Embedded image assets.

use serde::{Deserialize, Serialize};

/// An image loaded from the source package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Raw binary data
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,

    /// Detected image format
    pub format: ImageFormat,

    /// Width in pixels, when the format could be probed
    pub width: Option<u32>,

    /// Height in pixels, when the format could be probed
    pub height: Option<u32>,

    /// Caption taken from an adjacent caption paragraph
    pub caption: Option<String>,

    /// Alternative text from the drawing properties
    pub alt_text: Option<String>,

    /// Part name inside the source package (e.g., "word/media/image1.png")
    pub source_part: String,
}

impl ImageAsset {
    /// Create a new image asset, detecting the format from the data.
    pub fn new(data: Vec<u8>, source_part: impl Into<String>) -> Self {
        let source_part = source_part.into();
        let format = ImageFormat::detect(&data)
            .or_else(|| ImageFormat::from_part_name(&source_part))
            .unwrap_or(ImageFormat::Other);
        Self {
            data,
            format,
            width: None,
            height: None,
            caption: None,
            alt_text: None,
            source_part,
        }
    }

    /// Set image dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Set alternative text.
    pub fn with_alt_text(mut self, alt: impl Into<String>) -> Self {
        self.alt_text = Some(alt.into());
        self
    }

    /// Get the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Packaged filename for this image: the stable id plus the format extension.
    pub fn filename(&self, id: &str) -> String {
        format!("{}.{}", id, self.format.extension())
    }

    /// Whether at least one dimension reaches the given minimum.
    ///
    /// Only images below the minimum in both dimensions fail. Images
    /// without probed dimensions always pass.
    pub fn meets_min_size(&self, min: u32) -> bool {
        match (self.width, self.height) {
            (Some(w), Some(h)) => !(w < min && h < min),
            _ => true,
        }
    }
}

/// Image formats found in word-processing packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG
    Jpeg,
    /// GIF
    Gif,
    /// Windows bitmap
    Bmp,
    /// TIFF
    Tiff,
    /// WebP
    Webp,
    /// Enhanced metafile
    Emf,
    /// Windows metafile
    Wmf,
    /// Scalable vector graphics
    Svg,
    /// Unrecognized format
    Other,
}

impl ImageFormat {
    /// Detect format from data magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some(ImageFormat::Tiff);
        }
        if data.starts_with(b"BM") {
            return Some(ImageFormat::Bmp);
        }
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::Webp);
        }
        // EMF: record type 1, signature " EMF" at offset 40
        if data.len() >= 44 && data.starts_with(&[0x01, 0x00, 0x00, 0x00]) && &data[40..44] == b" EMF"
        {
            return Some(ImageFormat::Emf);
        }
        // Placeable WMF
        if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
            return Some(ImageFormat::Wmf);
        }
        None
    }

    /// Guess format from a part name extension.
    pub fn from_part_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase())?;
        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" | "jpe" => Some(ImageFormat::Jpeg),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            "webp" => Some(ImageFormat::Webp),
            "emf" => Some(ImageFormat::Emf),
            "wmf" => Some(ImageFormat::Wmf),
            "svg" => Some(ImageFormat::Svg),
            _ => None,
        }
    }

    /// File extension used for packaged files.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tif",
            ImageFormat::Webp => "webp",
            ImageFormat::Emf => "emf",
            ImageFormat::Wmf => "wmf",
            ImageFormat::Svg => "svg",
            ImageFormat::Other => "bin",
        }
    }

    /// MIME type of the format.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Emf => "image/x-emf",
            ImageFormat::Wmf => "image/x-wmf",
            ImageFormat::Svg => "image/svg+xml",
            ImageFormat::Other => "application/octet-stream",
        }
    }

    /// Whether the `image` crate can probe pixel dimensions for this format.
    pub fn is_raster(self) -> bool {
        matches!(
            self,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Gif
                | ImageFormat::Bmp
                | ImageFormat::Tiff
                | ImageFormat::Webp
        )
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}
