//! DOCX container detection and validation.

use crate::error::{Error, Result};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// DOCX container information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxFormat {
    /// Number of parts (zip entries) in the container
    pub part_count: usize,
    /// Whether the package carries a VBA project (`.docm`)
    pub macro_enabled: bool,
    /// Whether the package has core properties (`docProps/core.xml`)
    pub has_core_properties: bool,
}

impl std::fmt::Display for DocxFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.macro_enabled {
            write!(f, "DOCM ({} parts)", self.part_count)
        } else {
            write!(f, "DOCX ({} parts)", self.part_count)
        }
    }
}

/// Zip local file header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// Zip end-of-central-directory magic, found at the start of empty archives.
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";

/// Main document part every WordprocessingML package must contain.
pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";

/// Detect DOCX format from a file path.
///
/// # Example
/// ```no_run
/// use docxbook::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("document.docx").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocxFormat> {
    let data = fs::read(path)?;
    detect_format_from_bytes(&data)
}

/// Detect DOCX format from the full container bytes.
///
/// # Returns
/// * `Ok(DocxFormat)` if the data is a zip container holding a main document part
/// * `Err(Error::Input)` if the data is not a zip container
/// * `Err(Error::Extraction)` if the container has no main document part
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocxFormat> {
    if !is_zip_bytes(data) {
        return Err(Error::Input("not a zip container".into()));
    }

    let archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut has_document = false;
    let mut macro_enabled = false;
    let mut has_core_properties = false;

    for name in archive.file_names() {
        match name {
            MAIN_DOCUMENT_PART => has_document = true,
            "word/vbaProject.bin" => macro_enabled = true,
            "docProps/core.xml" => has_core_properties = true,
            _ => {}
        }
    }

    if !has_document {
        return Err(Error::Extraction(format!(
            "container has no {} part",
            MAIN_DOCUMENT_PART
        )));
    }

    Ok(DocxFormat {
        part_count: archive.len(),
        macro_enabled,
        has_core_properties,
    })
}

/// Check if bytes start with a zip signature.
pub fn is_zip_bytes(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC) || data.starts_with(ZIP_EMPTY_MAGIC)
}

/// Check if a file is a DOCX container.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes represent a DOCX container.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
