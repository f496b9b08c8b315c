//! # docxbook
//!
//! DOCX to DocBook XML conversion for Rust.
//!
//! This library reads text, tables, images and styles directly from the XML
//! parts of a DOCX package, renders the content as DTD-targeted DocBook XML
//! and bundles the result with its media into a reproducible zip package.
//! An orchestrator runs conversions as asynchronous jobs over a bounded
//! worker pool.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docxbook::{extract_file, render};
//!
//! fn main() -> docxbook::Result<()> {
//!     // Extract the content model
//!     let model = extract_file("manual.docx")?;
//!
//!     // Render DocBook XML
//!     let options = render::DocBookOptions::default();
//!     let xml = render::to_docbook(&model, &options)?;
//!     println!("{}", xml);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Style resolution**: headings, emphasis and lists from style inheritance
//! - **Merged tables**: horizontal and vertical merges as CALS spans
//! - **Images**: extracted once, size-filtered, packaged under stable ids
//! - **Deterministic output**: identical input yields identical bytes
//! - **Job service**: submit/poll conversions over HTTP (feature `server`)

pub mod config;
pub mod convert;
pub mod detect;
pub mod editor;
pub mod error;
pub mod extract;
pub mod jobs;
pub mod model;
pub mod package;
pub mod render;
pub mod validate;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use convert::{ConvertOptions, ConvertResult, ConverterRegistry, DocumentConverter};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, DocxFormat};
pub use editor::{EditorSession, EditorState};
pub use error::{Error, ErrorKind, Result};
pub use extract::{ExtractOptions, Extractor};
pub use jobs::{
    Artifact, ArtifactInfo, Dashboard, JobInput, JobOptions, JobSnapshot, JobStatus, JobStore,
    Orchestrator, OrchestratorConfig,
};
pub use model::{
    Block, ContentModel, GridCell, ImageAsset, ImageFormat, Metadata, OwnerCell, StyleSpan,
    TableGrid, TextFormat,
};
pub use package::{PackageManifest, PackageOutput, Packager};
pub use render::{DocBookGenerator, DocBookOptions, Schema};
pub use validate::{ValidationReport, Validator};

use std::path::Path;

/// Extract the content model of a DOCX file.
///
/// The file stem becomes the title when the document has none.
///
/// # Example
///
/// ```no_run
/// use docxbook::extract_file;
///
/// let model = extract_file("manual.docx").unwrap();
/// println!("{} blocks", model.blocks.len());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<ContentModel> {
    Extractor::default().extract_file(path)
}

/// Extract the content model of a DOCX file with custom options.
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<ContentModel> {
    Extractor::new(options).extract_file(path)
}

/// Extract the content model from DOCX bytes.
pub fn extract_bytes(data: &[u8]) -> Result<ContentModel> {
    extract::extract(data)
}

/// Convert a DOCX file to DocBook XML.
///
/// # Example
///
/// ```no_run
/// use docxbook::to_docbook;
///
/// let xml = to_docbook("manual.docx").unwrap();
/// std::fs::write("manual.xml", xml).unwrap();
/// ```
pub fn to_docbook<P: AsRef<Path>>(path: P) -> Result<String> {
    let model = extract_file(path)?;
    render::to_docbook(&model, &DocBookOptions::default())
}

/// Convert a DOCX file and write all artifacts into `output_dir`.
///
/// Returns the written artifacts.
///
/// # Example
///
/// ```no_run
/// use docxbook::convert_file;
///
/// for artifact in convert_file("manual.docx", "./out").unwrap() {
///     println!("{} ({} bytes)", artifact.name, artifact.size);
/// }
/// ```
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    path: P,
    output_dir: Q,
) -> Result<Vec<Artifact>> {
    Docxbook::new().convert(path)?.write_to(output_dir)
}

/// Validate a DocBook file structurally.
pub fn validate_file<P: AsRef<Path>>(path: P, schema: Schema) -> Result<ValidationReport> {
    let path = path.as_ref();
    let markup = std::fs::read_to_string(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Validator::new(schema).validate(&markup, &name))
}

/// Builder for converting DOCX documents.
///
/// # Example
///
/// ```no_run
/// use docxbook::{Docxbook, Schema};
///
/// let artifacts = Docxbook::new()
///     .with_schema(Schema::DocBook42)
///     .with_toc(true)
///     .with_min_image_size(32)
///     .convert("manual.docx")?
///     .write_to("./out")?;
/// # Ok::<(), docxbook::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Docxbook {
    options: ConvertOptions,
}

impl Docxbook {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing conversion options.
    pub fn with_options(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Extract text only (no images, tables as paragraphs).
    pub fn text_only(mut self) -> Self {
        self.options.extract = ExtractOptions::text_only();
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.options.extract = self.options.extract.with_images(extract);
        self
    }

    /// Enable or disable table extraction.
    pub fn with_tables(mut self, extract: bool) -> Self {
        self.options.extract = self.options.extract.with_tables(extract);
        self
    }

    /// Set the minimum image dimension in pixels.
    pub fn with_min_image_size(mut self, pixels: u32) -> Self {
        self.options.extract = self.options.extract.with_min_image_size(pixels);
        self
    }

    /// Set the target schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.options.docbook = self.options.docbook.with_schema(schema);
        self
    }

    /// Enable or disable the table of contents.
    pub fn with_toc(mut self, include: bool) -> Self {
        self.options.docbook = self.options.docbook.with_toc(include);
        self
    }

    /// Enable or disable the zip package.
    pub fn with_package(mut self, create: bool) -> Self {
        self.options.create_package = create;
        self
    }

    /// Get the conversion options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a DOCX file.
    pub fn convert<P: AsRef<Path>>(self, path: P) -> Result<DocxbookResult> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let result = ConverterRegistry::with_defaults().convert(path, &self.options)?;
        Ok(DocxbookResult { result, stem })
    }

    /// Convert DOCX bytes; `name` is used to name artifacts.
    pub fn convert_bytes(mut self, data: &[u8], name: &str) -> Result<DocxbookResult> {
        let stem = JobInput::new(name, Vec::new()).stem();
        if self.options.extract.fallback_title.is_none() {
            self.options.extract.fallback_title = Some(stem.clone());
        }
        let result = ConverterRegistry::with_defaults().convert_bytes(data, "docx", &self.options)?;
        Ok(DocxbookResult { result, stem })
    }
}

/// Result of a builder conversion.
#[derive(Debug, Clone)]
pub struct DocxbookResult {
    /// The conversion result
    pub result: ConvertResult,
    stem: String,
}

impl DocxbookResult {
    /// Generated DocBook XML.
    pub fn xml(&self) -> &str {
        &self.result.xml
    }

    /// Extracted content model.
    pub fn model(&self) -> &ContentModel {
        &self.result.model
    }

    /// Validation report, if validation ran.
    pub fn report(&self) -> Option<&ValidationReport> {
        self.result.report.as_ref()
    }

    /// Base name used for artifacts.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Write all artifacts into a directory.
    pub fn write_to<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<Artifact>> {
        self.result.write_to(dir, &self.stem)
    }
}
