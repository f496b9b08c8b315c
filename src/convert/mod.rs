//! Document converter module providing a plugin architecture for input formats.
//!
//! Converters are registered by file extension. The job service only accepts
//! submissions whose extension has a registered converter.
//!
//! # Example
//!
//! ```no_run
//! use docxbook::convert::{ConverterRegistry, ConvertOptions};
//! use std::path::Path;
//!
//! fn main() -> docxbook::Result<()> {
//!     let registry = ConverterRegistry::with_defaults();
//!     let result = registry.convert(Path::new("manual.docx"), &ConvertOptions::default())?;
//!     println!("{}", result.xml);
//!     Ok(())
//! }
//! ```

mod docx;

pub use docx::DocxConverter;

use crate::error::{Error, Result};
use crate::extract::ExtractOptions;
use crate::jobs::Artifact;
use crate::model::ContentModel;
use crate::package::PackageOutput;
use crate::render::{DocBookOptions, ExtractionStats};
use crate::validate::ValidationReport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Options for document conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Extraction options
    pub extract: ExtractOptions,

    /// DocBook generation options
    pub docbook: DocBookOptions,

    /// Build the zip package
    pub create_package: bool,

    /// Run the structural validator on the generated markup
    pub validate: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            docbook: DocBookOptions::default(),
            create_package: true,
            validate: true,
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set extraction options.
    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract = options;
        self
    }

    /// Set DocBook generation options.
    pub fn with_docbook_options(mut self, options: DocBookOptions) -> Self {
        self.docbook = options;
        self
    }

    /// Enable or disable packaging.
    pub fn with_package(mut self, create: bool) -> Self {
        self.create_package = create;
        self
    }

    /// Enable or disable validation.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// Result of document conversion.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Extracted content model
    pub model: ContentModel,

    /// Generated DocBook XML
    pub xml: String,

    /// Zip package, when packaging was requested
    pub package: Option<PackageOutput>,

    /// Validation report, when validation was requested
    pub report: Option<ValidationReport>,

    /// Content statistics
    pub stats: ExtractionStats,
}

impl ConvertResult {
    /// Number of images retained in the model.
    pub fn image_count(&self) -> usize {
        self.model.images.len()
    }

    /// Number of tables in the model.
    pub fn table_count(&self) -> usize {
        self.model.table_count()
    }

    /// Write all artifacts into `dir`, named after `stem`.
    ///
    /// Produces `<stem>.xml`, `<stem>_rittdoc.zip`, `<stem>_validation.json`
    /// and one file per retained image. Artifacts are returned in write order.
    pub fn write_to<P: AsRef<Path>>(&self, dir: P, stem: &str) -> Result<Vec<Artifact>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let mut artifacts = Vec::new();

        let mut write = |name: String, bytes: &[u8]| -> Result<()> {
            let path = dir.join(&name);
            fs::write(&path, bytes)?;
            artifacts.push(Artifact {
                name,
                path,
                size: bytes.len() as u64,
            });
            Ok(())
        };

        write(format!("{}.xml", stem), self.xml.as_bytes())?;
        if let Some(package) = &self.package {
            write(format!("{}_rittdoc.zip", stem), &package.bytes)?;
        }
        if let Some(report) = &self.report {
            write(format!("{}_validation.json", stem), report.to_json()?.as_bytes())?;
        }
        for (id, asset) in &self.model.images {
            write(asset.filename(id), &asset.data)?;
        }

        Ok(artifacts)
    }
}

/// Trait for document converters.
///
/// Implement this trait to add support for a new input format.
pub trait DocumentConverter: Send + Sync {
    /// Get the supported file extensions for this converter.
    ///
    /// Extensions should be lowercase without the leading dot (e.g., `["docx"]`).
    fn supported_extensions(&self) -> &[&str];

    /// Get the name of this converter.
    fn name(&self) -> &str;

    /// Convert a file at the given path.
    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult>;

    /// Convert from bytes.
    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult>;

    /// Check if this converter supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry for document converters.
///
/// The registry maps file extensions to converters.
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn DocumentConverter>>,
    by_name: HashMap<String, Arc<dyn DocumentConverter>>,
}

impl ConverterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the default converters (DOCX).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DocxConverter::new()));
        registry
    }

    /// Register a converter for all its supported extensions.
    pub fn register(&mut self, converter: Arc<dyn DocumentConverter>) {
        for ext in converter.supported_extensions() {
            self.converters
                .insert(ext.to_lowercase(), converter.clone());
        }
        self.by_name
            .insert(converter.name().to_lowercase(), converter);
    }

    /// Get a converter by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.converters.get(&ext.to_lowercase()).cloned()
    }

    /// Get a converter by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.converters.contains_key(&ext.to_lowercase())
    }

    /// Get all supported extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.converters.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }

    /// Find the converter for a file name, or fail with an input error.
    pub fn for_filename(&self, filename: &str) -> Result<Arc<dyn DocumentConverter>> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::Input(format!("'{}' has no file extension", filename)))?;

        self.get_by_extension(ext)
            .ok_or_else(|| Error::Input(format!("no converter for extension: {}", ext)))
    }

    /// Convert a file using the appropriate converter.
    pub fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        let converter = self.for_filename(&path.to_string_lossy())?;
        converter.convert(path, options)
    }

    /// Convert bytes using the specified extension to determine the converter.
    pub fn convert_bytes(
        &self,
        bytes: &[u8],
        ext: &str,
        options: &ConvertOptions,
    ) -> Result<ConvertResult> {
        let converter = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::Input(format!("no converter for extension: {}", ext)))?;

        converter.convert_bytes(bytes, options)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("extensions", &self.supported_extensions())
            .finish()
    }
}
