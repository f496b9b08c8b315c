//! DOCX document converter implementation.

use crate::error::Result;
use crate::extract::Extractor;
use crate::model::ContentModel;
use crate::package::{Packager, ROOT_FILE};
use crate::render::{DocBookGenerator, ExtractionStats};
use crate::validate::Validator;
use std::path::Path;

use super::{ConvertOptions, ConvertResult, DocumentConverter};

/// DOCX document converter.
///
/// Runs extraction, DocBook generation, packaging and validation.
#[derive(Debug, Clone, Default)]
pub struct DocxConverter {
    _private: (),
}

impl DocxConverter {
    /// Create a new DOCX converter.
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn convert_model(&self, model: ContentModel, options: &ConvertOptions) -> Result<ConvertResult> {
        let xml = DocBookGenerator::new(options.docbook.clone()).generate(&model)?;
        log::debug!("Generated {} bytes of DocBook", xml.len());

        let package = if options.create_package {
            Some(Packager::new().package(&xml, &model)?)
        } else {
            None
        };

        let report = options.validate.then(|| {
            let report = Validator::new(options.docbook.schema).validate(&xml, ROOT_FILE);
            if !report.is_valid {
                log::warn!(
                    "Generated markup has {} structural error(s)",
                    report.total_errors
                );
            }
            report
        });

        Ok(ConvertResult {
            stats: ExtractionStats::from_model(&model),
            model,
            xml,
            package,
            report,
        })
    }
}

impl DocumentConverter for DocxConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        let model = Extractor::new(options.extract.clone()).extract_file(path)?;
        self.convert_model(model, options)
    }

    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult> {
        let model = Extractor::new(options.extract.clone()).extract(bytes)?;
        self.convert_model(model, options)
    }
}
