//! DOCX extraction.
//!
//! Turns the bytes of a DOCX package into a [`ContentModel`]:
//!
//! 1. open the container and build the relationship table once,
//! 2. walk the body into raw blocks (styles flattened, merges resolved),
//! 3. load referenced media, probe dimensions and drop undersized images,
//! 4. assign stable image ids, attach captions and group list items.
//!
//! Extraction is a pure function of the input bytes and [`ExtractOptions`].

mod body;
mod media;
mod numbering;
mod options;
mod package;
mod styles;
mod table;
pub(crate) mod xml;

pub use media::probe_dimensions;
pub use options::{ExtractOptions, DEFAULT_MIN_IMAGE_SIZE};
pub use package::{DocxPackage, Relationship, Relationships};

use crate::error::{Error, Result};
use crate::model::{spans_text, Block, ContentModel, StyleSpan};
use body::{BodyReader, RawBlock};
use numbering::Numbering;
use std::collections::HashMap;
use std::path::Path;
use styles::StyleSheet;

/// DOCX → Content Model extractor.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    /// Create an extractor with the given options.
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Get the extraction options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract a content model from a file.
    ///
    /// The file stem is used as fallback title when none is configured.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<ContentModel> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        match (&self.options.fallback_title, path.file_stem()) {
            (None, Some(stem)) => {
                let options = self
                    .options
                    .clone()
                    .with_fallback_title(stem.to_string_lossy());
                Extractor::new(options).extract(&data)
            }
            _ => self.extract(&data),
        }
    }

    /// Extract a content model from DOCX bytes.
    pub fn extract(&self, data: &[u8]) -> Result<ContentModel> {
        let mut package = DocxPackage::open(data)?;
        let document = package.document()?;
        let body = document
            .child("w:body")
            .ok_or_else(|| Error::Extraction("main document has no body".into()))?;

        let styles = match package.styles() {
            Ok(Some(root)) => StyleSheet::from_element(&root),
            Ok(None) => StyleSheet::default(),
            Err(e) => {
                log::warn!("ignoring unreadable style definitions: {}", e);
                StyleSheet::default()
            }
        };
        let numbering = match package.numbering() {
            Ok(Some(root)) => Numbering::from_element(&root),
            Ok(None) => Numbering::default(),
            Err(e) => {
                log::warn!("ignoring unreadable numbering definitions: {}", e);
                Numbering::default()
            }
        };
        log::debug!("loaded {} style definitions", styles.len());

        let reader = BodyReader {
            styles: &styles,
            numbering: &numbering,
            rels: package.relationships(),
            options: &self.options,
        };
        let raw = reader.read(body);
        log::debug!("read {} raw blocks from body", raw.len());

        let (title, metadata) = package.core_properties();
        let title = title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.options.fallback_title.clone())
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        let mut model = ContentModel::new(title);
        model.metadata = metadata;

        let ids = if self.options.extract_images {
            self.load_images(&mut package, &raw, &mut model)?
        } else {
            HashMap::new()
        };
        let blocks = assemble(raw, &ids, &mut model);
        model.blocks = blocks;
        model.check_references()?;

        log::debug!(
            "extracted {} blocks, {} tables, {} images",
            model.blocks.len(),
            model.table_count(),
            model.images.len()
        );
        Ok(model)
    }

    /// Load referenced media parts, filter them by size and register the
    /// survivors under sequential ids. Returns part name → image id.
    fn load_images(
        &self,
        package: &mut DocxPackage<'_>,
        raw: &[RawBlock],
        model: &mut ContentModel,
    ) -> Result<HashMap<String, String>> {
        let mut order: Vec<&str> = Vec::new();
        let mut alt_texts: HashMap<&str, &str> = HashMap::new();
        for block in raw {
            if let RawBlock::Image(image) = block {
                if !order.contains(&image.part.as_str()) {
                    order.push(&image.part);
                }
                if let Some(alt) = &image.alt_text {
                    alt_texts.entry(&image.part).or_insert(alt);
                }
            }
        }

        let mut loaded = Vec::with_capacity(order.len());
        for part in order {
            match package.read_bytes(part)? {
                Some(data) => loaded.push((part.to_string(), data)),
                None => log::warn!("referenced image part {} is missing", part),
            }
        }

        let mut ids = HashMap::new();
        let retained = media::build_assets(loaded)
            .into_iter()
            .filter(|asset| media::retain(asset, self.options.min_image_size));
        for (n, mut asset) in retained.enumerate() {
            let id = media::image_id(n + 1);
            if let Some(alt) = alt_texts.get(asset.source_part.as_str()) {
                asset.alt_text = Some(alt.to_string());
            }
            ids.insert(asset.source_part.clone(), id.clone());
            model.add_image(id, asset);
        }
        Ok(ids)
    }
}

/// Resolve image references, attach captions and group list items.
fn assemble(
    raw: Vec<RawBlock>,
    ids: &HashMap<String, String>,
    model: &mut ContentModel,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut lists = ListBuilder::default();
    let mut last_image: Option<String> = None;

    for block in raw {
        let previous_image = last_image.take();
        match block {
            RawBlock::ListItem {
                ordered,
                level,
                spans,
            } => lists.push(ordered, level, spans, &mut blocks),
            RawBlock::Caption { spans } => {
                let target = previous_image
                    .as_ref()
                    .and_then(|id| model.images.get_mut(id))
                    .filter(|asset| asset.caption.is_none());
                match target {
                    Some(asset) => asset.caption = Some(spans_text(&spans)),
                    None => {
                        lists.finish(&mut blocks);
                        blocks.push(Block::Paragraph { spans });
                    }
                }
            }
            RawBlock::Heading { level, spans } => {
                lists.finish(&mut blocks);
                blocks.push(Block::Heading { level, spans });
            }
            RawBlock::Paragraph { spans } => {
                lists.finish(&mut blocks);
                blocks.push(Block::Paragraph { spans });
            }
            RawBlock::Table { grid } => {
                lists.finish(&mut blocks);
                blocks.push(Block::Table { grid });
            }
            RawBlock::Image(image) => {
                lists.finish(&mut blocks);
                if let Some(id) = ids.get(&image.part) {
                    blocks.push(Block::Image { id: id.clone() });
                    last_image = Some(id.clone());
                }
            }
        }
    }
    lists.finish(&mut blocks);
    blocks
}

struct ListFrame {
    ordered: bool,
    level: u8,
    items: Vec<Vec<Block>>,
}

/// Groups consecutive list paragraphs into nested [`Block::List`]s.
#[derive(Default)]
struct ListBuilder {
    stack: Vec<ListFrame>,
}

impl ListBuilder {
    fn push(&mut self, ordered: bool, level: u8, spans: Vec<StyleSpan>, out: &mut Vec<Block>) {
        while self.stack.last().is_some_and(|top| top.level > level) {
            self.close(out);
        }
        if self
            .stack
            .last()
            .is_some_and(|top| top.level == level && top.ordered != ordered)
        {
            self.close(out);
        }
        let needs_frame = match self.stack.last() {
            Some(top) => top.level < level,
            None => true,
        };
        if needs_frame {
            self.stack.push(ListFrame {
                ordered,
                level,
                items: Vec::new(),
            });
        }
        if let Some(top) = self.stack.last_mut() {
            top.items.push(vec![Block::Paragraph { spans }]);
        }
    }

    fn close(&mut self, out: &mut Vec<Block>) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let list = Block::List {
            ordered: frame.ordered,
            items: frame.items,
        };
        match self.stack.last_mut() {
            Some(parent) => match parent.items.last_mut() {
                Some(item) => item.push(list),
                None => parent.items.push(vec![list]),
            },
            None => out.push(list),
        }
    }

    fn finish(&mut self, out: &mut Vec<Block>) {
        while !self.stack.is_empty() {
            self.close(out);
        }
    }
}

/// Extract a content model with default options.
pub fn extract(data: &[u8]) -> Result<ContentModel> {
    Extractor::default().extract(data)
}
