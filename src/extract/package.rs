//! Open Packaging Convention access: parts and relationships.

use super::xml::{self, Element};
use crate::error::{Error, Result};
use crate::model::Metadata;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
const REL_CORE_PROPERTIES: &str = "/core-properties";
const REL_STYLES: &str = "/styles";
const REL_NUMBERING: &str = "/numbering";
const REL_IMAGE: &str = "/image";

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOC: usize = 1 << 20;

/// WordprocessingML main namespace (transitional).
pub const WORDML_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// WordprocessingML namespace used by Strict OOXML documents.
pub const WORDML_STRICT_NAMESPACE: &str = "http://purl.oclc.org/ooxml/wordprocessingml/main";

/// One entry of a relationship part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship type URI
    pub rel_type: String,
    /// Resolved part name, or the raw URI for external targets
    pub target: String,
    /// Whether the target lives outside the package
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship points at an image part.
    pub fn is_image(&self) -> bool {
        self.rel_type.ends_with(REL_IMAGE)
    }
}

/// Relationship id → relationship lookup table for one source part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: HashMap<String, Relationship>,
}

impl Relationships {
    /// Parse a `.rels` part whose source part lives in `base_dir`.
    pub(crate) fn parse(xml: &str, base_dir: &str) -> Result<Self> {
        let root = xml::parse(xml)?;
        let mut entries = HashMap::new();
        for rel in root.elements().filter(|e| e.local_name() == "Relationship") {
            let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) else {
                continue;
            };
            let external = rel.attr("TargetMode") == Some("External");
            let target = if external {
                target.to_string()
            } else {
                resolve_part_name(base_dir, target)
            };
            entries.insert(
                id.to_string(),
                Relationship {
                    rel_type: rel.attr("Type").unwrap_or_default().to_string(),
                    target,
                    external,
                },
            );
        }
        Ok(Self { entries })
    }

    /// Get a relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.get(id)
    }

    /// Find the first relationship whose type ends with the given suffix.
    pub fn find_by_type(&self, suffix: &str) -> Option<&Relationship> {
        let mut matches: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, r)| r.rel_type.ends_with(suffix))
            .collect();
        // HashMap order is arbitrary; pick the lowest id for stable results.
        matches.sort_by(|a, b| a.0.cmp(b.0));
        matches.first().map(|(_, r)| *r)
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no relationships.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve a relationship target against the directory of its source part.
pub(crate) fn resolve_part_name(base_dir: &str, target: &str) -> String {
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if base_dir.is_empty() {
        target.to_string()
    } else {
        format!("{}/{}", base_dir, target)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn parent_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// An opened DOCX container.
pub struct DocxPackage<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    main_part: String,
    document_rels: Relationships,
    core_part: Option<String>,
}

impl<'a> DocxPackage<'a> {
    /// Open the container and resolve the main document part via the
    /// package relationships.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::Input(format!("unreadable container: {}", e)))?;
        let mut package = Self {
            archive,
            main_part: String::new(),
            document_rels: Relationships::default(),
            core_part: None,
        };

        let package_rels = match package.read_text("_rels/.rels")? {
            Some(xml) => Relationships::parse(&xml, "")?,
            None => Relationships::default(),
        };
        package.main_part = package_rels
            .find_by_type(REL_OFFICE_DOCUMENT)
            .map(|r| r.target.clone())
            .unwrap_or_else(|| crate::detect::MAIN_DOCUMENT_PART.to_string());
        package.core_part = package_rels
            .find_by_type(REL_CORE_PROPERTIES)
            .map(|r| r.target.clone())
            .or_else(|| Some("docProps/core.xml".to_string()));

        if !package.has_part(&package.main_part) {
            return Err(Error::Extraction(format!(
                "main document part '{}' not found",
                package.main_part
            )));
        }

        let rels_part = rels_part_for(&package.main_part);
        let base_dir = parent_dir(&package.main_part).to_string();
        package.document_rels = match package.read_text(&rels_part)? {
            Some(xml) => Relationships::parse(&xml, &base_dir)?,
            None => Relationships::default(),
        };
        log::debug!(
            "opened package: main part {}, {} document relationships",
            package.main_part,
            package.document_rels.len()
        );
        Ok(package)
    }

    /// Name of the main document part.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Relationships of the main document part.
    pub fn relationships(&self) -> &Relationships {
        &self.document_rels
    }

    /// Check if the container holds the named part.
    pub fn has_part(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Read a part as bytes, `None` if absent.
    pub fn read_bytes(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let Some(index) = self.archive.index_for_name(name) else {
            return Ok(None);
        };
        let mut file = self.archive.by_index(index)?;
        let declared = usize::try_from(file.size()).unwrap_or(usize::MAX);
        let mut data = Vec::with_capacity(declared.min(MAX_PREALLOC));
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Read a part as UTF-8 text, `None` if absent.
    pub fn read_text(&mut self, name: &str) -> Result<Option<String>> {
        match self.read_bytes(name)? {
            Some(bytes) => {
                let text = String::from_utf8(bytes).map_err(|_| {
                    Error::Extraction(format!("part '{}' is not valid UTF-8", name))
                })?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    /// Parse the main document part and check its schema.
    pub(crate) fn document(&mut self) -> Result<Element> {
        let name = self.main_part.clone();
        let xml = self
            .read_text(&name)?
            .ok_or_else(|| Error::Extraction(format!("main document part '{}' not found", name)))?;
        let root = xml::parse(&xml)?;

        if root.local_name() != "document" {
            return Err(Error::Extraction(format!(
                "unexpected root element '{}' in main document part",
                root.name
            )));
        }
        let prefix = root
            .name
            .rsplit_once(':')
            .map(|(p, _)| format!("xmlns:{}", p))
            .unwrap_or_else(|| "xmlns".to_string());
        let namespace = root.attr(&prefix).map(str::to_string);
        match namespace.as_deref() {
            Some(WORDML_NAMESPACE) => Ok(root),
            Some(WORDML_STRICT_NAMESPACE) => Err(Error::Extraction(
                "Strict OOXML documents are not supported".into(),
            )),
            Some(other) => Err(Error::Extraction(format!(
                "unsupported document namespace '{}'",
                other
            ))),
            None => Err(Error::Extraction(
                "main document part declares no WordprocessingML namespace".into(),
            )),
        }
    }

    /// Parse a part referenced from the main document by relationship type,
    /// falling back to a conventional part name.
    pub(crate) fn related_part(&mut self, rel_suffix: &str, fallback: &str) -> Result<Option<Element>> {
        let name = self
            .document_rels
            .find_by_type(rel_suffix)
            .filter(|r| !r.external)
            .map(|r| r.target.clone())
            .unwrap_or_else(|| fallback.to_string());
        match self.read_text(&name)? {
            Some(xml) => Ok(Some(xml::parse(&xml)?)),
            None => Ok(None),
        }
    }

    /// Parse the style definitions part, if present.
    pub(crate) fn styles(&mut self) -> Result<Option<Element>> {
        self.related_part(REL_STYLES, "word/styles.xml")
    }

    /// Parse the numbering definitions part, if present.
    pub(crate) fn numbering(&mut self) -> Result<Option<Element>> {
        self.related_part(REL_NUMBERING, "word/numbering.xml")
    }

    /// Read core properties (`docProps/core.xml`).
    ///
    /// Returns the title separately; malformed core properties are ignored
    /// because they never affect the body content.
    pub fn core_properties(&mut self) -> (Option<String>, Metadata) {
        let Some(name) = self.core_part.clone() else {
            return (None, Metadata::default());
        };
        let root = match self.read_text(&name) {
            Ok(Some(xml)) => match xml::parse(&xml) {
                Ok(root) => root,
                Err(e) => {
                    log::warn!("ignoring malformed core properties: {}", e);
                    return (None, Metadata::default());
                }
            },
            _ => return (None, Metadata::default()),
        };

        let field = |local: &str| -> Option<String> {
            root.elements()
                .find(|e| e.local_name() == local)
                .map(|e| e.text().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let date = |local: &str| -> Option<DateTime<Utc>> {
            field(local)
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|d| d.with_timezone(&Utc))
        };

        let metadata = Metadata {
            authors: field("creator")
                .map(|c| {
                    c.split(';')
                        .map(|a| a.trim().to_string())
                        .filter(|a| !a.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            subject: field("subject"),
            keywords: field("keywords"),
            description: field("description"),
            created: date("created"),
            modified: date("modified"),
        };
        (field("title"), metadata)
    }
}
