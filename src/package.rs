//! Zip packaging of generated DocBook together with its media.
//!
//! The archive layout is fixed so that packaging the same content model
//! twice yields identical bytes:
//!
//! ```text
//! Book.xml
//! metadata.csv
//! book_metadata.csv
//! multimedia/img_0001.png
//! multimedia/img_0002.jpg
//! ...
//! ```

use crate::error::{Error, Result};
use crate::extract::xml;
use crate::model::{ContentModel, ImageFormat};
use crate::render::{ExtractionStats, MEDIA_DIR};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Name of the root markup file inside the package.
pub const ROOT_FILE: &str = "Book.xml";

/// Name of the per-image metadata index.
pub const IMAGE_INDEX_FILE: &str = "metadata.csv";

/// Name of the book-level metadata file.
pub const BOOK_INDEX_FILE: &str = "book_metadata.csv";

/// One packaged image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    /// Stable image id (e.g. "img_0001")
    pub image_id: String,

    /// File name inside the media directory
    pub filename: String,

    /// Width in pixels, if known
    pub width: Option<u32>,

    /// Height in pixels, if known
    pub height: Option<u32>,

    /// Figure caption
    pub caption: Option<String>,

    /// Alternative text
    pub alt_text: Option<String>,

    /// Image format
    pub format: ImageFormat,

    /// Size of the image data in bytes
    pub file_size: usize,
}

impl ManifestRow {
    /// Path of the image inside the archive.
    pub fn archive_path(&self) -> String {
        format!("{}/{}", MEDIA_DIR, self.filename)
    }
}

/// Package manifest: the root file plus one row per image, sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Root markup file name
    pub root_file: String,

    /// Image rows
    pub rows: Vec<ManifestRow>,
}

impl PackageManifest {
    /// Build the manifest for a content model.
    ///
    /// Fails when two images would be written under the same file name.
    /// Names are compared case-insensitively so the archive extracts
    /// cleanly on case-folding file systems.
    pub fn from_model(model: &ContentModel) -> Result<Self> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        let mut rows = Vec::with_capacity(model.images.len());

        for (id, asset) in &model.images {
            let filename = asset.filename(id);
            if let Some(other) = seen.insert(filename.to_lowercase(), id) {
                return Err(Error::Packaging(format!(
                    "images '{}' and '{}' both map to '{}'",
                    other, id, filename
                )));
            }
            rows.push(ManifestRow {
                image_id: id.clone(),
                filename,
                width: asset.width,
                height: asset.height,
                caption: asset.caption.clone(),
                alt_text: asset.alt_text.clone(),
                format: asset.format,
                file_size: asset.size(),
            });
        }

        Ok(Self {
            root_file: ROOT_FILE.to_string(),
            rows,
        })
    }

    /// Find the row for a media path such as "multimedia/img_0001.png".
    pub fn find_by_path(&self, path: &str) -> Option<&ManifestRow> {
        let name = path.strip_prefix(MEDIA_DIR)?.strip_prefix('/')?;
        self.rows.iter().find(|row| row.filename == name)
    }

    /// Number of image rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the manifest lists no images.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A finished package.
#[derive(Debug, Clone)]
pub struct PackageOutput {
    /// Zip archive bytes
    pub bytes: Vec<u8>,

    /// What the archive contains
    pub manifest: PackageManifest,
}

impl PackageOutput {
    /// Write the archive to a file.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Builds deterministic zip packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Packager;

impl Packager {
    /// Create a new packager.
    pub fn new() -> Self {
        Self
    }

    /// Package generated markup with the model's images.
    pub fn package(&self, markup: &str, model: &ContentModel) -> Result<PackageOutput> {
        let manifest = PackageManifest::from_model(model)?;
        check_media_references(markup, &manifest)?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        zip.start_file(ROOT_FILE, options).map_err(packaging_error)?;
        zip.write_all(markup.as_bytes())?;

        zip.start_file(IMAGE_INDEX_FILE, options)
            .map_err(packaging_error)?;
        zip.write_all(&image_index(&manifest)?)?;

        zip.start_file(BOOK_INDEX_FILE, options)
            .map_err(packaging_error)?;
        zip.write_all(&book_index(model)?)?;

        for row in &manifest.rows {
            let asset = model.images.get(&row.image_id).ok_or_else(|| {
                Error::Internal(format!("manifest row '{}' has no image", row.image_id))
            })?;
            zip.start_file(row.archive_path(), options)
                .map_err(packaging_error)?;
            zip.write_all(&asset.data)?;
        }

        let bytes = zip.finish().map_err(packaging_error)?.into_inner();
        log::debug!(
            "Packaged {} image(s) into {} bytes",
            manifest.len(),
            bytes.len()
        );

        Ok(PackageOutput { bytes, manifest })
    }
}

/// Package markup and images with a default packager.
pub fn package(markup: &str, model: &ContentModel) -> Result<PackageOutput> {
    Packager::new().package(markup, model)
}

/// Rewrite an existing package with new root markup.
///
/// All other entries are copied in their original order.
pub fn replace_root_file(archive: &[u8], markup: &str) -> Result<Vec<u8>> {
    let mut source = zip::ZipArchive::new(Cursor::new(archive)).map_err(packaging_error)?;
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut replaced = false;
    for index in 0..source.len() {
        let mut entry = source.by_index(index).map_err(packaging_error)?;
        let name = entry.name().to_string();
        zip.start_file(name.as_str(), options)
            .map_err(packaging_error)?;
        if name == ROOT_FILE {
            zip.write_all(markup.as_bytes())?;
            replaced = true;
        } else {
            std::io::copy(&mut entry, &mut zip)?;
        }
    }

    if !replaced {
        return Err(Error::Packaging(format!("package has no {}", ROOT_FILE)));
    }
    Ok(zip.finish().map_err(packaging_error)?.into_inner())
}

fn packaging_error(err: zip::result::ZipError) -> Error {
    Error::Packaging(err.to_string())
}

/// Every `fileref` pointing into the media directory must name a manifest row.
fn check_media_references(markup: &str, manifest: &PackageManifest) -> Result<()> {
    let root = xml::parse(markup)
        .map_err(|e| Error::Packaging(format!("markup is not well-formed: {}", e)))?;

    let mut dangling = BTreeSet::new();
    for data in root.descendants_named("imagedata") {
        let Some(fileref) = data.attr("fileref") else {
            continue;
        };
        if fileref.starts_with(MEDIA_DIR) && manifest.find_by_path(fileref).is_none() {
            dangling.insert(fileref.to_string());
        }
    }

    if dangling.is_empty() {
        Ok(())
    } else {
        let refs: Vec<String> = dangling.into_iter().collect();
        Err(Error::Packaging(format!(
            "markup references missing media: {}",
            refs.join(", ")
        )))
    }
}

fn image_index(manifest: &PackageManifest) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Image ID",
        "Filename",
        "Width",
        "Height",
        "Caption",
        "Alt Text",
        "Format",
        "File Size",
    ])?;
    for row in &manifest.rows {
        writer.write_record([
            row.image_id.clone(),
            row.filename.clone(),
            optional_number(row.width),
            optional_number(row.height),
            row.caption.clone().unwrap_or_default(),
            row.alt_text.clone().unwrap_or_default(),
            row.format.extension().to_uppercase(),
            format_size(row.file_size),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Packaging(e.to_string()))
}

fn book_index(model: &ContentModel) -> Result<Vec<u8>> {
    let stats = ExtractionStats::from_model(model);
    let meta = &model.metadata;
    let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
        d.map(|d| d.to_rfc3339()).unwrap_or_default()
    };

    let fields = [
        ("Title", model.title.clone()),
        ("Authors", meta.authors.join("; ")),
        ("Subject", meta.subject.clone().unwrap_or_default()),
        ("Keywords", meta.keyword_list().join("; ")),
        ("Created", date(meta.created)),
        ("Modified", date(meta.modified)),
        ("Chapters", stats.chapter_count.to_string()),
        ("Tables", stats.table_count.to_string()),
        ("Images", model.images.len().to_string()),
    ];

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Field", "Value"])?;
    for (field, value) in fields {
        writer.write_record([field, value.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Packaging(e.to_string()))
}

fn optional_number(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Human-readable file size: "512 B", "1.5 KB", "2.0 MB".
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let size = bytes as f64;
    if size < KB {
        format!("{} B", bytes)
    } else if size < KB * KB {
        format!("{:.1} KB", size / KB)
    } else {
        format!("{:.1} MB", size / (KB * KB))
    }
}
