//! Integration tests for packaging and on-disk artifacts.

mod common;

use common::{png, sample_manual, DocxBuilder};
use docxbook::package::{replace_root_file, IMAGE_INDEX_FILE, ROOT_FILE};
use docxbook::{Docxbook, Error, Packager};
use std::io::{Cursor, Read};

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut data = Vec::new();
    file.read_to_end(&mut data).unwrap();
    data
}

#[test]
fn test_package_layout() {
    let result = Docxbook::new()
        .convert_bytes(&sample_manual(), "manual.docx")
        .unwrap();
    let package = result.result.package.as_ref().unwrap();

    assert_eq!(
        entry_names(&package.bytes),
        vec![
            "Book.xml",
            "metadata.csv",
            "book_metadata.csv",
            "multimedia/img_0001.png"
        ]
    );
    assert_eq!(package.manifest.root_file, ROOT_FILE);
    assert_eq!(package.manifest.len(), 1);
}

#[test]
fn test_package_root_matches_markup() {
    let result = Docxbook::new()
        .convert_bytes(&sample_manual(), "manual.docx")
        .unwrap();
    let package = result.result.package.as_ref().unwrap();

    let root = read_entry(&package.bytes, ROOT_FILE);
    assert_eq!(String::from_utf8(root).unwrap(), result.xml());
}

#[test]
fn test_package_media_bytes_unchanged() {
    let image = png(64, 64);
    let data = DocxBuilder::new()
        .title("Media")
        .heading(1, "Pictures")
        .image("photo.png", image.clone(), "photo")
        .build();
    let result = Docxbook::new().convert_bytes(&data, "media.docx").unwrap();
    let package = result.result.package.as_ref().unwrap();

    assert_eq!(read_entry(&package.bytes, "multimedia/img_0001.png"), image);
}

#[test]
fn test_package_image_index() {
    let result = Docxbook::new()
        .convert_bytes(&sample_manual(), "manual.docx")
        .unwrap();
    let package = result.result.package.as_ref().unwrap();

    let csv = String::from_utf8(read_entry(&package.bytes, IMAGE_INDEX_FILE)).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Image ID,Filename,Width,Height,Caption,Alt Text,Format,File Size"
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("img_0001,img_0001.png,64,64,Engine overview diagram,Engine overview,PNG,"));
    assert!(lines.next().is_none());
}

#[test]
fn test_package_is_reproducible() {
    let data = sample_manual();
    let a = Docxbook::new().convert_bytes(&data, "manual.docx").unwrap();
    let b = Docxbook::new().convert_bytes(&data, "manual.docx").unwrap();
    assert_eq!(
        a.result.package.unwrap().bytes,
        b.result.package.unwrap().bytes
    );
}

#[test]
fn test_write_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = Docxbook::new()
        .convert_bytes(&sample_manual(), "Field Manual.docx")
        .unwrap()
        .write_to(dir.path())
        .unwrap();

    let names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Field_Manual.xml",
            "Field_Manual_rittdoc.zip",
            "Field_Manual_validation.json",
            "img_0001.png"
        ]
    );
    for artifact in &artifacts {
        let meta = std::fs::metadata(&artifact.path).unwrap();
        assert_eq!(meta.len(), artifact.size);
    }

    let report: serde_json::Value = serde_json::from_slice(
        &std::fs::read(dir.path().join("Field_Manual_validation.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["is_valid"], serde_json::Value::Bool(true));
}

#[test]
fn test_without_package() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = Docxbook::new()
        .with_package(false)
        .convert_bytes(&sample_manual(), "manual.docx")
        .unwrap()
        .write_to(dir.path())
        .unwrap();
    assert!(!artifacts.iter().any(|a| a.name.ends_with(".zip")));
    assert!(!dir.path().join("manual_rittdoc.zip").exists());
}

#[test]
fn test_replace_root_file_keeps_media() {
    let result = Docxbook::new()
        .convert_bytes(&sample_manual(), "manual.docx")
        .unwrap();
    let package = result.result.package.as_ref().unwrap();

    let edited = result.xml().replace("Field Manual", "Field Guide");
    let bytes = replace_root_file(&package.bytes, &edited).unwrap();

    assert_eq!(entry_names(&bytes), entry_names(&package.bytes));
    assert_eq!(
        String::from_utf8(read_entry(&bytes, ROOT_FILE)).unwrap(),
        edited
    );
    assert_eq!(
        read_entry(&bytes, "multimedia/img_0001.png"),
        read_entry(&package.bytes, "multimedia/img_0001.png")
    );
}

// ==================== Edge Case Tests ====================

#[test]
fn test_packager_rejects_dangling_reference() {
    let model = docxbook::extract_bytes(&sample_manual()).unwrap();
    let markup = "<book><chapter id=\"ch0001\"><title>x</title><figure id=\"fig_0001\"><title>f</title><mediaobject><imageobject><imagedata fileref=\"multimedia/img_0009.png\"/></imageobject></mediaobject></figure></chapter></book>";
    let result = Packager::new().package(markup, &model);
    assert!(matches!(result, Err(Error::Packaging(_))));
}

#[test]
fn test_replace_root_file_requires_root() {
    assert!(replace_root_file(b"not a zip", "<book/>").is_err());
}
