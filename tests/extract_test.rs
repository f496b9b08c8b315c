//! Integration tests for DOCX extraction.

mod common;

use common::{png, sample_manual, DocxBuilder, BULLETS};
use docxbook::model::spans_text;
use docxbook::{extract_bytes, Block, Error, ExtractOptions, Extractor, ImageFormat};

#[test]
fn test_extract_sample_structure() {
    let model = extract_bytes(&sample_manual()).unwrap();

    assert_eq!(model.title, "Field Manual");
    assert_eq!(
        model.metadata.authors,
        vec!["Ada Lovelace".to_string(), "Charles Babbage".to_string()]
    );
    assert_eq!(model.metadata.subject.as_deref(), Some("Engines"));
    assert_eq!(model.metadata.keyword_list(), vec!["analytical", "difference"]);
    assert!(model.metadata.created.is_some());

    let headings: Vec<(u8, String)> = model
        .blocks
        .iter()
        .filter_map(|b| match b {
            Block::Heading { level, spans } => Some((*level, spans_text(spans))),
            _ => None,
        })
        .collect();
    assert_eq!(
        headings,
        vec![
            (1, "Introduction".to_string()),
            (2, "Parts".to_string()),
            (1, "Operation".to_string()),
        ]
    );
    assert_eq!(model.table_count(), 1);
}

#[test]
fn test_extract_inline_formatting() {
    let model = extract_bytes(&sample_manual()).unwrap();
    let spans = model
        .blocks
        .iter()
        .find_map(|b| match b {
            Block::Paragraph { spans } if spans_text(spans).starts_with("Welcome") => Some(spans),
            _ => None,
        })
        .unwrap();
    assert_eq!(spans.len(), 2);
    assert!(!spans[0].bold);
    assert!(spans[1].bold);
    assert_eq!(spans[1].text, "engine");
}

#[test]
fn test_extract_image_with_caption() {
    let model = extract_bytes(&sample_manual()).unwrap();
    assert_eq!(model.images.len(), 1);

    let image = model.get_image("img_0001").unwrap();
    assert_eq!(image.format, ImageFormat::Png);
    assert_eq!(image.width, Some(64));
    assert_eq!(image.height, Some(64));
    assert_eq!(image.caption.as_deref(), Some("Engine overview diagram"));
    assert_eq!(image.alt_text.as_deref(), Some("Engine overview"));

    // The caption paragraph is consumed by the figure.
    assert!(!model.blocks.iter().any(|b| matches!(
        b,
        Block::Paragraph { spans } if spans_text(spans).contains("diagram")
    )));
    assert!(model.check_references().is_ok());
}

#[test]
fn test_extract_nested_list() {
    let model = extract_bytes(&sample_manual()).unwrap();
    let lists: Vec<&Block> = model
        .blocks
        .iter()
        .filter(|b| matches!(b, Block::List { .. }))
        .collect();
    assert_eq!(lists.len(), 2);

    let Block::List { ordered, items } = lists[0] else {
        unreachable!()
    };
    assert!(!ordered);
    assert_eq!(items.len(), 2);
    // "Columns" nests under "Store"
    assert_eq!(items[1].len(), 2);
    assert!(matches!(&items[1][1], Block::List { ordered: false, items } if items.len() == 1));

    let Block::List { ordered, items } = lists[1] else {
        unreachable!()
    };
    assert!(ordered);
    assert_eq!(items.len(), 2);
}

#[test]
fn test_extract_table_header() {
    let model = extract_bytes(&sample_manual()).unwrap();
    let grid = model
        .blocks
        .iter()
        .find_map(|b| match b {
            Block::Table { grid } => Some(grid),
            _ => None,
        })
        .unwrap();
    assert_eq!(grid.columns, 2);
    assert_eq!(grid.row_count(), 3);
    assert_eq!(grid.header_rows, 1);
    assert!(grid.is_rectangular());
    assert!(!grid.has_merged_cells());
}

#[test]
fn test_extract_merged_cells() {
    let table = r#"<w:tbl><w:tblGrid><w:gridCol/><w:gridCol/><w:gridCol/></w:tblGrid>
<w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>Wide</w:t></w:r></w:p></w:tc><w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>Tall</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc><w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc></w:tr>
</w:tbl>"#;
    let data = DocxBuilder::new().title("Grid").raw(table).build();
    let model = extract_bytes(&data).unwrap();

    let Some(Block::Table { grid }) = model.blocks.first() else {
        panic!("expected a table");
    };
    assert_eq!(grid.columns, 3);
    assert!(grid.is_rectangular());
    assert!(grid.has_merged_cells());

    let wide = grid.cell(0, 0).and_then(|c| c.as_owner()).unwrap();
    assert_eq!(wide.col_span, 2);
    let tall = grid.cell(0, 2).and_then(|c| c.as_owner()).unwrap();
    assert_eq!(tall.row_span, 2);
    assert!(grid.cell(1, 2).unwrap().is_placeholder());
}

#[test]
fn test_extract_small_images_dropped() {
    let data = DocxBuilder::new()
        .title("Icons")
        .image("icon.png", png(16, 16), "icon")
        .image("photo.png", png(80, 60), "photo")
        .build();
    let model = extract_bytes(&data).unwrap();

    assert_eq!(model.images.len(), 1);
    let image = model.get_image("img_0001").unwrap();
    assert_eq!(image.source_part, "word/media/photo.png");
    assert_eq!(model.image_refs(), vec!["img_0001"]);
}

#[test]
fn test_extract_min_image_size_option() {
    let data = DocxBuilder::new()
        .title("Icons")
        .image("icon.png", png(16, 16), "icon")
        .build();
    let options = ExtractOptions::new().with_min_image_size(10);
    let model = Extractor::new(options).extract(&data).unwrap();
    assert_eq!(model.images.len(), 1);
}

#[test]
fn test_extract_shared_image_part_once() {
    let data = DocxBuilder::new()
        .title("Repeat")
        .image("logo.png", png(60, 60), "logo")
        .para("between")
        .image("logo.png", Vec::new(), "logo")
        .build();
    let model = extract_bytes(&data).unwrap();

    assert_eq!(model.images.len(), 1);
    let refs: Vec<&Block> = model
        .blocks
        .iter()
        .filter(|b| matches!(b, Block::Image { .. }))
        .collect();
    assert_eq!(refs.len(), 2);
}

#[test]
fn test_extract_text_only() {
    let model = Extractor::new(ExtractOptions::text_only())
        .extract(&sample_manual())
        .unwrap();
    assert!(model.images.is_empty());
    assert_eq!(model.table_count(), 0);
    assert!(model.blocks.iter().any(|b| matches!(
        b,
        Block::Paragraph { spans } if spans_text(spans) == "Gear"
    )));
}

#[test]
fn test_extract_fallback_title() {
    let data = DocxBuilder::new().para("Body").build();
    let model = extract_bytes(&data).unwrap();
    assert_eq!(model.title, "");

    let options = ExtractOptions::new().with_fallback_title("notes");
    let model = Extractor::new(options).extract(&data).unwrap();
    assert_eq!(model.title, "notes");
}

#[test]
fn test_extract_file_uses_stem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("release-notes.docx");
    std::fs::write(&path, DocxBuilder::new().para("Body").build()).unwrap();

    let model = docxbook::extract_file(&path).unwrap();
    assert_eq!(model.title, "release-notes");
}

#[test]
fn test_extract_is_deterministic() {
    let data = sample_manual();
    let a = extract_bytes(&data).unwrap();
    let b = extract_bytes(&data).unwrap();
    assert_eq!(a.blocks, b.blocks);
    assert_eq!(
        a.images.keys().collect::<Vec<_>>(),
        b.images.keys().collect::<Vec<_>>()
    );
}

// ==================== Edge Case Tests ====================

#[test]
fn test_extract_not_a_container() {
    assert!(matches!(extract_bytes(b"plain text"), Err(Error::Input(_))));
}

#[test]
fn test_extract_missing_main_document() {
    use std::io::Write;
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("readme.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"hello").unwrap();
    let data = writer.finish().unwrap().into_inner();

    assert!(matches!(extract_bytes(&data), Err(Error::Extraction(_))));
}

#[test]
fn test_extract_empty_body() {
    let model = extract_bytes(&DocxBuilder::new().title("Empty").build()).unwrap();
    assert!(model.is_empty());
    assert_eq!(model.title, "Empty");
}

#[test]
fn test_list_without_numbering_definition() {
    let data = DocxBuilder::new()
        .title("Lists")
        .list_item("42", 0, "Undefined numbering")
        .list_item(BULLETS, 0, "Bullet")
        .build();
    let model = extract_bytes(&data).unwrap();
    // Undefined instances count as ordered, so the kind changes between items.
    assert_eq!(model.blocks.len(), 2);
    assert!(matches!(model.blocks[0], Block::List { ordered: true, .. }));
    assert!(matches!(model.blocks[1], Block::List { ordered: false, .. }));
}

#[test]
fn test_min_image_size_boundary() {
    let data = DocxBuilder::new()
        .title("Boundary")
        .image("exact.png", png(50, 50), "exact")
        .image("narrow.png", png(49, 50), "narrow")
        .image("tiny.png", png(49, 49), "tiny")
        .image("banner.png", png(400, 20), "banner")
        .build();
    let model = extract_bytes(&data).unwrap();

    let parts: Vec<&str> = model
        .images
        .values()
        .map(|i| i.source_part.as_str())
        .collect();
    assert_eq!(
        parts,
        vec![
            "word/media/exact.png",
            "word/media/narrow.png",
            "word/media/banner.png"
        ]
    );
}
