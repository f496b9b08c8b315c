//! Benchmarks for docxbook conversion performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic DOCX packages built in memory.

#[path = "../tests/common/mod.rs"]
mod common;

use common::{png, DocxBuilder, BULLETS};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use docxbook::render::{to_docbook, DocBookOptions};
use docxbook::Packager;

/// Creates a synthetic document with the given number of chapters.
fn create_test_docx(chapters: usize) -> Vec<u8> {
    let mut builder = DocxBuilder::new().title("Benchmark").creator("Bench Runner");
    for i in 0..chapters {
        builder = builder
            .heading(1, &format!("Chapter {}", i + 1))
            .para("Benchmark test content for docxbook performance measurement.")
            .para_bold("Important: ", "bold text")
            .heading(2, "Details")
            .list_item(BULLETS, 0, "First point")
            .list_item(BULLETS, 1, "Nested point")
            .table(&[&["Name", "Value"], &["alpha", "1"], &["beta", "2"]], true)
            .image(&format!("image{}.png", i), png(64, 64), "figure");
    }
    builder.build()
}

/// Benchmark container detection.
fn bench_format_detection(c: &mut Criterion) {
    let docx = create_test_docx(1);
    let not_docx = b"Not a DOCX file at all, just random text content";

    c.bench_function("detect_valid_docx", |b| {
        b.iter(|| docxbook::detect_format_from_bytes(black_box(&docx)).unwrap());
    });

    c.bench_function("detect_non_docx", |b| {
        b.iter(|| docxbook::detect_format_from_bytes(black_box(not_docx)).is_err());
    });
}

/// Benchmark extraction at various sizes.
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");

    for chapters in [1, 10, 50].iter() {
        let data = create_test_docx(*chapters);

        group.bench_function(format!("{}_chapters", chapters), |b| {
            b.iter(|| docxbook::extract_bytes(black_box(&data)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark generation and packaging of an extracted model.
fn bench_generate_and_package(c: &mut Criterion) {
    let model = docxbook::extract_bytes(&create_test_docx(10)).unwrap();
    let options = DocBookOptions::default();
    let xml = to_docbook(&model, &options).unwrap();

    c.bench_function("generate_10_chapters", |b| {
        b.iter(|| to_docbook(black_box(&model), &options).unwrap());
    });

    c.bench_function("package_10_chapters", |b| {
        b.iter(|| Packager::new().package(black_box(&xml), &model).unwrap());
    });
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_extraction,
    bench_generate_and_package,
);
criterion_main!(benches);
