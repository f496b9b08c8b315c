//! DocBook XML generation.
//!
//! Generation runs in two passes. The first pass folds the flat block
//! sequence into a section tree (headings open sections, following blocks
//! become their content). The second pass writes the tree as markup and,
//! when requested, derives the table of contents from the same tree.

use super::escape::{clean_line, escape_xml, normalize_text};
use super::{DocBookOptions, ExtractionStats, RenderResult};
use crate::error::{Error, Result};
use crate::model::{Block, ContentModel, GridCell, OwnerCell, StyleSpan, TableGrid};
use chrono::Datelike;
use std::borrow::Cow;

/// Deepest nesting below a chapter (`sect5`).
const MAX_SECTION_DEPTH: usize = 5;

/// Id of the `book` root element.
pub const BOOK_ID: &str = "b001";

/// Directory prefix of media references inside the markup.
pub const MEDIA_DIR: &str = "multimedia";

/// Convert a content model to DocBook XML.
pub fn to_docbook(model: &ContentModel, options: &DocBookOptions) -> Result<String> {
    DocBookGenerator::new(options.clone()).generate(model)
}

/// A section of the first-pass tree.
#[derive(Debug)]
struct Section<'a> {
    id: String,
    /// 0 = chapter or preface, 1 = sect1, ...
    depth: usize,
    /// Source heading level, used to decide nesting
    level: u8,
    preface: bool,
    /// 1-based position among all heading sections, in source order
    ordinal: usize,
    title: &'a [StyleSpan],
    content: Vec<&'a Block>,
    children: Vec<Section<'a>>,
}

impl<'a> Section<'a> {
    fn element(&self) -> String {
        match (self.preface, self.depth) {
            (true, _) => "preface".to_string(),
            (false, 0) => "chapter".to_string(),
            (false, d) => format!("sect{}", d),
        }
    }

    fn child_id(&self) -> String {
        format!("{}s{:04}", self.id, self.children.len() + 1)
    }

    /// Title markup; headings without visible text get `Section N`.
    fn title_markup(&self) -> String {
        if self.preface {
            return "Preface".to_string();
        }
        let title = render_inline(self.title);
        if title.is_empty() {
            format!("Section {}", self.ordinal)
        } else {
            title
        }
    }

    /// Plain title for table-of-contents entries.
    fn title_text(&self) -> String {
        let title = clean_line(&crate::model::spans_text(self.title));
        if title.is_empty() {
            format!("Section {}", self.ordinal)
        } else {
            title
        }
    }
}

/// Builds the section tree from the block sequence.
#[derive(Default)]
struct TreeBuilder<'a> {
    roots: Vec<Section<'a>>,
    open: Vec<Section<'a>>,
    chapters: usize,
    sections: usize,
}

impl<'a> TreeBuilder<'a> {
    fn build(blocks: &'a [Block]) -> Vec<Section<'a>> {
        let mut builder = TreeBuilder::default();
        for block in blocks {
            match block {
                Block::Heading { level, spans } => builder.open_section((*level).clamp(1, 6), spans),
                other => builder.add_content(other),
            }
        }
        builder.close_to(0);
        builder.roots
    }

    fn open_section(&mut self, level: u8, title: &'a [StyleSpan]) {
        while self
            .open
            .last()
            .is_some_and(|s| s.preface || s.level >= level)
        {
            self.close_one();
        }
        let (id, depth) = match self.open.last() {
            Some(parent) if parent.depth < MAX_SECTION_DEPTH => (parent.child_id(), parent.depth + 1),
            _ => {
                self.close_to(0);
                self.chapters += 1;
                (format!("ch{:04}", self.chapters), 0)
            }
        };
        self.sections += 1;
        self.open.push(Section {
            id,
            depth,
            level,
            preface: false,
            ordinal: self.sections,
            title,
            content: Vec::new(),
            children: Vec::new(),
        });
    }

    fn add_content(&mut self, block: &'a Block) {
        if self.open.is_empty() {
            self.open.push(Section {
                id: "pr0001".to_string(),
                depth: 0,
                level: 0,
                preface: true,
                ordinal: 0,
                title: &[],
                content: Vec::new(),
                children: Vec::new(),
            });
        }
        if let Some(section) = self.open.last_mut() {
            section.content.push(block);
        }
    }

    fn close_one(&mut self) {
        if let Some(section) = self.open.pop() {
            match self.open.last_mut() {
                Some(parent) => parent.children.push(section),
                None => self.roots.push(section),
            }
        }
    }

    fn close_to(&mut self, len: usize) {
        while self.open.len() > len {
            self.close_one();
        }
    }
}

/// Indenting markup writer.
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, String)]) {
        let line = format!("<{}{}>", tag, format_attrs(attrs));
        self.line(&line);
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{}>", tag));
    }

    /// Element whose content is already escaped markup.
    fn leaf(&mut self, tag: &str, attrs: &[(&str, String)], content: &str) {
        let attrs = format_attrs(attrs);
        if content.is_empty() {
            self.line(&format!("<{}{}/>", tag, attrs));
        } else {
            self.line(&format!("<{}{}>{}</{}>", tag, attrs, content, tag));
        }
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, String)]) {
        self.line(&format!("<{}{}/>", tag, format_attrs(attrs)));
    }
}

fn format_attrs(attrs: &[(&str, String)]) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!(" {}=\"{}\"", k, escape_xml(v)))
        .collect()
}

/// DocBook generator.
#[derive(Debug, Clone, Default)]
pub struct DocBookGenerator {
    options: DocBookOptions,
}

impl DocBookGenerator {
    /// Create a generator with the given options.
    pub fn new(options: DocBookOptions) -> Self {
        Self { options }
    }

    /// Get the generation options.
    pub fn options(&self) -> &DocBookOptions {
        &self.options
    }

    /// Generate DocBook XML for a content model.
    pub fn generate(&self, model: &ContentModel) -> Result<String> {
        let title = clean_line(&model.title);
        if title.is_empty() {
            return Err(Error::Generation("document has no title".into()));
        }
        model.check_references()?;

        let tree = TreeBuilder::build(&model.blocks);
        log::debug!(
            "section tree: {} top-level components, {} blocks",
            tree.len(),
            model.blocks.len()
        );

        let mut w = XmlWriter::new();
        w.line("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
        w.line(&self.options.schema.doctype());
        w.open("book", &[("id", BOOK_ID.to_string())]);
        self.write_bookinfo(&mut w, model, &title);
        if self.options.include_toc {
            self.write_toc(&mut w, &tree);
        }

        let mut figures = 0usize;
        if tree.is_empty() {
            w.open("chapter", &[("id", "ch0001".to_string())]);
            w.leaf("title", &[], &title);
            w.empty("para", &[]);
            w.close("chapter");
        }
        for section in &tree {
            self.write_section(&mut w, model, section, &mut figures);
        }
        w.close("book");
        Ok(w.out)
    }

    /// Generate DocBook XML together with content statistics.
    pub fn generate_with_stats(&self, model: &ContentModel) -> Result<RenderResult> {
        let content = self.generate(model)?;
        let stats = ExtractionStats::from_model(model);
        Ok(RenderResult::new(content, model.metadata.clone(), stats))
    }

    fn write_bookinfo(&self, w: &mut XmlWriter, model: &ContentModel, title: &str) {
        let meta = &model.metadata;
        let opts = &self.options;
        w.open("bookinfo", &[]);
        w.leaf("title", &[], title);

        let authors: Vec<&String> = meta.authors.iter().filter(|a| !a.trim().is_empty()).collect();
        if !authors.is_empty() {
            w.open("authorgroup", &[]);
            for author in authors {
                let name = normalize_text(author);
                let name = name.trim();
                w.open("author", &[]);
                match name.rsplit_once(' ') {
                    Some((first, last)) => {
                        w.leaf("firstname", &[], &escape_xml(first));
                        w.leaf("surname", &[], &escape_xml(last));
                    }
                    None => w.leaf("surname", &[], &escape_xml(name)),
                }
                w.close("author");
            }
            w.close("authorgroup");
        }

        if let Some(isbn) = opts.isbn.as_deref().map(clean_line).filter(|s| !s.is_empty()) {
            w.leaf("isbn", &[], &isbn);
        }
        if let Some(publisher) = opts.publisher.as_deref().map(clean_line).filter(|s| !s.is_empty()) {
            w.open("publisher", &[]);
            w.leaf("publishername", &[], &publisher);
            w.close("publisher");
        }
        if let Some(pubdate) = opts.pubdate.as_deref().map(clean_line).filter(|s| !s.is_empty()) {
            w.leaf("pubdate", &[], &pubdate);
        }
        if let Some(edition) = opts.edition.as_deref().map(clean_line).filter(|s| !s.is_empty()) {
            w.leaf("edition", &[], &edition);
        }
        if let Some(holder) = opts.copyright_holder.as_deref().map(clean_line).filter(|s| !s.is_empty()) {
            let year = opts
                .copyright_year
                .as_deref()
                .map(clean_line)
                .or_else(|| meta.created.map(|d| d.year().to_string()));
            if let Some(year) = year {
                w.open("copyright", &[]);
                w.leaf("year", &[], &year);
                w.leaf("holder", &[], &holder);
                w.close("copyright");
            }
        }

        if let Some(description) = meta.description.as_deref().map(clean_line).filter(|s| !s.is_empty()) {
            w.open("abstract", &[]);
            w.leaf("para", &[], &description);
            w.close("abstract");
        }
        if let Some(subject) = meta.subject.as_deref().map(clean_line).filter(|s| !s.is_empty()) {
            w.open("subjectset", &[]);
            w.open("subject", &[]);
            w.leaf("subjectterm", &[], &subject);
            w.close("subject");
            w.close("subjectset");
        }
        let keywords = meta.keyword_list();
        if !keywords.is_empty() {
            w.open("keywordset", &[]);
            for keyword in keywords {
                w.leaf("keyword", &[], &clean_line(keyword));
            }
            w.close("keywordset");
        }
        w.close("bookinfo");
    }

    /// Second pass: table of contents from the section tree.
    fn write_toc(&self, w: &mut XmlWriter, tree: &[Section<'_>]) {
        w.open("toc", &[]);
        w.leaf("title", &[], "Table of Contents");
        for section in tree.iter().filter(|s| s.preface) {
            w.leaf("tocfront", &[("linkend", section.id.clone())], "Preface");
        }
        for chapter in tree.iter().filter(|s| !s.preface) {
            self.write_toc_entry(w, chapter);
        }
        w.close("toc");
    }

    fn write_toc_entry(&self, w: &mut XmlWriter, section: &Section<'_>) {
        let tag = if section.depth == 0 {
            "tocchap".to_string()
        } else {
            format!("toclevel{}", section.depth)
        };
        w.open(&tag, &[]);
        w.leaf(
            "tocentry",
            &[("linkend", section.id.clone())],
            &section.title_text(),
        );
        let max_depth = usize::from(self.options.toc_depth).saturating_sub(1);
        if section.depth < max_depth {
            for child in &section.children {
                self.write_toc_entry(w, child);
            }
        }
        w.close(&tag);
    }

    fn write_section(
        &self,
        w: &mut XmlWriter,
        model: &ContentModel,
        section: &Section<'_>,
        figures: &mut usize,
    ) {
        let element = section.element();
        w.open(&element, &[("id", section.id.clone())]);
        w.leaf("title", &[], &section.title_markup());

        let before = w.out.len();
        for block in &section.content {
            self.write_block(w, model, block, figures);
        }
        if w.out.len() == before && section.children.is_empty() {
            w.empty("para", &[]);
        }
        for child in &section.children {
            self.write_section(w, model, child, figures);
        }
        w.close(&element);
    }

    fn write_block(&self, w: &mut XmlWriter, model: &ContentModel, block: &Block, figures: &mut usize) {
        match block {
            Block::Heading { spans, .. } | Block::Paragraph { spans } => {
                let text = render_inline(spans);
                if !text.is_empty() {
                    w.leaf("para", &[], &text);
                }
            }
            Block::List { ordered, items } => {
                let tag = if *ordered { "orderedlist" } else { "itemizedlist" };
                w.open(tag, &[]);
                for item in items {
                    w.open("listitem", &[]);
                    let before = w.out.len();
                    for child in item {
                        self.write_block(w, model, child, figures);
                    }
                    if w.out.len() == before {
                        w.empty("para", &[]);
                    }
                    w.close("listitem");
                }
                w.close(tag);
            }
            Block::Table { grid } => write_table(w, grid),
            Block::Image { id } => {
                let Some(image) = model.get_image(id) else {
                    return;
                };
                *figures += 1;
                let title = image
                    .caption
                    .as_deref()
                    .map(clean_line)
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| format!("Figure {}", figures));

                w.open("figure", &[("id", format!("fig_{:04}", figures))]);
                w.leaf("title", &[], &title);
                w.open("mediaobject", &[]);
                w.open("imageobject", &[]);
                let mut attrs = vec![(
                    "fileref",
                    format!("{}/{}", MEDIA_DIR, image.filename(id)),
                )];
                if let (Some(width), Some(height)) = (image.width, image.height) {
                    attrs.push(("width", format!("{}px", width)));
                    attrs.push(("depth", format!("{}px", height)));
                }
                w.empty("imagedata", &attrs);
                w.close("imageobject");
                if let Some(alt) = image.alt_text.as_deref().map(clean_line).filter(|a| !a.is_empty()) {
                    w.open("textobject", &[]);
                    w.leaf("phrase", &[], &alt);
                    w.close("textobject");
                }
                w.close("mediaobject");
                w.close("figure");
            }
        }
    }
}

fn write_table(w: &mut XmlWriter, grid: &TableGrid) {
    let grid = if grid.has_covered_rows() {
        let mut collapsed = grid.clone();
        collapsed.collapse_covered_rows();
        Cow::Owned(collapsed)
    } else {
        Cow::Borrowed(grid)
    };
    if grid.columns == 0 || grid.is_empty() {
        return;
    }
    w.open("informaltable", &[]);
    w.open("tgroup", &[("cols", grid.columns.to_string())]);
    for col in 1..=grid.columns {
        w.empty("colspec", &[("colname", format!("c{}", col))]);
    }
    if !grid.header().is_empty() {
        w.open("thead", &[]);
        write_rows(w, grid.header());
        w.close("thead");
    }
    w.open("tbody", &[]);
    write_rows(w, grid.body());
    w.close("tbody");
    w.close("tgroup");
    w.close("informaltable");
}

fn write_rows(w: &mut XmlWriter, rows: &[Vec<GridCell>]) {
    for row in rows {
        w.open("row", &[]);
        for (col, cell) in row.iter().enumerate() {
            if let GridCell::Owner(owner) = cell {
                write_entry(w, owner, col);
            }
        }
        w.close("row");
    }
}

fn write_entry(w: &mut XmlWriter, cell: &OwnerCell, col: usize) {
    let mut attrs = Vec::new();
    if cell.col_span > 1 {
        attrs.push(("namest", format!("c{}", col + 1)));
        attrs.push(("nameend", format!("c{}", col + cell.col_span)));
    }
    if cell.row_span > 1 {
        attrs.push(("morerows", (cell.row_span - 1).to_string()));
    }

    let paragraphs: Vec<String> = cell
        .paragraphs
        .iter()
        .map(|p| render_inline(p))
        .filter(|p| !p.is_empty())
        .collect();
    match paragraphs.as_slice() {
        [] => w.empty("entry", &attrs),
        [single] => w.leaf("entry", &attrs, single),
        many => {
            w.open("entry", &attrs);
            for para in many {
                w.leaf("para", &[], para);
            }
            w.close("entry");
        }
    }
}

/// Render spans as inline markup.
///
/// Emphasis nests in a fixed order: bold outermost, then italic, then
/// underline. Whitespace is collapsed across span boundaries.
pub fn render_inline(spans: &[StyleSpan]) -> String {
    let mut out = String::new();
    let mut ends_with_space = true;
    for span in spans {
        let mut text = normalize_text(&span.text);
        if ends_with_space && text.starts_with(' ') {
            text.remove(0);
        }
        if text.is_empty() {
            continue;
        }
        ends_with_space = text.ends_with(' ');
        let mut inner = escape_xml(&text);
        if span.underline {
            inner = format!("<emphasis role=\"underline\">{}</emphasis>", inner);
        }
        if span.italic {
            inner = format!("<emphasis>{}</emphasis>", inner);
        }
        if span.bold {
            inner = format!("<emphasis role=\"bold\">{}</emphasis>", inner);
        }
        out.push_str(&inner);
    }
    if ends_with_space && out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageAsset, TextFormat};

    fn generate(model: &ContentModel) -> String {
        DocBookGenerator::default().generate(model).unwrap()
    }

    #[test]
    fn test_requires_title() {
        let model = ContentModel::new("   ");
        let err = DocBookGenerator::default().generate(&model).unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[test]
    fn test_prolog_and_root() {
        let xml = generate(&ContentModel::new("Book"));
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE book PUBLIC"));
        assert!(xml.contains("<book id=\"b001\">"));
        assert!(xml.contains("<title>Book</title>"));
        assert!(xml.contains("<chapter id=\"ch0001\">"));
    }

    #[test]
    fn test_heading_nesting() {
        let mut model = ContentModel::new("Book");
        model.add_block(Block::heading(1, "One"));
        model.add_block(Block::paragraph("intro"));
        model.add_block(Block::heading(2, "One.A"));
        model.add_block(Block::paragraph("detail"));
        model.add_block(Block::heading(1, "Two"));
        let xml = generate(&model);

        let ch1 = xml.find("<chapter id=\"ch0001\">").unwrap();
        let s1 = xml.find("<sect1 id=\"ch0001s0001\">").unwrap();
        let end_s1 = xml.find("</sect1>").unwrap();
        let ch2 = xml.find("<chapter id=\"ch0002\">").unwrap();
        assert!(ch1 < s1 && s1 < end_s1 && end_s1 < ch2);
        // Empty chapter gets a placeholder paragraph.
        assert!(xml[ch2..].contains("<para/>"));
    }

    #[test]
    fn test_skipped_level_nests_directly() {
        let mut model = ContentModel::new("Book");
        model.add_block(Block::heading(1, "One"));
        model.add_block(Block::heading(3, "Deep"));
        model.add_block(Block::paragraph("x"));
        let xml = generate(&model);
        assert!(xml.contains("<sect1 id=\"ch0001s0001\">"));
        assert!(!xml.contains("<sect2"));
    }

    #[test]
    fn test_preface_for_leading_content() {
        let mut model = ContentModel::new("Book");
        model.add_block(Block::paragraph("before"));
        model.add_block(Block::heading(1, "One"));
        let xml = generate(&model);
        let preface = xml.find("<preface id=\"pr0001\">").unwrap();
        assert!(preface < xml.find("<chapter").unwrap());
    }

    #[test]
    fn test_emphasis_nesting_order() {
        let spans = vec![StyleSpan::new(
            "x",
            TextFormat {
                bold: true,
                italic: true,
                underline: true,
            },
        )];
        assert_eq!(
            render_inline(&spans),
            "<emphasis role=\"bold\"><emphasis><emphasis role=\"underline\">x</emphasis></emphasis></emphasis>"
        );
    }

    #[test]
    fn test_inline_whitespace_and_escape() {
        let spans = vec![StyleSpan::plain("a  <b> "), StyleSpan::bold(" c")];
        assert_eq!(
            render_inline(&spans),
            "a &lt;b&gt; <emphasis role=\"bold\">c</emphasis>"
        );
    }

    #[test]
    fn test_merged_table_entries() {
        let grid = TableGrid {
            columns: 2,
            header_rows: 0,
            cells: vec![
                vec![
                    GridCell::Owner(OwnerCell::text("top").col_span(2)),
                    GridCell::Placeholder {
                        owner_row: 0,
                        owner_col: 0,
                    },
                ],
                vec![
                    GridCell::Owner(OwnerCell::text("a")),
                    GridCell::Owner(OwnerCell::text("b")),
                ],
            ],
        };
        let mut model = ContentModel::new("Book");
        model.add_block(Block::Table { grid });
        let xml = generate(&model);
        assert!(xml.contains("<tgroup cols=\"2\">"));
        assert_eq!(xml.matches("<colspec").count(), 2);
        assert!(xml.contains("<entry namest=\"c1\" nameend=\"c2\">top</entry>"));
        assert_eq!(xml.matches("<entry").count(), 3);
    }

    #[test]
    fn test_header_only_table_has_body_rows() {
        let grid = TableGrid::from_text_rows(&[vec!["H1", "H2"]]).with_header_rows(1);
        let mut model = ContentModel::new("Book");
        model.add_block(Block::Table { grid });
        let xml = generate(&model);
        assert!(!xml.contains("<thead>"));
        let body = xml.find("<tbody>").unwrap();
        assert!(xml[body..].contains("<entry>H1</entry>"));
    }

    #[test]
    fn test_fully_covered_row_is_not_emitted() {
        let grid = TableGrid {
            columns: 1,
            header_rows: 0,
            cells: vec![
                vec![GridCell::Owner(OwnerCell::text("tall").row_span(2))],
                vec![GridCell::Placeholder {
                    owner_row: 0,
                    owner_col: 0,
                }],
            ],
        };
        let mut model = ContentModel::new("Book");
        model.add_block(Block::Table { grid });
        let xml = generate(&model);
        assert_eq!(xml.matches("<row>").count(), 1);
        assert!(xml.contains("<entry>tall</entry>"));
        assert!(!xml.contains("morerows"));
    }

    #[test]
    fn test_untitled_heading_gets_fallback_title() {
        let mut model = ContentModel::new("Book");
        model.add_block(Block::heading(1, "One"));
        model.add_block(Block::heading(2, "\u{0007}"));
        model.add_block(Block::paragraph("body"));
        let options = DocBookOptions::new().with_toc(true);
        let xml = DocBookGenerator::new(options).generate(&model).unwrap();
        assert!(xml.contains("<title>Section 2</title>"));
        assert!(xml.contains("<tocentry linkend=\"ch0001s0001\">Section 2</tocentry>"));
        assert!(!xml.contains("<title/>"));
    }

    #[test]
    fn test_figure() {
        let mut model = ContentModel::new("Book");
        model.add_image(
            "img_0001",
            ImageAsset::new(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], "word/media/image1.png")
                .with_dimensions(120, 80)
                .with_caption("A & B")
                .with_alt_text("diagram"),
        );
        model.add_block(Block::Image {
            id: "img_0001".into(),
        });
        let xml = generate(&model);
        assert!(xml.contains("<figure id=\"fig_0001\">"));
        assert!(xml.contains("<title>A &amp; B</title>"));
        assert!(xml.contains(
            "<imagedata fileref=\"multimedia/img_0001.png\" width=\"120px\" depth=\"80px\"/>"
        ));
        assert!(xml.contains("<phrase>diagram</phrase>"));
    }

    #[test]
    fn test_dangling_image_is_generation_error() {
        let mut model = ContentModel::new("Book");
        model.add_block(Block::Image { id: "img_0009".into() });
        assert!(matches!(
            DocBookGenerator::default().generate(&model),
            Err(Error::Generation(_))
        ));
    }

    #[test]
    fn test_toc_reflects_tree() {
        let mut model = ContentModel::new("Book");
        model.add_block(Block::heading(1, "One"));
        model.add_block(Block::heading(2, "One.A"));
        model.add_block(Block::heading(1, "Two"));
        let options = DocBookOptions::new().with_toc(true);
        let xml = DocBookGenerator::new(options).generate(&model).unwrap();
        assert!(xml.contains("<tocentry linkend=\"ch0001\">One</tocentry>"));
        assert!(xml.contains("<tocentry linkend=\"ch0001s0001\">One.A</tocentry>"));
        assert!(xml.contains("<tocentry linkend=\"ch0002\">Two</tocentry>"));
        assert_eq!(xml.matches("<tocchap>").count(), 2);
    }

    #[test]
    fn test_deterministic() {
        let mut model = ContentModel::new("Book");
        model.add_block(Block::heading(1, "One"));
        model.add_block(Block::list(true, ["a", "b"]));
        assert_eq!(generate(&model), generate(&model));
    }
}
