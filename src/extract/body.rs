//! Document body traversal.
//!
//! Walks `w:body` in source order and produces [`RawBlock`]s: resolved
//! text and structure, with images still referenced by package part.

use super::numbering::Numbering;
use super::options::ExtractOptions;
use super::package::Relationships;
use super::styles::{NumRef, ParagraphStyle, RunProps, StyleSheet};
use super::table::{self, RawCell, RawRow};
use super::xml::Element;
use crate::model::{coalesce_spans, StyleSpan, TableGrid};

/// Image referenced from the body.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    /// Resolved part name of the media file
    pub part: String,
    /// Alternative text from the drawing properties
    pub alt_text: Option<String>,
}

/// Body content before image resolution and list grouping.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBlock {
    Heading { level: u8, spans: Vec<StyleSpan> },
    Paragraph { spans: Vec<StyleSpan> },
    ListItem { ordered: bool, level: u8, spans: Vec<StyleSpan> },
    Caption { spans: Vec<StyleSpan> },
    Table { grid: TableGrid },
    Image(ImageRef),
}

/// A parsed paragraph.
#[derive(Debug, Default)]
struct ParsedParagraph {
    style: ParagraphStyle,
    num: Option<NumRef>,
    spans: Vec<StyleSpan>,
    images: Vec<ImageRef>,
}

/// Body walker over resolved styles, numbering and relationships.
pub(crate) struct BodyReader<'a> {
    pub styles: &'a StyleSheet,
    pub numbering: &'a Numbering,
    pub rels: &'a Relationships,
    pub options: &'a ExtractOptions,
}

impl<'a> BodyReader<'a> {
    /// Read all blocks of a `w:body` (or any block container).
    pub fn read(&self, body: &Element) -> Vec<RawBlock> {
        let mut out = Vec::new();
        self.read_container(body, &mut out);
        out
    }

    fn read_container(&self, container: &Element, out: &mut Vec<RawBlock>) {
        for child in container.elements() {
            match child.name.as_str() {
                "w:p" => self.read_paragraph(child, out),
                "w:tbl" => self.read_table(child, out),
                "w:sdt" => {
                    if let Some(content) = child.child("w:sdtContent") {
                        self.read_container(content, out);
                    }
                }
                "w:customXml" => self.read_container(child, out),
                _ => {}
            }
        }
    }

    fn read_paragraph(&self, p: &Element, out: &mut Vec<RawBlock>) {
        let para = self.parse_paragraph(p);
        if !para.spans.is_empty() {
            out.push(self.classify(&para));
        }
        if self.options.extract_images {
            out.extend(para.images.into_iter().map(RawBlock::Image));
        }
    }

    fn classify(&self, para: &ParsedParagraph) -> RawBlock {
        let spans = para.spans.clone();
        if para.style.is_caption {
            return RawBlock::Caption { spans };
        }
        if let Some(level) = para.style.heading_level {
            return RawBlock::Heading { level, spans };
        }
        if let Some(num) = &para.num {
            return RawBlock::ListItem {
                ordered: self.numbering.is_ordered(&num.num_id, num.ilvl),
                level: num.ilvl,
                spans,
            };
        }
        if let Some(hint) = para.style.list_hint {
            return RawBlock::ListItem {
                ordered: hint.ordered,
                level: hint.ilvl,
                spans,
            };
        }
        RawBlock::Paragraph { spans }
    }

    fn parse_paragraph(&self, p: &Element) -> ParsedParagraph {
        let ppr = p.child("w:pPr");
        let mut style = self
            .styles
            .paragraph_style(ppr.and_then(|pr| pr.child_val("w:pStyle")));

        if let Some(level) = ppr
            .and_then(|pr| pr.child_val("w:outlineLvl"))
            .and_then(|v| v.parse::<u8>().ok())
        {
            style.heading_level = (level < 9).then_some(level + 1);
        }
        let num = match ppr
            .and_then(|pr| pr.child("w:numPr"))
            .and_then(NumRef::from_num_pr)
        {
            Some(direct) => direct,
            None => style.num.clone(),
        };
        // Direct paragraph-mark formatting does not apply to runs; only
        // the paragraph style contributes.
        let mut para = ParsedParagraph {
            style,
            num,
            ..Default::default()
        };
        let mut spans = Vec::new();
        self.collect_runs(p, &para.style, &mut spans, &mut para.images);
        para.spans = trim_spans(coalesce_spans(spans));
        para
    }

    /// Collect runs from paragraph-level content, descending into inline
    /// wrappers such as hyperlinks and tracked insertions.
    fn collect_runs(
        &self,
        container: &Element,
        style: &ParagraphStyle,
        spans: &mut Vec<StyleSpan>,
        images: &mut Vec<ImageRef>,
    ) {
        for child in container.elements() {
            match child.name.as_str() {
                "w:r" => self.read_run(child, style, spans, images),
                "w:hyperlink" | "w:ins" | "w:smartTag" | "w:fldSimple" | "w:customXml"
                | "w:moveTo" | "w:dir" | "w:bdo" => self.collect_runs(child, style, spans, images),
                "w:sdt" => {
                    if let Some(content) = child.child("w:sdtContent") {
                        self.collect_runs(content, style, spans, images);
                    }
                }
                "mc:AlternateContent" => {
                    if let Some(branch) = alternate_branch(child) {
                        self.collect_runs(branch, style, spans, images);
                    }
                }
                _ => {}
            }
        }
    }

    fn read_run(
        &self,
        run: &Element,
        style: &ParagraphStyle,
        spans: &mut Vec<StyleSpan>,
        images: &mut Vec<ImageRef>,
    ) {
        let rpr = run.child("w:rPr");
        let direct = rpr.map(RunProps::from_rpr).unwrap_or_default();
        let char_style = rpr.and_then(|r| r.child_val("w:rStyle"));
        let format = self.styles.run_format(style, char_style, direct);

        let mut text = String::new();
        self.read_run_content(run, &mut text, images);
        if !text.is_empty() {
            spans.push(StyleSpan::new(text, format));
        }
    }

    fn read_run_content(&self, run: &Element, text: &mut String, images: &mut Vec<ImageRef>) {
        for child in run.elements() {
            match child.name.as_str() {
                "w:t" => text.push_str(&child.text()),
                "w:tab" | "w:br" | "w:cr" | "w:ptab" => text.push(' '),
                "w:noBreakHyphen" => text.push('-'),
                "w:drawing" => self.read_drawing(child, images),
                "w:pict" | "w:object" => self.read_vml(child, images),
                "mc:AlternateContent" => {
                    if let Some(branch) = alternate_branch(child) {
                        self.read_run_content(branch, text, images);
                    }
                }
                _ => {}
            }
        }
    }

    fn read_drawing(&self, drawing: &Element, images: &mut Vec<ImageRef>) {
        let alt_text = drawing
            .descendants_named("wp:docPr")
            .first()
            .and_then(|pr| {
                pr.attr("descr")
                    .filter(|d| !d.trim().is_empty())
                    .or_else(|| pr.attr("title").filter(|t| !t.trim().is_empty()))
            })
            .map(|s| s.trim().to_string());

        for blip in drawing.descendants_named("a:blip") {
            let Some(rid) = blip.attr("r:embed").or_else(|| blip.attr("r:link")) else {
                continue;
            };
            if let Some(part) = self.image_part(rid) {
                images.push(ImageRef {
                    part,
                    alt_text: alt_text.clone(),
                });
            }
        }
    }

    fn read_vml(&self, pict: &Element, images: &mut Vec<ImageRef>) {
        for data in pict.descendants_named("v:imagedata") {
            let Some(rid) = data.attr("r:id") else {
                continue;
            };
            if let Some(part) = self.image_part(rid) {
                let alt_text = data
                    .attr("o:title")
                    .filter(|t| !t.trim().is_empty())
                    .map(str::to_string);
                images.push(ImageRef { part, alt_text });
            }
        }
    }

    fn image_part(&self, rid: &str) -> Option<String> {
        match self.rels.get(rid) {
            Some(rel) if rel.external => {
                log::warn!("skipping externally linked image {} ({})", rid, rel.target);
                None
            }
            Some(rel) => Some(rel.target.clone()),
            None => {
                log::warn!("image relationship {} not found", rid);
                None
            }
        }
    }

    fn read_table(&self, tbl: &Element, out: &mut Vec<RawBlock>) {
        let mut rows = Vec::new();
        let mut images = Vec::new();
        for tr in rows_of(tbl) {
            let mut row = RawRow::from_tr(tr);
            for tc in cells_of(tr) {
                let mut cell = RawCell::from_tc(tc);
                self.read_cell(tc, &mut cell.paragraphs, &mut images);
                row.cells.push(cell);
            }
            rows.push(row);
        }

        if self.options.extract_tables {
            let grid = table::build_grid(table::declared_columns(tbl), rows);
            if !grid.is_empty() {
                out.push(RawBlock::Table { grid });
            }
        } else {
            let paragraphs = rows
                .into_iter()
                .flat_map(|r| r.cells)
                .flat_map(|c| c.paragraphs);
            out.extend(paragraphs.map(|spans| RawBlock::Paragraph { spans }));
        }

        if self.options.extract_images {
            out.extend(images.into_iter().map(RawBlock::Image));
        }
    }

    /// Cell content as paragraphs; nested tables are flattened in place.
    fn read_cell(
        &self,
        container: &Element,
        paragraphs: &mut Vec<Vec<StyleSpan>>,
        images: &mut Vec<ImageRef>,
    ) {
        for child in container.elements() {
            match child.name.as_str() {
                "w:p" => {
                    let para = self.parse_paragraph(child);
                    if !para.spans.is_empty() {
                        paragraphs.push(para.spans);
                    }
                    images.extend(para.images);
                }
                "w:tbl" => {
                    for tr in rows_of(child) {
                        for tc in cells_of(tr) {
                            self.read_cell(tc, paragraphs, images);
                        }
                    }
                }
                "w:sdt" => {
                    if let Some(content) = child.child("w:sdtContent") {
                        self.read_cell(content, paragraphs, images);
                    }
                }
                "w:customXml" => self.read_cell(child, paragraphs, images),
                _ => {}
            }
        }
    }
}

/// Branch of `mc:AlternateContent` to read: the first choice, else the fallback.
fn alternate_branch(alt: &Element) -> Option<&Element> {
    alt.child("mc:Choice").or_else(|| alt.child("mc:Fallback"))
}

/// Elements named `name` directly under `parent`, looking through content
/// controls and custom XML wrappers.
fn wrapped_children<'e>(parent: &'e Element, name: &str, out: &mut Vec<&'e Element>) {
    for child in parent.elements() {
        if child.name == name {
            out.push(child);
        } else if child.name == "w:sdt" {
            if let Some(content) = child.child("w:sdtContent") {
                wrapped_children(content, name, out);
            }
        } else if child.name == "w:customXml" {
            wrapped_children(child, name, out);
        }
    }
}

fn rows_of(tbl: &Element) -> Vec<&Element> {
    let mut rows = Vec::new();
    wrapped_children(tbl, "w:tr", &mut rows);
    rows
}

fn cells_of(tr: &Element) -> Vec<&Element> {
    let mut cells = Vec::new();
    wrapped_children(tr, "w:tc", &mut cells);
    cells
}

/// Trim leading whitespace of the first span and trailing whitespace of
/// the last, dropping spans left empty.
fn trim_spans(mut spans: Vec<StyleSpan>) -> Vec<StyleSpan> {
    while let Some(first) = spans.first_mut() {
        let trimmed = first.text.trim_start();
        if trimmed.is_empty() {
            spans.remove(0);
        } else {
            first.text = trimmed.to_string();
            break;
        }
    }
    while let Some(last) = spans.last_mut() {
        let trimmed = last.text.trim_end();
        if trimmed.is_empty() {
            spans.pop();
        } else {
            last.text = trimmed.to_string();
            break;
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::package::Relationships;
    use crate::extract::xml;

    const RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId6" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="http://example.com/x.png" TargetMode="External"/>
</Relationships>"#;

    fn read(body: &str, options: ExtractOptions) -> Vec<RawBlock> {
        let styles = StyleSheet::default();
        let numbering = Numbering::default();
        let rels = Relationships::parse(RELS, "word").unwrap();
        let reader = BodyReader {
            styles: &styles,
            numbering: &numbering,
            rels: &rels,
            options: &options,
        };
        let body = xml::parse(body).unwrap();
        reader.read(&body)
    }

    #[test]
    fn test_runs_coalesce_and_trim() {
        let blocks = read(
            r#"<w:body><w:p><w:r><w:t xml:space="preserve"> Hel</w:t></w:r><w:r><w:t>lo </w:t></w:r>
            <w:r><w:rPr><w:b/></w:rPr><w:t>world</w:t></w:r><w:r><w:t xml:space="preserve">  </w:t></w:r></w:p></w:body>"#,
            ExtractOptions::default(),
        );
        assert_eq!(
            blocks,
            vec![RawBlock::Paragraph {
                spans: vec![StyleSpan::plain("Hello "), StyleSpan::bold("world")]
            }]
        );
    }

    #[test]
    fn test_empty_paragraph_dropped() {
        let blocks = read(
            "<w:body><w:p/><w:p><w:r><w:t> </w:t></w:r></w:p></w:body>",
            ExtractOptions::default(),
        );
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_hyperlink_and_breaks() {
        let blocks = read(
            r#"<w:body><w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r>
            <w:hyperlink r:id="rId9"><w:r><w:t>link</w:t></w:r></w:hyperlink>
            <w:del><w:r><w:delText>gone</w:delText></w:r></w:del></w:p></w:body>"#,
            ExtractOptions::default(),
        );
        assert_eq!(
            blocks,
            vec![RawBlock::Paragraph {
                spans: vec![StyleSpan::plain("a blink")]
            }]
        );
    }

    #[test]
    fn test_direct_outline_level_heading() {
        let blocks = read(
            r#"<w:body><w:p><w:pPr><w:outlineLvl w:val="1"/></w:pPr><w:r><w:t>Sub</w:t></w:r></w:p></w:body>"#,
            ExtractOptions::default(),
        );
        assert!(matches!(&blocks[0], RawBlock::Heading { level: 2, .. }));
    }

    #[test]
    fn test_drawing_image_reference() {
        let blocks = read(
            r#"<w:body><w:p><w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture 1" descr="A chart"/>
            <a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="rId5"/></pic:blipFill></pic:pic></a:graphicData></a:graphic>
            </wp:inline></w:drawing></w:r></w:p>
            <w:p><w:r><w:drawing><a:blip r:embed="rId6"/></w:drawing></w:r></w:p></w:body>"#,
            ExtractOptions::default(),
        );
        assert_eq!(
            blocks,
            vec![RawBlock::Image(ImageRef {
                part: "word/media/image1.png".into(),
                alt_text: Some("A chart".into()),
            })]
        );
    }

    #[test]
    fn test_images_disabled() {
        let blocks = read(
            r#"<w:body><w:p><w:r><w:drawing><a:blip r:embed="rId5"/></w:drawing></w:r></w:p></w:body>"#,
            ExtractOptions::default().with_images(false),
        );
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_table_with_nested_table_flattened() {
        let blocks = read(
            r#"<w:body><w:tbl><w:tblGrid><w:gridCol/><w:gridCol/></w:tblGrid>
            <w:tr><w:tc><w:p><w:r><w:t>outer</w:t></w:r></w:p>
              <w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:tc>
            <w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body>"#,
            ExtractOptions::default(),
        );
        let RawBlock::Table { grid } = &blocks[0] else {
            panic!("expected table, got {:?}", blocks[0]);
        };
        assert_eq!(grid.columns, 2);
        assert_eq!(grid.row_count(), 1);
        let first = grid.cell(0, 0).unwrap().as_owner().unwrap();
        assert_eq!(first.paragraphs.len(), 2);
        assert_eq!(first.plain_text(), "outer inner");
    }

    #[test]
    fn test_tables_disabled_become_paragraphs() {
        let blocks = read(
            r#"<w:body><w:tbl><w:tr><w:tc><w:p><w:r><w:t>x</w:t></w:r></w:p></w:tc>
            <w:tc><w:p><w:r><w:t>y</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body>"#,
            ExtractOptions::default().with_tables(false),
        );
        assert_eq!(
            blocks,
            vec![
                RawBlock::Paragraph { spans: vec![StyleSpan::plain("x")] },
                RawBlock::Paragraph { spans: vec![StyleSpan::plain("y")] },
            ]
        );
    }

    #[test]
    fn test_content_control_is_transparent() {
        let blocks = read(
            r#"<w:body><w:sdt><w:sdtPr/><w:sdtContent><w:p><w:r><w:t>inside</w:t></w:r></w:p></w:sdtContent></w:sdt></w:body>"#,
            ExtractOptions::default(),
        );
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_trim_spans() {
        let spans = trim_spans(vec![
            StyleSpan::plain("  "),
            StyleSpan::bold(" a "),
            StyleSpan::italic(" "),
        ]);
        assert_eq!(spans, vec![StyleSpan::bold("a")]);
    }
}
