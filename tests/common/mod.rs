//! In-memory DOCX fixtures for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="0"/></w:pPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="1"/></w:pPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="2"/></w:pPr></w:style>
  <w:style w:type="paragraph" w:styleId="Caption"><w:name w:val="caption"/><w:basedOn w:val="Normal"/></w:style>
</w:styles>"#;

const NUMBERING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl>
    <w:lvl w:ilvl="1"><w:numFmt w:val="bullet"/></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="1">
    <w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
</w:numbering>"#;

/// Numbering instance of bulleted lists.
pub const BULLETS: &str = "1";
/// Numbering instance of numbered lists.
pub const NUMBERS: &str = "2";

/// Builds DOCX packages from body markup fragments.
#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    title: Option<String>,
    creator: Option<String>,
    subject: Option<String>,
    keywords: Option<String>,
    body: Vec<String>,
    images: Vec<(String, String, Vec<u8>)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn creator(mut self, creator: &str) -> Self {
        self.creator = Some(creator.to_string());
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn keywords(mut self, keywords: &str) -> Self {
        self.keywords = Some(keywords.to_string());
        self
    }

    /// Append raw body markup.
    pub fn raw(mut self, xml: &str) -> Self {
        self.body.push(xml.to_string());
        self
    }

    pub fn heading(self, level: u8, text: &str) -> Self {
        let xml = format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading{}"/></w:pPr>{}</w:p>"#,
            level,
            run(text)
        );
        self.raw(&xml)
    }

    pub fn para(self, text: &str) -> Self {
        let xml = format!("<w:p>{}</w:p>", run(text));
        self.raw(&xml)
    }

    /// Paragraph with a plain run followed by a bold run.
    pub fn para_bold(self, text: &str, bold: &str) -> Self {
        let xml = format!(
            r#"<w:p>{}<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            run(text),
            escape(bold)
        );
        self.raw(&xml)
    }

    pub fn list_item(self, num_id: &str, ilvl: u8, text: &str) -> Self {
        let xml = format!(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr></w:pPr>{}</w:p>"#,
            ilvl,
            num_id,
            run(text)
        );
        self.raw(&xml)
    }

    pub fn caption(self, text: &str) -> Self {
        let xml = format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Caption"/></w:pPr>{}</w:p>"#,
            run(text)
        );
        self.raw(&xml)
    }

    /// Embed an image in its own paragraph. `file` names the media part
    /// under `word/media/`; embedding the same file twice shares the part.
    pub fn image(mut self, file: &str, data: Vec<u8>, alt: &str) -> Self {
        let rid = match self.images.iter().find(|(_, f, _)| f == file) {
            Some((rid, _, _)) => rid.clone(),
            None => {
                let rid = format!("rIdImg{}", self.images.len() + 1);
                self.images.push((rid.clone(), file.to_string(), data));
                rid
            }
        };
        let xml = format!(
            r#"<w:p><w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture" descr="{}"/><a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="{}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
            escape(alt),
            rid
        );
        self.raw(&xml)
    }

    /// Table from rows of cell texts. The first row is a repeated header
    /// when `header` is set.
    pub fn table(self, rows: &[&[&str]], header: bool) -> Self {
        let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut xml = String::from("<w:tbl><w:tblGrid>");
        for _ in 0..columns {
            xml.push_str(r#"<w:gridCol w:w="2000"/>"#);
        }
        xml.push_str("</w:tblGrid>");
        for (i, row) in rows.iter().enumerate() {
            xml.push_str("<w:tr>");
            if header && i == 0 {
                xml.push_str("<w:trPr><w:tblHeader/></w:trPr>");
            }
            for cell in row.iter() {
                xml.push_str(&format!("<w:tc><w:p>{}</w:p></w:tc>", run(cell)));
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        self.raw(&xml)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let mut put = |name: &str, data: &[u8]| {
            writer.start_file(name, options).unwrap();
            writer.write_all(data).unwrap();
        };

        put("[Content_Types].xml", CONTENT_TYPES.as_bytes());
        put("_rels/.rels", package_rels().as_bytes());
        put("word/document.xml", self.document().as_bytes());
        put("word/_rels/document.xml.rels", self.document_rels().as_bytes());
        put("word/styles.xml", STYLES.as_bytes());
        put("word/numbering.xml", NUMBERING.as_bytes());
        put("docProps/core.xml", self.core().as_bytes());
        for (_, file, data) in &self.images {
            put(&format!("word/media/{}", file), data);
        }

        writer.finish().unwrap().into_inner()
    }

    fn document(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}" xmlns:r="{}" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            W_NS,
            R_NS,
            self.body.concat()
        )
    }

    fn document_rels(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{t}/styles" Target="styles.xml"/><Relationship Id="rId2" Type="{t}/numbering" Target="numbering.xml"/>"#,
            t = REL_TYPE
        );
        for (rid, file, _) in &self.images {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}/image" Target="media/{}"/>"#,
                rid, REL_TYPE, file
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn core(&self) -> String {
        let field = |tag: &str, value: &Option<String>| {
            value
                .as_ref()
                .map(|v| format!("<{tag}>{}</{tag}>", escape(v), tag = tag))
                .unwrap_or_default()
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/">{}{}{}{}<dcterms:created>2024-03-01T10:00:00Z</dcterms:created></cp:coreProperties>"#,
            field("dc:title", &self.title),
            field("dc:creator", &self.creator),
            field("dc:subject", &self.subject),
            field("cp:keywords", &self.keywords),
        )
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

fn package_rels() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{t}/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#,
        t = REL_TYPE
    )
}

fn run(text: &str) -> String {
    format!(
        r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Encode a solid PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// A small manual exercising headings, emphasis, lists, a captioned
/// figure and a table with a header row.
pub fn sample_manual() -> Vec<u8> {
    DocxBuilder::new()
        .title("Field Manual")
        .creator("Ada Lovelace; Charles Babbage")
        .subject("Engines")
        .keywords("analytical, difference")
        .heading(1, "Introduction")
        .para_bold("Welcome to the ", "engine")
        .image("image1.png", png(64, 64), "Engine overview")
        .caption("Engine overview diagram")
        .heading(2, "Parts")
        .list_item(BULLETS, 0, "Mill")
        .list_item(BULLETS, 0, "Store")
        .list_item(BULLETS, 1, "Columns")
        .table(&[&["Part", "Count"], &["Gear", "12"], &["Lever", "3"]], true)
        .heading(1, "Operation")
        .list_item(NUMBERS, 0, "Load cards")
        .list_item(NUMBERS, 0, "Turn crank")
        .para("Results & notes")
        .build()
}
