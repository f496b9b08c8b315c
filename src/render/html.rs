//! DocBook → HTML rendering for previews.

use super::escape::escape_xml;
use crate::error::{Error, Result};
use crate::extract::xml::{self, Element, Node};

/// Render DocBook markup to an HTML fragment.
pub fn to_html(docbook: &str) -> Result<String> {
    HtmlRenderer::new().render(docbook)
}

/// DocBook to HTML renderer.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    image_base: String,
}

impl HtmlRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix prepended to image file references (e.g. "/files/").
    pub fn with_image_base(mut self, base: impl Into<String>) -> Self {
        self.image_base = base.into();
        self
    }

    /// Render DocBook markup. Fails with an input error on malformed markup.
    pub fn render(&self, docbook: &str) -> Result<String> {
        let root = xml::parse(docbook)
            .map_err(|e| Error::Input(format!("markup is not well-formed: {}", e)))?;
        let mut out = String::new();
        self.element(&root, 0, &mut out);
        Ok(out)
    }

    fn children(&self, element: &Element, depth: usize, out: &mut String) {
        let inline = is_inline_context(&element.name);
        for child in &element.children {
            match child {
                Node::Text(text) if !inline && text.trim().is_empty() => {}
                Node::Text(text) => out.push_str(&escape_xml(text)),
                Node::Element(e) => self.element(e, depth, out),
            }
        }
    }

    fn wrap(&self, tag: &str, element: &Element, depth: usize, out: &mut String) {
        out.push_str(&format!("<{}>", tag));
        self.children(element, depth, out);
        out.push_str(&format!("</{}>", tag));
    }

    fn element(&self, e: &Element, depth: usize, out: &mut String) {
        match e.name.as_str() {
            "book" | "article" => {
                out.push_str("<div class=\"book\">");
                self.children(e, 0, out);
                out.push_str("</div>");
            }
            "bookinfo" | "articleinfo" => self.bookinfo(e, out),
            "toc" | "colspec" | "textobject" | "indexterm" => {}
            "chapter" | "preface" | "appendix" | "section" | "sect1" | "sect2" | "sect3"
            | "sect4" | "sect5" => {
                let class = e.name.as_str();
                match e.attr("id") {
                    Some(id) => out.push_str(&format!(
                        "<section class=\"{}\" id=\"{}\">",
                        class,
                        escape_xml(id)
                    )),
                    None => out.push_str(&format!("<section class=\"{}\">", class)),
                }
                self.children(e, depth + 1, out);
                out.push_str("</section>");
            }
            "title" => {
                let level = (depth + 1).clamp(2, 6);
                out.push_str(&format!("<h{}>", level));
                self.children(e, depth, out);
                out.push_str(&format!("</h{}>", level));
            }
            "para" | "simpara" => self.wrap("p", e, depth, out),
            "emphasis" => {
                let tag = match e.attr("role") {
                    Some("bold") | Some("strong") => "strong",
                    Some("underline") => "u",
                    _ => "em",
                };
                self.wrap(tag, e, depth, out);
            }
            "itemizedlist" => self.wrap("ul", e, depth, out),
            "orderedlist" => self.wrap("ol", e, depth, out),
            "listitem" => self.wrap("li", e, depth, out),
            "informaltable" | "table" => self.wrap("table", e, depth, out),
            "thead" => self.wrap("thead", e, depth, out),
            "tbody" => self.wrap("tbody", e, depth, out),
            "row" => self.wrap("tr", e, depth, out),
            "entry" => self.entry(e, depth, out),
            "figure" | "informalfigure" => self.figure(e, out),
            "ulink" => {
                let url = e.attr("url").unwrap_or_default();
                out.push_str(&format!("<a href=\"{}\">", escape_xml(url)));
                self.children(e, depth, out);
                out.push_str("</a>");
            }
            _ => self.children(e, depth, out),
        }
    }

    fn bookinfo(&self, e: &Element, out: &mut String) {
        if let Some(title) = e.child("title") {
            out.push_str(&format!("<h1>{}</h1>", escape_xml(&title.text())));
        }
        let authors: Vec<String> = e
            .descendants_named("author")
            .iter()
            .map(|a| {
                a.elements()
                    .map(|part| part.text())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|name| !name.trim().is_empty())
            .collect();
        if !authors.is_empty() {
            out.push_str(&format!(
                "<p class=\"authors\">{}</p>",
                escape_xml(&authors.join(", "))
            ));
        }
    }

    fn entry(&self, e: &Element, depth: usize, out: &mut String) {
        let mut attrs = String::new();
        if let (Some(start), Some(end)) = (column_number(e.attr("namest")), column_number(e.attr("nameend"))) {
            if end > start {
                attrs.push_str(&format!(" colspan=\"{}\"", end - start + 1));
            }
        }
        if let Some(more) = e.attr("morerows").and_then(|m| m.parse::<usize>().ok()) {
            if more > 0 {
                attrs.push_str(&format!(" rowspan=\"{}\"", more + 1));
            }
        }
        out.push_str(&format!("<td{}>", attrs));
        self.children(e, depth, out);
        out.push_str("</td>");
    }

    fn figure(&self, e: &Element, out: &mut String) {
        out.push_str(&match e.attr("id") {
            Some(id) => format!("<figure id=\"{}\">", escape_xml(id)),
            None => "<figure>".to_string(),
        });
        let alt = e
            .descendants_named("phrase")
            .first()
            .map(|p| p.text())
            .unwrap_or_default();
        for data in e.descendants_named("imagedata") {
            let src = format!("{}{}", self.image_base, data.attr("fileref").unwrap_or_default());
            out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\"/>",
                escape_xml(&src),
                escape_xml(&alt)
            ));
        }
        if let Some(title) = e.child("title") {
            out.push_str(&format!("<figcaption>{}</figcaption>", escape_xml(&title.text())));
        }
        out.push_str("</figure>");
    }
}

/// Elements whose whitespace-only text is significant.
fn is_inline_context(name: &str) -> bool {
    matches!(
        name,
        "para" | "simpara" | "title" | "emphasis" | "entry" | "phrase" | "ulink" | "literal"
    )
}

/// Column number from a `cN` column name.
fn column_number(name: Option<&str>) -> Option<usize> {
    name?.strip_prefix('c')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE book PUBLIC "-//OASIS//DTD DocBook XML V4.2//EN" "http://www.oasis-open.org/docbook/xml/4.2/docbookx.dtd">
<book id="b001">
  <bookinfo><title>Guide</title><authorgroup><author><firstname>Ada</firstname><surname>Lovelace</surname></author></authorgroup></bookinfo>
  <chapter id="ch0001">
    <title>Start</title>
    <para>Plain <emphasis role="bold">bold</emphasis> &amp; <emphasis>it</emphasis></para>
    <informaltable><tgroup cols="2"><colspec colname="c1"/><colspec colname="c2"/>
      <tbody><row><entry namest="c1" nameend="c2">wide</entry></row>
      <row><entry morerows="1">tall</entry><entry>x</entry></row></tbody></tgroup></informaltable>
    <figure id="fig_0001"><title>Chart</title><mediaobject><imageobject>
      <imagedata fileref="multimedia/img_0001.png"/></imageobject>
      <textobject><phrase>bars</phrase></textobject></mediaobject></figure>
  </chapter>
</book>"#;

    #[test]
    fn test_render_structure() {
        let html = to_html(DOC).unwrap();
        assert!(html.contains("<h1>Guide</h1>"));
        assert!(html.contains("<p class=\"authors\">Ada Lovelace</p>"));
        assert!(html.contains("<section class=\"chapter\" id=\"ch0001\"><h2>Start</h2>"));
        assert!(html.contains("<strong>bold</strong> &amp; <em>it</em>"));
    }

    #[test]
    fn test_render_table_spans() {
        let html = to_html(DOC).unwrap();
        assert!(html.contains("<td colspan=\"2\">wide</td>"));
        assert!(html.contains("<td rowspan=\"2\">tall</td>"));
    }

    #[test]
    fn test_render_figure_with_base() {
        let html = HtmlRenderer::new().with_image_base("/media/").render(DOC).unwrap();
        assert!(html.contains("<img src=\"/media/multimedia/img_0001.png\" alt=\"bars\"/>"));
        assert!(html.contains("<figcaption>Chart</figcaption>"));
    }

    #[test]
    fn test_malformed_is_input_error() {
        assert!(matches!(to_html("<book><para></book>"), Err(Error::Input(_))));
    }
}
