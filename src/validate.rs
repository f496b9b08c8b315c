//! Structural validation of generated DocBook.
//!
//! These checks cover what the generator is responsible for: required
//! titles and attributes, id uniqueness, figure and CALS table structure,
//! section nesting and the DOCTYPE. They do not load the external DTD.

use crate::extract::xml::{self, Element};
use crate::render::Schema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Issue severity
    pub severity: Severity,
    /// Short issue category, e.g. "missing_title"
    pub issue_type: String,
    /// Human-readable description
    pub description: String,
    /// Element the issue was found on (tag, plus id when present)
    pub location: String,
}

/// Result of validating one markup file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Name of the validated file
    pub file: String,
    /// Schema the markup was checked against
    pub schema: Schema,
    /// True when no error-level issue was found
    pub is_valid: bool,
    /// Number of error-level issues
    pub total_errors: usize,
    /// Number of warning-level issues
    pub total_warnings: usize,
    /// All issues in document order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Issues of the given severity.
    pub fn issues_of(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Elements that never belong in generated DocBook.
const FOREIGN_ELEMENTS: &[&str] = &["div", "span", "b", "i", "u", "br", "tr", "td", "th"];

/// Elements that must carry a `title` child.
const TITLE_REQUIRED: &[&str] = &[
    "chapter", "preface", "sect1", "sect2", "sect3", "sect4", "sect5", "figure", "table",
];

/// Structural DocBook validator.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    schema: Schema,
}

impl Validator {
    /// Create a validator for the given schema.
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    /// Validate markup. Malformed XML yields a report with a single error.
    pub fn validate(&self, markup: &str, file: &str) -> ValidationReport {
        let mut run = Run::default();
        match xml::parse(markup) {
            Ok(root) => {
                if root.name != "book" {
                    run.push(
                        Severity::Error,
                        "invalid_root",
                        format!("root element is <{}>, expected <book>", root.name),
                        &root,
                    );
                }
                self.check_doctype(markup, &mut run);
                run.check(&root, None);
            }
            Err(e) => run.issues.push(ValidationIssue {
                severity: Severity::Error,
                issue_type: "xml_parse_error".into(),
                description: format!("failed to parse XML: {}", e),
                location: file.to_string(),
            }),
        }

        let total_errors = run.count(Severity::Error);
        let total_warnings = run.count(Severity::Warning);
        log::debug!(
            "validated {}: {} errors, {} warnings",
            file,
            total_errors,
            total_warnings
        );
        ValidationReport {
            file: file.to_string(),
            schema: self.schema,
            is_valid: total_errors == 0,
            total_errors,
            total_warnings,
            issues: run.issues,
        }
    }

    fn check_doctype(&self, markup: &str, run: &mut Run) {
        let head = markup.split("<book").next().unwrap_or(markup);
        let Some(start) = head.find("<!DOCTYPE") else {
            run.issues.push(ValidationIssue {
                severity: Severity::Warning,
                issue_type: "missing_doctype".into(),
                description: "document has no DOCTYPE declaration".into(),
                location: "prolog".into(),
            });
            return;
        };
        if !head[start..].contains(self.schema.public_id()) {
            run.issues.push(ValidationIssue {
                severity: Severity::Warning,
                issue_type: "unexpected_doctype".into(),
                description: format!(
                    "DOCTYPE does not reference \"{}\"",
                    self.schema.public_id()
                ),
                location: "prolog".into(),
            });
        }
    }
}

#[derive(Default)]
struct Run {
    issues: Vec<ValidationIssue>,
    seen_ids: HashSet<String>,
}

impl Run {
    fn push(&mut self, severity: Severity, issue_type: &str, description: String, at: &Element) {
        let location = match at.attr("id") {
            Some(id) => format!("{}#{}", at.name, id),
            None => at.name.clone(),
        };
        self.issues.push(ValidationIssue {
            severity,
            issue_type: issue_type.to_string(),
            description,
            location,
        });
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    fn check(&mut self, e: &Element, parent: Option<&str>) {
        let tag = e.name.as_str();

        if FOREIGN_ELEMENTS.contains(&tag) {
            self.push(
                Severity::Error,
                "foreign_element",
                format!("<{}> is not a DocBook element", tag),
                e,
            );
        }

        let has_title = e.child("title").is_some();
        if tag == "book" {
            let info_title = e.child("bookinfo").and_then(|i| i.child("title"));
            if !has_title && info_title.is_none() {
                self.push(Severity::Error, "missing_title", "<book> requires a title".into(), e);
            }
        } else if TITLE_REQUIRED.contains(&tag) && !has_title {
            self.push(
                Severity::Error,
                "missing_title",
                format!("<{}> requires a <title> child", tag),
                e,
            );
        }

        if let Some(id) = e.attr("id") {
            if !self.seen_ids.insert(id.to_string()) {
                self.push(
                    Severity::Error,
                    "duplicate_id",
                    format!("duplicate id '{}'", id),
                    e,
                );
            }
        }

        match tag {
            "chapter" | "sect1" | "sect2" | "sect3" | "sect4" | "sect5" | "figure" => {
                if e.attr("id").is_none() {
                    self.push(
                        Severity::Error,
                        "missing_attribute",
                        format!("<{}> requires an id attribute", tag),
                        e,
                    );
                }
            }
            _ => {}
        }
        if let Some(level) = tag.strip_prefix("sect").and_then(|n| n.parse::<u8>().ok()) {
            self.check_section(e, level, parent);
        }
        match tag {
            "chapter" | "preface" => self.check_not_empty(e),
            "figure" => self.check_figure(e),
            "tgroup" => self.check_tgroup(e),
            "imagedata" => self.check_imagedata(e),
            _ => {}
        }

        for child in e.elements() {
            self.check(child, Some(tag));
        }
    }

    fn check_section(&mut self, e: &Element, level: u8, parent: Option<&str>) {
        let expected_parent = if level == 1 {
            matches!(parent, Some("chapter" | "preface" | "appendix" | "article"))
        } else {
            parent == Some(format!("sect{}", level - 1).as_str())
        };
        if !expected_parent {
            self.push(
                Severity::Error,
                "invalid_section_hierarchy",
                format!(
                    "<sect{}> found inside <{}>",
                    level,
                    parent.unwrap_or("document")
                ),
                e,
            );
        }
        self.check_not_empty(e);
    }

    fn check_not_empty(&mut self, e: &Element) {
        if e.elements().all(|c| c.name == "title") {
            self.push(
                Severity::Error,
                "empty_section",
                format!("<{}> has a title but no content", e.name),
                e,
            );
        }
    }

    fn check_figure(&mut self, e: &Element) {
        let imagedata = e
            .child("mediaobject")
            .and_then(|m| m.child("imageobject"))
            .and_then(|i| i.child("imagedata"));
        if imagedata.is_none() {
            self.push(
                Severity::Error,
                "invalid_figure_structure",
                "<figure> must contain mediaobject/imageobject/imagedata".into(),
                e,
            );
        }
    }

    fn check_tgroup(&mut self, e: &Element) {
        let cols = match e.attr("cols").map(|c| c.parse::<usize>()) {
            Some(Ok(n)) if n > 0 => n,
            Some(_) => {
                self.push(
                    Severity::Error,
                    "invalid_attribute",
                    "<tgroup> cols must be a positive integer".into(),
                    e,
                );
                return;
            }
            None => {
                self.push(
                    Severity::Error,
                    "missing_attribute",
                    "<tgroup> requires a cols attribute".into(),
                    e,
                );
                return;
            }
        };

        let colspecs = e.children_named("colspec").count();
        if colspecs != 0 && colspecs != cols {
            self.push(
                Severity::Warning,
                "colspec_mismatch",
                format!("{} colspec elements for cols=\"{}\"", colspecs, cols),
                e,
            );
        }
        if e.child("tbody").is_none() {
            self.push(
                Severity::Error,
                "invalid_table_structure",
                "<tgroup> must contain a <tbody>".into(),
                e,
            );
        }
        for section in e.children_named("thead").chain(e.children_named("tbody")) {
            if section.child("row").is_none() {
                self.push(
                    Severity::Error,
                    "invalid_table_structure",
                    format!("<{}> must contain at least one <row>", section.name),
                    section,
                );
            }
        }
        let rows = e
            .children_named("thead")
            .chain(e.children_named("tbody"))
            .flat_map(|section| section.children_named("row"));
        for row in rows {
            if row.child("entry").is_none() && row.child("entrytbl").is_none() {
                self.push(
                    Severity::Error,
                    "invalid_table_structure",
                    "<row> must contain at least one <entry>".into(),
                    row,
                );
            }
        }
    }

    fn check_imagedata(&mut self, e: &Element) {
        match e.attr("fileref") {
            None | Some("") => self.push(
                Severity::Error,
                "missing_attribute",
                "<imagedata> requires a fileref attribute".into(),
                e,
            ),
            Some(_) if e.attr("width").is_none() => self.push(
                Severity::Warning,
                "missing_attribute",
                "<imagedata> has no width".into(),
                e,
            ),
            Some(_) => {}
        }
    }
}

/// Validate markup against the default schema.
pub fn validate_xml(markup: &str) -> ValidationReport {
    Validator::default().validate(markup, "Book.xml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, ContentModel, TableGrid};
    use crate::render::DocBookGenerator;

    #[test]
    fn test_generated_markup_is_valid() {
        let mut model = ContentModel::new("Book");
        model.add_block(Block::paragraph("preface text"));
        model.add_block(Block::heading(1, "One"));
        model.add_block(Block::heading(2, "One.A"));
        model.add_block(Block::Table {
            grid: TableGrid::from_text_rows(&[vec!["a", "b"]]),
        });
        model.add_block(Block::heading(1, "Two"));
        let xml = DocBookGenerator::default().generate(&model).unwrap();
        let report = validate_xml(&xml);
        assert!(report.is_valid, "{:?}", report.issues);
        assert_eq!(report.total_warnings, 0);
    }

    #[test]
    fn test_malformed_markup() {
        let report = validate_xml("<book><chapter></book>");
        assert!(!report.is_valid);
        assert_eq!(report.issues[0].issue_type, "xml_parse_error");
    }

    #[test]
    fn test_structural_errors() {
        let xml = r#"<book id="b001"><bookinfo><title>T</title></bookinfo>
<chapter id="ch0001"><para>x</para><sect2 id="ch0001s0001"><title>S</title><para>y</para></sect2></chapter>
<chapter id="ch0001"><title>Dup</title><figure id="f1"><title>F</title></figure></chapter></book>"#;
        let report = validate_xml(xml);
        let types: Vec<&str> = report.issues.iter().map(|i| i.issue_type.as_str()).collect();
        assert!(types.contains(&"missing_doctype"));
        assert!(types.contains(&"missing_title"));
        assert!(types.contains(&"invalid_section_hierarchy"));
        assert!(types.contains(&"duplicate_id"));
        assert!(types.contains(&"invalid_figure_structure"));
        assert!(!report.is_valid);
    }

    fn table_issues(tgroup: &str) -> Vec<String> {
        let xml = format!(
            r#"<book id="b001"><bookinfo><title>T</title></bookinfo>
<chapter id="ch0001"><title>C</title><informaltable>{}</informaltable></chapter></book>"#,
            tgroup
        );
        validate_xml(&xml)
            .issues
            .into_iter()
            .filter(|i| i.issue_type == "invalid_table_structure")
            .map(|i| i.description)
            .collect()
    }

    #[test]
    fn test_empty_tbody_is_error() {
        let issues = table_issues(
            r#"<tgroup cols="1"><thead><row><entry>H</entry></row></thead><tbody></tbody></tgroup>"#,
        );
        assert_eq!(issues, vec!["<tbody> must contain at least one <row>".to_string()]);
    }

    #[test]
    fn test_empty_thead_is_error() {
        let issues = table_issues(
            r#"<tgroup cols="1"><thead></thead><tbody><row><entry>a</entry></row></tbody></tgroup>"#,
        );
        assert_eq!(issues, vec!["<thead> must contain at least one <row>".to_string()]);
    }

    #[test]
    fn test_row_without_entries_is_error() {
        let issues = table_issues(
            r#"<tgroup cols="1"><tbody><row><entry morerows="1">a</entry></row><row></row></tbody></tgroup>"#,
        );
        assert_eq!(issues, vec!["<row> must contain at least one <entry>".to_string()]);
    }

    #[test]
    fn test_report_json() {
        let report = validate_xml("<book/>");
        let json = report.to_json().unwrap();
        assert!(json.contains("\"schema\": \"rittdoc\""));
        assert!(json.contains("\"is_valid\": false"));
    }
}
