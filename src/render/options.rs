//! DocBook generation options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target document type definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Schema {
    /// RittDoc DocBook 4.3 based variant
    #[default]
    #[serde(rename = "rittdoc")]
    RittDoc,
    /// OASIS DocBook XML 4.2
    #[serde(rename = "docbook42")]
    DocBook42,
}

impl Schema {
    /// Public identifier of the DTD.
    pub fn public_id(self) -> &'static str {
        match self {
            Schema::RittDoc => "-//RIS Dev//DTD DocBook V4.3 -Based Variant V1.1//EN",
            Schema::DocBook42 => "-//OASIS//DTD DocBook XML V4.2//EN",
        }
    }

    /// System identifier of the DTD.
    pub fn system_id(self) -> &'static str {
        match self {
            Schema::RittDoc => "http://LOCALHOST/dtd/V1.1/RittDocBook.dtd",
            Schema::DocBook42 => "http://www.oasis-open.org/docbook/xml/4.2/docbookx.dtd",
        }
    }

    /// Full DOCTYPE declaration for a `book` root.
    pub fn doctype(self) -> String {
        format!(
            "<!DOCTYPE book PUBLIC \"{}\" \"{}\">",
            self.public_id(),
            self.system_id()
        )
    }

    /// Short name used in configuration and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Schema::RittDoc => "rittdoc",
            Schema::DocBook42 => "docbook42",
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Schema {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', '.'], "").as_str() {
            "rittdoc" => Ok(Schema::RittDoc),
            "docbook42" | "docbook" => Ok(Schema::DocBook42),
            other => Err(format!("unknown schema '{}'", other)),
        }
    }
}

/// Options for DocBook generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocBookOptions {
    /// Target DTD
    pub schema: Schema,

    /// Emit a table of contents after `bookinfo`
    pub include_toc: bool,

    /// Deepest section level listed in the table of contents (1 = chapters)
    pub toc_depth: u8,

    /// ISBN for `bookinfo`
    pub isbn: Option<String>,

    /// Publisher name for `bookinfo`
    pub publisher: Option<String>,

    /// Publication date for `bookinfo`
    pub pubdate: Option<String>,

    /// Edition for `bookinfo`
    pub edition: Option<String>,

    /// Copyright holder for `bookinfo`
    pub copyright_holder: Option<String>,

    /// Copyright year for `bookinfo`
    pub copyright_year: Option<String>,
}

impl Default for DocBookOptions {
    fn default() -> Self {
        Self {
            schema: Schema::default(),
            include_toc: false,
            toc_depth: 3,
            isbn: None,
            publisher: None,
            pubdate: None,
            edition: None,
            copyright_holder: None,
            copyright_year: None,
        }
    }
}

impl DocBookOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Enable or disable the table of contents.
    pub fn with_toc(mut self, include: bool) -> Self {
        self.include_toc = include;
        self
    }

    /// Set the table of contents depth.
    pub fn with_toc_depth(mut self, depth: u8) -> Self {
        self.toc_depth = depth.clamp(1, 6);
        self
    }

    /// Set the ISBN.
    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    /// Set the publisher.
    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Set the publication date.
    pub fn with_pubdate(mut self, pubdate: impl Into<String>) -> Self {
        self.pubdate = Some(pubdate.into());
        self
    }

    /// Set the edition.
    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = Some(edition.into());
        self
    }

    /// Set the copyright holder and year.
    pub fn with_copyright(mut self, holder: impl Into<String>, year: impl Into<String>) -> Self {
        self.copyright_holder = Some(holder.into());
        self.copyright_year = Some(year.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_parse() {
        assert_eq!("rittdoc".parse::<Schema>(), Ok(Schema::RittDoc));
        assert_eq!("DocBook-4.2".parse::<Schema>(), Ok(Schema::DocBook42));
        assert!("dita".parse::<Schema>().is_err());
    }

    #[test]
    fn test_doctype() {
        assert!(Schema::DocBook42.doctype().contains("docbookx.dtd"));
        assert!(Schema::RittDoc.doctype().starts_with("<!DOCTYPE book PUBLIC"));
    }

    #[test]
    fn test_toc_depth_clamped() {
        assert_eq!(DocBookOptions::new().with_toc_depth(0).toc_depth, 1);
        assert_eq!(DocBookOptions::new().with_toc_depth(20).toc_depth, 6);
    }
}
