//! Style spans: runs of text with one resolved formatting state.

use serde::{Deserialize, Serialize};

/// Resolved character formatting of a span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextFormat {
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
}

impl TextFormat {
    /// Plain formatting (no flags set).
    pub const PLAIN: TextFormat = TextFormat {
        bold: false,
        italic: false,
        underline: false,
    };

    /// Check if no formatting flag is set.
    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }
}

/// A contiguous run of text sharing resolved formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSpan {
    /// Text content
    pub text: String,

    /// Bold text
    #[serde(default)]
    pub bold: bool,

    /// Italic text
    #[serde(default)]
    pub italic: bool,

    /// Underlined text
    #[serde(default)]
    pub underline: bool,
}

impl StyleSpan {
    /// Create a span with the given formatting.
    pub fn new(text: impl Into<String>, format: TextFormat) -> Self {
        Self {
            text: text.into(),
            bold: format.bold,
            italic: format.italic,
            underline: format.underline,
        }
    }

    /// Create a plain text span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextFormat::PLAIN)
    }

    /// Create a bold span.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(
            text,
            TextFormat {
                bold: true,
                ..TextFormat::PLAIN
            },
        )
    }

    /// Create an italic span.
    pub fn italic(text: impl Into<String>) -> Self {
        Self::new(
            text,
            TextFormat {
                italic: true,
                ..TextFormat::PLAIN
            },
        )
    }

    /// Get the formatting flags of this span.
    pub fn format(&self) -> TextFormat {
        TextFormat {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }

    /// Check if the span has no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Merge adjacent spans with identical formatting and drop empty spans.
pub fn coalesce_spans(spans: impl IntoIterator<Item = StyleSpan>) -> Vec<StyleSpan> {
    let mut merged: Vec<StyleSpan> = Vec::new();
    for span in spans {
        if span.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.format() == span.format() => last.text.push_str(&span.text),
            _ => merged.push(span),
        }
    }
    merged
}

/// Concatenated text of a span sequence.
pub fn spans_text(spans: &[StyleSpan]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalesce_identical_formatting() {
        let spans = vec![
            StyleSpan::bold("Hel"),
            StyleSpan::bold("lo"),
            StyleSpan::plain(" "),
            StyleSpan::plain("world"),
        ];
        let merged = coalesce_spans(spans);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "Hello");
        assert!(merged[0].bold);
        assert_eq!(merged[1].text, " world");
    }

    #[test]
    fn test_coalesce_keeps_distinct_formatting() {
        let spans = vec![
            StyleSpan::bold("a"),
            StyleSpan::italic("b"),
            StyleSpan::bold("c"),
        ];
        assert_eq!(coalesce_spans(spans).len(), 3);
    }

    #[test]
    fn test_coalesce_drops_empty() {
        let spans = vec![
            StyleSpan::plain("a"),
            StyleSpan::bold(""),
            StyleSpan::plain("b"),
        ];
        let merged = coalesce_spans(spans);
        assert_eq!(merged, vec![StyleSpan::plain("ab")]);
    }

    #[test]
    fn test_spans_text() {
        let spans = vec![StyleSpan::plain("Hello, "), StyleSpan::bold("world")];
        assert_eq!(spans_text(&spans), "Hello, world");
    }
}
