//! Text normalization and XML escaping.

use unicode_normalization::UnicodeNormalization;

/// Escape the five XML-reserved characters.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Characters not allowed in XML 1.0 documents, plus other controls.
fn is_disallowed(c: char) -> bool {
    (c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
        || matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

/// NFC-normalize, drop control characters and collapse whitespace runs to
/// single spaces. Leading and trailing whitespace is kept as one space so
/// that adjacent spans stay separated.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.nfc() {
        if is_disallowed(c) {
            continue;
        }
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Normalize and escape in one step.
pub fn clean_text(text: &str) -> String {
    escape_xml(&normalize_text(text))
}

/// Normalize, trim and escape text for an element that holds a single line
/// (titles, metadata fields, attribute values).
pub fn clean_line(text: &str) -> String {
    escape_xml(normalize_text(text).trim())
}
