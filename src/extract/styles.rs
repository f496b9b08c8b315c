//! Style definitions and flattening of the style inheritance chain.
//!
//! Effective formatting of a run is resolved in this order, later entries
//! overriding earlier ones: document defaults, paragraph style chain,
//! character style chain, direct run properties.

use super::xml::Element;
use crate::model::TextFormat;
use std::collections::{HashMap, HashSet};

/// Longest `w:basedOn` chain followed before giving up.
const MAX_CHAIN_DEPTH: usize = 32;

/// Deepest heading level produced from styles.
pub const MAX_HEADING_LEVEL: u8 = 9;

/// Tri-state run properties: `None` means "inherit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunProps {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
}

impl RunProps {
    /// Read properties from a `w:rPr` element.
    pub(crate) fn from_rpr(rpr: &Element) -> Self {
        Self {
            bold: rpr.child("w:b").map(toggle_on),
            italic: rpr.child("w:i").map(toggle_on),
            underline: rpr.child("w:u").map(underline_on),
        }
    }

    /// Overlay `self` on top of `base`.
    pub fn over(self, base: RunProps) -> RunProps {
        RunProps {
            bold: self.bold.or(base.bold),
            italic: self.italic.or(base.italic),
            underline: self.underline.or(base.underline),
        }
    }

    /// Concrete formatting, unset properties being off.
    pub fn resolve(self) -> TextFormat {
        TextFormat {
            bold: self.bold.unwrap_or(false),
            italic: self.italic.unwrap_or(false),
            underline: self.underline.unwrap_or(false),
        }
    }
}

fn is_off(val: Option<&str>) -> bool {
    matches!(val, Some("0") | Some("false") | Some("off"))
}

fn toggle_on(e: &Element) -> bool {
    !is_off(e.attr("w:val"))
}

fn underline_on(e: &Element) -> bool {
    let val = e.attr("w:val");
    !(is_off(val) || val == Some("none"))
}

/// Numbering reference (`w:numPr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumRef {
    pub num_id: String,
    pub ilvl: u8,
}

impl NumRef {
    /// Read a `w:numPr` element. `numId` 0 explicitly removes numbering.
    pub(crate) fn from_num_pr(num_pr: &Element) -> Option<Option<Self>> {
        let num_id = num_pr.child_val("w:numId")?;
        if num_id == "0" {
            return Some(None);
        }
        let ilvl = num_pr
            .child_val("w:ilvl")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        Some(Some(NumRef {
            num_id: num_id.to_string(),
            ilvl,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StyleKind {
    Paragraph,
    Character,
    Other,
}

#[derive(Debug, Clone)]
struct StyleDef {
    kind: StyleKind,
    name: Option<String>,
    based_on: Option<String>,
    run: RunProps,
    outline_level: Option<u8>,
    /// `Some(None)` when the style removes inherited numbering.
    num: Option<Option<NumRef>>,
}

/// Flattened paragraph style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphStyle {
    /// Run properties contributed by defaults and the paragraph style chain
    pub run: RunProps,
    /// Heading level, if the style is a heading style
    pub heading_level: Option<u8>,
    /// Numbering inherited from the style chain
    pub num: Option<NumRef>,
    /// List kind derived from the style name (`List Bullet`, `List Number`)
    pub list_hint: Option<ListHint>,
    /// Whether the style is a caption style
    pub is_caption: bool,
}

/// List information derived from a style name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHint {
    pub ordered: bool,
    pub ilvl: u8,
}

/// Parsed `word/styles.xml`.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<String, StyleDef>,
    default_run: RunProps,
    default_paragraph: Option<String>,
    default_character: Option<String>,
}

impl StyleSheet {
    /// Build a style sheet from the root of the styles part.
    pub(crate) fn from_element(root: &Element) -> Self {
        let default_run = root
            .child("w:docDefaults")
            .and_then(|d| d.child("w:rPrDefault"))
            .and_then(|d| d.child("w:rPr"))
            .map(RunProps::from_rpr)
            .unwrap_or_default();

        let mut sheet = StyleSheet {
            default_run,
            ..Default::default()
        };

        for style in root.children_named("w:style") {
            let Some(id) = style.attr("w:styleId") else {
                continue;
            };
            let kind = match style.attr("w:type") {
                Some("paragraph") => StyleKind::Paragraph,
                Some("character") => StyleKind::Character,
                _ => StyleKind::Other,
            };
            let is_default = toggle_on_attr(style.attr("w:default"));
            if is_default {
                match kind {
                    StyleKind::Paragraph => sheet.default_paragraph = Some(id.to_string()),
                    StyleKind::Character => sheet.default_character = Some(id.to_string()),
                    StyleKind::Other => {}
                }
            }

            let ppr = style.child("w:pPr");
            let def = StyleDef {
                kind,
                name: style.child_val("w:name").map(str::to_string),
                based_on: style.child_val("w:basedOn").map(str::to_string),
                run: style
                    .child("w:rPr")
                    .map(RunProps::from_rpr)
                    .unwrap_or_default(),
                outline_level: ppr
                    .and_then(|p| p.child_val("w:outlineLvl"))
                    .and_then(|v| v.parse().ok()),
                num: ppr
                    .and_then(|p| p.child("w:numPr"))
                    .and_then(NumRef::from_num_pr),
            };
            sheet.styles.insert(id.to_string(), def);
        }
        sheet
    }

    /// Number of style definitions.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if no styles are defined.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Style ids from `id` up the `basedOn` chain, most derived first.
    fn chain(&self, id: &str) -> Vec<&StyleDef> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(style_id) = current {
            if chain.len() >= MAX_CHAIN_DEPTH || !seen.insert(style_id) {
                break;
            }
            let Some(def) = self.styles.get(style_id) else {
                break;
            };
            chain.push(def);
            current = def.based_on.as_deref();
        }
        chain
    }

    /// Flatten a paragraph style (or the default paragraph style).
    pub fn paragraph_style(&self, style_id: Option<&str>) -> ParagraphStyle {
        let id = style_id.or(self.default_paragraph.as_deref());
        let mut flat = ParagraphStyle {
            run: self.default_run,
            ..Default::default()
        };
        let Some(id) = id else {
            return flat;
        };

        let chain = self.chain(id);
        // Base first so derived styles override.
        for def in chain.iter().rev() {
            if def.kind == StyleKind::Character {
                continue;
            }
            flat.run = def.run.over(flat.run);
            if let Some(level) = def.outline_level {
                // Level 9 marks body text.
                flat.heading_level = (level < 9).then_some(level + 1);
            }
            if let Some(num) = &def.num {
                flat.num = num.clone();
            }
        }

        for def in &chain {
            let name = def.name.as_deref();
            if flat.heading_level.is_none() {
                flat.heading_level = name.and_then(heading_level_from_name);
            }
            if flat.list_hint.is_none() {
                flat.list_hint = name.and_then(list_hint_from_name);
            }
            if name.is_some_and(|n| n.eq_ignore_ascii_case("caption")) {
                flat.is_caption = true;
            }
        }
        if flat.heading_level.is_none() {
            flat.heading_level = heading_level_from_name(id);
        }
        if id.eq_ignore_ascii_case("caption") {
            flat.is_caption = true;
        }
        flat.heading_level = flat
            .heading_level
            .map(|level| level.clamp(1, MAX_HEADING_LEVEL));
        flat
    }

    /// Resolve the effective formatting of a run.
    pub fn run_format(
        &self,
        paragraph: &ParagraphStyle,
        char_style: Option<&str>,
        direct: RunProps,
    ) -> TextFormat {
        let mut props = paragraph.run;
        if let Some(id) = char_style.or(self.default_character.as_deref()) {
            for def in self.chain(id).iter().rev() {
                props = def.run.over(props);
            }
        }
        direct.over(props).resolve()
    }
}

fn toggle_on_attr(val: Option<&str>) -> bool {
    matches!(val, Some("1") | Some("true") | Some("on"))
}

/// Heading level from a style name or id (`Heading 2`, `heading2`, `Title`).
pub fn heading_level_from_name(name: &str) -> Option<u8> {
    let lower = name.trim().to_ascii_lowercase();
    match lower.as_str() {
        "title" => return Some(1),
        "subtitle" => return Some(2),
        _ => {}
    }
    let rest = lower.strip_prefix("heading")?.trim_start();
    let level: u8 = rest.parse().ok()?;
    (1..=MAX_HEADING_LEVEL).contains(&level).then_some(level)
}

/// List hint from a style name (`List Bullet`, `List Number 2`).
pub fn list_hint_from_name(name: &str) -> Option<ListHint> {
    let lower = name.trim().to_ascii_lowercase();
    let (ordered, rest) = if let Some(rest) = lower.strip_prefix("list bullet") {
        (false, rest)
    } else if let Some(rest) = lower.strip_prefix("list number") {
        (true, rest)
    } else {
        return None;
    };
    let ilvl = match rest.trim() {
        "" => 0,
        n => n.parse::<u8>().ok()?.saturating_sub(1),
    };
    Some(ListHint { ordered, ilvl })
}
