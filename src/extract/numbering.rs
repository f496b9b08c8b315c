//! Numbering definitions (`word/numbering.xml`).

use super::xml::Element;
use std::collections::HashMap;

/// Maps numbering instances to the list kind of each level.
#[derive(Debug, Clone, Default)]
pub struct Numbering {
    /// abstractNumId → ilvl → numFmt
    abstract_formats: HashMap<String, HashMap<u8, String>>,
    /// numId → abstractNumId
    instances: HashMap<String, String>,
}

impl Numbering {
    pub(crate) fn from_element(root: &Element) -> Self {
        let mut numbering = Numbering::default();
        for abs in root.children_named("w:abstractNum") {
            let Some(id) = abs.attr("w:abstractNumId") else {
                continue;
            };
            let levels = abs
                .children_named("w:lvl")
                .filter_map(|lvl| {
                    let ilvl = lvl.attr("w:ilvl")?.parse().ok()?;
                    let fmt = lvl.child_val("w:numFmt").unwrap_or("decimal");
                    Some((ilvl, fmt.to_string()))
                })
                .collect();
            numbering.abstract_formats.insert(id.to_string(), levels);
        }
        for num in root.children_named("w:num") {
            if let (Some(num_id), Some(abs_id)) =
                (num.attr("w:numId"), num.child_val("w:abstractNumId"))
            {
                numbering
                    .instances
                    .insert(num_id.to_string(), abs_id.to_string());
            }
        }
        numbering
    }

    /// Number format of a list level, if defined.
    pub fn format(&self, num_id: &str, ilvl: u8) -> Option<&str> {
        let abs_id = self.instances.get(num_id)?;
        self.abstract_formats
            .get(abs_id)?
            .get(&ilvl)
            .map(String::as_str)
    }

    /// Whether a list level is numbered. Undefined levels count as ordered.
    pub fn is_ordered(&self, num_id: &str, ilvl: u8) -> bool {
        !matches!(self.format(num_id, ilvl), Some("bullet") | Some("none"))
    }
}
