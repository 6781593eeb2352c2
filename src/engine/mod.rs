//! The tabular reconciliation engine.
//!
//! One export pass: index the live elements, scan and index the sheet, diff
//! the two, apply the batched mutations, restore the canonical sort order.
//! One import pass: scan the sheet into a rule table and apply matching
//! rules back onto elements. Every per-category behavior difference comes in
//! through [`crate::schema::SchemaConfig`]; the engine itself is shared.

pub mod diff;
pub mod export;
pub mod import;
pub mod index;
pub mod mutate;
pub mod region;
pub mod sort;

use std::collections::HashMap;

use crate::key::UnitConverter;
use crate::model::{Element, read_first_attr};
use crate::schema::ColumnSpec;

/// State scoped to one schema pass.
///
/// Holds the optional host unit converter and the per-type attribute memo
/// used for display columns marked `memoize_by_type`. Built fresh for every
/// pass; nothing in the engine is module-level mutable state.
pub struct PassContext<'a> {
    pub converter: Option<&'a dyn UnitConverter>,
    type_text: HashMap<(String, String), String>,
}

impl<'a> PassContext<'a> {
    pub fn new(converter: Option<&'a dyn UnitConverter>) -> Self {
        Self {
            converter,
            type_text: HashMap::new(),
        }
    }

    /// Reads a display attribute through its fallback chain, memoized by the
    /// element's type when the column asks for it.
    pub fn display_text<E: Element>(&mut self, element: &E, spec: &ColumnSpec) -> String {
        let chain: Vec<&str> = spec
            .attribute
            .iter()
            .map(String::as_str)
            .chain(spec.fallback_attributes.iter().map(String::as_str))
            .collect();
        if !spec.memoize_by_type {
            return read_first_attr(element, &chain);
        }
        let Some(type_id) = element.type_id() else {
            return read_first_attr(element, &chain);
        };
        let cache_key = (type_id.to_string(), spec.header.clone());
        if let Some(text) = self.type_text.get(&cache_key) {
            return text.clone();
        }
        let text = read_first_attr(element, &chain);
        // An empty read proves nothing about the type; caching it would hide
        // a later element that does carry the attribute.
        if !text.is_empty() {
            self.type_text.insert(cache_key, text.clone());
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::model::{AttrValue, JsonElement};

    fn element(id: &str, description: Option<&str>) -> JsonElement {
        let mut attributes = BTreeMap::new();
        if let Some(text) = description {
            attributes.insert(
                "Type Description".to_string(),
                AttrValue::Text(text.to_string()),
            );
        }
        JsonElement {
            id: id.to_string(),
            category: "Pipes".to_string(),
            type_id: Some("Steel".to_string()),
            attributes,
            read_only: BTreeSet::new(),
        }
    }

    fn memoized_spec() -> ColumnSpec {
        let mut spec = ColumnSpec::display("Type Description", Some("Type Description"));
        spec.memoize_by_type = true;
        spec
    }

    #[test]
    fn empty_reads_are_not_memoized() {
        let spec = memoized_spec();
        let mut ctx = PassContext::new(None);

        // First element of the type has no description; a later one does and
        // must still be read.
        assert_eq!(ctx.display_text(&element("p1", None), &spec), "");
        assert_eq!(
            ctx.display_text(&element("p2", Some("welded steel")), &spec),
            "welded steel"
        );
    }

    #[test]
    fn non_empty_reads_are_memoized_per_type() {
        let spec = memoized_spec();
        let mut ctx = PassContext::new(None);

        assert_eq!(
            ctx.display_text(&element("p1", Some("welded steel")), &spec),
            "welded steel"
        );
        // Same type: the memo answers even though this element reads empty.
        assert_eq!(
            ctx.display_text(&element("p2", None), &spec),
            "welded steel"
        );
    }
}
