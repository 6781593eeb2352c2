//! The live-object boundary.
//!
//! The engine sees elements through the [`Element`] trait: named attributes
//! with tolerant reads and outcome-reporting writes. [`JsonElement`] is the
//! crate's host-model stand-in, a serde snapshot of the element collection
//! that the CLI loads from and saves back to disk.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// An attribute value in the host model's own storage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Integer(i64),
    Text(String),
}

impl AttrValue {
    /// Trimmed textual form, used when an attribute feeds a key component.
    pub fn to_text(&self) -> String {
        match self {
            AttrValue::Text(text) => text.trim().to_string(),
            AttrValue::Number(value) => value.to_string(),
            AttrValue::Integer(value) => value.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(value) => Some(*value),
            AttrValue::Integer(value) => Some(*value as f64),
            AttrValue::Text(_) => None,
        }
    }
}

/// Result of one attribute write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Updated,
    /// The element has no attribute of that name.
    Missing,
    ReadOnly,
    /// The value could not be coerced to the attribute's storage type.
    TypeMismatch,
}

/// Named-attribute access contract supplied by the host environment.
pub trait Element {
    fn id(&self) -> &str;
    fn category(&self) -> &str;

    /// Identifier of the element's shared type definition, when the host
    /// exposes one; used only for per-pass memoization of type-level reads.
    fn type_id(&self) -> Option<&str> {
        None
    }

    fn get(&self, attr: &str) -> Option<AttrValue>;
    fn set(&mut self, attr: &str, value: &str) -> SetOutcome;
}

/// One element of the snapshot file.
///
/// `type_id` groups elements sharing a type definition; the export pass uses
/// it to memoize type-level attribute lookups. Attributes listed in
/// `read_only` refuse writes the way a locked host parameter would.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonElement {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub type_id: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub read_only: BTreeSet<String>,
}

impl Element for JsonElement {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn type_id(&self) -> Option<&str> {
        self.type_id.as_deref()
    }

    fn get(&self, attr: &str) -> Option<AttrValue> {
        self.attributes.get(attr).cloned()
    }

    /// Coerces `value` to the attribute's current storage type, mirroring how
    /// the host sets string/integer/double parameters: empty strings become
    /// zero for numeric attributes, unparsable text is a type mismatch.
    fn set(&mut self, attr: &str, value: &str) -> SetOutcome {
        if self.read_only.contains(attr) {
            return SetOutcome::ReadOnly;
        }
        let Some(current) = self.attributes.get_mut(attr) else {
            return SetOutcome::Missing;
        };
        let text = value.trim();
        match current {
            AttrValue::Text(_) => {
                *current = AttrValue::Text(text.to_string());
                SetOutcome::Updated
            }
            AttrValue::Number(_) => match parse_number(text) {
                Some(parsed) => {
                    *current = AttrValue::Number(parsed);
                    SetOutcome::Updated
                }
                None => SetOutcome::TypeMismatch,
            },
            AttrValue::Integer(_) => match parse_number(text) {
                Some(parsed) => {
                    *current = AttrValue::Integer(parsed as i64);
                    SetOutcome::Updated
                }
                None => SetOutcome::TypeMismatch,
            },
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    if text.is_empty() {
        return Some(0.0);
    }
    text.replace(',', ".").parse::<f64>().ok()
}

/// Reads the first non-empty attribute of `names`, in order.
///
/// This is the single tolerant fallback chain for display-name style
/// attributes; call sites configure the chain instead of re-implementing it.
pub fn read_first_attr(element: &dyn Element, names: &[&str]) -> String {
    for name in names {
        if let Some(value) = element.get(name) {
            let text = value.to_text();
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

/// Category and name-substring predicates of the live-object query contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementFilter {
    /// Categories the element may belong to; empty accepts every category.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Attribute the substring predicates test (defaults to `Type Name`).
    #[serde(default = "default_name_attribute")]
    pub name_attribute: String,
    /// Case-insensitive substrings of which at least one must match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_contains: Vec<String>,
    /// Case-insensitive substrings none of which may match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_contains: Vec<String>,
}

fn default_name_attribute() -> String {
    "Type Name".to_string()
}

impl ElementFilter {
    pub fn for_category(category: &str) -> Self {
        Self {
            categories: vec![category.to_string()],
            name_attribute: default_name_attribute(),
            include_contains: Vec::new(),
            exclude_contains: Vec::new(),
        }
    }

    pub fn matches(&self, element: &dyn Element) -> bool {
        if !self.categories.is_empty()
            && !self.categories.iter().any(|c| c == element.category())
        {
            return false;
        }
        if self.include_contains.is_empty() && self.exclude_contains.is_empty() {
            return true;
        }
        let name = element
            .get(&self.name_attribute)
            .map(|value| value.to_text())
            .unwrap_or_default()
            .to_lowercase();
        if !self.include_contains.is_empty()
            && !self
                .include_contains
                .iter()
                .any(|needle| name.contains(&needle.to_lowercase()))
        {
            return false;
        }
        !self
            .exclude_contains
            .iter()
            .any(|needle| name.contains(&needle.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(category: &str, type_name: &str) -> JsonElement {
        JsonElement {
            id: "e1".into(),
            category: category.into(),
            type_id: None,
            attributes: BTreeMap::from([(
                "Type Name".to_string(),
                AttrValue::Text(type_name.into()),
            )]),
            read_only: BTreeSet::new(),
        }
    }

    #[test]
    fn filter_is_case_insensitive_on_substrings() {
        let mut filter = ElementFilter::for_category("Conduits");
        filter.include_contains = vec!["ThermoCable".into()];
        assert!(filter.matches(&element("Conduits", "MAN_thermocable 25")));
        assert!(!filter.matches(&element("Conduits", "Standard 25")));
        assert!(!filter.matches(&element("Ducts", "MAN_thermocable 25")));
    }

    #[test]
    fn set_coerces_to_the_existing_storage_type() {
        let mut e = element("Conduits", "x");
        e.attributes
            .insert("Count".into(), AttrValue::Integer(1));
        assert_eq!(e.set("Count", "3,5"), SetOutcome::Updated);
        assert_eq!(e.get("Count"), Some(AttrValue::Integer(3)));
        assert_eq!(e.set("Count", ""), SetOutcome::Updated);
        assert_eq!(e.get("Count"), Some(AttrValue::Integer(0)));
        assert_eq!(e.set("Count", "abc"), SetOutcome::TypeMismatch);
        assert_eq!(e.set("Nope", "1"), SetOutcome::Missing);
    }

    #[test]
    fn read_only_attributes_refuse_writes() {
        let mut e = element("Conduits", "x");
        e.read_only.insert("Type Name".into());
        assert_eq!(e.set("Type Name", "y"), SetOutcome::ReadOnly);
        assert_eq!(e.get("Type Name"), Some(AttrValue::Text("x".into())));
    }

    #[test]
    fn first_attr_walks_the_fallback_chain() {
        let mut e = element("Conduits", "x");
        e.attributes
            .insert("Description".into(), AttrValue::Text("  ".into()));
        e.attributes
            .insert("Type Description".into(), AttrValue::Text("steel".into()));
        let got = read_first_attr(&e, &["Description", "Type Description"]);
        assert_eq!(got, "steel");
    }
}
