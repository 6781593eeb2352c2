//! Canonicalization of raw cell and attribute values into comparable key
//! components.
//!
//! Every key used by the engine, whether derived from a live element or from
//! a worksheet row, passes through the same two entry points,
//! [`normalize_text`] and [`normalize_number`]. That shared pipeline is what
//! makes the export index and the import rule table agree on which rows and
//! elements are "the same thing".

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Conversion factor used when no host converter is available for a
/// feet-to-millimetres rule. Matches the internal length unit of the host
/// model (decimal feet).
const FEET_TO_MM: f64 = 304.8;

/// Keys are compared at this precision; one micro-unit = 1e-6.
const KEY_SCALE: f64 = 1_000_000.0;

/// Unit handling applied before a numeric value becomes a key component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRule {
    /// The value is already in the sheet's unit.
    #[default]
    None,
    /// Host-internal length (decimal feet) to millimetres.
    FeetToMillimetres,
}

impl UnitRule {
    fn fallback_factor(self) -> Option<f64> {
        match self {
            UnitRule::None => None,
            UnitRule::FeetToMillimetres => Some(FEET_TO_MM),
        }
    }

    /// Converts `value` to the target unit, preferring the host-supplied
    /// converter and falling back to the constant multiplier when the host
    /// cannot answer.
    pub fn apply(self, value: f64, converter: Option<&dyn UnitConverter>) -> f64 {
        match self.fallback_factor() {
            None => value,
            Some(factor) => converter
                .and_then(|c| c.convert(self, value))
                .unwrap_or(value * factor),
        }
    }
}

/// Host-supplied unit conversion. The engine only ever asks for the rules it
/// knows; a `None` answer falls back to the rule's constant multiplier.
pub trait UnitConverter {
    fn convert(&self, rule: UnitRule, value: f64) -> Option<f64>;
}

/// How a numeric cell or attribute is turned into a key component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberPolicy {
    /// Strip diameter glyphs and `mm` suffixes before scanning for digits.
    #[serde(default)]
    pub strip_units: bool,
    #[serde(default)]
    pub unit: UnitRule,
}

/// A numeric value normalized for key comparison: the key is the value
/// rounded to six decimals and scaled to an integer so it can be hashed; the
/// display string is the same rounded value with trailing zeros stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedNumber {
    pub key: i64,
    pub display: String,
}

impl NormalizedNumber {
    /// The "zero/absent" component produced by empty or unparsable input.
    pub fn absent() -> Self {
        Self {
            key: 0,
            display: String::new(),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.key == 0
    }

    fn from_value(value: f64) -> Self {
        let key = (value * KEY_SCALE).round() as i64;
        Self {
            key,
            display: format_key(key),
        }
    }
}

/// One component of a composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Text(String),
    /// Rounded numeric key in micro-units.
    Number(i64),
}

impl KeyPart {
    pub fn is_absent(&self) -> bool {
        match self {
            KeyPart::Text(text) => text.is_empty(),
            KeyPart::Number(key) => *key == 0,
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyPart {
    /// Numbers sort before text, mirroring how the sort stage orders mixed
    /// columns.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Number(lhs), KeyPart::Number(rhs)) => lhs.cmp(rhs),
            (KeyPart::Number(_), KeyPart::Text(_)) => Ordering::Less,
            (KeyPart::Text(_), KeyPart::Number(_)) => Ordering::Greater,
            (KeyPart::Text(lhs), KeyPart::Text(rhs)) => lhs.cmp(rhs),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Text(text) => write!(f, "{text}"),
            KeyPart::Number(key) => write!(f, "{}", format_key(*key)),
        }
    }
}

/// An ordered tuple of key components identifying one record or element
/// grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey(pub Vec<KeyPart>);

impl CompositeKey {
    /// True when every component is empty/zero; such keys are discarded by
    /// both indexers.
    pub fn is_absent(&self) -> bool {
        self.0.iter().all(KeyPart::is_absent)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, part) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// Trims, collapses internal whitespace runs to one space, and canonicalizes
/// purely-numeric text ("101.0" becomes "101") so hand-typed cells and
/// formatted attribute values compare equal.
pub fn normalize_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match canonical_numeric(&collapsed) {
        Some(numeric) => numeric,
        None => collapsed,
    }
}

/// Normalizes a raw textual value into a numeric key component.
///
/// Accepts a decimal comma or dot, optionally strips unit glyphs and suffixes
/// before scanning for the first numeric substring, applies the policy's unit
/// conversion, and rounds to six decimals. Empty or unparsable input yields
/// the absent component, never an error.
pub fn normalize_number(
    raw: &str,
    policy: &NumberPolicy,
    converter: Option<&dyn UnitConverter>,
) -> NormalizedNumber {
    let mut text = raw.trim().to_string();
    if policy.strip_units {
        text = strip_unit_marks(&text);
    }
    let text = text.replace(',', ".");
    match first_number(&text) {
        Some(value) => NormalizedNumber::from_value(policy.unit.apply(value, converter)),
        None => NormalizedNumber::absent(),
    }
}

/// Normalizes a value that is already numeric (e.g. a double attribute read
/// straight from the host model). Only the unit conversion and rounding steps
/// apply.
pub fn normalize_number_value(
    value: f64,
    policy: &NumberPolicy,
    converter: Option<&dyn UnitConverter>,
) -> NormalizedNumber {
    if value == 0.0 {
        return NormalizedNumber::absent();
    }
    NormalizedNumber::from_value(policy.unit.apply(value, converter))
}

/// The numeric value a micro-unit key stands for.
pub fn key_value(key: i64) -> f64 {
    key as f64 / KEY_SCALE
}

/// Formats a micro-unit key back into its canonical display string: six
/// decimals with trailing zeros (and a dangling dot) stripped.
pub fn format_key(key: i64) -> String {
    let mut text = format!("{:.6}", key as f64 / KEY_SCALE);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}

/// Returns the canonical form of a string that consists solely of digits with
/// at most one decimal separator, or `None` when the string is not purely
/// numeric.
fn canonical_numeric(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let mut digits = 0usize;
    let mut separators = 0usize;
    for ch in text.chars() {
        match ch {
            '0'..='9' => digits += 1,
            '.' | ',' => separators += 1,
            _ => return None,
        }
    }
    if digits == 0 || separators > 1 {
        return None;
    }
    let mut canonical = text.replace(',', ".");
    if canonical.contains('.') {
        while canonical.ends_with('0') {
            canonical.pop();
        }
        if canonical.ends_with('.') {
            canonical.pop();
        }
    }
    if canonical.is_empty() {
        canonical.push('0');
    }
    Some(canonical)
}

/// Removes diameter glyphs and `mm` suffixes ahead of the numeric scan.
fn strip_unit_marks(text: &str) -> String {
    const GLYPHS: [char; 5] = ['\u{03a6}', '\u{03c6}', '\u{00d8}', '\u{00f8}', '\u{2300}'];
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if GLYPHS.contains(&ch) {
            continue;
        }
        if (ch == 'm' || ch == 'M') && matches!(chars.peek(), Some('m') | Some('M')) {
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out.trim().to_string()
}

/// Scans for the first substring shaped like `123` or `123.45` and parses it.
fn first_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx].is_ascii_digit() {
            let start = idx;
            while idx < bytes.len() && bytes[idx].is_ascii_digit() {
                idx += 1;
            }
            if idx < bytes.len() && bytes[idx] == b'.' && bytes.get(idx + 1).is_some_and(u8::is_ascii_digit) {
                idx += 1;
                while idx < bytes.len() && bytes[idx].is_ascii_digit() {
                    idx += 1;
                }
            }
            return text[start..idx].parse::<f64>().ok();
        }
        idx += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_collapsed() {
        assert_eq!(normalize_text("  Steel   Pipe \t DN50 "), "Steel Pipe DN50");
    }

    #[test]
    fn purely_numeric_text_is_canonicalized() {
        assert_eq!(normalize_text("101.0"), "101");
        assert_eq!(normalize_text("101,50"), "101.5");
        assert_eq!(normalize_text("DN101.0"), "DN101.0");
    }

    #[test]
    fn comma_and_dot_decimals_share_a_key() {
        let policy = NumberPolicy::default();
        let a = normalize_number("101.50", &policy, None);
        let b = normalize_number("101,50", &policy, None);
        let c = normalize_number("101.5", &policy, None);
        assert_eq!(a.key, b.key);
        assert_eq!(b.key, c.key);
        assert_eq!(a.display, "101.5");
    }

    #[test]
    fn unit_marks_are_stripped_before_scanning() {
        let policy = NumberPolicy {
            strip_units: true,
            unit: UnitRule::None,
        };
        assert_eq!(normalize_number("\u{00d8}110 mm", &policy, None).display, "110");
        assert_eq!(normalize_number("300 mm", &policy, None).display, "300");
    }

    #[test]
    fn unparsable_input_yields_absent() {
        let got = normalize_number("n/a", &NumberPolicy::default(), None);
        assert!(got.is_absent());
        assert!(got.display.is_empty());
    }

    #[test]
    fn feet_convert_through_the_fallback_factor() {
        let policy = NumberPolicy {
            strip_units: false,
            unit: UnitRule::FeetToMillimetres,
        };
        let got = normalize_number_value(1.0, &policy, None);
        assert_eq!(got.display, "304.8");
    }

    struct Doubler;

    impl UnitConverter for Doubler {
        fn convert(&self, _rule: UnitRule, value: f64) -> Option<f64> {
            Some(value * 2.0)
        }
    }

    #[test]
    fn host_converter_wins_over_the_fallback() {
        let policy = NumberPolicy {
            strip_units: false,
            unit: UnitRule::FeetToMillimetres,
        };
        let got = normalize_number_value(3.0, &policy, Some(&Doubler));
        assert_eq!(got.display, "6");
    }

    #[test]
    fn all_absent_composite_key_is_absent() {
        let key = CompositeKey(vec![KeyPart::Text(String::new()), KeyPart::Number(0)]);
        assert!(key.is_absent());
        let key = CompositeKey(vec![KeyPart::Text("x".into()), KeyPart::Number(0)]);
        assert!(!key.is_absent());
    }

    #[test]
    fn numbers_order_before_text() {
        let mut parts = vec![
            KeyPart::Text("a".into()),
            KeyPart::Number(2_000_000),
            KeyPart::Number(1_000_000),
        ];
        parts.sort();
        assert_eq!(
            parts,
            vec![
                KeyPart::Number(1_000_000),
                KeyPart::Number(2_000_000),
                KeyPart::Text("a".into()),
            ]
        );
    }
}
