//! The two key indexes: sheet rows by key, and live elements by key.
//!
//! Both sides derive their composite key through the same column specs, which
//! is what guarantees export/import key symmetry.

use std::collections::HashMap;

use tracing::warn;

use crate::key::{
    CompositeKey, KeyPart, UnitConverter, normalize_number, normalize_number_value, normalize_text,
};
use crate::model::Element;
use crate::schema::{ColumnSpec, SchemaConfig};
use crate::store::{Cell, Sheet};

use super::region::DataRegion;

/// Key component from a sheet cell. Sheet values are already in the target
/// unit, so only rounding and glyph stripping apply.
pub fn cell_key_part(cell: &Cell, spec: &ColumnSpec) -> KeyPart {
    match spec.sheet_policy() {
        Some(policy) => {
            let normalized = match cell {
                Cell::Number(value) => normalize_number_value(*value, &policy, None),
                other => normalize_number(&other.to_text(), &policy, None),
            };
            KeyPart::Number(normalized.key)
        }
        None => KeyPart::Text(normalize_text(&cell.to_text())),
    }
}

/// Key component from an element attribute. Numeric attributes stored in the
/// host's internal unit go through the schema's conversion; textual fallbacks
/// are assumed to already be display values in the target unit.
pub fn attr_key_part<E: Element>(
    element: &E,
    spec: &ColumnSpec,
    converter: Option<&dyn UnitConverter>,
) -> KeyPart {
    let value = spec
        .attribute
        .as_deref()
        .and_then(|attr| element.get(attr));
    match spec.sheet_policy() {
        Some(sheet_policy) => {
            let policy = spec.numeric.unwrap_or_default();
            let normalized = match value {
                Some(value) => match value.as_number() {
                    Some(number) => normalize_number_value(number, &policy, converter),
                    None => normalize_number(&value.to_text(), &sheet_policy, None),
                },
                None => crate::key::NormalizedNumber::absent(),
            };
            KeyPart::Number(normalized.key)
        }
        None => {
            let text = match value {
                Some(value) => value.to_text(),
                None if spec.attribute.is_none() => element.category().to_string(),
                None => String::new(),
            };
            KeyPart::Text(normalize_text(&text))
        }
    }
}

/// Composite key of one element under the given schema.
pub fn element_key<E: Element>(
    element: &E,
    schema: &SchemaConfig,
    converter: Option<&dyn UnitConverter>,
) -> CompositeKey {
    CompositeKey(
        schema
            .key_columns()
            .map(|spec| attr_key_part(element, spec, converter))
            .collect(),
    )
}

/// Reads the key columns across the region in one batch per column and
/// indexes each row by its normalized key.
///
/// When two rows normalize to the same key the later row wins; the shadowed
/// row is logged because it becomes invisible to the diff.
pub fn index_rows<S: Sheet + ?Sized>(
    sheet: &S,
    region: DataRegion,
    key_specs: &[(&ColumnSpec, u32)],
) -> HashMap<CompositeKey, u32> {
    let mut index = HashMap::new();
    if region.is_empty() || key_specs.is_empty() {
        return index;
    }

    let blocks: Vec<Vec<Cell>> = key_specs
        .iter()
        .map(|&(_, col)| sheet.read_column(col, region.first_row, region.last_row))
        .collect();

    for offset in 0..region.row_count() as usize {
        let key = CompositeKey(
            key_specs
                .iter()
                .enumerate()
                .map(|(idx, &(spec, _))| cell_key_part(&blocks[idx][offset], spec))
                .collect(),
        );
        if key.is_absent() {
            continue;
        }
        let row = region.first_row + offset as u32;
        if let Some(shadowed) = index.insert(key.clone(), row) {
            warn!(sheet = sheet.name(), key = %key, shadowed_row = shadowed, row, "duplicate key, keeping the later row");
        }
    }

    index
}

/// Groups the filtered elements by composite key. Fan-out is expected:
/// several elements may share one key. Elements whose key is entirely absent
/// are excluded.
pub fn group_elements<E: Element>(
    elements: &[E],
    schema: &SchemaConfig,
    converter: Option<&dyn UnitConverter>,
) -> HashMap<CompositeKey, Vec<usize>> {
    let mut groups: HashMap<CompositeKey, Vec<usize>> = HashMap::new();
    for (idx, element) in elements.iter().enumerate() {
        if !schema.filter.matches(element) {
            continue;
        }
        let key = element_key(element, schema, converter);
        if key.is_absent() {
            continue;
        }
        groups.entry(key).or_default().push(idx);
    }
    groups
}
