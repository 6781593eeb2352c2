//! One import pass: sheet rows back onto live elements.
//!
//! The rule table is keyed by the same composite key the export path writes,
//! derived from the sheet's own cells through the same normalizer, so a row
//! the export produced always matches the elements it came from.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::key::CompositeKey;
use crate::model::{Element, SetOutcome};
use crate::schema::{ColumnSpec, SchemaConfig};
use crate::store::{Cell, MemoryWorkbook, Sheet};

use super::PassContext;
use super::index::{cell_key_part, group_elements};
use super::region::{DataRegion, scan_region};

/// Values one rule pushes onto matching elements, aligned with the schema's
/// value columns; `None` marks a value column absent from the sheet.
pub type RuleValues = Vec<Option<String>>;

/// Per-schema outcome of an import pass.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub schema: String,
    pub sheet: String,
    /// Rows that produced a rule.
    pub rules: usize,
    /// Rules that matched at least one element.
    pub matched_keys: usize,
    /// Elements with at least one successfully written field.
    pub updated_elements: usize,
    /// Keyed elements no rule matched; left untouched.
    pub unmatched_elements: usize,
    /// Per attribute: elements that do not carry it.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub missing_fields: BTreeMap<String, usize>,
    /// Per attribute: writes refused (read-only, type mismatch).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl ImportSummary {
    fn empty(schema: &SchemaConfig) -> Self {
        Self {
            schema: schema.name.clone(),
            sheet: schema.sheet.clone(),
            rules: 0,
            matched_keys: 0,
            updated_elements: 0,
            unmatched_elements: 0,
            missing_fields: BTreeMap::new(),
            field_errors: BTreeMap::new(),
            skipped: None,
        }
    }

    pub fn skipped(schema: &SchemaConfig, reason: String) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::empty(schema)
        }
    }
}

/// Builds the rule table and applies every matching rule to the filtered
/// elements. Fan-out applies one rule to each element sharing the key; a
/// per-field write failure is counted but never aborts the element or the
/// pass.
pub fn run_import<E: Element>(
    workbook: &MemoryWorkbook,
    schema: &SchemaConfig,
    elements: &mut [E],
    ctx: &mut PassContext<'_>,
) -> Result<ImportSummary> {
    let sheet = workbook
        .sheet(&schema.sheet)
        .ok_or_else(|| SyncError::SheetNotFound(schema.sheet.clone()))?;

    let key_cols = schema.resolve_key_columns(sheet)?;
    let value_cols = schema.resolve_value_columns(sheet)?;
    let key_specs: Vec<(&ColumnSpec, u32)> = schema
        .key_columns()
        .zip(key_cols.iter())
        .map(|(spec, &col)| (spec, col))
        .collect();

    let region = scan_region(sheet, &key_cols, schema.min_data_row, schema.empty_run_stop);
    let rules = build_rules(sheet, region, &key_specs, &value_cols);
    debug!(
        schema = %schema.name,
        rules = rules.len(),
        first_row = region.first_row,
        last_row = region.last_row,
        "rule table built"
    );

    let groups = group_elements(elements, schema, ctx.converter);

    let mut summary = ImportSummary::empty(schema);
    summary.rules = rules.len();

    for (key, values) in &rules {
        let Some(members) = groups.get(key) else {
            continue;
        };
        summary.matched_keys += 1;
        for &idx in members {
            let element = &mut elements[idx];
            let mut any_written = false;
            for (value, column) in values.iter().zip(&schema.value_columns) {
                let Some(text) = value else {
                    continue;
                };
                match element.set(&column.attribute, text) {
                    SetOutcome::Updated => any_written = true,
                    SetOutcome::Missing => {
                        *summary
                            .missing_fields
                            .entry(column.attribute.clone())
                            .or_default() += 1;
                    }
                    SetOutcome::ReadOnly | SetOutcome::TypeMismatch => {
                        *summary
                            .field_errors
                            .entry(column.attribute.clone())
                            .or_default() += 1;
                    }
                }
            }
            if any_written {
                summary.updated_elements += 1;
            }
        }
    }

    summary.unmatched_elements = groups
        .iter()
        .filter(|(key, _)| !rules.contains_key(*key))
        .map(|(_, members)| members.len())
        .sum();

    info!(
        schema = %schema.name,
        matched_keys = summary.matched_keys,
        updated_elements = summary.updated_elements,
        unmatched_elements = summary.unmatched_elements,
        "import pass applied"
    );

    Ok(summary)
}

/// Reads the region's key and value columns in one batch each and builds the
/// key → values table. Rows with an absent key or with every present value
/// cell empty are excluded; duplicate keys keep the later row.
fn build_rules<S: Sheet + ?Sized>(
    sheet: &S,
    region: DataRegion,
    key_specs: &[(&ColumnSpec, u32)],
    value_cols: &[Option<u32>],
) -> HashMap<CompositeKey, RuleValues> {
    let mut rules = HashMap::new();
    if region.is_empty() {
        return rules;
    }

    let key_blocks: Vec<Vec<Cell>> = key_specs
        .iter()
        .map(|&(_, col)| sheet.read_column(col, region.first_row, region.last_row))
        .collect();
    let value_blocks: Vec<Option<Vec<Cell>>> = value_cols
        .iter()
        .map(|col| col.map(|col| sheet.read_column(col, region.first_row, region.last_row)))
        .collect();

    for offset in 0..region.row_count() as usize {
        let key = CompositeKey(
            key_specs
                .iter()
                .enumerate()
                .map(|(idx, &(spec, _))| cell_key_part(&key_blocks[idx][offset], spec))
                .collect(),
        );
        if key.is_absent() {
            continue;
        }
        let values: RuleValues = value_blocks
            .iter()
            .map(|block| block.as_ref().map(|cells| cells[offset].to_text()))
            .collect();
        if values.iter().flatten().all(|text| text.is_empty()) {
            continue;
        }
        if rules.insert(key.clone(), values).is_some() {
            warn!(sheet = sheet.name(), key = %key, "duplicate rule key, keeping the later row");
        }
    }

    rules
}
