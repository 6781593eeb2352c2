//! One export pass: live elements into the schema's sheet.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::key::{CompositeKey, KeyPart, key_value};
use crate::model::Element;
use crate::schema::{ColumnSpec, SchemaConfig};
use crate::store::{Cell, MemoryWorkbook, Sheet};

use super::PassContext;
use super::diff::{Record, reconcile};
use super::index::{attr_key_part, element_key, index_rows};
use super::mutate;
use super::region::scan_region;
use super::sort::sort_region;

/// Per-schema outcome of an export pass.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub schema: String,
    pub sheet: String,
    pub records: usize,
    pub updated: usize,
    pub appended: usize,
    pub deleted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl ExportSummary {
    pub fn skipped(schema: &SchemaConfig, reason: String) -> Self {
        Self {
            schema: schema.name.clone(),
            sheet: schema.sheet.clone(),
            records: 0,
            updated: 0,
            appended: 0,
            deleted: 0,
            skipped: Some(reason),
        }
    }
}

/// Synchronizes one schema's sheet with the current element set.
///
/// The sheet and any missing schema columns are created on demand; rows for
/// vanished keys are deleted, matched keys updated in place, new keys
/// appended, and the region re-sorted into canonical order afterwards.
pub fn run_export<E: Element>(
    workbook: &mut MemoryWorkbook,
    schema: &SchemaConfig,
    elements: &[E],
    ctx: &mut PassContext<'_>,
) -> Result<ExportSummary> {
    let fresh = build_records(schema, elements, ctx);
    info!(
        schema = %schema.name,
        records = fresh.len(),
        "fresh record set built"
    );

    let sheet = workbook.ensure_sheet(&schema.sheet);
    let columns = schema.ensure_columns(sheet);
    let key_specs: Vec<(&ColumnSpec, u32)> = schema
        .columns
        .iter()
        .zip(columns.iter())
        .filter(|(spec, _)| spec.key)
        .map(|(spec, &col)| (spec, col))
        .collect();
    let key_cols: Vec<u32> = key_specs.iter().map(|&(_, col)| col).collect();

    let region = scan_region(sheet, &key_cols, schema.min_data_row, schema.empty_run_stop);
    let existing = index_rows(sheet, region, &key_specs);
    debug!(
        schema = %schema.name,
        existing = existing.len(),
        first_row = region.first_row,
        last_row = region.last_row,
        "existing rows indexed"
    );

    let recon = reconcile(&fresh, &existing);
    let counts = mutate::apply(sheet, &recon, &columns, region, schema.min_data_row);

    let sorted_region = scan_region(sheet, &key_cols, schema.min_data_row, schema.empty_run_stop);
    let width = sheet.last_used_column(schema.header_row);
    sort_region(sheet, sorted_region, width, &key_specs);

    info!(
        schema = %schema.name,
        updated = counts.updated,
        appended = counts.appended,
        deleted = counts.deleted,
        "export pass applied"
    );

    Ok(ExportSummary {
        schema: schema.name.clone(),
        sheet: schema.sheet.clone(),
        records: fresh.len(),
        updated: counts.updated,
        appended: counts.appended,
        deleted: counts.deleted,
        skipped: None,
    })
}

/// Builds the deduplicated, canonically ordered fresh record set.
///
/// Elements sharing one key collapse into a single record; blank display
/// cells of the first element seen are backfilled from later ones.
fn build_records<E: Element>(
    schema: &SchemaConfig,
    elements: &[E],
    ctx: &mut PassContext<'_>,
) -> Vec<Record> {
    let mut records: BTreeMap<CompositeKey, Vec<Cell>> = BTreeMap::new();

    for element in elements {
        if !schema.filter.matches(element) {
            continue;
        }
        let key = element_key(element, schema, ctx.converter);
        if key.is_absent() {
            continue;
        }
        let cells = record_cells(schema, element, ctx);
        match records.get_mut(&key) {
            None => {
                records.insert(key, cells);
            }
            Some(existing) => {
                for (slot, cell) in existing.iter_mut().zip(cells) {
                    if slot.is_blank() && !cell.is_blank() {
                        *slot = cell;
                    }
                }
            }
        }
    }

    records
        .into_iter()
        .map(|(key, cells)| Record { key, cells })
        .collect()
}

fn record_cells<E: Element>(
    schema: &SchemaConfig,
    element: &E,
    ctx: &mut PassContext<'_>,
) -> Vec<Cell> {
    schema
        .columns
        .iter()
        .map(|spec| {
            if spec.numeric.is_some() {
                match attr_key_part(element, spec, ctx.converter) {
                    KeyPart::Number(0) => Cell::Empty,
                    KeyPart::Number(key) => Cell::Number(key_value(key)),
                    KeyPart::Text(_) => Cell::Empty,
                }
            } else if spec.attribute.is_none() && spec.fallback_attributes.is_empty() {
                Cell::Text(element.category().to_string())
            } else {
                let text = ctx.display_text(element, spec);
                if text.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(text)
                }
            }
        })
        .collect()
}
