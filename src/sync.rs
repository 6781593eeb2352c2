//! Top-level synchronization runs.
//!
//! A run takes one workbook, one element snapshot, and a selection of
//! schemas, and executes the selected passes sequentially. Failures stay
//! schema-scoped: a pass that cannot run is reported as skipped in its
//! summary and never aborts its siblings.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::engine::PassContext;
use crate::engine::export::{ExportSummary, run_export};
use crate::engine::import::{ImportSummary, run_import};
use crate::error::Result;
use crate::key::UnitConverter;
use crate::model::JsonElement;
use crate::schema::SchemaConfig;
use crate::store::{MemoryWorkbook, xlsx};

/// Outcome of one schema pass, in either direction.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum PassSummary {
    Export(ExportSummary),
    Import(ImportSummary),
}

/// Runs the selected export passes against an in-memory workbook.
pub fn run_export_passes(
    workbook: &mut MemoryWorkbook,
    schemas: &[&SchemaConfig],
    elements: &[JsonElement],
    converter: Option<&dyn UnitConverter>,
) -> Vec<ExportSummary> {
    schemas
        .iter()
        .map(|schema| {
            let mut ctx = PassContext::new(converter);
            match run_export(workbook, schema, elements, &mut ctx) {
                Ok(summary) => summary,
                Err(error) => {
                    warn!(schema = %schema.name, %error, "export pass skipped");
                    ExportSummary::skipped(schema, error.to_string())
                }
            }
        })
        .collect()
}

/// Runs the selected import passes.
///
/// Each schema's writes are transactional: the pass runs against a staged
/// copy of the element set and commits only when the pass succeeds, so a
/// failed schema leaves the elements exactly as they were. Per-field write
/// failures inside a committed pass are tolerated and only counted.
pub fn run_import_passes(
    workbook: &MemoryWorkbook,
    schemas: &[&SchemaConfig],
    elements: &mut Vec<JsonElement>,
    converter: Option<&dyn UnitConverter>,
) -> Vec<ImportSummary> {
    schemas
        .iter()
        .map(|schema| {
            let mut ctx = PassContext::new(converter);
            let mut staged = elements.clone();
            match run_import(workbook, schema, &mut staged, &mut ctx) {
                Ok(summary) => {
                    *elements = staged;
                    summary
                }
                Err(error) => {
                    warn!(schema = %schema.name, %error, "import pass skipped");
                    ImportSummary::skipped(schema, error.to_string())
                }
            }
        })
        .collect()
}

/// Synchronizes an element snapshot file into a workbook file.
#[instrument(
    level = "info",
    skip_all,
    fields(workbook = %workbook_path.display(), elements = %elements_path.display())
)]
pub fn export_files(
    workbook_path: &Path,
    elements_path: &Path,
    schemas: &[&SchemaConfig],
) -> Result<Vec<ExportSummary>> {
    let elements = load_elements(elements_path)?;
    info!(element_count = elements.len(), "element snapshot loaded");
    let mut workbook = xlsx::load_workbook(workbook_path)?;
    let summaries = run_export_passes(&mut workbook, schemas, &elements, None);
    xlsx::save_workbook(workbook_path, &workbook)?;
    Ok(summaries)
}

/// Synchronizes workbook values back into an element snapshot file. The
/// workbook is only read; the snapshot is rewritten with the applied values.
#[instrument(
    level = "info",
    skip_all,
    fields(workbook = %workbook_path.display(), elements = %elements_path.display())
)]
pub fn import_files(
    workbook_path: &Path,
    elements_path: &Path,
    schemas: &[&SchemaConfig],
) -> Result<Vec<ImportSummary>> {
    let mut elements = load_elements(elements_path)?;
    info!(element_count = elements.len(), "element snapshot loaded");
    let workbook = xlsx::load_workbook(workbook_path)?;
    let summaries = run_import_passes(&workbook, schemas, &mut elements, None);
    save_elements(elements_path, &elements)?;
    Ok(summaries)
}

/// Loads the element snapshot the host model exported.
pub fn load_elements(path: &Path) -> Result<Vec<JsonElement>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Persists the element snapshot after an import run.
pub fn save_elements(path: &Path, elements: &[JsonElement]) -> Result<()> {
    let json = serde_json::to_string_pretty(elements)?;
    fs::write(path, json)?;
    Ok(())
}
