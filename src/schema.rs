//! Per-category schema configuration.
//!
//! Each synchronized category is one [`SchemaConfig`] record: which sheet it
//! lives on, which columns make up the composite key, which element
//! attributes feed which columns, and which value columns the import path
//! pushes back onto elements. The engine is generic over these records; the
//! shipped catalog lives in [`crate::catalog`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::key::NumberPolicy;
use crate::model::ElementFilter;
use crate::store::{Cell, Sheet};

pub const DEFAULT_HEADER_ROW: u32 = 3;
pub const DEFAULT_MIN_DATA_ROW: u32 = 5;
pub const DEFAULT_EMPTY_RUN_STOP: u32 = 20;

/// One column of a schema's sheet layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Canonical header text, written on export when the column is missing.
    pub header: String,
    /// Alternative header spellings accepted case-insensitively on import.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    /// Element attribute feeding the column; `None` uses the element's
    /// category name.
    #[serde(default)]
    pub attribute: Option<String>,
    /// Attributes tried in order when `attribute` reads empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_attributes: Vec<String>,
    /// Numeric columns carry a policy; text columns leave this unset.
    #[serde(default)]
    pub numeric: Option<NumberPolicy>,
    /// Whether the column contributes a component to the composite key.
    #[serde(default)]
    pub key: bool,
    /// Memoize the attribute lookup per element type within one pass.
    #[serde(default)]
    pub memoize_by_type: bool,
}

impl ColumnSpec {
    pub fn text_key(header: &str, attribute: &str) -> Self {
        Self {
            header: header.to_string(),
            synonyms: Vec::new(),
            attribute: Some(attribute.to_string()),
            fallback_attributes: Vec::new(),
            numeric: None,
            key: true,
            memoize_by_type: false,
        }
    }

    pub fn number_key(header: &str, attribute: &str, policy: NumberPolicy) -> Self {
        Self {
            header: header.to_string(),
            synonyms: Vec::new(),
            attribute: Some(attribute.to_string()),
            fallback_attributes: Vec::new(),
            numeric: Some(policy),
            key: true,
            memoize_by_type: false,
        }
    }

    pub fn display(header: &str, attribute: Option<&str>) -> Self {
        Self {
            header: header.to_string(),
            synonyms: Vec::new(),
            attribute: attribute.map(str::to_string),
            fallback_attributes: Vec::new(),
            numeric: None,
            key: false,
            memoize_by_type: false,
        }
    }

    pub fn with_synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms = synonyms.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Policy for normalizing values read from the sheet itself. The sheet
    /// already holds target-unit values, so the unit conversion is dropped
    /// and only glyph stripping survives.
    pub fn sheet_policy(&self) -> Option<NumberPolicy> {
        self.numeric.map(|policy| NumberPolicy {
            strip_units: policy.strip_units,
            unit: crate::key::UnitRule::None,
        })
    }
}

/// A column the import path pushes back onto matched elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueColumn {
    pub header: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    /// Element attribute receiving the cell value.
    pub attribute: String,
}

impl ValueColumn {
    pub fn new(header: &str, synonyms: &[&str], attribute: &str) -> Self {
        Self {
            header: header.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            attribute: attribute.to_string(),
        }
    }
}

/// Configuration record for one synchronized category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Switch name used to select the schema on the command line.
    pub name: String,
    /// Worksheet the schema owns.
    pub sheet: String,
    #[serde(default = "default_header_row")]
    pub header_row: u32,
    #[serde(default = "default_min_data_row")]
    pub min_data_row: u32,
    #[serde(default = "default_empty_run_stop")]
    pub empty_run_stop: u32,
    #[serde(default)]
    pub filter: ElementFilter,
    /// Ordered sheet layout; key columns in their order here form the
    /// composite key and the sort priority.
    pub columns: Vec<ColumnSpec>,
    /// Optional import-path value columns, preserved untouched by export.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_columns: Vec<ValueColumn>,
}

fn default_header_row() -> u32 {
    DEFAULT_HEADER_ROW
}

fn default_min_data_row() -> u32 {
    DEFAULT_MIN_DATA_ROW
}

fn default_empty_run_stop() -> u32 {
    DEFAULT_EMPTY_RUN_STOP
}

impl SchemaConfig {
    pub fn key_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|spec| spec.key)
    }

    /// Resolves every schema column against the header row, creating missing
    /// headers after the last used header cell (export behavior).
    pub fn ensure_columns<S: Sheet + ?Sized>(&self, sheet: &mut S) -> Vec<u32> {
        let headers = read_headers(sheet, self.header_row);
        let mut next_col = sheet.last_used_column(self.header_row) + 1;
        let mut resolved = Vec::with_capacity(self.columns.len());
        for spec in &self.columns {
            match headers
                .iter()
                .find(|(text, _)| text == &spec.header)
                .map(|(_, col)| *col)
            {
                Some(col) => resolved.push(col),
                None => {
                    sheet.write_cell(self.header_row, next_col, Cell::Text(spec.header.clone()));
                    resolved.push(next_col);
                    next_col += 1;
                }
            }
        }
        resolved
    }

    /// Resolves key columns through the case-insensitive synonym table
    /// (import behavior); a missing key column skips the schema.
    pub fn resolve_key_columns<S: Sheet + ?Sized>(&self, sheet: &S) -> Result<Vec<u32>> {
        let headers = read_headers(sheet, self.header_row);
        self.key_columns()
            .map(|spec| {
                find_ci(&headers, &spec.header, &spec.synonyms).ok_or_else(|| {
                    SyncError::MissingColumn {
                        sheet: self.sheet.clone(),
                        column: spec.header.clone(),
                    }
                })
            })
            .collect()
    }

    /// Resolves the value columns; entries missing from the sheet come back
    /// as `None`. At least one must resolve for the import to proceed.
    pub fn resolve_value_columns<S: Sheet + ?Sized>(&self, sheet: &S) -> Result<Vec<Option<u32>>> {
        let headers = read_headers(sheet, self.header_row);
        let resolved: Vec<Option<u32>> = self
            .value_columns
            .iter()
            .map(|value| find_ci(&headers, &value.header, &value.synonyms))
            .collect();
        if !self.value_columns.is_empty() && resolved.iter().all(Option::is_none) {
            return Err(SyncError::NoValueColumns {
                sheet: self.sheet.clone(),
            });
        }
        Ok(resolved)
    }
}

/// Reads the header row as `(trimmed text, column)` pairs.
fn read_headers<S: Sheet + ?Sized>(sheet: &S, header_row: u32) -> Vec<(String, u32)> {
    let last_col = sheet.last_used_column(header_row);
    if last_col == 0 {
        return Vec::new();
    }
    (1..=last_col)
        .filter_map(|col| {
            let text = sheet.read_cell(header_row, col).to_text();
            if text.is_empty() {
                None
            } else {
                Some((text, col))
            }
        })
        .collect()
}

fn find_ci(headers: &[(String, u32)], canonical: &str, synonyms: &[String]) -> Option<u32> {
    let mut candidates = vec![canonical.to_lowercase()];
    candidates.extend(synonyms.iter().map(|s| s.to_lowercase()));
    headers
        .iter()
        .find(|(text, _)| candidates.contains(&text.to_lowercase()))
        .map(|(_, col)| *col)
}
