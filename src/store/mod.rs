//! The tabular store boundary.
//!
//! The engine only ever talks to [`Sheet`]: a named grid of 1-based rows and
//! columns with ranged reads, ranged writes, and whole-row deletion. The
//! in-memory implementation in [`memory`] backs both the tests and the xlsx
//! adapter in [`xlsx`], which shuttles a workbook file in and out of memory.

pub mod memory;
pub mod xlsx;

pub use memory::{MemorySheet, MemoryWorkbook};

/// A single cell value as stored in the sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// True for cells that count as blank during region scanning: empty cells
    /// and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed textual form of the cell, used wherever the engine normalizes
    /// cell contents into key components.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(value) => value.to_string(),
            Cell::Bool(value) => value.to_string(),
        }
    }
}

/// One worksheet of the external store.
///
/// Rows and columns are 1-based to match the host spreadsheet addressing.
/// `read_column` and `write_column_range` are the ranged calls the batched
/// mutator compresses row operations into; implementations should treat each
/// invocation as one round trip to the store.
pub trait Sheet {
    fn name(&self) -> &str;

    /// Total number of addressable rows.
    fn row_capacity(&self) -> u32;

    /// Rightmost non-blank column in `row`, or 0 when the row is blank.
    fn last_used_column(&self, row: u32) -> u32;

    fn read_cell(&self, row: u32, col: u32) -> Cell;

    /// Reads `col` over `first_row..=last_row`; the result always has exactly
    /// one entry per row in the range.
    fn read_column(&self, col: u32, first_row: u32, last_row: u32) -> Vec<Cell>;

    fn write_cell(&mut self, row: u32, col: u32, value: Cell);

    /// Writes a contiguous vertical run starting at `first_row`.
    fn write_column_range(&mut self, col: u32, first_row: u32, values: &[Cell]);

    /// Removes entire rows `first_row..=last_row`, shifting rows below up.
    fn delete_rows(&mut self, first_row: u32, last_row: u32);
}
