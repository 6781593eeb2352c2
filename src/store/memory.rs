use std::collections::BTreeMap;

use super::{Cell, Sheet};

/// Row capacity of the xlsx format; the in-memory store mirrors it so region
/// scans behave identically against both backends.
const XLSX_ROW_CAPACITY: u32 = 1_048_576;

/// Sparse in-memory worksheet.
///
/// Besides backing the xlsx adapter, it counts ranged writes and delete calls
/// so tests can assert that the batched mutator stays within its
/// one-call-per-contiguous-run I/O bound.
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    name: String,
    cells: BTreeMap<(u32, u32), Cell>,
    ranged_writes: usize,
    delete_calls: usize,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of `write_column_range` calls since construction.
    pub fn ranged_writes(&self) -> usize {
        self.ranged_writes
    }

    /// Number of `delete_rows` calls since construction.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls
    }

    pub fn reset_counters(&mut self) {
        self.ranged_writes = 0;
        self.delete_calls = 0;
    }

    /// Iterates all non-empty cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &Cell)> {
        self.cells.iter().map(|(&(row, col), cell)| (row, col, cell))
    }

    /// Number of non-blank rows intersecting `first_row..=last_row`.
    pub fn occupied_rows(&self, first_row: u32, last_row: u32) -> usize {
        let mut rows: Vec<u32> = self
            .cells
            .iter()
            .filter(|&(&(row, _), cell)| row >= first_row && row <= last_row && !cell.is_blank())
            .map(|(&(row, _), _)| row)
            .collect();
        rows.dedup();
        rows.len()
    }
}

impl Sheet for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn row_capacity(&self) -> u32 {
        XLSX_ROW_CAPACITY
    }

    fn last_used_column(&self, row: u32) -> u32 {
        self.cells
            .range((row, 0)..=(row, u32::MAX))
            .filter(|(_, cell)| !cell.is_blank())
            .map(|(&(_, col), _)| col)
            .max()
            .unwrap_or(0)
    }

    fn read_cell(&self, row: u32, col: u32) -> Cell {
        self.cells.get(&(row, col)).cloned().unwrap_or_default()
    }

    fn read_column(&self, col: u32, first_row: u32, last_row: u32) -> Vec<Cell> {
        if last_row < first_row {
            return Vec::new();
        }
        (first_row..=last_row)
            .map(|row| self.read_cell(row, col))
            .collect()
    }

    fn write_cell(&mut self, row: u32, col: u32, value: Cell) {
        if matches!(value, Cell::Empty) {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    fn write_column_range(&mut self, col: u32, first_row: u32, values: &[Cell]) {
        self.ranged_writes += 1;
        for (offset, value) in values.iter().enumerate() {
            self.write_cell(first_row + offset as u32, col, value.clone());
        }
    }

    fn delete_rows(&mut self, first_row: u32, last_row: u32) {
        if last_row < first_row {
            return;
        }
        self.delete_calls += 1;
        let removed = last_row - first_row + 1;
        let old = std::mem::take(&mut self.cells);
        for ((row, col), cell) in old {
            if row < first_row {
                self.cells.insert((row, col), cell);
            } else if row > last_row {
                self.cells.insert((row - removed, col), cell);
            }
        }
    }
}

/// A set of named sheets, the unit the xlsx adapter loads and saves.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: BTreeMap<String, MemorySheet>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.get(name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut MemorySheet> {
        self.sheets.get_mut(name)
    }

    /// Returns the named sheet, creating it when absent (export-side
    /// behavior; import never creates sheets).
    pub fn ensure_sheet(&mut self, name: &str) -> &mut MemorySheet {
        self.sheets
            .entry(name.to_string())
            .or_insert_with(|| MemorySheet::new(name))
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &MemorySheet> {
        self.sheets.values()
    }
}
