//! Adapter between workbook files and the in-memory store.
//!
//! Loading preserves absolute cell positions: a header on spreadsheet row 3
//! lands on row 3 of the [`MemorySheet`], regardless of where the sheet's
//! occupied rectangle starts.

use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::store::{Cell, MemoryWorkbook, Sheet};

/// Reads every worksheet of an xlsx file into memory.
pub fn load_workbook(path: &Path) -> Result<MemoryWorkbook> {
    let mut source: Xlsx<_> = open_workbook(path)?;
    let mut workbook = MemoryWorkbook::new();

    let names: Vec<String> = source.sheet_names().to_vec();
    for name in names {
        let sheet = workbook.ensure_sheet(&name);
        let range = match source.worksheet_range(&name) {
            Some(range) => range?,
            None => continue,
        };
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        for (row_offset, row) in range.rows().enumerate() {
            for (col_offset, data) in row.iter().enumerate() {
                let cell = convert_cell(data);
                if matches!(cell, Cell::Empty) {
                    continue;
                }
                let row = start_row + row_offset as u32 + 1;
                let col = start_col + col_offset as u32 + 1;
                sheet.write_cell(row, col, cell);
            }
        }
    }

    Ok(workbook)
}

/// Writes the in-memory workbook back to an xlsx file.
pub fn save_workbook(path: &Path, workbook: &MemoryWorkbook) -> Result<()> {
    let mut writer = Workbook::new();

    for sheet in workbook.sheets() {
        let worksheet = writer.add_worksheet();
        worksheet.set_name(sheet.name())?;
        for (row, col, cell) in sheet.cells() {
            let (row, col) = (row - 1, (col - 1) as u16);
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    worksheet.write_string(row, col, text)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row, col, *value)?;
                }
                Cell::Bool(value) => {
                    worksheet.write_boolean(row, col, *value)?;
                }
            }
        }
    }

    writer.save(path)?;
    Ok(())
}

fn convert_cell(data: &DataType) -> Cell {
    match data {
        DataType::Empty | DataType::Error(_) => Cell::Empty,
        DataType::String(text) => {
            if text.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(text.clone())
            }
        }
        DataType::Float(value) | DataType::DateTime(value) => Cell::Number(*value),
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Bool(value) => Cell::Bool(*value),
        other => {
            let text = other.to_string();
            if text.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(text)
            }
        }
    }
}
