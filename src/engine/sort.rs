//! Restoring the canonical row order after mutation.

use crate::key::KeyPart;
use crate::schema::ColumnSpec;
use crate::store::{Cell, Sheet};

use super::index::cell_key_part;
use super::region::DataRegion;

/// Stable multi-key ascending sort of the region's rows.
///
/// Sort keys are the schema's key columns in priority order; numeric columns
/// compare by numeric value, not lexically. Rows whose key cells are all
/// blank sink to the bottom, as a spreadsheet sort would leave them. The
/// whole row width (column 1 through the last used header column) moves
/// together.
pub fn sort_region<S: Sheet + ?Sized>(
    sheet: &mut S,
    region: DataRegion,
    width: u32,
    key_specs: &[(&ColumnSpec, u32)],
) {
    if region.is_empty() || region.row_count() < 2 || width == 0 || key_specs.is_empty() {
        return;
    }

    let columns: Vec<Vec<Cell>> = (1..=width)
        .map(|col| sheet.read_column(col, region.first_row, region.last_row))
        .collect();

    let row_count = region.row_count() as usize;
    let mut order: Vec<usize> = (0..row_count).collect();
    let sort_keys: Vec<(Vec<KeyPart>, bool)> = (0..row_count)
        .map(|offset| {
            let parts: Vec<KeyPart> = key_specs
                .iter()
                .map(|&(spec, col)| cell_key_part(&columns[(col - 1) as usize][offset], spec))
                .collect();
            let blank = parts.iter().all(KeyPart::is_absent);
            (parts, blank)
        })
        .collect();

    order.sort_by(|&lhs, &rhs| {
        let (lhs_parts, lhs_blank) = &sort_keys[lhs];
        let (rhs_parts, rhs_blank) = &sort_keys[rhs];
        lhs_blank
            .cmp(rhs_blank)
            .then_with(|| lhs_parts.cmp(rhs_parts))
    });

    if order.iter().enumerate().all(|(idx, &src)| idx == src) {
        return;
    }

    for (col_idx, column) in columns.iter().enumerate() {
        let reordered: Vec<Cell> = order.iter().map(|&src| column[src].clone()).collect();
        sheet.write_column_range(col_idx as u32 + 1, region.first_row, &reordered);
    }
}
