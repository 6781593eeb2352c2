//! Applying a reconciliation to the sheet in minimal ranged calls.

use crate::store::{Cell, Sheet};

use super::diff::Reconciliation;
use super::region::DataRegion;

/// Row counts of one applied pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationCounts {
    pub updated: usize,
    pub deleted: usize,
    pub appended: usize,
}

/// Compresses an ascending row list into maximal contiguous `(start, end)`
/// runs.
pub fn contiguous_runs(sorted_rows: &[u32]) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut rows = sorted_rows.iter().copied();
    let Some(first) = rows.next() else {
        return runs;
    };
    let (mut start, mut prev) = (first, first);
    for row in rows {
        if row == prev + 1 {
            prev = row;
        } else {
            runs.push((start, prev));
            start = row;
            prev = row;
        }
    }
    runs.push((start, prev));
    runs
}

/// Applies the reconciliation in the fixed safe order: updates, then
/// deletes, then appends.
///
/// Updates are row-stable so they run first. Deletes run high-to-low so
/// removing a run never shifts a not-yet-processed lower row, and they run
/// before the append start row is computed: appends begin just past the
/// region as it stands *after* shrinkage. Each operation class is compressed
/// into contiguous runs, one ranged store call per run and column.
pub fn apply<S: Sheet + ?Sized>(
    sheet: &mut S,
    recon: &Reconciliation,
    columns: &[u32],
    region: DataRegion,
    min_data_row: u32,
) -> MutationCounts {
    let mut counts = MutationCounts::default();

    // Updates, ascending, run-length compressed.
    let mut updates = recon.updates.clone();
    updates.sort_by_key(|&(row, _)| row);
    let mut run_start = 0usize;
    while run_start < updates.len() {
        let mut run_end = run_start;
        while run_end + 1 < updates.len() && updates[run_end + 1].0 == updates[run_end].0 + 1 {
            run_end += 1;
        }
        let first_row = updates[run_start].0;
        for (col_idx, &col) in columns.iter().enumerate() {
            let values: Vec<Cell> = updates[run_start..=run_end]
                .iter()
                .map(|(_, cells)| cells.get(col_idx).cloned().unwrap_or_default())
                .collect();
            sheet.write_column_range(col, first_row, &values);
        }
        counts.updated += run_end - run_start + 1;
        run_start = run_end + 1;
    }

    // Deletes, highest runs first.
    for &(start, end) in contiguous_runs(&recon.deletes).iter().rev() {
        sheet.delete_rows(start, end);
        counts.deleted += (end - start + 1) as usize;
    }

    // Appends, starting just past the shrunk region.
    if !recon.appends.is_empty() {
        let removed = recon
            .deletes
            .iter()
            .filter(|&&row| row <= region.last_row)
            .count() as u32;
        let start_row = if region.is_empty() {
            min_data_row
        } else {
            (region.last_row - removed + 1).max(min_data_row)
        };
        for (col_idx, &col) in columns.iter().enumerate() {
            let values: Vec<Cell> = recon
                .appends
                .iter()
                .map(|cells| cells.get(col_idx).cloned().unwrap_or_default())
                .collect();
            sheet.write_column_range(col, start_row, &values);
        }
        counts.appended = recon.appends.len();
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySheet;

    #[test]
    fn runs_are_maximal() {
        assert_eq!(contiguous_runs(&[]), vec![]);
        assert_eq!(contiguous_runs(&[5]), vec![(5, 5)]);
        assert_eq!(
            contiguous_runs(&[5, 6, 7, 9, 12, 13]),
            vec![(5, 7), (9, 9), (12, 13)]
        );
    }

    #[test]
    fn contiguous_deletes_are_one_call() {
        let mut sheet = MemorySheet::new("t");
        for row in 5..=10 {
            sheet.write_cell(row, 1, Cell::Number(row as f64));
        }
        let recon = Reconciliation {
            deletes: vec![6, 7, 8],
            ..Reconciliation::default()
        };
        let region = DataRegion {
            first_row: 5,
            last_row: 10,
        };

        let counts = apply(&mut sheet, &recon, &[1], region, 5);

        assert_eq!(counts.deleted, 3);
        assert_eq!(sheet.delete_calls(), 1);
        assert_eq!(sheet.read_cell(6, 1), Cell::Number(9.0));
    }

    #[test]
    fn appends_land_after_the_shrunk_region() {
        let mut sheet = MemorySheet::new("t");
        for row in 5..=8 {
            sheet.write_cell(row, 1, Cell::Text(format!("r{row}")));
        }
        // Delete the last two rows and append one: the append must land on
        // row 7, which only holds if deletes run before the start row is
        // computed.
        let recon = Reconciliation {
            deletes: vec![7, 8],
            appends: vec![vec![Cell::Text("new".into())]],
            ..Reconciliation::default()
        };
        let region = DataRegion {
            first_row: 5,
            last_row: 8,
        };

        apply(&mut sheet, &recon, &[1], region, 5);

        assert_eq!(sheet.read_cell(7, 1), Cell::Text("new".into()));
        assert!(sheet.read_cell(8, 1).is_blank());
        assert!(sheet.read_cell(9, 1).is_blank());
    }

    #[test]
    fn update_runs_bound_ranged_writes() {
        let mut sheet = MemorySheet::new("t");
        let recon = Reconciliation {
            updates: vec![
                (9, vec![Cell::Number(9.0)]),
                (5, vec![Cell::Number(5.0)]),
                (6, vec![Cell::Number(6.0)]),
            ],
            ..Reconciliation::default()
        };
        let region = DataRegion {
            first_row: 5,
            last_row: 9,
        };

        let counts = apply(&mut sheet, &recon, &[1], region, 5);

        assert_eq!(counts.updated, 3);
        // Two runs (5..=6 and 9..=9), one column each.
        assert_eq!(sheet.ranged_writes(), 2);
        assert_eq!(sheet.read_cell(6, 1), Cell::Number(6.0));
    }

    #[test]
    fn append_into_an_empty_region_starts_at_min_row() {
        let mut sheet = MemorySheet::new("t");
        let recon = Reconciliation {
            appends: vec![vec![Cell::Text("a".into())], vec![Cell::Text("b".into())]],
            ..Reconciliation::default()
        };
        let region = DataRegion {
            first_row: 5,
            last_row: 4,
        };

        apply(&mut sheet, &recon, &[1], region, 5);

        assert_eq!(sheet.read_cell(5, 1), Cell::Text("a".into()));
        assert_eq!(sheet.read_cell(6, 1), Cell::Text("b".into()));
    }
}
