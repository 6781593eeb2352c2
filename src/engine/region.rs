//! Locating the occupied row range of a schema within a sparse sheet.

use crate::store::Sheet;

/// Rows fetched per ranged read while scanning. Bounds the round-trip cost of
/// a scan against large or remote stores.
pub const SCAN_CHUNK_ROWS: u32 = 2000;

/// Contiguous occupied row range of one schema. Recomputed at the start of
/// every pass and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRegion {
    pub first_row: u32,
    pub last_row: u32,
}

impl DataRegion {
    pub fn is_empty(&self) -> bool {
        self.last_row < self.first_row
    }

    pub fn row_count(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.last_row - self.first_row + 1
        }
    }
}

/// Scans `key_cols` downward from `min_row` in [`SCAN_CHUNK_ROWS`] blocks.
///
/// A row with any non-blank key cell extends the region and resets the
/// empty-run counter; once `empty_run_stop` consecutive blank rows accumulate
/// the gap is treated as end-of-data. Shorter gaps are spanned, so a stray
/// blank row never truncates a legitimately sparse table.
pub fn scan_region<S: Sheet + ?Sized>(
    sheet: &S,
    key_cols: &[u32],
    min_row: u32,
    empty_run_stop: u32,
) -> DataRegion {
    let empty = DataRegion {
        first_row: min_row,
        last_row: min_row.saturating_sub(1),
    };
    if key_cols.is_empty() || min_row == 0 {
        return empty;
    }

    let capacity = sheet.row_capacity();
    let mut last_data_row = min_row - 1;
    let mut empty_run = 0u32;
    let mut chunk_start = min_row;

    while chunk_start <= capacity {
        let chunk_end = capacity.min(chunk_start + SCAN_CHUNK_ROWS - 1);
        let blocks: Vec<_> = key_cols
            .iter()
            .map(|&col| sheet.read_column(col, chunk_start, chunk_end))
            .collect();
        for offset in 0..=(chunk_end - chunk_start) {
            let occupied = blocks
                .iter()
                .any(|block| !block[offset as usize].is_blank());
            if occupied {
                last_data_row = chunk_start + offset;
                empty_run = 0;
            } else {
                empty_run += 1;
                if empty_run >= empty_run_stop {
                    return DataRegion {
                        first_row: min_row,
                        last_row: last_data_row,
                    };
                }
            }
        }
        chunk_start = chunk_end + 1;
    }

    DataRegion {
        first_row: min_row,
        last_row: last_data_row,
    }
}
