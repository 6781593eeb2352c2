//! The pure reconciliation step: fresh records versus the existing row index.

use std::collections::{HashMap, HashSet};

use crate::key::CompositeKey;
use crate::store::Cell;

/// One fresh record: its composite key plus the cells destined for the
/// schema's columns, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: CompositeKey,
    pub cells: Vec<Cell>,
}

/// The operation sets one pass applies to the sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// `(row, cells)` for keys present on both sides; row numbers preserved.
    pub updates: Vec<(u32, Vec<Cell>)>,
    /// Cells for keys the sheet has never seen, in the caller's order.
    pub appends: Vec<Vec<Cell>>,
    /// Rows whose key vanished from the fresh set, ascending.
    pub deletes: Vec<u32>,
}

/// Computes update/append/delete sets from the fresh records and the
/// existing index. Pure: no store access, fully unit-testable.
///
/// `fresh` must already be in canonical order so appended rows land sorted.
/// A key can never be both updated and deleted within one pass.
pub fn reconcile(fresh: &[Record], existing: &HashMap<CompositeKey, u32>) -> Reconciliation {
    let mut recon = Reconciliation::default();

    let fresh_keys: HashSet<&CompositeKey> = fresh.iter().map(|record| &record.key).collect();

    for record in fresh {
        match existing.get(&record.key) {
            Some(&row) => recon.updates.push((row, record.cells.clone())),
            None => recon.appends.push(record.cells.clone()),
        }
    }

    for (key, &row) in existing {
        if !fresh_keys.contains(key) {
            recon.deletes.push(row);
        }
    }
    recon.deletes.sort_unstable();

    recon
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyPart;

    fn record(name: &str) -> Record {
        Record {
            key: CompositeKey(vec![KeyPart::Text(name.to_string())]),
            cells: vec![Cell::Text(name.to_string())],
        }
    }

    fn key(name: &str) -> CompositeKey {
        CompositeKey(vec![KeyPart::Text(name.to_string())])
    }

    #[test]
    fn update_delete_append_are_exact() {
        let fresh = vec![record("A"), record("C")];
        let existing = HashMap::from([(key("A"), 5), (key("B"), 6)]);

        let recon = reconcile(&fresh, &existing);

        assert_eq!(recon.updates, vec![(5, vec![Cell::Text("A".into())])]);
        assert_eq!(recon.appends, vec![vec![Cell::Text("C".into())]]);
        assert_eq!(recon.deletes, vec![6]);
    }

    #[test]
    fn identical_sides_produce_updates_only() {
        let fresh = vec![record("A"), record("B")];
        let existing = HashMap::from([(key("A"), 5), (key("B"), 6)]);

        let recon = reconcile(&fresh, &existing);

        assert_eq!(recon.updates.len(), 2);
        assert!(recon.appends.is_empty());
        assert!(recon.deletes.is_empty());
    }

    #[test]
    fn appends_keep_the_caller_order() {
        let fresh = vec![record("B"), record("A"), record("C")];
        let existing = HashMap::new();

        let recon = reconcile(&fresh, &existing);

        let appended: Vec<String> = recon
            .appends
            .iter()
            .map(|cells| cells[0].to_text())
            .collect();
        assert_eq!(appended, vec!["B", "A", "C"]);
    }
}
