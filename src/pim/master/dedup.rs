use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use crate::pim::master::model::{CanonicalKey, Table};
use crate::pim::master::normalize::KeySpec;

/// A source table reduced to at most one row per canonical key.
///
/// Rows keep their original relative order. Rows with an absent key are not
/// part of the lookup at all.
#[derive(Debug, Clone)]
pub struct LookupTable {
    table: Table,
    index: HashMap<CanonicalKey, usize>,
    duplicates_dropped: usize,
    absent_keys: usize,
}

impl LookupTable {
    /// Builds a lookup from `table`, keyed by `spec`. See [`LookupTable::from_keys`].
    pub fn build(table: &Table, spec: &KeySpec) -> Self {
        let keys = spec.derive_all(table);
        Self::from_keys(table, &keys)
    }

    /// Builds a lookup from precomputed keys (one per row of `table`).
    ///
    /// The first row carrying a key wins; later rows with the same key are
    /// discarded silently apart from the `duplicates_dropped` counter.
    pub fn from_keys(table: &Table, keys: &[Option<CanonicalKey>]) -> Self {
        let mut index = HashMap::new();
        let mut kept = Vec::new();
        let mut duplicates_dropped = 0;
        let mut absent_keys = 0;

        for (row, key) in keys.iter().enumerate().take(table.row_count()) {
            let Some(key) = key else {
                absent_keys += 1;
                continue;
            };
            match index.entry(key.clone()) {
                Entry::Occupied(_) => duplicates_dropped += 1,
                Entry::Vacant(slot) => {
                    slot.insert(kept.len());
                    kept.push(row);
                }
            }
        }

        debug!(
            rows = table.row_count(),
            kept = kept.len(),
            duplicates_dropped,
            absent_keys,
            "lookup table built"
        );

        Self {
            table: table.select_rows(&kept),
            index,
            duplicates_dropped,
            absent_keys,
        }
    }

    /// Deduplicated rows, in first-occurrence order.
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Row position inside [`LookupTable::table`] for `key`.
    pub fn position(&self, key: &CanonicalKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Value of `column` in the row retained for `key`.
    pub fn get(&self, key: &CanonicalKey, column: &str) -> Option<&str> {
        self.position(key)
            .and_then(|row| self.table.get(row, column))
    }

    /// Rows discarded because an earlier row already claimed their key.
    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    /// Rows excluded because their key normalized to absent.
    pub fn absent_keys(&self) -> usize {
        self.absent_keys
    }
}
