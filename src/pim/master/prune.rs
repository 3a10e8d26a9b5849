use tracing::info;

use crate::pim::master::model::Table;

/// Table with all-absent columns removed, plus the names that were dropped.
#[derive(Debug, Clone)]
pub struct PrunedTable {
    pub table: Table,
    pub dropped: Vec<String>,
}

/// Removes every column whose value is absent in all rows.
///
/// A table without rows therefore loses every column. Surviving columns keep
/// their relative order.
pub fn prune_empty_columns(table: &Table) -> PrunedTable {
    let mut kept = Vec::with_capacity(table.column_count());
    let mut dropped = Vec::new();

    for (index, name) in table.columns().iter().enumerate() {
        let populated = table.rows().iter().any(|row| row[index].is_some());
        if populated {
            kept.push(index);
        } else {
            dropped.push(name.clone());
        }
    }

    info!(
        kept = kept.len(),
        dropped = dropped.len(),
        "pruned empty columns"
    );

    PrunedTable {
        table: table.select_columns(&kept),
        dropped,
    }
}
