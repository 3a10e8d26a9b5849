//! Ordered chain of key joins against deduplicated lookup tables.
//!
//! Every stage derives its left-hand key from the *primary* table rows, never
//! from a column joined in by an earlier stage. Stage order therefore only
//! affects collision naming, not which rows match.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pim::master::dedup::LookupTable;
use crate::pim::master::model::Table;
use crate::pim::master::normalize::KeySpec;

/// How unmatched primary rows are treated by a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    /// Unmatched rows are kept with absent values for every joined column.
    #[default]
    Left,
    /// Unmatched rows are dropped.
    Inner,
}

/// One step of the chain: which lookup to join, on which primary key, and
/// the suffix applied when an incoming column name is already taken.
#[derive(Debug, Clone)]
pub struct JoinStage {
    pub tag: String,
    pub suffix: String,
    pub kind: JoinKind,
    pub left_key: KeySpec,
    pub lookup: LookupTable,
}

/// Where a joined-in column ended up in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub source: String,
    pub output: String,
}

/// Per-stage diagnostics collected while joining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub tag: String,
    pub kind: JoinKind,
    /// Output rows that found a lookup row in this stage.
    pub matched: usize,
    pub lookup_rows: usize,
    pub duplicates_dropped: usize,
    pub absent_keys: usize,
    pub columns: Vec<ColumnMapping>,
}

impl StageSummary {
    /// Output name of a column contributed by this stage.
    pub fn output_name(&self, source: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|mapping| mapping.source == source)
            .map(|mapping| mapping.output.as_str())
    }
}

/// Result of running the chain: the joined table plus per-stage summaries.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub table: Table,
    pub stages: Vec<StageSummary>,
}

impl JoinOutcome {
    pub fn stage(&self, tag: &str) -> Option<&StageSummary> {
        self.stages.iter().find(|stage| stage.tag == tag)
    }
}

/// Runs the configured stages in order against a primary table.
#[derive(Debug, Clone, Default)]
pub struct JoinSequencer {
    stages: Vec<JoinStage>,
}

impl JoinSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: JoinStage) -> &mut Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[JoinStage] {
        &self.stages
    }

    /// Joins every stage into `primary`.
    ///
    /// The output starts with the primary columns followed by each stage's
    /// lookup columns in stage order. With only left stages the output holds
    /// exactly one row per primary row, in primary order.
    pub fn run(&self, primary: &Table) -> JoinOutcome {
        let mut names = ColumnNameRegistry::default();
        for column in primary.columns() {
            names.claim(column.clone());
        }

        let (mut columns, mut rows) = primary.clone().into_parts();
        // Primary row each output row descends from.
        let mut origins: Vec<usize> = (0..rows.len()).collect();
        let mut summaries = Vec::with_capacity(self.stages.len());

        for (position, stage) in self.stages.iter().enumerate() {
            let lookup = stage.lookup.table();
            let mapping: Vec<ColumnMapping> = lookup
                .columns()
                .iter()
                .map(|source| ColumnMapping {
                    source: source.clone(),
                    output: names.assign(source, &stage.suffix, position + 1),
                })
                .collect();
            for column in &mapping {
                if column.source != column.output {
                    debug!(
                        stage = %stage.tag,
                        from = %column.source,
                        to = %column.output,
                        "renamed colliding column"
                    );
                }
            }
            columns.extend(mapping.iter().map(|column| column.output.clone()));

            let keys = stage.left_key.derive_all(primary);
            let width = lookup.column_count();
            let mut matched = 0;
            let mut next_rows = Vec::with_capacity(rows.len());
            let mut next_origins = Vec::with_capacity(origins.len());

            for (mut row, origin) in rows.into_iter().zip(origins) {
                let hit = keys[origin]
                    .as_ref()
                    .and_then(|key| stage.lookup.position(key));
                match (hit, stage.kind) {
                    (Some(found), _) => {
                        matched += 1;
                        row.extend(lookup.rows()[found].iter().cloned());
                    }
                    (None, JoinKind::Left) => {
                        row.extend(std::iter::repeat_n(None, width));
                    }
                    (None, JoinKind::Inner) => continue,
                }
                next_rows.push(row);
                next_origins.push(origin);
            }

            rows = next_rows;
            origins = next_origins;

            info!(
                stage = %stage.tag,
                matched,
                rows = rows.len(),
                lookup_rows = stage.lookup.len(),
                "join stage complete"
            );

            summaries.push(StageSummary {
                tag: stage.tag.clone(),
                kind: stage.kind,
                matched,
                lookup_rows: stage.lookup.len(),
                duplicates_dropped: stage.lookup.duplicates_dropped(),
                absent_keys: stage.lookup.absent_keys(),
                columns: mapping,
            });
        }

        JoinOutcome {
            table: Table::from_parts(columns, rows),
            stages: summaries,
        }
    }
}

/// Hands out unique column names for the accumulating master table.
#[derive(Debug, Default)]
pub struct ColumnNameRegistry {
    used: HashSet<String>,
}

impl ColumnNameRegistry {
    pub fn claim(&mut self, name: String) {
        self.used.insert(name);
    }

    /// Returns `raw` when free, otherwise `raw + suffix`, otherwise
    /// `raw + suffix + "_" + n` for the first free `n >= stage`.
    ///
    /// The numbered form covers stages sharing a suffix and source columns
    /// that already carry the suffixed name.
    pub fn assign(&mut self, raw: &str, suffix: &str, stage: usize) -> String {
        if self.used.insert(raw.to_string()) {
            return raw.to_string();
        }

        let suffixed = format!("{raw}{suffix}");
        if self.used.insert(suffixed.clone()) {
            return suffixed;
        }

        let mut counter = stage;
        loop {
            let candidate = format!("{suffixed}_{counter}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}
