//! Read-only coverage accounting over the finished master table.

use std::fmt;

use serde::Serialize;

use crate::pim::master::join::StageSummary;
use crate::pim::master::model::Table;

/// Designates the column whose non-absent count measures a stage's hit rate.
///
/// `column` is the name in the *source* table; it is resolved to its output
/// name (which may carry a collision suffix) through the stage summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchIndicator {
    pub stage: String,
    pub column: String,
}

/// Coverage for one joined source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCoverage {
    pub stage: String,
    /// Output column counted, when the stage contributed the indicator.
    pub indicator: Option<String>,
    /// Master rows with a value in the indicator column.
    pub indicator_hits: usize,
    /// Master rows whose key found a lookup row.
    pub key_matches: usize,
    pub duplicates_dropped: usize,
}

/// Summary statistics of a master build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub total_rows: usize,
    pub column_count: usize,
    pub dropped_columns: Vec<String>,
    pub sources: Vec<SourceCoverage>,
}

impl CoverageReport {
    /// Computes the report. Never mutates `table` and never fails: an
    /// indicator that was pruned, renamed away or never existed counts zero.
    pub fn compute(
        table: &Table,
        stages: &[StageSummary],
        indicators: &[MatchIndicator],
        dropped_columns: &[String],
    ) -> Self {
        let sources = stages
            .iter()
            .map(|stage| {
                let indicator = indicators
                    .iter()
                    .find(|indicator| indicator.stage == stage.tag)
                    .and_then(|indicator| stage.output_name(&indicator.column))
                    .map(str::to_string);
                let indicator_hits = indicator
                    .as_deref()
                    .map(|column| table.count_present(column))
                    .unwrap_or(0);
                SourceCoverage {
                    stage: stage.tag.clone(),
                    indicator,
                    indicator_hits,
                    key_matches: stage.matched,
                    duplicates_dropped: stage.duplicates_dropped,
                }
            })
            .collect();

        Self {
            total_rows: table.row_count(),
            column_count: table.column_count(),
            dropped_columns: dropped_columns.to_vec(),
            sources,
        }
    }

    pub fn source(&self, stage: &str) -> Option<&SourceCoverage> {
        self.sources.iter().find(|source| source.stage == stage)
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}", self.total_rows)?;
        writeln!(f, "Columns after drop: {}", self.column_count)?;
        for source in &self.sources {
            writeln!(
                f,
                "Matches to {}: {} (key matches: {})",
                source.stage, source.indicator_hits, source.key_matches
            )?;
        }
        Ok(())
    }
}
