//! Readers and writers for the tables exchanged with the outside world.
//!
//! Every value is kept as text; empty cells load as absent.

pub mod delimited;
pub mod excel_read;
pub mod excel_write;

use std::path::Path;

use tracing::{info, instrument};

use crate::pim::master::error::{PimError, Result};
use crate::pim::master::model::Table;

/// On-disk table representation, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Delimited { delimiter: u8 },
    Xlsx,
}

/// Detects the table format from the file extension (case-insensitive).
pub fn detect_format(path: &Path) -> Option<TableFormat> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "csv" | "txt" => Some(TableFormat::Delimited { delimiter: b',' }),
        "tsv" | "tab" => Some(TableFormat::Delimited { delimiter: b'\t' }),
        "xlsx" => Some(TableFormat::Xlsx),
        _ => None,
    }
}

/// Loads a whole table into memory.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(PimError::MissingInput(path.to_path_buf()));
    }
    let format =
        detect_format(path).ok_or_else(|| PimError::UnsupportedFormat(path.to_path_buf()))?;
    let table = match format {
        TableFormat::Delimited { delimiter } => delimited::read_table(path, delimiter)?,
        TableFormat::Xlsx => excel_read::read_table(path)?,
    };
    info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded table"
    );
    Ok(table)
}

/// Writes a table using the format implied by the file extension.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let format =
        detect_format(path).ok_or_else(|| PimError::UnsupportedFormat(path.to_path_buf()))?;
    match format {
        TableFormat::Delimited { delimiter } => delimited::write_table(path, table, delimiter),
        TableFormat::Xlsx => excel_write::write_table(path, table),
    }
}

/// Makes header names unique and non-empty.
///
/// Blank names become `Unnamed: {position}`; repeats of a name get `.1`,
/// `.2`, … appended in order of appearance.
pub fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut headers = Vec::new();

    for (position, name) in raw.into_iter().enumerate() {
        let name = name.as_ref();
        let base = if name.trim().is_empty() {
            format!("Unnamed: {position}")
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut counter = 1;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{base}.{counter}");
            counter += 1;
        }
        headers.push(candidate);
    }

    headers
}
