use std::fs;
use std::path::Path;

use tracing::warn;

use crate::pim::master::error::Result;
use crate::pim::master::io::normalize_headers;
use crate::pim::master::model::Table;

/// Reads a delimited text file with a header row.
///
/// Files that are not valid UTF-8 are decoded as Windows-1252, which is what
/// spreadsheet exports usually produce.
pub fn read_table(path: &Path, delimiter: u8) -> Result<Table> {
    let content = read_as_utf8(path)?;
    read_from_str(&content, delimiter)
}

/// Parses delimited text held in memory.
pub fn read_from_str(content: &str, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = normalize_headers(reader.headers()?.iter());
    let width = headers.len();
    let mut table = Table::new(headers);
    let mut overlong = 0usize;

    for record in reader.records() {
        let record = record?;
        if record.len() > width {
            overlong += 1;
        }
        let cells = record
            .iter()
            .take(width)
            .map(|field| (!field.is_empty()).then(|| field.to_string()))
            .collect();
        table.push_row(cells);
    }

    if overlong > 0 {
        warn!(rows = overlong, width, "ignored cells beyond the header width");
    }

    Ok(table)
}

/// Writes a table as delimited text. Absent cells are written empty.
pub fn write_table(path: &Path, table: &Table, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

fn read_as_utf8(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(error) => {
            warn!(path = %path.display(), "input is not UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(error.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}
