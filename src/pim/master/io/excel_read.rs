use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::pim::master::error::{PimError, Result};
use crate::pim::master::io::normalize_headers;
use crate::pim::master::model::{Cell, Table};

/// Reads the first worksheet of an Excel workbook. The first row is the
/// header; every cell is converted to text.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PimError::InvalidTable(format!("{} has no worksheets", path.display())))?
        .map_err(PimError::from)?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => normalize_headers(header.iter().map(|cell| cell_to_string(Some(cell)))),
        None => Vec::new(),
    };
    let width = headers.len();
    let mut table = Table::new(headers);

    for row in rows {
        let cells: Vec<Cell> = row
            .iter()
            .take(width)
            .map(|cell| {
                let value = cell_to_string(Some(cell));
                (!value.is_empty()).then_some(value)
            })
            .collect();
        table.push_row(cells);
    }

    Ok(table)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
