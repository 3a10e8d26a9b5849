use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::pim::master::error::{PimError, Result};
use crate::pim::master::model::Table;

/// Worksheet name used for tables written to Excel.
pub const MASTER_SHEET: &str = "Master";

/// Largest row count a worksheet can hold, header included.
const MAX_SHEET_ROWS: usize = 1_048_576;

/// Writes the table to a single worksheet with an autofilter table.
/// Absent cells are left blank.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    if table.row_count() + 1 > MAX_SHEET_ROWS {
        return Err(PimError::InvalidTable(format!(
            "{} rows do not fit in one worksheet",
            table.row_count()
        )));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(MASTER_SHEET)?;

    for (col_idx, header) in table.columns().iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if let Some(value) = cell {
                worksheet.write_string((row_idx + 1) as u32, col_idx as u16, value)?;
            }
        }
    }

    if table.column_count() > 0 && !table.is_empty() {
        let mut excel_table = rust_xlsxwriter::Table::new();
        excel_table.set_autofilter(true);
        let col_end = (table.column_count() as u16).saturating_sub(1);
        worksheet.add_table(0, 0, table.row_count() as u32, col_end, &excel_table)?;
    }

    workbook.save(path)?;
    Ok(())
}
