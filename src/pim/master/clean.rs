//! Silver pass: light text normalization of free-text product columns.

use tracing::info;

use crate::pim::master::model::Table;

/// Columns cleaned when the caller does not name any.
pub const DEFAULT_TEXT_COLUMNS: [&str; 3] = ["name", "description_a", "description_b"];

/// Trims, collapses whitespace runs to a single space, then deletes every
/// character other than ASCII letters, digits, `.,!?` and whitespace.
///
/// Deletion runs after the collapse, so `"a & b"` becomes `"a  b"`.
pub fn clean_text(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .chars()
        .filter(|ch| keep_char(*ch))
        .collect()
}

fn keep_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | ',' | '!' | '?') || ch.is_whitespace()
}

/// Returns a copy of `table` in which every listed column exists and holds
/// cleaned text. Missing columns are added; absent values become empty text.
pub fn silver_transform<S: AsRef<str>>(table: &Table, columns: &[S]) -> Table {
    let mut cleaned = table.clone();
    for column in columns {
        let index = cleaned.ensure_column(column.as_ref(), None);
        for row in 0..cleaned.row_count() {
            let value = clean_text(cleaned.cell(row, index));
            cleaned.set_cell(row, index, Some(value));
        }
    }
    info!(
        rows = cleaned.row_count(),
        columns = columns.len(),
        "cleaned text columns"
    );
    cleaned
}
