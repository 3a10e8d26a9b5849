//! Canonical join-key derivation.
//!
//! Normalization is a pure function of the raw cell text. Junk input never
//! raises: it degrades to an absent key and simply never matches.

use serde::{Deserialize, Serialize};

use crate::pim::master::model::{CanonicalKey, Table};

/// Flavour of canonicalization applied to a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Barcodes and other numeric codes: digits only, leading zeros stripped.
    NumericCode,
    /// Item codes and SKUs: trimmed and upper-cased.
    Alphanumeric,
}

impl KeyKind {
    pub fn normalize(self, raw: Option<&str>) -> Option<CanonicalKey> {
        match self {
            KeyKind::NumericCode => normalize_numeric_code(raw),
            KeyKind::Alphanumeric => normalize_alphanumeric(raw),
        }
    }
}

/// Keeps ASCII digits only and strips every leading zero.
///
/// Known quirk: a code made only of zeros (`"0000000"`, `"0"`) normalizes to
/// absent rather than to a literal `"0"` key, so such rows never match.
pub fn normalize_numeric_code(raw: Option<&str>) -> Option<CanonicalKey> {
    let digits: String = raw?.chars().filter(char::is_ascii_digit).collect();
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        None
    } else {
        Some(CanonicalKey::new(stripped))
    }
}

/// Trims surrounding whitespace and upper-cases; empty results are absent.
pub fn normalize_alphanumeric(raw: Option<&str>) -> Option<CanonicalKey> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(CanonicalKey::new(trimmed.to_uppercase()))
    }
}

/// Describes how a table derives one join key: a primary column followed by
/// fallback columns consulted, in order, while the key is still absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    pub kind: KeyKind,
    pub columns: Vec<String>,
}

impl KeySpec {
    pub fn new<I, S>(kind: KeyKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn numeric<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(KeyKind::NumericCode, columns)
    }

    pub fn alphanumeric<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(KeyKind::Alphanumeric, columns)
    }

    /// Derives the key for one row of `table`.
    pub fn derive(&self, table: &Table, row: usize) -> Option<CanonicalKey> {
        self.columns
            .iter()
            .find_map(|column| self.kind.normalize(table.get(row, column)))
    }

    /// Derives the key for every row of `table`, in row order.
    ///
    /// Columns missing from the header are skipped, so a table lacking all of
    /// them yields an absent key for every row.
    pub fn derive_all(&self, table: &Table) -> Vec<Option<CanonicalKey>> {
        let indices: Vec<usize> = self
            .columns
            .iter()
            .filter_map(|column| table.column_index(column))
            .collect();

        (0..table.row_count())
            .map(|row| {
                indices
                    .iter()
                    .find_map(|index| self.kind.normalize(table.cell(row, *index)))
            })
            .collect()
    }
}
