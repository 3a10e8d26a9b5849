use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, PimError>;

/// Error type covering the failure cases around loading sources, reading the
/// join plan, calling the enrichment service, and writing the master table.
///
/// The reconciliation core itself never fails on data: malformed keys,
/// missing columns and duplicates all degrade to absent values.
#[derive(Debug, Error)]
pub enum PimError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a YAML configuration file cannot be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Errors bubbled up from the delimited text reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Transport failures while talking to the text-generation service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when a table does not follow the expected shape.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// Raised when the join plan or enrichment settings are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when a join stage references a source table that was not supplied.
    #[error("join stage '{stage}' references unknown source '{source_name}'")]
    UnknownSource { stage: String, source_name: String },

    /// Raised when a file extension maps to no supported table format.
    #[error("unsupported table format for {0}")]
    UnsupportedFormat(PathBuf),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the text-generation service answers with an error status.
    #[error("enrichment failed: {0}")]
    Enrichment(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
