use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type covering the different failure cases that can occur while
/// reading the workbook, diffing it against the element snapshot, or applying
/// mutations. Schema-scoped variants never abort the overall run; the runner
/// records them in the schema's summary and moves on.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a schema names a worksheet the workbook does not contain.
    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    /// Raised when a required key column is absent from the header row.
    #[error("sheet '{sheet}' is missing required column '{column}'")]
    MissingColumn { sheet: String, column: String },

    /// Raised on import when neither value column exists on the sheet.
    #[error("sheet '{sheet}' has no value columns to import")]
    NoValueColumns { sheet: String },

    /// Raised when the CLI selects a schema the catalog does not define.
    #[error("unknown schema '{0}'")]
    UnknownSchema(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
