// src/utils/error.rs
use thiserror::Error;

// One error type per pipeline concern, folded into AppError at the top.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status} for {url}")]
    Http { status: reqwest::StatusCode, url: String },

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("No page loaded; navigate first")]
    NoPage,

    #[error("Session already closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),

    #[error("Page session failed: {0}")]
    Session(#[from] SessionError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing expected column '{column}' in {path}")]
    MissingColumn { column: String, path: String },

    #[error("Invalid {column} value '{value}' on line {line}")]
    InvalidValue { column: &'static str, value: String, line: u64 },
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid table name '{0}'")]
    InvalidTableName(String),

    #[error("Could not read cleaned data: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Report serialization failed: {0}")]
    Report(#[from] serde_json::Error),
}
