// src/storage/mod.rs
//! Flat-file boundaries between the stages: the raw table written by the
//! scraper and the cleaned table written by the preprocessor.
pub mod clean;
pub mod raw;

use crate::models::HEADER;
use crate::utils::error::StorageError;
use csv::StringRecord;
use std::fs;
use std::path::Path;

pub use clean::{read_clean_table, write_clean_table};
pub use raw::{read_raw_table, write_raw_table};

/// Creates the parent directory of `path` if it doesn't exist.
fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Opens a CSV file for writing (truncating it) and writes the fixed header.
fn create_table_writer(path: &Path) -> Result<csv::Writer<fs::File>, StorageError> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;
    Ok(writer)
}

/// Positions of the four expected columns, looked up by name.
fn column_indices(headers: &StringRecord, path: &Path) -> Result<[usize; 4], StorageError> {
    let mut indices = [0usize; 4];
    for (slot, column) in indices.iter_mut().zip(HEADER) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| StorageError::MissingColumn {
                column: column.to_string(),
                path: path.display().to_string(),
            })?;
    }
    Ok(indices)
}

/// Reads every row of a headed CSV file as the four expected columns.
/// Returns each row's fields alongside its line number.
fn read_table_rows(path: &Path) -> Result<Vec<(u64, [String; 4])>, StorageError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let indices = column_indices(reader.headers()?, path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let fields = indices.map(|i| record.get(i).unwrap_or_default().to_string());
        rows.push((line, fields));
    }
    Ok(rows)
}
