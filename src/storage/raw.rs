// src/storage/raw.rs
use super::{create_table_writer, read_table_rows};
use crate::models::{RawRecord, RawTable};
use crate::utils::error::StorageError;
use std::path::Path;

/// Writes the raw table with the fixed `Name,Price,Rating,Reviews` header,
/// replacing any existing file.
pub fn write_raw_table(path: &Path, rows: &[RawRecord]) -> Result<(), StorageError> {
    let mut writer = create_table_writer(path)?;
    for row in rows {
        writer.write_record(row.fields())?;
    }
    writer.flush()?;

    tracing::info!("Saved {} raw rows to {}", rows.len(), path.display());
    Ok(())
}

/// Reads a raw table. Values are returned exactly as stored; columns are
/// matched by header name so extra columns are ignored.
pub fn read_raw_table(path: &Path) -> Result<RawTable, StorageError> {
    let rows: RawTable = read_table_rows(path)?
        .into_iter()
        .map(|(_, [name, price, rating, reviews])| RawRecord { name, price, rating, reviews })
        .collect();

    tracing::debug!("Read {} raw rows from {}", rows.len(), path.display());
    Ok(rows)
}
