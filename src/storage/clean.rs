// src/storage/clean.rs
use super::{create_table_writer, read_table_rows};
use crate::models::{CleanRecord, CleanTable};
use crate::utils::error::StorageError;
use std::path::Path;

/// Decimal text that parses back to exactly `value`; integral values keep a
/// trailing ".0" so the column reads as decimal.
pub fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Writes the cleaned table, replacing any existing file. Missing values are
/// written as empty fields.
pub fn write_clean_table(path: &Path, rows: &[CleanRecord]) -> Result<(), StorageError> {
    let mut writer = create_table_writer(path)?;
    for row in rows {
        writer.write_record([
            row.name.clone(),
            row.price.map(format_decimal).unwrap_or_default(),
            row.rating.map(format_decimal).unwrap_or_default(),
            row.reviews.map(|r| r.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;

    tracing::info!("Cleaned data saved to {} ({} rows)", path.display(), rows.len());
    Ok(())
}

fn parse_optional<T: std::str::FromStr>(
    column: &'static str,
    value: &str,
    line: u64,
) -> Result<Option<T>, StorageError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value.parse::<T>().map(Some).map_err(|_| StorageError::InvalidValue {
        column,
        value: value.to_string(),
        line,
    })
}

/// Reads a cleaned table back into typed rows. Anything other than a number
/// or an empty field in a numeric column is an error.
pub fn read_clean_table(path: &Path) -> Result<CleanTable, StorageError> {
    let mut rows = CleanTable::new();
    for (line, [name, price, rating, reviews]) in read_table_rows(path)? {
        rows.push(CleanRecord {
            name,
            price: parse_optional::<f64>("Price", &price, line)?.filter(|v| v.is_finite()),
            rating: parse_optional::<f64>("Rating", &rating, line)?.filter(|v| v.is_finite()),
            reviews: parse_optional::<i64>("Reviews", &reviews, line)?,
        });
    }

    tracing::debug!("Read {} cleaned rows from {}", rows.len(), path.display());
    Ok(rows)
}
