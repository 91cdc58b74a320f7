// src/preprocess/mod.rs
use crate::models::{CleanRecord, CleanTable, RawRecord, UNKNOWN};
use crate::storage::{read_raw_table, write_clean_table};
use crate::utils::error::StorageError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

// First "<digit>.<digit>" in the text, e.g. "4.3" in "4.3 out of 5 stars".
static RATING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d\.\d").expect("Failed to compile RATING_RE")
});

/// Counts gathered while cleaning one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeSummary {
    pub rows_read: usize,
    pub rows_written: usize,
    pub duplicates_dropped: usize,
    pub missing_price: usize,
    pub missing_rating: usize,
    pub missing_reviews: usize,
}

/// Empty values become the "Unknown" sentinel before any coercion.
/// Whitespace-only text is a value, not an absence.
fn fill_missing(value: &str) -> &str {
    if value.is_empty() {
        UNKNOWN
    } else {
        value
    }
}

fn strip_thousands(value: &str) -> String {
    value.replace(',', "").trim().to_string()
}

/// "1,234" becomes 1234. Anything that isn't a finite number after removing
/// separators is missing.
pub fn parse_price(value: &str) -> Option<f64> {
    strip_thousands(fill_missing(value))
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// "4.3 out of 5 stars" becomes 4.3. Missing when no `<digit>.<digit>` appears.
pub fn parse_rating(value: &str) -> Option<f64> {
    RATING_RE
        .find(fill_missing(value))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// "2,048" becomes 2048. Integer-valued decimals ("500.0") are accepted.
pub fn parse_reviews(value: &str) -> Option<i64> {
    let cleaned = strip_thousands(fill_missing(value));
    if let Ok(count) = cleaned.parse::<i64>() {
        return Some(count);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}

pub fn normalize_record(raw: &RawRecord) -> CleanRecord {
    CleanRecord {
        name: fill_missing(&raw.name).to_string(),
        price: parse_price(&raw.price),
        rating: parse_rating(&raw.rating),
        reviews: parse_reviews(&raw.reviews),
    }
}

/// Coerces every row, then drops rows whose coerced values repeat an earlier
/// row. Kept rows stay in input order.
pub fn normalize_table(rows: &[RawRecord]) -> (CleanTable, NormalizeSummary) {
    let mut summary = NormalizeSummary { rows_read: rows.len(), ..Default::default() };
    let mut seen = HashSet::new();
    let mut cleaned = CleanTable::with_capacity(rows.len());

    for raw in rows {
        let record = normalize_record(raw);
        if !seen.insert(record.key()) {
            summary.duplicates_dropped += 1;
            continue;
        }
        summary.missing_price += record.price.is_none() as usize;
        summary.missing_rating += record.rating.is_none() as usize;
        summary.missing_reviews += record.reviews.is_none() as usize;
        cleaned.push(record);
    }

    summary.rows_written = cleaned.len();
    (cleaned, summary)
}

/// Reads the raw file, cleans it and writes the cleaned file, replacing any
/// existing one. Only structural problems (unreadable file, missing column)
/// fail the run; unparseable values become missing.
pub fn preprocess_file(input: &Path, output: &Path) -> Result<NormalizeSummary, StorageError> {
    tracing::info!("Starting data preprocessing of {}", input.display());

    let raw = read_raw_table(input)?;
    let (cleaned, summary) = normalize_table(&raw);
    write_clean_table(output, &cleaned)?;

    tracing::info!(
        "Preprocessed {} rows into {} ({} duplicates dropped; missing price/rating/reviews: {}/{}/{})",
        summary.rows_read,
        summary.rows_written,
        summary.duplicates_dropped,
        summary.missing_price,
        summary.missing_rating,
        summary.missing_reviews
    );
    Ok(summary)
}
