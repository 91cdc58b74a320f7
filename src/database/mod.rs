// src/database/mod.rs
use crate::models::{CleanRecord, CleanTable};
use crate::storage::read_clean_table;
use crate::utils::error::DatabaseError;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;

static TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Failed to compile TABLE_NAME_RE")
});

fn checked_table_name(table: &str) -> Result<&str, DatabaseError> {
    if TABLE_NAME_RE.is_match(table) {
        Ok(table)
    } else {
        Err(DatabaseError::InvalidTableName(table.to_string()))
    }
}

/// File-backed SQLite store holding cleaned product tables.
pub struct ProductStore {
    conn: Connection,
}

impl ProductStore {
    /// Opens the store at `path`, creating the file and its directory if needed.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!("Opened store {}", path.display());
        Ok(Self { conn })
    }

    #[cfg(test)]
    fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    /// Replaces the whole content of `table` with `rows`: the table is dropped,
    /// recreated and filled in one transaction, so a failure leaves the
    /// previous table in place.
    pub fn replace_table(&mut self, table: &str, rows: &[CleanRecord]) -> Result<usize, DatabaseError> {
        let table = checked_table_name(table)?;
        let tx = self.conn.transaction()?;

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{table}\";
             CREATE TABLE \"{table}\" (
                 Name    TEXT,
                 Price   REAL,
                 Rating  REAL,
                 Reviews INTEGER
             );"
        ))?;

        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO \"{table}\" (Name, Price, Rating, Reviews) VALUES (?1, ?2, ?3, ?4)"
            ))?;
            for row in rows {
                insert.execute(params![row.name, row.price, row.rating, row.reviews])?;
            }
        }

        tx.commit()?;
        tracing::debug!("Replaced table {} with {} rows", table, rows.len());
        Ok(rows.len())
    }

    pub fn count_rows(&self, table: &str) -> Result<usize, DatabaseError> {
        let table = checked_table_name(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Reads `table` back in insertion order.
    pub fn load_products(&self, table: &str) -> Result<CleanTable, DatabaseError> {
        let table = checked_table_name(table)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT Name, Price, Rating, Reviews FROM \"{table}\" ORDER BY rowid"
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CleanRecord {
                    name: row.get(0)?,
                    price: row.get(1)?,
                    rating: row.get(2)?,
                    reviews: row.get(3)?,
                })
            })?
            .collect::<Result<CleanTable, _>>()?;
        Ok(rows)
    }

    pub fn close(self) -> Result<(), DatabaseError> {
        self.conn.close().map_err(|(_, e)| DatabaseError::Sqlite(e))
    }
}

/// Loads the cleaned file and full-replaces `table` in the store at `db_path`.
/// Returns the number of rows now in the table.
pub fn store_in_database(input: &Path, db_path: &Path, table: &str) -> Result<usize, DatabaseError> {
    tracing::info!("Storing {} in SQLite database {}", input.display(), db_path.display());

    // Validate before touching the store file.
    checked_table_name(table)?;
    let rows = read_clean_table(input)?;

    let mut store = ProductStore::open(db_path)?;
    store.replace_table(table, &rows)?;
    let stored = store.count_rows(table)?;
    store.close()?;

    tracing::info!("Data stored successfully in {} ({} rows in '{}')", db_path.display(), stored, table);
    Ok(stored)
}
