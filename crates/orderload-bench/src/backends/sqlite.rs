//! SQLite backend.
//!
//! SQLite has no bulk loader, so `bulk_load` splits the payload with the
//! requested terminators and feeds every row through one prepared insert in
//! a single transaction. Every field is checked against its column before
//! anything is written, and the table is `STRICT`. It keeps the benchmark and
//! the tests runnable without a MySQL server.

use std::path::{Path, PathBuf};

use rusqlite::{params, params_from_iter, Connection};

use crate::error::{Error, Result};
use crate::fixtures::Order;
use crate::serializer::{is_valid_field, DATE_FORMAT};

use super::{
    check_identifier, column_list, insert_statement, BulkLoader, LoadOptions, LoadSource,
    OrderStore, RowInserter,
};

/// SQLite backend for benchmarks.
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Use the database file at `path`, created on first connection.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.path).map_err(|e| Error::Connectivity(e.to_string()))
    }
}

impl BulkLoader for SqliteStore {
    fn bulk_load(
        &self,
        source: LoadSource,
        table: &str,
        columns: &[&str],
        options: &LoadOptions,
    ) -> Result<u64> {
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            check_identifier(table)?,
            column_list(columns)?,
            placeholders.join(", ")
        );

        let payload = match source {
            LoadSource::File(path) => std::fs::read(path)?,
            LoadSource::Stream(bytes) => bytes.to_vec(),
        };
        let text = std::str::from_utf8(&payload)
            .map_err(|e| Error::Format(format!("payload is not UTF-8: {}", e)))?;
        let rows = split_rows(text, columns, options)?;

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut loaded = 0u64;
        {
            let mut stmt = tx.prepare(&sql)?;
            for (line, fields) in &rows {
                stmt.execute(params_from_iter(fields.iter()))
                    .map_err(|e| Error::Format(format!("line {}: {}", line, e)))?;
                loaded += 1;
            }
        }
        tx.commit()?;

        tracing::debug!(table, rows = loaded, "bulk load complete");
        Ok(loaded)
    }
}

impl RowInserter for SqliteStore {
    fn insert_rows(&self, orders: &[Order], table: &str) -> Result<u64> {
        let placeholders: Vec<String> = (1..=4).map(|i| format!("?{}", i)).collect();
        let sql = insert_statement(table, &placeholders)?;

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut inserted = 0u64;
        {
            let mut stmt = tx.prepare(&sql)?;
            for (index, order) in orders.iter().enumerate() {
                stmt.execute(params![
                    order.order_date.format(DATE_FORMAT).to_string(),
                    order.product_id,
                    order.order_type,
                    order.amount.to_string(),
                ])
                .map_err(|e| Error::Execution(format!("row {}: {}", index, e)))?;
                inserted += 1;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }
}

impl OrderStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn ping(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| Error::Connectivity(e.to_string()))
    }

    fn create_table(&self, table: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_date TEXT NOT NULL,
                product_id INTEGER NOT NULL,
                order_type INTEGER NOT NULL CHECK (order_type BETWEEN 1 AND 10),
                amount REAL NOT NULL
            ) STRICT;
            "#,
            check_identifier(table)?
        ))?;
        Ok(())
    }

    fn truncate(&self, table: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(&format!("DELETE FROM {}", check_identifier(table)?), [])?;
        Ok(())
    }

    fn row_count(&self, table: &str) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", check_identifier(table)?),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// Split a delimited payload into rows of one field per column, keyed by
/// 1-based line number. Every field must be a valid rendering for its column.
fn split_rows<'a>(
    text: &'a str,
    columns: &[&str],
    options: &LoadOptions,
) -> Result<Vec<(usize, Vec<&'a str>)>> {
    let width = columns.len();
    if options.field_terminator.is_empty() || options.line_terminator.is_empty() {
        return Err(Error::Config("terminators must not be empty".to_string()));
    }

    let mut rows = Vec::new();
    for (index, line) in text
        .split(options.line_terminator.as_str())
        .enumerate()
        .skip(options.ignore_lines)
    {
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line
            .split(options.field_terminator.as_str())
            .map(|field| {
                if options.field_quotation_optional {
                    unquote(field)
                } else {
                    field
                }
            })
            .collect();

        if fields.len() != width {
            return Err(Error::Format(format!(
                "line {}: expected {} fields, found {}",
                index + 1,
                width,
                fields.len()
            )));
        }
        if let Some((column, value)) = columns
            .iter()
            .zip(&fields)
            .find(|(column, value)| !is_valid_field(column, value))
        {
            return Err(Error::Format(format!(
                "line {}: invalid {} value {:?}",
                index + 1,
                column,
                value
            )));
        }
        rows.push((index + 1, fields));
    }
    Ok(rows)
}

fn unquote(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}
