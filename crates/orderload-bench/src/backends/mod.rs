//! Store backends for the loading strategies.
//!
//! Every backend exposes the same two entry points, a bulk loader accepting
//! either a file path or a byte stream, and a row inserter driving one
//! prepared statement. Connections are opened per call and released on every
//! exit path.

pub mod mysql;
pub mod sqlite;

use std::path::PathBuf;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::fixtures::Order;

pub use mysql::MySqlStore;
pub use sqlite::SqliteStore;

/// Input of a bulk load.
#[derive(Debug, Clone)]
pub enum LoadSource {
    /// A file on local disk.
    File(PathBuf),
    /// An in-memory payload.
    Stream(Bytes),
}

impl LoadSource {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadSource::File(_) => "file",
            LoadSource::Stream(_) => "stream",
        }
    }
}

/// Delimiters and header handling for a bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub field_terminator: String,
    pub line_terminator: String,
    /// Leading lines to skip (the CSV header).
    pub ignore_lines: usize,
    /// Fields may be wrapped in double quotes.
    pub field_quotation_optional: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            field_terminator: ",".to_string(),
            line_terminator: "\n".to_string(),
            ignore_lines: 1,
            field_quotation_optional: true,
        }
    }
}

/// Bulk import through the store's native facility.
pub trait BulkLoader {
    /// Append the rows in `source` to `table`, returning the number of rows loaded.
    fn bulk_load(
        &self,
        source: LoadSource,
        table: &str,
        columns: &[&str],
        options: &LoadOptions,
    ) -> Result<u64>;
}

/// Row-by-row parameterized inserts.
pub trait RowInserter {
    /// Insert every order into `table`, returning the number of rows inserted.
    ///
    /// Aborts on the first failing row; no rows of the batch remain visible.
    fn insert_rows(&self, orders: &[Order], table: &str) -> Result<u64>;
}

/// A store the harness can benchmark against.
pub trait OrderStore: BulkLoader + RowInserter {
    /// Backend name for reports.
    fn name(&self) -> &'static str;

    /// Open and release a connection.
    fn ping(&self) -> Result<()>;

    /// Create the orders table if it does not exist.
    fn create_table(&self, table: &str) -> Result<()>;

    /// Remove every row from `table`.
    fn truncate(&self, table: &str) -> Result<()>;

    /// Count the rows in `table`.
    fn row_count(&self, table: &str) -> Result<u64>;
}

/// Insert statement shared by the row inserters.
pub(crate) fn insert_statement(table: &str, placeholders: &[String]) -> Result<String> {
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        check_identifier(table)?,
        crate::fixtures::ORDER_COLUMNS.join(", "),
        placeholders.join(", ")
    ))
}

/// Reject identifiers that would need quoting.
///
/// Table and column names are interpolated into SQL text.
pub(crate) fn check_identifier(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(name)
    } else {
        Err(Error::Config(format!("invalid identifier: {:?}", name)))
    }
}

/// Validate and join a column list.
pub(crate) fn column_list(columns: &[&str]) -> Result<String> {
    if columns.is_empty() {
        return Err(Error::Config("column list is empty".to_string()));
    }
    let checked = columns
        .iter()
        .map(|c| check_identifier(c))
        .collect::<Result<Vec<_>>>()?;
    Ok(checked.join(", "))
}
