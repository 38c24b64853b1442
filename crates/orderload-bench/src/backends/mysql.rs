//! MySQL backend.
//!
//! Drives `mysql_async` from synchronous benchmark code through a
//! current-thread runtime. Bulk loads go through `LOAD DATA LOCAL INFILE`:
//! file sources are served by a whitelisting handler for exactly that path,
//! stream sources by a per-connection handler yielding the buffer.

use std::path::Path;

use bytes::Bytes;
use chrono::{Datelike, Timelike};
use futures::stream::{self, StreamExt};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder, Params, TxOpts, Value, WhiteListFsHandler};
use tokio::runtime::Runtime;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::fixtures::Order;

use super::{
    check_identifier, column_list, insert_statement, BulkLoader, LoadOptions, LoadSource,
    OrderStore, RowInserter,
};

/// File name sent for stream loads. The per-connection handler ignores it.
const STREAM_FILE_NAME: &str = "orderload-stream";

/// Size of the chunks a stream payload is handed to the driver in.
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Server error codes for load data that does not fit the target columns.
const FORMAT_ERROR_CODES: [u16; 8] = [
    1261, // too few fields
    1262, // too many fields
    1264, // out of range
    1265, // data truncated
    1292, // incorrect datetime
    1366, // incorrect value for column
    1406, // data too long
    3819, // check constraint violated
];

/// MySQL backend for benchmarks.
pub struct MySqlStore {
    config: StoreConfig,
    rt: Runtime,
}

impl MySqlStore {
    /// Create a backend for `config`. No connection is opened until first use.
    pub fn new(config: StoreConfig) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { config, rt })
    }

    /// The connection settings.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn opts(&self, infile_path: Option<&Path>) -> Opts {
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(self.config.host.clone())
            .tcp_port(self.config.port)
            .db_name(Some(self.config.database.clone()))
            .user(Some(self.config.user.clone()))
            .pass(self.config.password.clone());

        if let Some(path) = infile_path {
            builder = builder.local_infile_handler(Some(WhiteListFsHandler::new([path])));
        }

        builder.into()
    }

    async fn connect(&self, infile_path: Option<&Path>) -> Result<Conn> {
        tracing::debug!(
            host = %self.config.host,
            port = self.config.port,
            database = %self.config.database,
            "opening connection"
        );
        Conn::new(self.opts(infile_path))
            .await
            .map_err(|e| Error::Connectivity(e.to_string()))
    }

    /// Run a statement that returns nothing on a fresh connection.
    fn execute(&self, sql: String) -> Result<()> {
        self.rt.block_on(async {
            let mut conn = self.connect(None).await?;
            let result = conn
                .query_drop(sql.as_str())
                .await
                .map_err(statement_error);
            release(conn).await;
            result
        })
    }
}

impl BulkLoader for MySqlStore {
    fn bulk_load(
        &self,
        source: LoadSource,
        table: &str,
        columns: &[&str],
        options: &LoadOptions,
    ) -> Result<u64> {
        if !self.config.allow_local_infile {
            return Err(Error::Config(
                "local infile is disabled for this store".to_string(),
            ));
        }

        let (file_name, infile_path) = match &source {
            LoadSource::File(path) => {
                // Surface a missing artifact as an IO error rather than a driver error.
                std::fs::metadata(path)?;
                (path.to_string_lossy().into_owned(), Some(path.as_path()))
            }
            LoadSource::Stream(_) => (STREAM_FILE_NAME.to_string(), None),
        };
        let sql = load_data_statement(&file_name, table, columns, options)?;

        self.rt.block_on(async {
            let mut conn = self.connect(infile_path).await?;
            if let LoadSource::Stream(payload) = &source {
                conn.set_infile_handler(stream_handler(payload.clone()));
            }

            let result = match conn.query_drop(sql.as_str()).await {
                Ok(()) => Ok(conn.affected_rows()),
                Err(e) => Err(load_error(e)),
            };
            release(conn).await;

            if let Ok(rows) = &result {
                tracing::debug!(table, source = source.kind(), rows, "bulk load complete");
            }
            result
        })
    }
}

impl RowInserter for MySqlStore {
    fn insert_rows(&self, orders: &[Order], table: &str) -> Result<u64> {
        let placeholders: Vec<String> = (0..4).map(|_| "?".to_string()).collect();
        let sql = insert_statement(table, &placeholders)?;

        self.rt.block_on(async {
            let mut conn = self.connect(None).await?;
            let result = insert_all(&mut conn, &sql, orders).await;
            release(conn).await;
            result
        })
    }
}

impl OrderStore for MySqlStore {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn ping(&self) -> Result<()> {
        self.rt.block_on(async {
            let mut conn = self.connect(None).await?;
            let result = conn
                .ping()
                .await
                .map_err(|e| Error::Connectivity(e.to_string()));
            release(conn).await;
            result
        })
    }

    fn create_table(&self, table: &str) -> Result<()> {
        self.execute(format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                order_date DATETIME NOT NULL,
                product_id INT NOT NULL,
                order_type TINYINT NOT NULL,
                amount DECIMAL(12, 2) NOT NULL,
                CHECK (order_type BETWEEN 1 AND 10)
            )
            "#,
            check_identifier(table)?
        ))
    }

    fn truncate(&self, table: &str) -> Result<()> {
        self.execute(format!("TRUNCATE TABLE {}", check_identifier(table)?))
    }

    fn row_count(&self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", check_identifier(table)?);
        self.rt.block_on(async {
            let mut conn = self.connect(None).await?;
            let result = conn
                .query_first::<u64, _>(sql.as_str())
                .await
                .map(|count| count.unwrap_or(0))
                .map_err(statement_error);
            release(conn).await;
            result
        })
    }
}

/// Insert every order through one prepared statement inside one transaction.
async fn insert_all(conn: &mut Conn, sql: &str, orders: &[Order]) -> Result<u64> {
    let mut tx = conn
        .start_transaction(TxOpts::default())
        .await
        .map_err(statement_error)?;
    let stmt = tx.prep(sql).await.map_err(statement_error)?;

    let mut inserted = 0u64;
    for (index, order) in orders.iter().enumerate() {
        tx.exec_drop(&stmt, order_params(order))
            .await
            .map_err(|e| Error::Execution(format!("row {}: {}", index, e)))?;
        inserted += 1;
    }

    tx.commit().await.map_err(statement_error)?;
    Ok(inserted)
}

fn order_params(order: &Order) -> Params {
    let date = order.order_date;
    Params::Positional(vec![
        Value::Date(
            date.year() as u16,
            date.month() as u8,
            date.day() as u8,
            date.hour() as u8,
            date.minute() as u8,
            date.second() as u8,
            0,
        ),
        Value::Int(order.product_id.into()),
        Value::Int(order.order_type.into()),
        Value::Bytes(order.amount.to_string().into_bytes()),
    ])
}

/// Close a connection, logging instead of failing the operation it served.
async fn release(conn: Conn) {
    if let Err(e) = conn.disconnect().await {
        tracing::warn!(error = %e, "failed to close connection");
    }
}

fn stream_handler(
    payload: Bytes,
) -> impl std::future::Future<Output = mysql_async::Result<mysql_async::InfileData>>
       + Send
       + Sync
       + 'static {
    async move {
        let chunks: Vec<std::io::Result<Bytes>> = (0..payload.len())
            .step_by(STREAM_CHUNK_SIZE)
            .map(|start| {
                let end = (start + STREAM_CHUNK_SIZE).min(payload.len());
                Ok(payload.slice(start..end))
            })
            .collect();
        Ok(stream::iter(chunks).boxed())
    }
}

/// Render the `LOAD DATA LOCAL INFILE` statement.
pub(crate) fn load_data_statement(
    file_name: &str,
    table: &str,
    columns: &[&str],
    options: &LoadOptions,
) -> Result<String> {
    let mut sql = format!(
        "LOAD DATA LOCAL INFILE {} INTO TABLE {} FIELDS TERMINATED BY {}",
        sql_literal(file_name),
        check_identifier(table)?,
        sql_literal(&options.field_terminator)
    );
    if options.field_quotation_optional {
        sql.push_str(" OPTIONALLY ENCLOSED BY '\"'");
    }
    sql.push_str(&format!(
        " LINES TERMINATED BY {}",
        sql_literal(&options.line_terminator)
    ));
    if options.ignore_lines > 0 {
        sql.push_str(&format!(" IGNORE {} LINES", options.ignore_lines));
    }
    sql.push_str(&format!(" ({})", column_list(columns)?));
    Ok(sql)
}

/// Quote a string as a MySQL string literal.
fn sql_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn load_error(err: mysql_async::Error) -> Error {
    match &err {
        mysql_async::Error::Server(server) if FORMAT_ERROR_CODES.contains(&server.code) => {
            Error::Format(err.to_string())
        }
        _ => statement_error(err),
    }
}

fn statement_error(err: mysql_async::Error) -> Error {
    match err {
        mysql_async::Error::Io(e) => Error::Connectivity(e.to_string()),
        other => Error::Execution(other.to_string()),
    }
}
