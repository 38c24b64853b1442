//! The three loading strategies under comparison.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::backends::{LoadOptions, LoadSource, OrderStore};
use crate::error::{Error, Result};
use crate::fixtures::{Order, ORDER_COLUMNS};
use crate::serializer::{serialize, to_csv_bytes, CsvDestination};

/// How a batch reaches the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Serialize to a CSV file, then bulk load the file.
    CsvFile,
    /// Serialize to memory, then stream the buffer to the bulk loader.
    Stream,
    /// One prepared INSERT per row.
    RowInsert,
}

impl Strategy {
    /// Every strategy, in report order.
    pub const ALL: [Strategy; 3] = [Strategy::CsvFile, Strategy::Stream, Strategy::RowInsert];

    /// Stable name used in reports and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::CsvFile => "csv_file",
            Strategy::Stream => "stream",
            Strategy::RowInsert => "row_insert",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown strategy {:?} (expected csv_file, stream or row_insert)",
                    s
                ))
            })
    }
}

/// Where a strategy writes and what it loads into.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub table: &'a str,
    pub csv_path: &'a Path,
    pub options: &'a LoadOptions,
}

/// Push `orders` into `store` using `strategy`, returning the number of rows written.
///
/// An empty batch only opens and releases a connection.
pub fn run_strategy(
    strategy: Strategy,
    store: &dyn OrderStore,
    orders: &[Order],
    ctx: &StrategyContext<'_>,
) -> Result<u64> {
    if orders.is_empty() {
        store.ping()?;
        return Ok(0);
    }

    match strategy {
        Strategy::CsvFile => {
            serialize(orders, CsvDestination::File(ctx.csv_path))?;
            store.bulk_load(
                LoadSource::File(ctx.csv_path.to_path_buf()),
                ctx.table,
                &ORDER_COLUMNS,
                ctx.options,
            )
        }
        Strategy::Stream => store.bulk_load(
            LoadSource::Stream(to_csv_bytes(orders)?),
            ctx.table,
            &ORDER_COLUMNS,
            ctx.options,
        ),
        Strategy::RowInsert => store.insert_rows(orders, ctx.table),
    }
}
