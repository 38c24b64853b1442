//! CSV rendering of order batches.
//!
//! The format is fixed: one header line naming [`ORDER_COLUMNS`], then one
//! line per order with comma-separated fields and `\n` terminators. No field
//! can contain the delimiter, so nothing is quoted.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use bytes::Bytes;
use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::fixtures::{Amount, Order, OrderFields, ORDER_COLUMNS};

/// Date format understood by MySQL `DATETIME` columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rough upper bound of one rendered line, used to presize buffers.
const LINE_CAPACITY: usize = 48;

/// Where a serialized batch goes.
pub enum CsvDestination<'a> {
    /// A file, created or truncated.
    File(&'a Path),
    /// An in-memory buffer, appended to.
    Buffer(&'a mut Vec<u8>),
}

/// Serialize `orders` to `destination`.
pub fn serialize(orders: &[Order], destination: CsvDestination<'_>) -> Result<()> {
    match destination {
        CsvDestination::File(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_orders(orders, &mut writer)?;
            writer.flush()?;
        }
        CsvDestination::Buffer(buffer) => {
            buffer.reserve(LINE_CAPACITY * (orders.len() + 1));
            write_orders(orders, buffer)?;
        }
    }
    Ok(())
}

/// Write the header and one line per order to `writer`.
pub fn write_orders<W: Write>(orders: &[Order], mut writer: W) -> Result<()> {
    writeln!(writer, "{}", ORDER_COLUMNS.join(","))?;
    for order in orders {
        writeln!(
            writer,
            "{},{},{},{}",
            order.order_date.format(DATE_FORMAT),
            order.product_id,
            order.order_type,
            order.amount
        )?;
    }
    Ok(())
}

/// Serialize `orders` into a freshly allocated buffer.
pub fn to_csv_bytes(orders: &[Order]) -> Result<Bytes> {
    let mut buffer = Vec::new();
    serialize(orders, CsvDestination::Buffer(&mut buffer))?;
    Ok(Bytes::from(buffer))
}

/// Parse a serialized batch back into its loaded fields.
pub fn parse_orders<R: BufRead>(reader: R) -> Result<Vec<OrderFields>> {
    let mut lines = reader.lines();

    let expected_header = ORDER_COLUMNS.join(",");
    match lines.next().transpose()? {
        Some(header) if header == expected_header => {}
        Some(header) => {
            return Err(Error::Format(format!(
                "unexpected header {:?}, expected {:?}",
                header, expected_header
            )))
        }
        None => return Err(Error::Format("missing header line".to_string())),
    }

    let mut orders = Vec::new();
    for (index, line) in lines.enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        // Header is line 1.
        orders.push(parse_line(&line, index + 2)?);
    }
    Ok(orders)
}

/// Whether `value` is a well-formed rendering for `column`.
///
/// Columns outside [`ORDER_COLUMNS`] accept any value.
pub(crate) fn is_valid_field(column: &str, value: &str) -> bool {
    match column {
        "order_date" => NaiveDateTime::parse_from_str(value, DATE_FORMAT).is_ok(),
        "product_id" => value.parse::<i32>().is_ok(),
        "order_type" => value.parse::<i8>().is_ok(),
        "amount" => value.parse::<Amount>().is_ok(),
        _ => true,
    }
}

fn parse_line(line: &str, line_number: usize) -> Result<OrderFields> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != ORDER_COLUMNS.len() {
        return Err(Error::Format(format!(
            "line {}: expected {} fields, found {}",
            line_number,
            ORDER_COLUMNS.len(),
            fields.len()
        )));
    }

    let bad = |column: usize| {
        Error::Format(format!(
            "line {}: invalid {} value {:?}",
            line_number, ORDER_COLUMNS[column], fields[column]
        ))
    };

    Ok(OrderFields {
        order_date: NaiveDateTime::parse_from_str(fields[0], DATE_FORMAT)
            .map_err(|_| bad(0))?,
        product_id: fields[1].parse().map_err(|_| bad(1))?,
        order_type: fields[2].parse().map_err(|_| bad(2))?,
        amount: fields[3].parse().map_err(|_| bad(3))?,
    })
}
