//! Synthetic order generation.
//!
//! Orders are drawn from fixed distributions with a seeded RNG so that every
//! strategy loads the same batch for a given seed.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::{Error, Result};

/// Seed used by [`generate_orders`].
pub const DEFAULT_SEED: u64 = 20_210_101;

/// Columns loaded into the target table, in serialization order.
pub const ORDER_COLUMNS: [&str; 4] = ["order_date", "product_id", "order_type", "amount"];

/// Width of the order date window in days (three years).
pub const ORDER_DATE_WINDOW_DAYS: i64 = 365 * 3;

/// Inclusive product id range.
pub const PRODUCT_ID_RANGE: (i32, i32) = (1, 10_000);

/// Inclusive order type range.
pub const ORDER_TYPE_RANGE: (i8, i8) = (1, 10);

/// Exclusive upper bound of generated amounts, in hundredths.
pub const AMOUNT_LIMIT_HUNDREDTHS: i64 = 100_000 * 100;

/// First day of the order date window (2021-01-01 00:00:00).
pub fn order_date_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::default())
}

/// Fixed-point decimal amount with two fractional digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Amount(i64);

impl Amount {
    /// Create an amount from a count of hundredths (`12345` is `123.45`).
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Amount(hundredths)
    }

    /// The amount in hundredths.
    pub const fn hundredths(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Format(format!("invalid amount: {:?}", s));

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty()
            || fraction.len() > 2
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let hundredths = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(fraction))
            .ok_or_else(invalid)?;

        Ok(Amount(if negative { -hundredths } else { hundredths }))
    }
}

/// A synthetic order.
///
/// `id` is generated but never serialized or inserted; the target table
/// assigns its own key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub id: u64,
    pub order_date: NaiveDateTime,
    pub product_id: i32,
    pub order_type: i8,
    pub amount: Amount,
}

impl Order {
    /// The loaded columns of this order.
    pub fn fields(&self) -> OrderFields {
        OrderFields {
            order_date: self.order_date,
            product_id: self.product_id,
            order_type: self.order_type,
            amount: self.amount,
        }
    }
}

/// The columns of an order that reach the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderFields {
    pub order_date: NaiveDateTime,
    pub product_id: i32,
    pub order_type: i8,
    pub amount: Amount,
}

/// Seeded order generator.
///
/// Reusing one generator continues its random sequence; two generators with
/// the same seed produce identical batches.
pub struct OrderGenerator {
    rng: StdRng,
    start: NaiveDateTime,
}

impl OrderGenerator {
    /// Create a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            start: order_date_start(),
        }
    }

    /// Generate a single order.
    pub fn next_order(&mut self) -> Order {
        let days = self.rng.gen_range(0..=ORDER_DATE_WINDOW_DAYS);

        Order {
            id: self.rng.gen(),
            order_date: self.start + Duration::days(days),
            product_id: self.rng.gen_range(PRODUCT_ID_RANGE.0..=PRODUCT_ID_RANGE.1),
            order_type: self.rng.gen_range(ORDER_TYPE_RANGE.0..=ORDER_TYPE_RANGE.1),
            amount: Amount(self.rng.gen_range(0..AMOUNT_LIMIT_HUNDREDTHS)),
        }
    }

    /// Generate `count` orders.
    pub fn generate(&mut self, count: usize) -> Vec<Order> {
        (0..count).map(|_| self.next_order()).collect()
    }
}

impl Default for OrderGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

/// Generate `count` orders with the default seed.
pub fn generate_orders(count: usize) -> Vec<Order> {
    OrderGenerator::default().generate(count)
}
