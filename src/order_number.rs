//! Human-readable, time-ordered order numbers.
//!
//! Format: `FH` + `yyyyMMddHHmmss` + 3-digit random suffix. Two orders
//! placed in the same second can collide on the suffix; the unique index on
//! `orders.order_no` rejects the duplicate and the caller regenerates.

use chrono::Utc;
use rand::Rng;

pub const ORDER_NO_PREFIX: &str = "FH";

/// Generates a fresh candidate order number. Not guaranteed unique; the
/// insert's unique constraint is the arbiter.
pub fn generate() -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(100..1000);
    format!("{ORDER_NO_PREFIX}{timestamp}{suffix}")
}
