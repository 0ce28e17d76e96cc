//! Pricing

use crate::{cart::CartLine, prices::Price};

/// Calculates the total price of a list of lines.
///
/// Arithmetic saturates instead of overflowing, so the result is always defined.
pub fn lines_total(lines: &[CartLine]) -> Price {
    lines.iter().map(CartLine::line_total).sum()
}

/// Total number of units across a list of lines.
pub fn item_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.qty)).sum()
}
