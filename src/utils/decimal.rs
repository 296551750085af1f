//! Decimal arithmetic utilities for financial calculations.

use rust_decimal::Decimal;

/// Safe division that returns zero if divisor is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Simple moving average over the `window` values ending just before
/// `end` (exclusive). `None` if the slice does not cover the window.
pub fn sma(values: &[Decimal], end: usize, window: usize) -> Option<Decimal> {
    if window == 0 || end > values.len() || end < window {
        return None;
    }
    let slice = &values[end - window..end];
    let sum: Decimal = slice.iter().copied().sum();
    Some(sum / Decimal::from(window))
}
