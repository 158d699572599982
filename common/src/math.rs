//! Tolerance-based float comparisons
//!
//! Prices arrive as floating point; all ordering decisions in the book and
//! the matcher go through these instead of exact comparison.

/// Absolute comparison tolerance.
pub const EPSILON: f64 = 5e-9;

/// `a` equals `b` within tolerance.
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// `a` is strictly greater than `b` beyond tolerance.
#[must_use]
pub fn approx_gt(a: f64, b: f64) -> bool {
    a - b > EPSILON
}

/// `a` is strictly lower than `b` beyond tolerance.
#[must_use]
pub fn approx_lt(a: f64, b: f64) -> bool {
    b - a > EPSILON
}

/// `a` is greater than or equal to `b` within tolerance.
#[must_use]
pub fn approx_ge(a: f64, b: f64) -> bool {
    approx_gt(a, b) || approx_eq(a, b)
}

/// `a` is lower than or equal to `b` within tolerance.
#[must_use]
pub fn approx_le(a: f64, b: f64) -> bool {
    approx_lt(a, b) || approx_eq(a, b)
}
