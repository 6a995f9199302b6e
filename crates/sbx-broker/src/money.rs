//! Monetary rounding.
//!
//! Every monetary amount in the engine (cash balances, fill prices, notionals,
//! fees) is rounded to 6 decimal places on write. Derived read-side values are
//! rounded again at the projection boundary. 1e-6 is the engine's monetary
//! granularity; nothing below it is ever observable.

/// Round to 6 decimal places (half away from zero).
#[inline]
pub fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
