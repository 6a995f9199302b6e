//! Provider boundary for simulated quote streams.
//!
//! This module defines **only** the quote type, the error type, and the
//! provider trait. Concrete implementations live in [`replay`](crate::replay)
//! and [`live`](crate::live).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

/// A two-sided quote derived from a mid price.
///
/// Invariants (maintained by every provider):
/// - `bid <= mid <= ask`
/// - `ask - bid == mid * spread_bps / 10_000` (6-dp rounded)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Ticker symbol exactly as configured (e.g. `"AAPL"`).
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub mid: f64,
    /// Full bid/ask spread in basis points of the mid.
    pub spread_bps: f64,
    /// Short-window coefficient of variation of the mid price.
    ///
    /// Floored at `0.001`; consumed only as a slippage input.
    pub volatility_proxy: f64,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`MarketDataProvider`] implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// The symbol is not configured in this provider.
    UnknownSymbol { symbol: String },
    /// The live provider was requested while `ENABLE_LIVE_MARKET_DATA` is unset.
    LiveDataDisabled,
    /// The provider does not implement this operation.
    Unsupported { provider: &'static str },
}

impl fmt::Display for MarketDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketDataError::UnknownSymbol { symbol } => {
                write!(f, "unknown symbol: {symbol}")
            }
            MarketDataError::LiveDataDisabled => {
                write!(f, "live market data disabled; set ENABLE_LIVE_MARKET_DATA=true")
            }
            MarketDataError::Unsupported { provider } => {
                write!(f, "provider '{provider}' does not serve quotes")
            }
        }
    }
}

impl std::error::Error for MarketDataError {}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Quote-stream provider contract.
///
/// Implementations must be object-safe so callers can hold an
/// `Arc<dyn MarketDataProvider>` without knowing the concrete type, and
/// `Send + Sync` so the broker can share one provider across accounts.
///
/// The two operations differ only in cursor behavior:
/// - [`get_quote`](MarketDataProvider::get_quote) **advances** the provider's
///   internal cursor for the symbol (the next call sees the next series value).
/// - [`peek_quote`](MarketDataProvider::peek_quote) returns the current quote
///   **without** advancing. Used by mark-to-market reads, which must not
///   consume prices.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name identifying this provider (e.g. `"replay"`).
    fn name(&self) -> &'static str;

    /// Return the current quote for `symbol` and advance the cursor.
    fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Return the current quote for `symbol` without advancing the cursor.
    fn peek_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
