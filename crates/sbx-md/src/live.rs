//! Live market-data placeholder.
//!
//! Exists to validate the provider abstraction: the broker can be wired to a
//! non-replay source without code changes. There is no upstream transport
//! yet, so every quote call errors; construction itself is gated behind
//! `ENABLE_LIVE_MARKET_DATA=true` so a misconfigured deployment fails at
//! startup rather than at the first order.

use crate::provider::{MarketDataError, MarketDataProvider, Quote};

/// Environment flag that must be `"true"` for [`LiveProvider::from_env`].
pub const ENABLE_LIVE_MARKET_DATA: &str = "ENABLE_LIVE_MARKET_DATA";

/// Placeholder live-feed provider.
#[derive(Debug, Default)]
pub struct LiveProvider {
    _private: (),
}

impl LiveProvider {
    /// Construct the provider, honoring the enable flag.
    pub fn from_env() -> Result<Self, MarketDataError> {
        let enabled = std::env::var(ENABLE_LIVE_MARKET_DATA)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if !enabled {
            return Err(MarketDataError::LiveDataDisabled);
        }
        Ok(Self { _private: () })
    }
}

impl MarketDataProvider for LiveProvider {
    fn name(&self) -> &'static str {
        "live"
    }

    fn get_quote(&self, _symbol: &str) -> Result<Quote, MarketDataError> {
        Err(MarketDataError::Unsupported { provider: "live" })
    }

    fn peek_quote(&self, _symbol: &str) -> Result<Quote, MarketDataError> {
        Err(MarketDataError::Unsupported { provider: "live" })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
