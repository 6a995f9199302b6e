//! Deterministic replay provider.
//!
//! Cycles through a canned per-symbol mid-price series. The cursor for a
//! symbol advances on every [`get_quote`](crate::MarketDataProvider::get_quote)
//! and wraps modulo the series length, so a replay never runs dry.
//!
//! Bid/ask are derived from the mid and a per-symbol (or default) spread in
//! basis points. The volatility proxy is the coefficient of variation over a
//! trailing window of up to 5 series values ending at the current index; it
//! is floored at `0.001` and never wraps past the start of the series.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::provider::{MarketDataError, MarketDataProvider, Quote};

/// Trailing window length for the volatility proxy.
const VOLATILITY_WINDOW: usize = 5;

/// Lower bound for the volatility proxy (also the < 2 point fallback).
const VOLATILITY_FLOOR: f64 = 0.001;

fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

// ---------------------------------------------------------------------------
// Dataset format
// ---------------------------------------------------------------------------

/// One symbol's replay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSeries {
    /// Mid prices, cycled in order.
    pub series: Vec<f64>,
    /// Full spread in basis points; falls back to the provider default.
    #[serde(default)]
    pub spread_bps: Option<f64>,
}

/// The on-disk replay dataset: `symbol -> {series, spreadBps?}`.
pub type ReplayDataset = BTreeMap<String, SymbolSeries>;

/// Parse a dataset from its JSON representation.
pub fn dataset_from_json_str(s: &str) -> Result<ReplayDataset, serde_json::Error> {
    serde_json::from_str(s)
}

/// The dataset shipped with the engine, used when no file is configured.
pub fn default_dataset() -> ReplayDataset {
    fn entry(series: &[f64], spread_bps: Option<f64>) -> SymbolSeries {
        SymbolSeries {
            series: series.to_vec(),
            spread_bps,
        }
    }

    let mut ds = ReplayDataset::new();
    ds.insert(
        "AAPL".to_string(),
        entry(
            &[
                187.44, 188.12, 187.9, 189.3, 190.02, 189.55, 191.1, 190.6, 192.25, 191.8, 193.4,
                192.95, 194.1, 193.6,
            ],
            Some(4.0),
        ),
    );
    ds.insert(
        "MSFT".to_string(),
        entry(
            &[
                412.3, 413.1, 411.8, 414.5, 415.9, 414.2, 416.7, 417.3, 416.1, 418.8, 419.5,
                418.2,
            ],
            Some(3.0),
        ),
    );
    ds.insert(
        "NVDA".to_string(),
        entry(
            &[
                118.2, 119.6, 121.1, 119.9, 122.4, 123.8, 122.1, 124.9, 126.3, 124.7, 127.2,
                128.6,
            ],
            Some(8.0),
        ),
    );
    ds.insert(
        "TSLA".to_string(),
        entry(
            &[
                214.6, 212.9, 216.3, 218.1, 215.4, 219.7, 221.2, 218.8, 222.6, 220.9, 224.3,
                222.5,
            ],
            Some(10.0),
        ),
    );
    ds
}

// ---------------------------------------------------------------------------
// ReplayProvider
// ---------------------------------------------------------------------------

/// Replay implementation of [`MarketDataProvider`].
///
/// Cursors live behind a single mutex, so concurrent callers against the same
/// symbol are serialized and each consumed price is handed out exactly once.
pub struct ReplayProvider {
    data: BTreeMap<String, SymbolSeries>,
    default_spread_bps: f64,
    cursors: Mutex<BTreeMap<String, usize>>,
}

impl ReplayProvider {
    /// Build a provider from a dataset.
    ///
    /// Symbols with an empty series are dropped: there is no price to serve,
    /// so they behave exactly like unconfigured symbols.
    pub fn new(dataset: ReplayDataset, default_spread_bps: f64) -> Self {
        let data = dataset
            .into_iter()
            .filter(|(_, s)| !s.series.is_empty())
            .collect();
        Self {
            data,
            default_spread_bps,
            cursors: Mutex::new(BTreeMap::new()),
        }
    }

    /// Symbols this provider serves, in deterministic order.
    pub fn symbols(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    fn quote_at(&self, symbol: &str, series: &SymbolSeries, idx: usize) -> Quote {
        let mid = series.series[idx];
        let spread_bps = series.spread_bps.unwrap_or(self.default_spread_bps);
        let half = mid * spread_bps / 20_000.0;

        Quote {
            symbol: symbol.to_string(),
            bid: round6(mid - half),
            ask: round6(mid + half),
            mid: round6(mid),
            spread_bps,
            volatility_proxy: volatility_proxy(&series.series, idx),
            timestamp: Utc::now(),
        }
    }

    fn series_for(&self, symbol: &str) -> Result<&SymbolSeries, MarketDataError> {
        self.data.get(symbol).ok_or_else(|| MarketDataError::UnknownSymbol {
            symbol: symbol.to_string(),
        })
    }
}

impl MarketDataProvider for ReplayProvider {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let series = self.series_for(symbol)?;
        let mut cursors = self.cursors.lock().expect("replay cursor lock poisoned");
        let idx = *cursors.entry(symbol.to_string()).or_insert(0);
        cursors.insert(symbol.to_string(), (idx + 1) % series.series.len());
        Ok(self.quote_at(symbol, series, idx))
    }

    fn peek_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let series = self.series_for(symbol)?;
        let cursors = self.cursors.lock().expect("replay cursor lock poisoned");
        let idx = cursors.get(symbol).copied().unwrap_or(0);
        Ok(self.quote_at(symbol, series, idx))
    }
}

/// Coefficient of variation over `series[idx-4 ..= idx]` (clamped at 0).
///
/// Population stddev; returns the floor when the window holds fewer than two
/// points or the mean is not positive.
fn volatility_proxy(series: &[f64], idx: usize) -> f64 {
    let start = idx.saturating_sub(VOLATILITY_WINDOW - 1);
    let window = &series[start..=idx];
    if window.len() < 2 {
        return VOLATILITY_FLOOR;
    }

    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return VOLATILITY_FLOOR;
    }
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (variance.sqrt() / mean).max(VOLATILITY_FLOOR)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
