//! Broker tunables.
//!
//! One immutable [`BrokerConfig`] per broker instance. The daemon loads it
//! from an optional YAML file; everything else takes the defaults. Field
//! names follow the wire convention (camelCase) so the YAML and the JSON
//! admin surfaces agree.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrokerConfig {
    /// Seeds every RNG stream. Identical seed + identical input sequence
    /// yields identical order/fill histories.
    pub seed: u64,
    /// Cooperative delay between trigger evaluation and the fill quote.
    pub execution_delay_ms: u64,

    /// Gate order placement by venue wall clock.
    pub enforce_market_hours: bool,
    pub market_open_hour: u32,
    pub market_open_minute: u32,
    pub market_close_hour: u32,
    pub market_close_minute: u32,

    /// Flat fee per fill.
    pub commission_per_trade: f64,
    /// Proportional fee on notional, in basis points.
    pub fee_rate_bps: f64,

    /// Slippage components; see the fill pricing step in `engine`.
    pub base_slippage_bps: f64,
    pub size_impact_bps: f64,
    pub random_slippage_bps: f64,

    /// Default replay spread when a symbol does not carry its own.
    pub base_spread_bps: f64,

    /// Margin ratios applied to long/short market value.
    pub initial_margin_long: f64,
    pub initial_margin_short: f64,
    pub maintenance_margin_long: f64,
    pub maintenance_margin_short: f64,

    /// T+N settlement, in business days.
    pub settlement_days_equities: u32,
    /// Daily financing rate applied to open short market value.
    pub short_borrow_daily_rate: f64,

    /// Toggles forced liquidation on maintenance-margin deficiency.
    pub force_liquidation_enabled: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            execution_delay_ms: 250,
            enforce_market_hours: false,
            market_open_hour: 9,
            market_open_minute: 30,
            market_close_hour: 16,
            market_close_minute: 0,
            commission_per_trade: 1.0,
            fee_rate_bps: 1.0,
            base_slippage_bps: 1.0,
            size_impact_bps: 2.0,
            random_slippage_bps: 3.0,
            base_spread_bps: 5.0,
            initial_margin_long: 0.5,
            initial_margin_short: 1.5,
            maintenance_margin_long: 0.25,
            maintenance_margin_short: 0.3,
            settlement_days_equities: 2,
            short_borrow_daily_rate: 0.0003,
            force_liquidation_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
