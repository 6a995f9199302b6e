//! Margin metrics.
//!
//! Pure computation over an account snapshot and a caller-supplied mark map;
//! the engine fills the marks from `peek_quote` so metric reads never consume
//! replay prices.

use std::collections::BTreeMap;

use crate::account::Account;
use crate::config::BrokerConfig;

/// Symbol -> mid mark. Missing symbols mark at 0.
pub type MarkMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct MarginMetrics {
    /// Σ qty·mid over long positions.
    pub long_value: f64,
    /// Σ |qty|·mid over short positions.
    pub short_value: f64,
    /// Σ qty·mid, signed.
    pub market_value: f64,
    /// settled + unsettled + marketValue − feesDue.
    pub equity: f64,
    /// Equity required to open: initialMarginLong·long + initialMarginShort·short.
    pub initial_required: f64,
    /// Equity required to hold: maintenanceMarginLong·long + maintenanceMarginShort·short.
    pub maintenance_required: f64,
    /// equity − maintenanceRequired.
    pub margin_excess: f64,
    /// settled − reserved − feesDue.
    pub available_cash: f64,
}

pub(crate) fn compute_metrics(
    acct: &Account,
    marks: &MarkMap,
    config: &BrokerConfig,
) -> MarginMetrics {
    let mut long_value = 0.0;
    let mut short_value = 0.0;
    let mut market_value = 0.0;

    // deterministic iteration (BTreeMap)
    for (symbol, pos) in &acct.positions {
        let mid = marks.get(symbol).copied().unwrap_or(0.0);
        market_value += pos.quantity * mid;
        if pos.quantity > 0.0 {
            long_value += pos.quantity * mid;
        } else {
            short_value += pos.quantity.abs() * mid;
        }
    }

    let equity = acct.settled_cash + acct.unsettled_cash + market_value - acct.fees_due;
    let initial_required =
        config.initial_margin_long * long_value + config.initial_margin_short * short_value;
    let maintenance_required = config.maintenance_margin_long * long_value
        + config.maintenance_margin_short * short_value;

    MarginMetrics {
        long_value,
        short_value,
        market_value,
        equity,
        initial_required,
        maintenance_required,
        margin_excess: equity - maintenance_required,
        available_cash: acct.settled_cash - acct.reserved_cash - acct.fees_due,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::apply_position_delta;
    use crate::rng::account_rng;
    use chrono::{TimeZone, Utc};

    fn account(settled: f64) -> Account {
        Account::new(
            "ACC-1-test".to_string(),
            Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap(),
            settled,
            account_rng(42, "ACC-1-test"),
        )
    }

    fn marks(entries: &[(&str, f64)]) -> MarkMap {
        entries.iter().map(|(s, m)| (s.to_string(), *m)).collect()
    }

    #[test]
    fn flat_account_metrics() {
        let a = account(10_000.0);
        let m = compute_metrics(&a, &MarkMap::new(), &BrokerConfig::default());
        assert_eq!(m.equity, 10_000.0);
        assert_eq!(m.available_cash, 10_000.0);
        assert_eq!(m.initial_required, 0.0);
        assert_eq!(m.maintenance_required, 0.0);
        assert_eq!(m.margin_excess, 10_000.0);
    }

    #[test]
    fn long_and_short_split() {
        let mut a = account(10_000.0);
        apply_position_delta(&mut a, "AAPL", 10.0, 100.0);
        apply_position_delta(&mut a, "TSLA", -5.0, 200.0);

        let mk = marks(&[("AAPL", 110.0), ("TSLA", 190.0)]);
        let m = compute_metrics(&a, &mk, &BrokerConfig::default());

        assert_eq!(m.long_value, 1100.0);
        assert_eq!(m.short_value, 950.0);
        assert_eq!(m.market_value, 1100.0 - 950.0);
        // initial = 0.5*1100 + 1.5*950; maintenance = 0.25*1100 + 0.3*950
        assert_eq!(m.initial_required, 550.0 + 1425.0);
        assert_eq!(m.maintenance_required, 275.0 + 285.0);
    }

    #[test]
    fn equity_formula_includes_all_cash_buckets() {
        let mut a = account(1_000.0);
        a.unsettled_cash = 500.0;
        a.fees_due = 25.0;
        apply_position_delta(&mut a, "AAPL", 2.0, 100.0);

        let m = compute_metrics(&a, &marks(&[("AAPL", 120.0)]), &BrokerConfig::default());
        assert_eq!(m.equity, 1_000.0 + 500.0 + 240.0 - 25.0);
    }

    #[test]
    fn available_cash_subtracts_reservations_and_fees() {
        let mut a = account(1_000.0);
        a.reserved_cash = 300.0;
        a.fees_due = 10.0;
        let m = compute_metrics(&a, &MarkMap::new(), &BrokerConfig::default());
        assert_eq!(m.available_cash, 690.0);
    }

    #[test]
    fn unknown_symbol_marks_at_zero() {
        let mut a = account(1_000.0);
        apply_position_delta(&mut a, "GONE", 10.0, 50.0);
        let m = compute_metrics(&a, &MarkMap::new(), &BrokerConfig::default());
        assert_eq!(m.market_value, 0.0);
        assert_eq!(m.equity, 1_000.0);
    }
}
