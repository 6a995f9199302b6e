//! Signed-position and cash application.
//!
//! Deterministic, pure logic, no IO. The engine computes the fill terms
//! (price, notional, fees, settlement date) and hands them here; this module
//! owns the weighted-average-cost rules and the cash buckets.

use std::collections::btree_map::Entry;

use crate::account::Account;
use crate::money::round6;
use crate::types::{OrderSide, PendingSettlement, Position, SettleDirection};

/// One executed trade, ready to be applied to an account.
#[derive(Debug, Clone)]
pub(crate) struct TradeApplication {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub fill_price: f64,
    pub notional: f64,
    pub fees: f64,
    pub settle_at: chrono::DateTime<chrono::Utc>,
}

/// Apply a trade: position update, cash movement, fee accrual, settlement
/// queue entry. Used both on the live account and on the post-trade
/// simulation copy.
pub(crate) fn apply_trade(acct: &mut Account, trade: &TradeApplication) {
    let delta = if trade.side.is_buy() {
        trade.quantity
    } else {
        -trade.quantity
    };
    apply_position_delta(acct, &trade.symbol, delta, trade.fill_price);

    if trade.side.is_buy() {
        acct.reserved_cash = round6(acct.reserved_cash + trade.notional);
        acct.pending_settlements.push(PendingSettlement {
            amount: trade.notional,
            direction: SettleDirection::Debit,
            settle_at: trade.settle_at,
            symbol: trade.symbol.clone(),
        });
    } else {
        acct.unsettled_cash = round6(acct.unsettled_cash + trade.notional);
        acct.pending_settlements.push(PendingSettlement {
            amount: trade.notional,
            direction: SettleDirection::Credit,
            settle_at: trade.settle_at,
            symbol: trade.symbol.clone(),
        });
    }

    acct.fees_due = round6(acct.fees_due + trade.fees);
}

/// Signed-position update with weighted-average cost.
///
/// Rules, for current `{q, a}` and signed delta `d` at fill price `p`:
/// - flat or same sign: `q' = q + d`, `a' = (|q|·a + |d|·p) / |q'|`
/// - opposite sign, lands on zero: position deleted
/// - opposite sign, sign preserved: `q' = q + d`, `a'` unchanged (reducing)
/// - opposite sign, sign flips: `q' = q + d`, `a' = p` (residual reseeds)
pub(crate) fn apply_position_delta(acct: &mut Account, symbol: &str, delta: f64, price: f64) {
    debug_assert!(delta != 0.0, "position delta must be non-zero");
    debug_assert!(price > 0.0, "fill price must be positive");

    match acct.positions.entry(symbol.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(Position {
                symbol: symbol.to_string(),
                quantity: delta,
                avg_price: round6(price),
            });
        }
        Entry::Occupied(mut slot) => {
            let q = slot.get().quantity;
            let next = q + delta;

            if q.signum() == delta.signum() {
                let pos = slot.get_mut();
                pos.avg_price =
                    round6((q.abs() * pos.avg_price + delta.abs() * price) / next.abs());
                pos.quantity = next;
            } else if next == 0.0 {
                slot.remove();
            } else if next.signum() == q.signum() {
                // reducing trade: average entry is preserved
                slot.get_mut().quantity = next;
            } else {
                // crossed zero: the residual is a fresh position at the fill price
                let pos = slot.get_mut();
                pos.quantity = next;
                pos.avg_price = round6(price);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::account_rng;
    use chrono::{TimeZone, Utc};

    fn account() -> Account {
        Account::new(
            "ACC-1-test".to_string(),
            Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap(),
            100_000.0,
            account_rng(42, "ACC-1-test"),
        )
    }

    fn trade(side: OrderSide, qty: f64, price: f64, fees: f64) -> TradeApplication {
        TradeApplication {
            symbol: "AAPL".to_string(),
            side,
            quantity: qty,
            fill_price: price,
            notional: round6(price * qty),
            fees,
            settle_at: Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap(),
        }
    }

    // --- signed-position rules ---

    #[test]
    fn opening_long_sets_avg_to_fill_price() {
        let mut a = account();
        apply_position_delta(&mut a, "AAPL", 10.0, 100.0);
        let p = &a.positions["AAPL"];
        assert_eq!(p.quantity, 10.0);
        assert_eq!(p.avg_price, 100.0);
    }

    #[test]
    fn same_sign_add_uses_weighted_average() {
        let mut a = account();
        apply_position_delta(&mut a, "AAPL", 10.0, 100.0);
        apply_position_delta(&mut a, "AAPL", 5.0, 130.0);
        let p = &a.positions["AAPL"];
        assert_eq!(p.quantity, 15.0);
        // (10*100 + 5*130)/15 = 110
        assert_eq!(p.avg_price, 110.0);
    }

    #[test]
    fn same_sign_add_on_short_side() {
        let mut a = account();
        apply_position_delta(&mut a, "AAPL", -10.0, 100.0);
        apply_position_delta(&mut a, "AAPL", -10.0, 110.0);
        let p = &a.positions["AAPL"];
        assert_eq!(p.quantity, -20.0);
        assert_eq!(p.avg_price, 105.0);
    }

    #[test]
    fn reducing_trade_keeps_average() {
        let mut a = account();
        apply_position_delta(&mut a, "AAPL", 10.0, 100.0);
        apply_position_delta(&mut a, "AAPL", -4.0, 150.0);
        let p = &a.positions["AAPL"];
        assert_eq!(p.quantity, 6.0);
        assert_eq!(p.avg_price, 100.0);
    }

    #[test]
    fn closing_to_zero_deletes_position() {
        let mut a = account();
        apply_position_delta(&mut a, "AAPL", 10.0, 100.0);
        apply_position_delta(&mut a, "AAPL", -10.0, 150.0);
        assert!(a.positions.is_empty());
    }

    #[test]
    fn short_cover_to_zero_deletes_position() {
        let mut a = account();
        apply_position_delta(&mut a, "AAPL", -20.0, 200.0);
        apply_position_delta(&mut a, "AAPL", 20.0, 180.0);
        assert!(a.positions.is_empty());
    }

    #[test]
    fn sign_flip_reseeds_average_to_fill_price() {
        let mut a = account();
        apply_position_delta(&mut a, "AAPL", 10.0, 100.0);
        apply_position_delta(&mut a, "AAPL", -15.0, 140.0);
        let p = &a.positions["AAPL"];
        assert_eq!(p.quantity, -5.0);
        assert_eq!(p.avg_price, 140.0);
    }

    // --- cash movement ---

    #[test]
    fn buy_reserves_cash_and_queues_debit() {
        let mut a = account();
        apply_trade(&mut a, &trade(OrderSide::Buy, 5.0, 188.0, 1.094));

        assert_eq!(a.reserved_cash, 940.0);
        assert_eq!(a.settled_cash, 100_000.0); // untouched until settlement
        assert_eq!(a.fees_due, 1.094);
        assert_eq!(a.pending_settlements.len(), 1);
        let e = &a.pending_settlements[0];
        assert_eq!(e.direction, SettleDirection::Debit);
        assert_eq!(e.amount, 940.0);
        assert_eq!(e.symbol, "AAPL");
    }

    #[test]
    fn sell_accrues_unsettled_and_queues_credit() {
        let mut a = account();
        apply_position_delta(&mut a, "AAPL", 5.0, 100.0);
        apply_trade(&mut a, &trade(OrderSide::Sell, 5.0, 188.0, 1.094));

        assert_eq!(a.unsettled_cash, 940.0);
        assert_eq!(a.reserved_cash, 0.0);
        assert_eq!(a.pending_settlements[0].direction, SettleDirection::Credit);
        assert!(a.positions.is_empty());
    }

    #[test]
    fn short_sale_opens_negative_position() {
        let mut a = account();
        apply_trade(&mut a, &trade(OrderSide::SellShort, 20.0, 210.0, 1.42));
        assert_eq!(a.positions["AAPL"].quantity, -20.0);
        assert_eq!(a.unsettled_cash, 4200.0);
    }

    #[test]
    fn cover_reserves_cash_like_a_buy() {
        let mut a = account();
        apply_trade(&mut a, &trade(OrderSide::SellShort, 20.0, 210.0, 0.0));
        apply_trade(&mut a, &trade(OrderSide::BuyToCover, 20.0, 205.0, 0.0));
        assert!(a.positions.is_empty());
        assert_eq!(a.reserved_cash, 4100.0);
        assert_eq!(a.unsettled_cash, 4200.0);
        assert_eq!(a.pending_settlements.len(), 2);
    }

    #[test]
    fn fees_accumulate_across_trades() {
        let mut a = account();
        apply_trade(&mut a, &trade(OrderSide::Buy, 1.0, 100.0, 1.01));
        apply_trade(&mut a, &trade(OrderSide::Buy, 1.0, 100.0, 1.01));
        assert_eq!(a.fees_due, 2.02);
    }
}
