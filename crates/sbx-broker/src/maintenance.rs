//! Lifecycle maintenance: the `refresh` pass.
//!
//! Runs before every read and around every order placement:
//!
//! 1. settle pending entries whose `settle_at` has arrived (FIFO by settle
//!    date), then drain accrued fees into settled cash;
//! 2. accrue the daily short-borrow fee over whole calendar days;
//! 3. when enabled and the account is maintenance-deficient, force-liquidate
//!    the largest position via an internal MARKET IOC order.
//!
//! The liquidation order re-enters the execution pipeline with the margin
//! bypass flag; refreshes running on its behalf skip step 3, so the bypass is
//! single-level and the recursion terminates.

use tracing::{debug, warn};

use crate::account::Account;
use crate::engine::Broker;
use crate::money::round6;
use crate::rng;
use crate::types::{Order, OrderStatus, RawOrderInput, SettleDirection};

/// Reject reason recorded when a forced liquidation order itself rejects.
pub const LIQUIDATION_FAILED_REASON: &str = "margin_call_forced_liquidation_failed";

impl Broker {
    pub(crate) async fn refresh_account(&self, acct: &mut Account, allow_liquidation: bool) {
        let now = self.clock().now();

        // 1. settle due entries, FIFO by settle date
        let mut due = Vec::new();
        acct.pending_settlements.retain(|entry| {
            if entry.settle_at <= now {
                due.push(entry.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|entry| entry.settle_at);
        for entry in due {
            match entry.direction {
                SettleDirection::Debit => {
                    acct.settled_cash = round6(acct.settled_cash - entry.amount);
                    acct.reserved_cash = round6((acct.reserved_cash - entry.amount).max(0.0));
                }
                SettleDirection::Credit => {
                    acct.settled_cash = round6(acct.settled_cash + entry.amount);
                    acct.unsettled_cash = round6(acct.unsettled_cash - entry.amount);
                }
            }
        }

        // accrued fees always drain into settled cash
        if acct.fees_due != 0.0 {
            acct.settled_cash = round6(acct.settled_cash - acct.fees_due);
            acct.fees_due = 0.0;
        }

        // 2. daily short-borrow accrual
        let today = now.date_naive();
        if acct.last_borrow_fee_date != today {
            let days = (today - acct.last_borrow_fee_date).num_days();
            if days > 0 {
                let mut short_value = 0.0;
                for (symbol, pos) in &acct.positions {
                    if pos.quantity < 0.0 {
                        let mid = self
                            .market_data()
                            .peek_quote(symbol)
                            .map(|q| q.mid)
                            .unwrap_or(0.0);
                        short_value += pos.quantity.abs() * mid;
                    }
                }
                if short_value > 0.0 {
                    let accrued =
                        round6(short_value * self.config().short_borrow_daily_rate * days as f64);
                    acct.fees_due = round6(acct.fees_due + accrued);
                    debug!(account_id = %acct.id, days, accrued, "short borrow fee accrued");
                }
            }
            acct.last_borrow_fee_date = today;
        }

        // 3. forced liquidation
        if allow_liquidation && self.config().force_liquidation_enabled {
            self.liquidate_if_deficient(acct).await;
        }
    }

    async fn liquidate_if_deficient(&self, acct: &mut Account) {
        let metrics = self.metrics(acct);
        if metrics.equity >= metrics.maintenance_required {
            return;
        }

        // largest |qty·mid| position; map order breaks ties on the first hit
        let marks = self.marks_for(acct);
        let mut victim: Option<(String, f64)> = None;
        let mut largest = 0.0;
        for (symbol, pos) in &acct.positions {
            let exposure = (pos.quantity * marks.get(symbol).copied().unwrap_or(0.0)).abs();
            if exposure > largest {
                largest = exposure;
                victim = Some((symbol.clone(), pos.quantity));
            }
        }
        let Some((symbol, quantity)) = victim else {
            return;
        };

        let side = if quantity > 0.0 { "SELL" } else { "BUY_TO_COVER" };
        warn!(
            account_id = %acct.id,
            symbol = %symbol,
            quantity,
            equity = metrics.equity,
            maintenance_required = metrics.maintenance_required,
            "maintenance deficiency: forcing liquidation"
        );

        let raw = RawOrderInput::market(&symbol, side, quantity.abs()).with_tif("IOC");
        // boxed to break the refresh -> liquidation -> execute_order cycle
        let order = self.execute_order(acct, raw, true).await;

        if order.status == OrderStatus::Rejected {
            warn!(account_id = %acct.id, symbol = %symbol, "forced liquidation order rejected");
            let now = self.clock().now();
            let synthetic = Order {
                id: rng::mint_id("ORD", now.timestamp_millis(), &mut acct.rng),
                account_id: acct.id.clone(),
                symbol,
                order_type: "MARKET".to_string(),
                side: side.to_string(),
                tif: "IOC".to_string(),
                quantity: quantity.abs(),
                limit_price: None,
                stop_price: None,
                status: OrderStatus::Rejected,
                reason: Some(LIQUIDATION_FAILED_REASON.to_string()),
                created_at: now,
                filled_at: None,
                fill_price: None,
                fees: 0.0,
                trigger_state: None,
                effective_type: None,
            };
            acct.orders.insert(0, synthetic);
        }
    }
}
