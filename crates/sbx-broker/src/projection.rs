//! Read-side account views.
//!
//! Every read refreshes the account first (settlement, fee drain, borrow
//! accrual, liquidation check), then projects a snapshot. Views carry
//! 6-dp-rounded values and camelCase wire names; no business logic lives
//! here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::Broker;
use crate::error::BrokerError;
use crate::money::round6;
use crate::types::{Fill, Order, OrderStatus};

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    pub settled: f64,
    pub unsettled: f64,
    pub available: f64,
    pub reserved: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginView {
    pub long: f64,
    pub short: f64,
    pub initial: f64,
    pub maintenance: f64,
    pub excess: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub balances: Balances,
    pub equity: f64,
    pub margin: MarginView,
    pub fees_due: f64,
    pub open_positions: usize,
    pub open_orders: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    pub mid: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}

// ---------------------------------------------------------------------------
// Read surface
// ---------------------------------------------------------------------------

impl Broker {
    pub async fn get_account(&self, account_id: &str) -> Result<AccountView, BrokerError> {
        let handle = self.account_handle(account_id).await?;
        let mut acct = handle.lock().await;
        self.refresh_account(&mut acct, true).await;

        let m = self.metrics(&acct);
        Ok(AccountView {
            id: acct.id.clone(),
            created_at: acct.created_at,
            balances: Balances {
                settled: round6(acct.settled_cash),
                unsettled: round6(acct.unsettled_cash),
                available: round6(m.available_cash),
                reserved: round6(acct.reserved_cash),
            },
            equity: round6(m.equity),
            margin: MarginView {
                long: round6(m.long_value),
                short: round6(m.short_value),
                initial: round6(m.initial_required),
                maintenance: round6(m.maintenance_required),
                excess: round6(m.margin_excess),
            },
            fees_due: round6(acct.fees_due),
            open_positions: acct.positions.len(),
            open_orders: acct
                .orders
                .iter()
                .filter(|o| o.status == OrderStatus::Open)
                .count(),
        })
    }

    pub async fn get_positions(&self, account_id: &str) -> Result<Vec<PositionView>, BrokerError> {
        let handle = self.account_handle(account_id).await?;
        let mut acct = handle.lock().await;
        self.refresh_account(&mut acct, true).await;

        let marks = self.marks_for(&acct);
        Ok(acct
            .positions
            .values()
            .map(|pos| {
                let mid = marks.get(&pos.symbol).copied().unwrap_or(0.0);
                let unrealized = if pos.quantity > 0.0 {
                    (mid - pos.avg_price) * pos.quantity
                } else {
                    (pos.avg_price - mid) * pos.quantity.abs()
                };
                PositionView {
                    symbol: pos.symbol.clone(),
                    quantity: pos.quantity,
                    avg_price: pos.avg_price,
                    mid: round6(mid),
                    market_value: round6(pos.quantity * mid),
                    unrealized_pnl: round6(unrealized),
                }
            })
            .collect())
    }

    /// Newest-first order log, optionally filtered by status
    /// (case-insensitive).
    pub async fn get_orders(
        &self,
        account_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<Order>, BrokerError> {
        let handle = self.account_handle(account_id).await?;
        let mut acct = handle.lock().await;
        self.refresh_account(&mut acct, true).await;

        let orders = match status {
            Some(filter) => acct
                .orders
                .iter()
                .filter(|o| o.status.as_str().eq_ignore_ascii_case(filter.trim()))
                .cloned()
                .collect(),
            None => acct.orders.clone(),
        };
        Ok(orders)
    }

    /// Newest-first fill log.
    pub async fn get_fills(&self, account_id: &str) -> Result<Vec<Fill>, BrokerError> {
        let handle = self.account_handle(account_id).await?;
        let mut acct = handle.lock().await;
        self.refresh_account(&mut acct, true).await;
        Ok(acct.fills.clone())
    }
}
