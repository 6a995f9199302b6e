//! Per-account in-memory ledger state.
//!
//! One [`Account`] holds everything trader-visible: cash buckets, signed
//! positions, append-only order/fill history (newest first), the pending
//! settlement queue, and the account's private RNG stream. Mutation goes
//! through `accounting` and the engine; reads go through `projection`.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rand_chacha::ChaCha8Rng;

use crate::types::{Fill, Order, PendingSettlement, Position};

#[derive(Debug, Clone)]
pub(crate) struct Account {
    pub id: String,
    pub created_at: DateTime<Utc>,

    /// Cash that has fully settled and is spendable (before reservations).
    pub settled_cash: f64,
    /// Sale proceeds awaiting T+N settlement.
    pub unsettled_cash: f64,
    /// Cash earmarked for unsettled purchases; never negative.
    pub reserved_cash: f64,
    /// Fees accrued since the last refresh drain.
    pub fees_due: f64,

    pub positions: BTreeMap<String, Position>,
    /// Newest first.
    pub orders: Vec<Order>,
    /// Newest first.
    pub fills: Vec<Fill>,
    pub pending_settlements: Vec<PendingSettlement>,

    /// Calendar date of the last short-borrow accrual.
    pub last_borrow_fee_date: NaiveDate,

    /// Private deterministic stream: order/fill ids and slippage draws.
    pub rng: ChaCha8Rng,
}

impl Account {
    pub fn new(id: String, created_at: DateTime<Utc>, initial_capital: f64, rng: ChaCha8Rng) -> Self {
        Self {
            id,
            created_at,
            settled_cash: initial_capital,
            unsettled_cash: 0.0,
            reserved_cash: 0.0,
            fees_due: 0.0,
            positions: BTreeMap::new(),
            orders: Vec::new(),
            fills: Vec::new(),
            pending_settlements: Vec::new(),
            last_borrow_fee_date: created_at.date_naive(),
            rng,
        }
    }

}
