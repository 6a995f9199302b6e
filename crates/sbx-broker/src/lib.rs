//! Deterministic broker simulation core.
//!
//! Models a brokerage account's trader-visible lifecycle without venue
//! connectivity: order intake and validation, price discovery over a
//! replayable quote stream, market/limit/stop/stop-limit matching, signed
//! positions with weighted-average cost, cash reservation and T+N
//! settlement, short-borrow fees, margin metrics, and forced liquidation on
//! maintenance deficiency.
//!
//! The engine is deterministic: every random draw comes from seeded ChaCha
//! streams, and all time flows through an injectable [`Clock`]. Same seed,
//! same operation sequence, same replay dataset — identical order and fill
//! histories (modulo wall-clock timestamps when the system clock is used).
//!
//! Module layout mirrors the write/read split:
//! - `engine` + `accounting` + `maintenance` own mutation,
//! - `metrics` + `projection` own derived reads,
//! - `money`, `calendar`, `clock`, `rng`, `types` are the shared substrate.

mod account;
mod accounting;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod maintenance;
pub mod metrics;
pub mod money;
pub mod projection;
pub mod rng;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::BrokerConfig;
pub use engine::Broker;
pub use error::BrokerError;
pub use maintenance::LIQUIDATION_FAILED_REASON;
pub use metrics::{MarginMetrics, MarkMap};
pub use money::round6;
pub use projection::{AccountView, Balances, MarginView, PositionView};
pub use types::{
    Fill, Order, OrderSide, OrderStatus, OrderType, PendingSettlement, Position, RawOrderInput,
    SettleDirection, Tif, TriggerState,
};

// Re-exported so downstream crates can wire providers without a direct
// sbx-md dependency line for the common case.
pub use sbx_md::{
    dataset_from_json_str, default_dataset, LiveProvider, MarketDataError, MarketDataProvider,
    Quote, ReplayDataset, ReplayProvider, SymbolSeries,
};
