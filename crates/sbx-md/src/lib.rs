//! Market-data capability for the broker simulation engine.
//!
//! This crate defines **only** the quote model, the provider trait, and the
//! two provider implementations the engine ships with:
//!
//! - [`ReplayProvider`] — cycles deterministically through canned per-symbol
//!   price series. This is the default and the only variant used in tests.
//! - [`LiveProvider`] — a placeholder for a real upstream feed. Refuses to
//!   construct unless explicitly enabled via environment, and errors on every
//!   quote call.
//!
//! No broker accounting, no HTTP, and no wall-clock-dependent *logic* belong
//! here (quote timestamps are stamped, but nothing branches on them).

pub mod live;
pub mod provider;
pub mod replay;

pub use live::LiveProvider;
pub use provider::{MarketDataError, MarketDataProvider, Quote};
pub use replay::{dataset_from_json_str, default_dataset, ReplayDataset, ReplayProvider, SymbolSeries};
