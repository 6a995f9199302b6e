//! Shared runtime state and environment wiring for sbx-daemon.
//!
//! All types here are `Clone`-able via `Arc`. Handlers receive
//! `State<Arc<AppState>>` from Axum; this module owns the provider/config
//! selection but no route logic.

use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use sbx_broker::{Broker, BrokerConfig, SystemClock};
use sbx_md::{
    dataset_from_json_str, default_dataset, LiveProvider, MarketDataProvider, ReplayProvider,
};

/// Selects the market-data provider: `replay` (default) or `live`.
pub const MARKET_DATA_MODE: &str = "MARKET_DATA_MODE";
/// Optional path to a YAML `BrokerConfig` file.
pub const SBX_CONFIG: &str = "SBX_CONFIG";
/// Optional path to a replay dataset JSON file.
pub const SBX_REPLAY_DATASET: &str = "SBX_REPLAY_DATASET";

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health logging.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<Broker>,
    pub build: BuildInfo,
}

impl AppState {
    /// Wrap an already-wired broker (used by tests).
    pub fn with_broker(broker: Broker) -> Self {
        Self {
            broker: Arc::new(broker),
            build: BuildInfo {
                service: "sbx-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }

    /// Production wiring: config file + env-selected provider.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = load_broker_config()?;
        let provider = build_provider(&config)?;
        info!(provider = provider.name(), "market data provider selected");
        Ok(Self::with_broker(Broker::new(
            config,
            provider,
            Arc::new(SystemClock),
        )))
    }
}

// ---------------------------------------------------------------------------
// Environment wiring
// ---------------------------------------------------------------------------

/// Load `BrokerConfig` from the YAML file named by `SBX_CONFIG`, or defaults.
pub fn load_broker_config() -> anyhow::Result<BrokerConfig> {
    match std::env::var(SBX_CONFIG) {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("read broker config: {path}"))?;
            let config =
                serde_yaml::from_str(&raw).with_context(|| format!("parse broker config: {path}"))?;
            info!(%path, "broker config loaded");
            Ok(config)
        }
        Err(_) => Ok(BrokerConfig::default()),
    }
}

/// Select the market-data provider from `MARKET_DATA_MODE`.
pub fn build_provider(config: &BrokerConfig) -> anyhow::Result<Arc<dyn MarketDataProvider>> {
    let mode = std::env::var(MARKET_DATA_MODE).unwrap_or_else(|_| "replay".to_string());
    match mode.trim().to_ascii_lowercase().as_str() {
        "live" => {
            let live = LiveProvider::from_env().context("live market data requested")?;
            Ok(Arc::new(live))
        }
        _ => {
            let dataset = match std::env::var(SBX_REPLAY_DATASET) {
                Ok(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("read replay dataset: {path}"))?;
                    dataset_from_json_str(&raw)
                        .with_context(|| format!("parse replay dataset: {path}"))?
                }
                Err(_) => default_dataset(),
            };
            Ok(Arc::new(ReplayProvider::new(
                dataset,
                config.base_spread_bps,
            )))
        }
    }
}
