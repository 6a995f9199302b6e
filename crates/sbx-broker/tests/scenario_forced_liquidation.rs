//! Forced liquidation: a maintenance-deficient account has its largest
//! position closed by an internal MARKET IOC order; when even that order
//! cannot execute, a synthetic rejection documents the failed margin call.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use sbx_broker::{
    Broker, BrokerConfig, FixedClock, OrderStatus, RawOrderInput, ReplayDataset, ReplayProvider,
    SymbolSeries, LIQUIDATION_FAILED_REASON,
};

/// Four quotes at `start`, then the series jumps to `spike`.
fn spike_series(start: f64, spike: f64) -> ReplayDataset {
    let mut series = vec![start; 4];
    series.extend(std::iter::repeat(spike).take(12));
    let mut ds = ReplayDataset::new();
    ds.insert(
        "SQZ".to_string(),
        SymbolSeries {
            series,
            spread_bps: Some(5.0),
        },
    );
    ds
}

fn broker_with(ds: ReplayDataset, force_liquidation_enabled: bool) -> (Broker, Arc<FixedClock>) {
    let cfg = BrokerConfig {
        seed: 42,
        execution_delay_ms: 0,
        enforce_market_hours: false,
        force_liquidation_enabled,
        ..BrokerConfig::default()
    };
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 4, 14, 0, 0).unwrap(), // Monday
    ));
    let provider = Arc::new(ReplayProvider::new(ds, cfg.base_spread_bps));
    (Broker::new(cfg, provider, clock.clone()), clock)
}

/// Open a short at 100, settle it, then walk the replay cursor into the
/// spiked region so the next refresh marks the short against the new price.
async fn squeezed_short_account(broker: &Broker, clock: &FixedClock, capital: f64) -> String {
    let id = broker.create_account(capital).await.unwrap();
    let order = broker
        .place_order(&id, RawOrderInput::market("SQZ", "SELL_SHORT", 50.0))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Filled);

    clock.advance(Duration::days(3));
    broker.quote("SQZ").unwrap();
    broker.quote("SQZ").unwrap();
    id
}

#[tokio::test]
async fn deficient_short_is_bought_back_in() {
    let (broker, clock) = broker_with(spike_series(100.0, 250.0), true);
    let id = squeezed_short_account(&broker, &clock, 10_000.0).await;

    // the read triggers refresh: equity < maintenance at the 250 mark
    let view = broker.get_account(&id).await.unwrap();

    assert!(broker.get_positions(&id).await.unwrap().is_empty());
    assert_eq!(view.margin.short, 0.0);
    assert_eq!(view.margin.maintenance, 0.0);

    let orders = broker.get_orders(&id, None).await.unwrap();
    let cover = orders
        .iter()
        .find(|o| o.side == "BUY_TO_COVER" && o.status == OrderStatus::Filled)
        .expect("liquidation order in history");
    assert_eq!(cover.order_type, "MARKET");
    assert_eq!(cover.tif, "IOC");
    assert_eq!(cover.quantity, 50.0);

    assert_eq!(broker.get_fills(&id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn failed_liquidation_records_a_synthetic_rejection() {
    // 7,600 is just enough to open the short, but nowhere near enough to
    // buy 50 shares back at 260
    let (broker, clock) = broker_with(spike_series(100.0, 260.0), true);
    let id = squeezed_short_account(&broker, &clock, 7_600.0).await;

    broker.get_account(&id).await.unwrap();

    let orders = broker.get_orders(&id, None).await.unwrap();
    assert_eq!(
        orders[0].reason.as_deref(),
        Some(LIQUIDATION_FAILED_REASON),
        "synthetic margin-call rejection is the newest order"
    );
    assert_eq!(orders[0].status, OrderStatus::Rejected);
    assert!(orders[1]
        .reason
        .as_deref()
        .unwrap()
        .contains("insufficient available buying power"));

    // the deficiency persists: the short is still on the book
    let positions = broker.get_positions(&id).await.unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].quantity, -50.0);
}

#[tokio::test]
async fn deficient_account_rejects_new_risk() {
    let (broker, clock) = broker_with(spike_series(100.0, 260.0), true);
    let id = squeezed_short_account(&broker, &clock, 7_600.0).await;
    broker.get_account(&id).await.unwrap();

    let order = broker
        .place_order(&id, RawOrderInput::market("SQZ", "BUY", 1.0))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Rejected);
    assert_eq!(
        order.reason.as_deref(),
        Some("margin deficiency: account below maintenance")
    );
}

#[tokio::test]
async fn liquidation_can_be_disabled() {
    let (broker, clock) = broker_with(spike_series(100.0, 250.0), false);
    let id = squeezed_short_account(&broker, &clock, 10_000.0).await;

    let view = broker.get_account(&id).await.unwrap();

    // deficiency is visible but nothing is closed
    assert!(view.margin.excess < 0.0);
    let positions = broker.get_positions(&id).await.unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].quantity, -50.0);
}
