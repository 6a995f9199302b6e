//! T+N settlement: reserved cash converts to a settled debit once the
//! settlement date arrives, and sale proceeds move from unsettled to settled.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use sbx_broker::{
    round6, Broker, BrokerConfig, FixedClock, RawOrderInput, ReplayDataset, ReplayProvider,
    SymbolSeries,
};

fn broker() -> (Broker, Arc<FixedClock>) {
    let cfg = BrokerConfig {
        seed: 42,
        execution_delay_ms: 0,
        enforce_market_hours: false,
        ..BrokerConfig::default()
    };
    let mut ds = ReplayDataset::new();
    ds.insert(
        "STL".to_string(),
        SymbolSeries {
            series: vec![150.0; 8],
            spread_bps: Some(5.0),
        },
    );
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 4, 14, 0, 0).unwrap(), // Monday
    ));
    let provider = Arc::new(ReplayProvider::new(ds, cfg.base_spread_bps));
    (Broker::new(cfg, provider, clock.clone()), clock)
}

#[tokio::test]
async fn buy_settles_after_two_business_days() {
    let (broker, clock) = broker();
    let id = broker.create_account(100_000.0).await.unwrap();

    broker
        .place_order(&id, RawOrderInput::market("STL", "BUY", 5.0))
        .await
        .unwrap();
    let fill = broker.get_fills(&id).await.unwrap().remove(0);

    // before settlement: cash reserved, settled only reduced by the fee drain
    let before = broker.get_account(&id).await.unwrap();
    assert_eq!(before.balances.reserved, fill.notional);
    assert_eq!(before.balances.settled, round6(100_000.0 - fill.fees));

    // Monday + 2 business days = Wednesday
    clock.advance(Duration::days(2));
    let after = broker.get_account(&id).await.unwrap();
    assert_eq!(after.balances.reserved, 0.0);
    assert_eq!(
        after.balances.settled,
        round6(round6(100_000.0 - fill.fees) - fill.notional)
    );
}

#[tokio::test]
async fn settlement_does_not_fire_early() {
    let (broker, clock) = broker();
    let id = broker.create_account(100_000.0).await.unwrap();

    broker
        .place_order(&id, RawOrderInput::market("STL", "BUY", 5.0))
        .await
        .unwrap();

    // one day is not enough for T+2
    clock.advance(Duration::days(1));
    let view = broker.get_account(&id).await.unwrap();
    assert!(view.balances.reserved > 0.0);
}

#[tokio::test]
async fn weekend_defers_settlement() {
    let (broker, clock) = broker();
    // move to Friday before trading
    clock.set(Utc.with_ymd_and_hms(2024, 3, 8, 14, 0, 0).unwrap());
    let id = broker.create_account(100_000.0).await.unwrap();

    broker
        .place_order(&id, RawOrderInput::market("STL", "BUY", 5.0))
        .await
        .unwrap();

    // Friday + 2 calendar days is Sunday: still unsettled
    clock.advance(Duration::days(2));
    assert!(broker.get_account(&id).await.unwrap().balances.reserved > 0.0);

    // Tuesday: T+2 business days reached
    clock.advance(Duration::days(2));
    assert_eq!(broker.get_account(&id).await.unwrap().balances.reserved, 0.0);
}

#[tokio::test]
async fn sale_proceeds_move_from_unsettled_to_settled() {
    let (broker, clock) = broker();
    let id = broker.create_account(100_000.0).await.unwrap();

    broker
        .place_order(&id, RawOrderInput::market("STL", "BUY", 5.0))
        .await
        .unwrap();
    broker
        .place_order(&id, RawOrderInput::market("STL", "SELL", 5.0))
        .await
        .unwrap();

    let sell_fill = broker.get_fills(&id).await.unwrap().remove(0);
    let before = broker.get_account(&id).await.unwrap();
    assert_eq!(before.balances.unsettled, sell_fill.notional);

    clock.advance(Duration::days(4));
    let after = broker.get_account(&id).await.unwrap();
    assert_eq!(after.balances.unsettled, 0.0);
    assert_eq!(after.balances.reserved, 0.0);
    // all cash is settled again; identity holds with no fees outstanding
    assert_eq!(after.balances.available, after.balances.settled);
}
