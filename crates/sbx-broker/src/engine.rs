//! The broker execution engine.
//!
//! [`Broker`] owns the account map, the market-data capability, the clock,
//! and the config. `place_order` runs a fixed pipeline:
//!
//! refresh → normalize → validate → market hours → quote → margin guard →
//! trigger → delay → re-quote → fill condition → slippage + fees →
//! post-trade simulation → apply → record → refresh
//!
//! Every early return appends a REJECTED order to the account history and
//! hands it back; the only out-of-band failure is an unknown account id.
//!
//! # Serialization
//! Each account sits behind its own `tokio::sync::Mutex`, held for the whole
//! pipeline — including the cooperative execution delay — so no partial state
//! is ever observable and per-account operations are strictly serialized.
//! Accounts are independent; cross-account calls proceed in parallel.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use sbx_md::{MarketDataError, MarketDataProvider, Quote, ReplayDataset, ReplayProvider};

use crate::account::Account;
use crate::accounting::{self, TradeApplication};
use crate::calendar;
use crate::clock::{Clock, SystemClock};
use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::metrics::{compute_metrics, MarginMetrics, MarkMap};
use crate::money::round6;
use crate::rng;
use crate::types::{
    normalize, price_ok, Fill, Order, OrderSide, OrderStatus, OrderType, RawOrderInput, Tif,
    TriggerState,
};

pub struct Broker {
    config: BrokerConfig,
    market_data: Arc<dyn MarketDataProvider>,
    clock: Arc<dyn Clock>,
    accounts: RwLock<BTreeMap<String, Arc<Mutex<Account>>>>,
    /// Broker-level stream; mints account ids only.
    id_rng: StdMutex<ChaCha8Rng>,
}

impl Broker {
    pub fn new(
        config: BrokerConfig,
        market_data: Arc<dyn MarketDataProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let id_rng = StdMutex::new(rng::broker_rng(config.seed));
        Self {
            config,
            market_data,
            clock,
            accounts: RwLock::new(BTreeMap::new()),
            id_rng,
        }
    }

    /// Convenience wiring: replay provider over `dataset`, system clock.
    pub fn replay(config: BrokerConfig, dataset: ReplayDataset) -> Self {
        let spread = config.base_spread_bps;
        Self::new(
            config,
            Arc::new(ReplayProvider::new(dataset, spread)),
            Arc::new(SystemClock),
        )
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn market_data(&self) -> &Arc<dyn MarketDataProvider> {
        &self.market_data
    }

    /// Advancing quote lookup for the quotes façade.
    pub fn quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.market_data.get_quote(&symbol.trim().to_uppercase())
    }

    // -----------------------------------------------------------------------
    // Account lifecycle
    // -----------------------------------------------------------------------

    /// Open an account funded with `initial_capital` settled cash.
    pub async fn create_account(&self, initial_capital: f64) -> Result<String, BrokerError> {
        if !(initial_capital.is_finite() && initial_capital > 0.0) {
            return Err(BrokerError::InvalidInitialCapital {
                value: format!("{initial_capital}"),
            });
        }

        let now = self.clock.now();
        let id = {
            let mut id_rng = self.id_rng.lock().expect("id rng lock poisoned");
            rng::mint_id("ACC", now.timestamp_millis(), &mut id_rng)
        };
        let account_rng = rng::account_rng(self.config.seed, &id);
        let account = Account::new(id.clone(), now, round6(initial_capital), account_rng);

        self.accounts
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(account)));
        info!(account_id = %id, initial_capital, "account created");
        Ok(id)
    }

    pub(crate) async fn account_handle(
        &self,
        account_id: &str,
    ) -> Result<Arc<Mutex<Account>>, BrokerError> {
        self.accounts
            .read()
            .await
            .get(account_id)
            .cloned()
            .ok_or_else(|| BrokerError::UnknownAccount {
                account_id: account_id.to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Order placement
    // -----------------------------------------------------------------------

    /// Place an order. Validation and business failures return a REJECTED
    /// order (recorded in history); only an unknown account id errors.
    pub async fn place_order(
        &self,
        account_id: &str,
        raw: RawOrderInput,
    ) -> Result<Order, BrokerError> {
        let handle = self.account_handle(account_id).await?;
        let mut acct = handle.lock().await;
        Ok(self.execute_order(&mut acct, raw, false).await)
    }

    /// The full pipeline. `bypass_margin` is set only by forced liquidation:
    /// it skips the maintenance guard and disables nested liquidation in the
    /// surrounding refreshes (single-level bypass).
    pub(crate) fn execute_order<'a>(
        &'a self,
        acct: &'a mut Account,
        raw: RawOrderInput,
        bypass_margin: bool,
    ) -> Pin<Box<dyn Future<Output = Order> + Send + 'a>> {
        Box::pin(self.execute_order_inner(acct, raw, bypass_margin))
    }

    async fn execute_order_inner(
        &self,
        acct: &mut Account,
        raw: RawOrderInput,
        bypass_margin: bool,
    ) -> Order {
        self.refresh_account(acct, !bypass_margin).await;

        let input = normalize(&raw);
        let now = self.clock.now();
        let mut order = Order {
            id: rng::mint_id("ORD", now.timestamp_millis(), &mut acct.rng),
            account_id: acct.id.clone(),
            symbol: input.symbol.clone(),
            order_type: input.order_type.clone(),
            side: input.side.clone(),
            tif: input.tif.clone(),
            quantity: input.quantity,
            limit_price: input.limit_price,
            stop_price: input.stop_price,
            status: OrderStatus::Open,
            reason: None,
            created_at: now,
            filled_at: None,
            fill_price: None,
            fees: 0.0,
            trigger_state: None,
            effective_type: None,
        };

        // type / side / tif / quantity / price validation
        let Some(order_type) = OrderType::parse(&input.order_type) else {
            return self.reject(acct, order, "unsupported order type");
        };
        let Some(side) = OrderSide::parse(&input.side) else {
            return self.reject(acct, order, "unsupported side");
        };
        let Some(tif) = Tif::parse(&input.tif) else {
            return self.reject(acct, order, "unsupported tif");
        };
        if !(input.quantity.is_finite() && input.quantity > 0.0) {
            return self.reject(acct, order, "invalid quantity");
        }
        match order_type {
            OrderType::Limit if !price_ok(input.limit_price) => {
                return self.reject(acct, order, "invalid limit price");
            }
            OrderType::Stop if !price_ok(input.stop_price) => {
                return self.reject(acct, order, "invalid stop price");
            }
            OrderType::StopLimit
                if !(price_ok(input.limit_price) && price_ok(input.stop_price)) =>
            {
                return self.reject(acct, order, "invalid stop/limit prices");
            }
            _ => {}
        }
        if order_type == OrderType::Market && tif == Tif::Gtc {
            return self.reject(acct, order, "unsupported order type/tif combination");
        }

        // market hours
        if self.config.enforce_market_hours {
            let local = self.clock.now_local();
            if !calendar::is_market_open(
                local,
                self.config.market_open_hour,
                self.config.market_open_minute,
                self.config.market_close_hour,
                self.config.market_close_minute,
            ) {
                return self.reject(acct, order, "market closed");
            }
        }

        // symbol existence: first advancing quote
        let first_quote = match self.market_data.get_quote(&input.symbol) {
            Ok(q) => q,
            Err(_) => return self.reject(acct, order, "unknown symbol"),
        };

        // maintenance-margin guard
        if !bypass_margin {
            let m = self.metrics(acct);
            if m.equity < m.maintenance_required {
                return self.reject(acct, order, "margin deficiency: account below maintenance");
            }
        }

        // trigger evaluation against the first quote's mid
        let triggered = match order_type {
            OrderType::Market | OrderType::Limit => {
                order.trigger_state = Some(TriggerState::NotRequired);
                true
            }
            OrderType::Stop | OrderType::StopLimit => {
                let stop = input.stop_price.unwrap_or(f64::NAN);
                let hit = if side.is_buy() {
                    first_quote.mid >= stop
                } else {
                    first_quote.mid <= stop
                };
                if hit {
                    order.trigger_state = Some(match order_type {
                        OrderType::Stop => TriggerState::TriggeredToMarket,
                        _ => TriggerState::TriggeredToLimit,
                    });
                }
                hit
            }
        };
        if !triggered {
            return self.park(acct, order);
        }

        // execution delay, then the fill quote
        if self.config.execution_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.execution_delay_ms)).await;
        }
        let quote = match self.market_data.get_quote(&input.symbol) {
            Ok(q) => q,
            Err(_) => return self.reject(acct, order, "unknown symbol"),
        };
        let effective_type = match order_type {
            OrderType::Stop => OrderType::Market,
            OrderType::StopLimit => OrderType::Limit,
            other => other,
        };
        order.effective_type = Some(effective_type);

        // fill condition
        if effective_type == OrderType::Limit {
            let limit = input.limit_price.unwrap_or(f64::NAN);
            let marketable = if side.is_buy() {
                quote.ask <= limit
            } else {
                quote.bid >= limit
            };
            if !marketable {
                return self.park(acct, order);
            }
        }

        // slippage and fees
        let base_price = if side.is_buy() { quote.ask } else { quote.bid };
        let slippage_bps = self.slippage_bps(acct, input.quantity, quote.volatility_proxy);
        let signed = if side.is_buy() { 1.0 } else { -1.0 };
        let fill_price = round6(base_price * (1.0 + signed * slippage_bps / 10_000.0));
        let notional = round6(fill_price * input.quantity);
        let fees = round6(
            self.config.commission_per_trade + notional * self.config.fee_rate_bps / 10_000.0,
        );

        let exec_now = self.clock.now();
        let trade = TradeApplication {
            symbol: input.symbol.clone(),
            side,
            quantity: input.quantity,
            fill_price,
            notional,
            fees,
            settle_at: calendar::add_business_days(exec_now, self.config.settlement_days_equities),
        };

        // post-trade simulation on a deep copy of the account
        let mut sim = acct.clone();
        accounting::apply_trade(&mut sim, &trade);
        let sim_metrics = self.metrics(&sim);
        if sim_metrics.available_cash < 0.0 || sim_metrics.equity < sim_metrics.initial_required {
            return self.reject(acct, order, "insufficient available buying power / margin");
        }

        // apply and record
        accounting::apply_trade(acct, &trade);

        order.status = OrderStatus::Filled;
        order.filled_at = Some(exec_now);
        order.fill_price = Some(fill_price);
        order.fees = fees;

        let fill = Fill {
            id: rng::mint_id("FIL", exec_now.timestamp_millis(), &mut acct.rng),
            order_id: order.id.clone(),
            account_id: acct.id.clone(),
            symbol: input.symbol.clone(),
            side: input.side.clone(),
            quantity: input.quantity,
            price: fill_price,
            notional,
            fees,
            timestamp: exec_now,
        };
        info!(
            account_id = %acct.id,
            order_id = %order.id,
            symbol = %fill.symbol,
            side = %fill.side,
            quantity = fill.quantity,
            price = fill.price,
            "order filled"
        );
        acct.orders.insert(0, order.clone());
        acct.fills.insert(0, fill);

        self.refresh_account(acct, !bypass_margin).await;
        order
    }

    // -----------------------------------------------------------------------
    // Pipeline helpers
    // -----------------------------------------------------------------------

    fn reject(&self, acct: &mut Account, mut order: Order, reason: &str) -> Order {
        order.status = OrderStatus::Rejected;
        order.reason = Some(reason.to_string());
        debug!(account_id = %acct.id, order_id = %order.id, reason, "order rejected");
        acct.orders.insert(0, order.clone());
        order
    }

    /// Untriggered or unmarketable orders rest OPEN in the history.
    fn park(&self, acct: &mut Account, order: Order) -> Order {
        debug!(account_id = %acct.id, order_id = %order.id, "order parked open");
        acct.orders.insert(0, order.clone());
        order
    }

    /// `slippageBps = base + log10(1+qty)·sizeImpact + vol·10000·0.05 + u·random`
    /// where `u` is the account stream's next uniform draw.
    fn slippage_bps(&self, acct: &mut Account, quantity: f64, volatility_proxy: f64) -> f64 {
        let u: f64 = acct.rng.gen();
        self.config.base_slippage_bps
            + (1.0 + quantity).log10() * self.config.size_impact_bps
            + volatility_proxy * 10_000.0 * 0.05
            + u * self.config.random_slippage_bps
    }

    /// Mid marks for every held symbol, via non-advancing peeks.
    pub(crate) fn marks_for(&self, acct: &Account) -> MarkMap {
        acct.positions
            .keys()
            .map(|symbol| {
                let mid = self
                    .market_data
                    .peek_quote(symbol)
                    .map(|q| q.mid)
                    .unwrap_or(0.0);
                (symbol.clone(), mid)
            })
            .collect()
    }

    pub(crate) fn metrics(&self, acct: &Account) -> MarginMetrics {
        compute_metrics(acct, &self.marks_for(acct), &self.config)
    }
}
