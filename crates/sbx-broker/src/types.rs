//! Order, fill, and settlement records plus the raw-input normalization.
//!
//! Orders retain the *normalized raw strings* for type/side/tif rather than
//! parsed enums: every early validation failure still appends a REJECTED
//! order to the account history, and that record must be able to carry
//! whatever unsupported token the caller sent. The execution pipeline parses
//! the strings into [`OrderType`]/[`OrderSide`]/[`Tif`] for its own logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

impl OrderType {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "MARKET" => Some(Self::Market),
            "LIMIT" => Some(Self::Limit),
            "STOP" => Some(Self::Stop),
            "STOP_LIMIT" => Some(Self::StopLimit),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
            Self::Stop => "STOP",
            Self::StopLimit => "STOP_LIMIT",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
    SellShort,
    BuyToCover,
}

impl OrderSide {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            "SELL_SHORT" => Some(Self::SellShort),
            "BUY_TO_COVER" => Some(Self::BuyToCover),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::SellShort => "SELL_SHORT",
            Self::BuyToCover => "BUY_TO_COVER",
        }
    }

    /// Buys and covers hit the ask and reserve cash; sells and shorts hit the
    /// bid and accrue unsettled proceeds.
    pub fn is_buy(self) -> bool {
        matches!(self, Self::Buy | Self::BuyToCover)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tif {
    Day,
    Gtc,
    Ioc,
}

impl Tif {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "DAY" => Some(Self::Day),
            "GTC" => Some(Self::Gtc),
            "IOC" => Some(Self::Ioc),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    Filled,
    Rejected,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Filled => "FILLED",
            Self::Rejected => "REJECTED",
            Self::Canceled => "CANCELED",
        }
    }
}

/// Trigger evaluation outcome carried on filled/parked orders.
///
/// `PendingLimit` is part of the wire vocabulary but the evaluator never
/// produces it; untriggered stop orders park with no trigger state at all.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerState {
    NotRequired,
    PendingLimit,
    TriggeredToMarket,
    TriggeredToLimit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettleDirection {
    Debit,
    Credit,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    /// Signed: positive = long, negative = short. Never zero (flat positions
    /// are deleted).
    pub quantity: f64,
    /// Weighted-average cost; > 0 whenever quantity != 0.
    pub avg_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    /// Normalized raw token; may be unsupported on REJECTED records.
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: String,
    pub tif: String,
    pub quantity: f64,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub status: OrderStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub filled_at: Option<DateTime<Utc>>,
    pub fill_price: Option<f64>,
    pub fees: f64,
    pub trigger_state: Option<TriggerState>,
    pub effective_type: Option<OrderType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub id: String,
    pub order_id: String,
    pub account_id: String,
    pub symbol: String,
    pub side: String,
    pub quantity: f64,
    pub price: f64,
    pub notional: f64,
    pub fees: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSettlement {
    pub amount: f64,
    pub direction: SettleDirection,
    pub settle_at: DateTime<Utc>,
    pub symbol: String,
}

// ---------------------------------------------------------------------------
// Raw order input + normalization
// ---------------------------------------------------------------------------

/// Raw order payload as submitted by a caller, before normalization.
///
/// Numeric fields are kept as loose JSON values and coerced the way trading
/// front ends actually submit them (numbers or numeric strings). Unknown
/// fields are ignored on deserialization, so internal flags such as the
/// liquidation margin bypass can never be injected from outside — the engine
/// takes that flag as a separate function parameter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrderInput {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, rename = "type")]
    pub order_type: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub tif: Option<String>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub limit_price: Option<Value>,
    #[serde(default)]
    pub stop_price: Option<Value>,
}

impl RawOrderInput {
    pub fn market(symbol: &str, side: &str, quantity: f64) -> Self {
        Self {
            symbol: Some(symbol.to_string()),
            order_type: Some("MARKET".to_string()),
            side: Some(side.to_string()),
            quantity: Some(Value::from(quantity)),
            ..Self::default()
        }
    }

    pub fn limit(symbol: &str, side: &str, quantity: f64, limit_price: f64) -> Self {
        Self {
            order_type: Some("LIMIT".to_string()),
            limit_price: Some(Value::from(limit_price)),
            ..Self::market(symbol, side, quantity)
        }
    }

    pub fn stop(symbol: &str, side: &str, quantity: f64, stop_price: f64) -> Self {
        Self {
            order_type: Some("STOP".to_string()),
            stop_price: Some(Value::from(stop_price)),
            ..Self::market(symbol, side, quantity)
        }
    }

    pub fn stop_limit(
        symbol: &str,
        side: &str,
        quantity: f64,
        stop_price: f64,
        limit_price: f64,
    ) -> Self {
        Self {
            order_type: Some("STOP_LIMIT".to_string()),
            stop_price: Some(Value::from(stop_price)),
            limit_price: Some(Value::from(limit_price)),
            ..Self::market(symbol, side, quantity)
        }
    }

    pub fn with_tif(mut self, tif: &str) -> Self {
        self.tif = Some(tif.to_string());
        self
    }
}

/// The caller's input after case-folding and numeric coercion.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedInput {
    pub symbol: String,
    pub order_type: String,
    pub side: String,
    pub tif: String,
    /// NaN when absent or uncoercible; rejected by quantity validation.
    pub quantity: f64,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
}

pub(crate) fn normalize(raw: &RawOrderInput) -> NormalizedInput {
    let upper = |s: &Option<String>| s.as_deref().unwrap_or("").trim().to_uppercase();

    let tif = match upper(&raw.tif) {
        t if t.is_empty() => "DAY".to_string(),
        t => t,
    };

    NormalizedInput {
        symbol: upper(&raw.symbol),
        order_type: upper(&raw.order_type),
        side: upper(&raw.side),
        tif,
        quantity: coerce_number(raw.quantity.as_ref()).unwrap_or(f64::NAN),
        limit_price: coerce_number(raw.limit_price.as_ref()),
        stop_price: coerce_number(raw.stop_price.as_ref()),
    }
}

/// JS-style numeric coercion: absent/null stays absent; numbers pass through;
/// numeric strings parse; anything else coerces to NaN and fails validation.
fn coerce_number(v: Option<&Value>) -> Option<f64> {
    match v {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(n.as_f64().unwrap_or(f64::NAN)),
        Some(Value::String(s)) => Some(s.trim().parse().unwrap_or(f64::NAN)),
        Some(_) => Some(f64::NAN),
    }
}

/// A price is usable when present, finite, and strictly positive.
pub(crate) fn price_ok(p: Option<f64>) -> bool {
    matches!(p, Some(x) if x.is_finite() && x > 0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_tokens_round_trip() {
        assert_eq!(OrderType::parse("STOP_LIMIT"), Some(OrderType::StopLimit));
        assert_eq!(OrderType::StopLimit.as_str(), "STOP_LIMIT");
        assert_eq!(OrderSide::parse("BUY_TO_COVER"), Some(OrderSide::BuyToCover));
        assert_eq!(Tif::parse("GTC"), Some(Tif::Gtc));
        assert_eq!(OrderType::parse("TRAILING_STOP"), None);
        assert_eq!(OrderSide::parse(""), None);
    }

    #[test]
    fn buy_side_classification() {
        assert!(OrderSide::Buy.is_buy());
        assert!(OrderSide::BuyToCover.is_buy());
        assert!(!OrderSide::Sell.is_buy());
        assert!(!OrderSide::SellShort.is_buy());
    }

    #[test]
    fn normalize_upper_cases_and_defaults_tif() {
        let raw = RawOrderInput {
            symbol: Some("aapl".to_string()),
            order_type: Some("market".to_string()),
            side: Some("buy".to_string()),
            tif: None,
            quantity: Some(Value::from(5)),
            ..RawOrderInput::default()
        };
        let n = normalize(&raw);
        assert_eq!(n.symbol, "AAPL");
        assert_eq!(n.order_type, "MARKET");
        assert_eq!(n.side, "BUY");
        assert_eq!(n.tif, "DAY");
        assert_eq!(n.quantity, 5.0);
    }

    #[test]
    fn normalize_coerces_numeric_strings() {
        let raw = RawOrderInput {
            quantity: Some(Value::from("12.5")),
            limit_price: Some(Value::from(" 187.25 ")),
            ..RawOrderInput::default()
        };
        let n = normalize(&raw);
        assert_eq!(n.quantity, 12.5);
        assert_eq!(n.limit_price, Some(187.25));
        assert_eq!(n.stop_price, None);
    }

    #[test]
    fn normalize_garbage_quantity_becomes_nan() {
        let raw = RawOrderInput {
            quantity: Some(Value::from("a lot")),
            ..RawOrderInput::default()
        };
        assert!(normalize(&raw).quantity.is_nan());
    }

    #[test]
    fn absent_quantity_is_nan() {
        assert!(normalize(&RawOrderInput::default()).quantity.is_nan());
    }

    #[test]
    fn price_ok_rules() {
        assert!(price_ok(Some(1.0)));
        assert!(!price_ok(Some(0.0)));
        assert!(!price_ok(Some(-1.0)));
        assert!(!price_ok(Some(f64::NAN)));
        assert!(!price_ok(Some(f64::INFINITY)));
        assert!(!price_ok(None));
    }

    #[test]
    fn raw_input_ignores_unknown_fields() {
        // The internal margin-bypass flag cannot be injected from outside.
        let body = r#"{"symbol":"AAPL","type":"MARKET","side":"BUY","quantity":5,
                       "_bypassMarginCheck":true}"#;
        let raw: RawOrderInput = serde_json::from_str(body).unwrap();
        let n = normalize(&raw);
        assert_eq!(n.symbol, "AAPL");
        assert_eq!(n.quantity, 5.0);
    }

    #[test]
    fn order_serializes_with_wire_field_names() {
        let order = Order {
            id: "ORD-1-aaaa".to_string(),
            account_id: "ACC-1-bbbb".to_string(),
            symbol: "AAPL".to_string(),
            order_type: "LIMIT".to_string(),
            side: "BUY".to_string(),
            tif: "DAY".to_string(),
            quantity: 5.0,
            limit_price: Some(180.0),
            stop_price: None,
            status: OrderStatus::Open,
            reason: None,
            created_at: chrono::Utc::now(),
            filled_at: None,
            fill_price: None,
            fees: 0.0,
            trigger_state: Some(TriggerState::NotRequired),
            effective_type: Some(OrderType::Limit),
        };
        let v = serde_json::to_value(&order).unwrap();
        assert_eq!(v["type"], "LIMIT");
        assert_eq!(v["accountId"], "ACC-1-bbbb");
        assert_eq!(v["limitPrice"], 180.0);
        assert_eq!(v["status"], "OPEN");
        assert_eq!(v["triggerState"], "NOT_REQUIRED");
        assert_eq!(v["effectiveType"], "LIMIT");
    }
}
