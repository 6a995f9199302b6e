//! Request and response types for the sbx-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded by
//! Axum and decoded by tests. Order/fill/account bodies reuse the broker's
//! own wire types; only the façade-specific envelopes live here.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// POST /accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Must be finite and strictly positive.
    #[serde(default)]
    pub initial_capital: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersQuery {
    /// Optional case-insensitive status filter.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteQuery {
    pub symbol: String,
}

// ---------------------------------------------------------------------------
// Errors and health
// ---------------------------------------------------------------------------

/// Uniform error envelope for 4xx responses that carry no order record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `GET /actuator/health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
