//! Axum router and all HTTP handlers for sbx-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.
//!
//! Error mapping: REJECTED orders come back as 400 **with the full order
//! record** so callers can audit the reason; unknown accounts are 404;
//! unknown symbols on the quote endpoint are 404.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use sbx_broker::{BrokerError, OrderStatus, RawOrderInput};

use crate::api_types::{
    CreateAccountRequest, CreateAccountResponse, ErrorResponse, HealthResponse, OrdersQuery,
    QuoteQuery,
};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/:id", get(account))
        .route("/accounts/:id/positions", get(positions))
        .route("/accounts/:id/orders", post(place_order).get(orders))
        .route("/accounts/:id/fills", get(fills))
        .route("/quotes", get(quotes))
        .route("/actuator/health", get(health))
        .with_state(state)
}

fn broker_error_response(err: BrokerError) -> Response {
    let status = match err {
        BrokerError::UnknownAccount { .. } => StatusCode::NOT_FOUND,
        BrokerError::InvalidInitialCapital { .. } => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// POST /accounts
// ---------------------------------------------------------------------------

pub(crate) async fn create_account(
    State(st): State<Arc<AppState>>,
    Json(body): Json<CreateAccountRequest>,
) -> Response {
    match st.broker.create_account(body.initial_capital).await {
        Ok(id) => {
            info!(account_id = %id, "account opened via api");
            (StatusCode::CREATED, Json(CreateAccountResponse { id })).into_response()
        }
        Err(err) => broker_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// GET /accounts/:id
// ---------------------------------------------------------------------------

pub(crate) async fn account(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match st.broker.get_account(&id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => broker_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// GET /accounts/:id/positions
// ---------------------------------------------------------------------------

pub(crate) async fn positions(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match st.broker.get_positions(&id).await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => broker_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// POST /accounts/:id/orders
// ---------------------------------------------------------------------------

/// Place an order. Non-rejected orders (FILLED or parked OPEN) return 201;
/// rejections return 400 with the recorded order as the body.
pub(crate) async fn place_order(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(raw): Json<RawOrderInput>,
) -> Response {
    match st.broker.place_order(&id, raw).await {
        Ok(order) if order.status == OrderStatus::Rejected => {
            (StatusCode::BAD_REQUEST, Json(order)).into_response()
        }
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(err) => broker_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// GET /accounts/:id/orders?status=…
// ---------------------------------------------------------------------------

pub(crate) async fn orders(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<OrdersQuery>,
) -> Response {
    match st.broker.get_orders(&id, query.status.as_deref()).await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(err) => broker_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// GET /accounts/:id/fills
// ---------------------------------------------------------------------------

pub(crate) async fn fills(State(st): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match st.broker.get_fills(&id).await {
        Ok(fills) => (StatusCode::OK, Json(fills)).into_response(),
        Err(err) => broker_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// GET /quotes?symbol=…
// ---------------------------------------------------------------------------

pub(crate) async fn quotes(
    State(st): State<Arc<AppState>>,
    Query(query): Query<QuoteQuery>,
) -> Response {
    match st.broker.quote(&query.symbol) {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(err) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /actuator/health
// ---------------------------------------------------------------------------

pub(crate) async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "UP" }))
}
