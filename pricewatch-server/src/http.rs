//! Pricewatch HTTP REST API
//!
//! Axum server exposing the same operations as the Unix socket IPC channel.
//! Each endpoint is a thin axum handler over a plain inner function, so the
//! inner functions can be tested without going through axum dispatch.
//!
//! Endpoints:
//! - GET  /health       — service status
//! - GET  /version      — server version info
//! - POST /items        — menu items visible to the current session
//! - POST /restaurants  — restaurant listing
//! - GET  /updates      — last price update events, newest first
//! - GET  /session      — current session, if any
//! - POST /login        — demo login
//! - POST /logout       — clear the session
//! - POST /connections  — connect or disconnect one platform
//! - POST /tick         — run one price tick now

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use pricewatch_core::ipc::PriceRequest;
use pricewatch_core::{Platform, PricewatchError, SortOrder};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::router;
use crate::state::SharedState;

/// Build the Axum router with all endpoints
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/items", post(items_handler))
        .route("/restaurants", post(restaurants_handler))
        .route("/updates", get(updates_handler))
        .route("/session", get(session_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/connections", post(connections_handler))
        .route("/tick", post(tick_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: SharedState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Pricewatch HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ItemsRequest {
    pub query: Option<String>,
    pub sort: Option<SortOrder>,
    pub platforms: Option<Vec<Platform>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RestaurantsRequest {
    pub query: Option<String>,
    pub platforms: Option<Vec<Platform>>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub platform: String,
}

#[derive(Debug, Deserialize)]
pub struct ConnectionRequest {
    pub platform: String,
    pub connected: bool,
}

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            status: "error".to_string(),
        }
    }
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "pricewatch/1",
    })
}

pub async fn health_inner(state: &SharedState) -> (StatusCode, serde_json::Value) {
    let (status, mut body) = run(state, PriceRequest::Health).await;
    if let Some(obj) = body.as_object_mut() {
        obj.insert("version".to_string(), serde_json::json!(env!("CARGO_PKG_VERSION")));
        obj.insert(
            "socket".to_string(),
            serde_json::json!(state.config.service.socket_path),
        );
    }
    (status, body)
}

pub async fn items_inner(
    state: &SharedState,
    req: ItemsRequest,
) -> (StatusCode, serde_json::Value) {
    let query = req.query.filter(|q| !q.trim().is_empty());
    run(
        state,
        PriceRequest::Items {
            query,
            sort: req.sort,
            platforms: req.platforms,
        },
    )
    .await
}

pub async fn restaurants_inner(
    state: &SharedState,
    req: RestaurantsRequest,
) -> (StatusCode, serde_json::Value) {
    let query = req.query.filter(|q| !q.trim().is_empty());
    run(
        state,
        PriceRequest::Restaurants {
            query,
            platforms: req.platforms,
        },
    )
    .await
}

pub async fn login_inner(
    state: &SharedState,
    req: LoginRequest,
) -> (StatusCode, serde_json::Value) {
    run(
        state,
        PriceRequest::Login {
            email: req.email,
            password: req.password,
            platform: req.platform,
        },
    )
    .await
}

pub async fn connections_inner(
    state: &SharedState,
    req: ConnectionRequest,
) -> (StatusCode, serde_json::Value) {
    let request = if req.connected {
        PriceRequest::Connect {
            platform: req.platform,
        }
    } else {
        PriceRequest::Disconnect {
            platform: req.platform,
        }
    };
    run(state, request).await
}

/// Dispatch through the router and map the outcome to an HTTP status.
pub async fn run(state: &SharedState, request: PriceRequest) -> (StatusCode, serde_json::Value) {
    match router::dispatch(request, state).await {
        Ok(data) => (StatusCode::OK, data),
        Err(e) => error_body(&e),
    }
}

pub fn error_body(e: &PricewatchError) -> (StatusCode, serde_json::Value) {
    let status = match e {
        PricewatchError::Session(pricewatch_core::SessionError::NotLoggedIn) => {
            StatusCode::UNAUTHORIZED
        }
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        PricewatchError::Feed(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    }
    let body = serde_json::to_value(ErrorResponse::new(e.to_string()))
        .unwrap_or_else(|_| serde_json::json!({"status": "error"}));
    (status, body)
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn items_handler(
    State(state): State<SharedState>,
    Json(req): Json<ItemsRequest>,
) -> impl IntoResponse {
    let (status, body) = items_inner(&state, req).await;
    (status, Json(body))
}

pub async fn restaurants_handler(
    State(state): State<SharedState>,
    Json(req): Json<RestaurantsRequest>,
) -> impl IntoResponse {
    let (status, body) = restaurants_inner(&state, req).await;
    (status, Json(body))
}

pub async fn updates_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let (status, body) = run(&state, PriceRequest::Updates).await;
    (status, Json(body))
}

pub async fn session_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let (status, body) = run(&state, PriceRequest::Session).await;
    (status, Json(body))
}

pub async fn login_handler(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let (status, body) = login_inner(&state, req).await;
    (status, Json(body))
}

pub async fn logout_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let (status, body) = run(&state, PriceRequest::Logout).await;
    (status, Json(body))
}

pub async fn connections_handler(
    State(state): State<SharedState>,
    Json(req): Json<ConnectionRequest>,
) -> impl IntoResponse {
    let (status, body) = connections_inner(&state, req).await;
    (status, Json(body))
}

pub async fn tick_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let (status, body) = run(&state, PriceRequest::Tick).await;
    (status, Json(body))
}
