//! HTTP gateway (Axum) over the verifier.
//!
//! This module is primarily used by the `veracity` server binary.

pub mod error;
pub mod handler;
pub mod middleware;
pub mod state;


use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{stats_handler, verify_batch_handler, verify_handler};
pub use state::AppState;

use crate::constants::VERACITY_STATUS_HEADER;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/v1/stats", get(stats_handler))
        .route("/v1/verify", post(verify_handler))
        .route("/v1/verify/batch", post(verify_batch_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(VERACITY_STATUS_HEADER, HeaderValue::from_static("healthy"));

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}
