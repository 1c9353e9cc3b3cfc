use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::constants::VERACITY_STATUS_HEADER;
use crate::model::{VerificationOptions, VerificationResult};
use crate::verifier::VerifierStats;

use super::error::GatewayError;
use super::middleware::RequestMetricsSnapshot;
use super::state::AppState;

pub const STATUS_VALID: &str = "valid";
pub const STATUS_INVALID: &str = "invalid";
pub const STATUS_ERROR: &str = "error";
pub const STATUS_COMPLETE: &str = "complete";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub content: String,
    #[serde(default)]
    pub options: VerificationOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchVerifyRequest {
    pub contents: Vec<String>,
    #[serde(default)]
    pub options: VerificationOptions,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub verifier: VerifierStats,
    pub requests: RequestMetricsSnapshot,
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, GatewayError> {
    serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))
}

fn with_status(status: &'static str, body: impl IntoResponse) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(VERACITY_STATUS_HEADER, HeaderValue::from_static(status));
    (StatusCode::OK, headers, body).into_response()
}

fn result_status(result: &VerificationResult) -> &'static str {
    if result.is_error() {
        STATUS_ERROR
    } else if result.is_valid {
        STATUS_VALID
    } else {
        STATUS_INVALID
    }
}

#[instrument(skip(state, body), fields(content_len = tracing::field::Empty))]
pub async fn verify_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, GatewayError> {
    let request: VerifyRequest = parse_body(body)?;
    if request.content.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "content must not be empty".to_string(),
        ));
    }
    tracing::Span::current().record("content_len", request.content.len());

    let result = state
        .verifier
        .verify(&request.content, &request.options)
        .await?;

    debug!(
        is_valid = result.is_valid,
        confidence = result.confidence,
        "Verification served"
    );
    Ok(with_status(result_status(&result), Json(result)))
}

#[instrument(skip(state, body), fields(total = tracing::field::Empty))]
pub async fn verify_batch_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, GatewayError> {
    let request: BatchVerifyRequest = parse_body(body)?;
    if request.contents.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "contents must not be empty".to_string(),
        ));
    }
    tracing::Span::current().record("total", request.contents.len());

    let batch = state
        .verifier
        .verify_batch(&request.contents, &request.options)
        .await?;

    Ok(with_status(STATUS_COMPLETE, Json(batch)))
}

#[instrument(skip(state))]
pub async fn stats_handler(State(state): State<AppState>) -> Response {
    let stats = StatsResponse {
        verifier: state.verifier.stats(),
        requests: state.request_metrics.snapshot(),
    };
    Json(stats).into_response()
}
