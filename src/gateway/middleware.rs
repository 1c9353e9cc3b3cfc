//! Per-request duration/status accounting for the verification endpoints.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tokio::time::Instant;
use tracing::info;

use super::state::AppState;

/// Running totals over every request the gateway served.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    requests: AtomicU64,
    errors: AtomicU64,
    total_duration_ms: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub average_duration_ms: f64,
}

impl RequestMetrics {
    pub fn observe(&self, status: u16, duration_ms: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.total_duration_ms
            .fetch_add(duration_ms, Ordering::Relaxed);
        if status >= 400 {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> RequestMetricsSnapshot {
        let requests = self.requests.load(Ordering::Relaxed);
        let total = self.total_duration_ms.load(Ordering::Relaxed);
        RequestMetricsSnapshot {
            requests,
            errors: self.errors.load(Ordering::Relaxed),
            average_duration_ms: if requests == 0 {
                0.0
            } else {
                total as f64 / requests as f64
            },
        }
    }
}

pub async fn request_metrics(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let endpoint = request.uri().path().to_string();
    let method = request.method().clone();

    let response = next.run(request).await;

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = response.status().as_u16();
    state.request_metrics.observe(status, duration_ms);

    info!(
        target: "veracity::http",
        endpoint = %endpoint,
        method = %method,
        status,
        duration_ms,
        "Request completed"
    );

    response
}
