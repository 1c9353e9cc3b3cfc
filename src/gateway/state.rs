use std::sync::Arc;

use crate::verifier::Verifier;

use super::middleware::RequestMetrics;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Verifier,

    pub request_metrics: Arc<RequestMetrics>,
}

impl AppState {
    pub fn new(verifier: Verifier) -> Self {
        Self {
            verifier,
            request_metrics: Arc::new(RequestMetrics::default()),
        }
    }
}
