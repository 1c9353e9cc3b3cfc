use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::constants::VERACITY_STATUS_HEADER;
use crate::verifier::VerifierError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid options: {0}")]
    InvalidOptions(#[from] VerifierError),
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, veracity_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::InvalidOptions(_) => (StatusCode::BAD_REQUEST, "invalid_options"),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            VERACITY_STATUS_HEADER,
            HeaderValue::from_static(veracity_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
