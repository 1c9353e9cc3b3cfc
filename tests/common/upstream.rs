//! Scripted HTTP stand-in for a completion provider.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

#[derive(Default)]
struct StubState {
    replies: Mutex<VecDeque<(u16, Value)>>,
    fallback: Mutex<Option<(u16, Value)>>,
    delay: Mutex<Option<Duration>>,
    requests: Mutex<Vec<CapturedRequest>>,
}

/// Answers every request with the next scripted reply, then the fallback (or 500).
pub struct StubUpstream {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubUpstream {
    pub async fn spawn() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .fallback(capture)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub upstream");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn reply(&self, status: u16, body: Value) -> &Self {
        self.state.replies.lock().push_back((status, body));
        self
    }

    pub fn always(&self, status: u16, body: Value) -> &Self {
        *self.state.fallback.lock() = Some((status, body));
        self
    }

    pub fn delay(&self, delay: Duration) -> &Self {
        *self.state.delay.lock() = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }
}

async fn capture(
    State(state): State<Arc<StubState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let captured = CapturedRequest {
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    state.requests.lock().push(captured);

    let delay = *state.delay.lock();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let next = state.replies.lock().pop_front();
    let (status, body) = next
        .or_else(|| state.fallback.lock().clone())
        .unwrap_or((500, serde_json::json!({"error": {"message": "no scripted reply"}})));

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

/// An address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway port");
    let addr = listener.local_addr().expect("throwaway address");
    drop(listener);
    format!("http://{}", addr)
}
