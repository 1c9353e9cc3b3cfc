use std::error::Error as StdError;
use std::io;

use thiserror::Error;

pub const CODE_CONNECTION_RESET: &str = "ECONNRESET";
pub const CODE_TIMED_OUT: &str = "ETIMEDOUT";
pub const CODE_CONNECTION_REFUSED: &str = "ECONNREFUSED";
pub const CODE_DNS_FAILURE: &str = "ENOTFOUND";

/// Transport or HTTP failure from a completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    /// HTTP status, when the endpoint answered.
    pub status: Option<u16>,
    /// Transport error code (`ECONNRESET`, `ETIMEDOUT`, ...) or provider error code.
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code: None,
            message: message.into(),
        }
    }

    pub fn transport(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: Some(code.to_string()),
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::transport(CODE_TIMED_OUT, message)
    }

    /// Short label used in result metadata.
    pub fn kind(&self) -> &'static str {
        match (self.status, self.code.as_deref()) {
            (Some(_), _) => "http",
            (None, Some(_)) => "transport",
            (None, None) => "provider",
        }
    }

    /// Maps a `reqwest` failure, walking the source chain for a transport code.
    pub fn from_reqwest(provider: &str, err: &reqwest::Error) -> Self {
        let message = format!("{} request failed: {}", provider, describe_chain(err));

        if let Some(status) = err.status() {
            return Self::http(status.as_u16(), message);
        }
        if err.is_timeout() {
            return Self::timeout(message);
        }

        match transport_code(err) {
            Some(code) => Self::transport(code, message),
            None if err.is_connect() => Self::transport(CODE_CONNECTION_REFUSED, message),
            None => Self::new(message),
        }
    }
}

fn transport_code(err: &(dyn StdError + 'static)) -> Option<&'static str> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                    return Some(CODE_CONNECTION_RESET);
                }
                io::ErrorKind::ConnectionRefused => return Some(CODE_CONNECTION_REFUSED),
                io::ErrorKind::TimedOut => return Some(CODE_TIMED_OUT),
                _ => {}
            }
        }
        let text = e.to_string().to_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return Some(CODE_DNS_FAILURE);
        }
        current = e.source();
    }
    None
}

fn describe_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        let text = e.to_string();
        if !parts.contains(&text) {
            parts.push(text);
        }
        current = e.source();
    }
    parts.join(": ")
}
