use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::error;

/// A captured failure. Tags and extras travel with the report rather than through ambient scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub message: String,
    pub tags: BTreeMap<String, String>,
    pub extras: Value,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tags: BTreeMap::new(),
            extras: Value::Null,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_extras(mut self, extras: Value) -> Self {
        self.extras = extras;
        self
    }
}

/// Fire-and-forget error capture. Implementations must not block or fail the caller.
pub trait ErrorReporter: Send + Sync {
    fn capture(&self, report: ErrorReport);
}

/// Logs reports at `error` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn capture(&self, report: ErrorReport) {
        let tags = serde_json::to_string(&report.tags).unwrap_or_default();
        error!(
            target: "veracity::errors",
            tags = %tags,
            extras = %report.extras,
            "{}",
            report.message
        );
    }
}

/// Drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopErrorReporter;

impl ErrorReporter for NoopErrorReporter {
    fn capture(&self, _report: ErrorReport) {}
}
