//! Append-only metrics sinks.
//!
//! `TracingMetricsSink` logs records, `JsonlMetricsSink` appends them to a file, and
//! `NoopMetricsSink` drops them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use super::error::SinkResult;

/// One verification outcome as written to the metrics store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub operation: String,
    pub execution_time_ms: u64,
    pub tokens_used: u64,
    pub cost: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub metadata: Value,
    pub timestamp: DateTime<Utc>,
}

/// Append-only write interface for verification metrics. Must tolerate concurrent writers.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn record(&self, record: MetricsRecord) -> SinkResult<()>;
}

/// Emits each record as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetricsSink;

#[async_trait]
impl MetricsSink for TracingMetricsSink {
    async fn record(&self, record: MetricsRecord) -> SinkResult<()> {
        info!(
            target: "veracity::metrics",
            operation = %record.operation,
            execution_time_ms = record.execution_time_ms,
            tokens_used = record.tokens_used,
            cost = record.cost,
            success = record.success,
            error = record.error_message.as_deref().unwrap_or(""),
            metadata = %record.metadata,
            "verification recorded"
        );
        Ok(())
    }
}

/// Appends each record as one JSON line. Writes are serialized so lines never interleave.
#[derive(Debug)]
pub struct JsonlMetricsSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlMetricsSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricsSink for JsonlMetricsSink {
    async fn record(&self, record: MetricsRecord) -> SinkResult<()> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

#[async_trait]
impl MetricsSink for NoopMetricsSink {
    async fn record(&self, _record: MetricsRecord) -> SinkResult<()> {
        Ok(())
    }
}
