use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{SinkError, SinkResult};
use super::metrics::{MetricsRecord, MetricsSink};
use super::report::{ErrorReport, ErrorReporter};

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingMetricsSink {
    records: Mutex<Vec<MetricsRecord>>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MetricsRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl MetricsSink for RecordingMetricsSink {
    async fn record(&self, record: MetricsRecord) -> SinkResult<()> {
        self.records.lock().push(record);
        Ok(())
    }
}

/// Rejects every write, counting attempts.
#[derive(Debug, Default)]
pub struct FailingMetricsSink {
    attempts: Mutex<usize>,
}

impl FailingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

#[async_trait]
impl MetricsSink for FailingMetricsSink {
    async fn record(&self, _record: MetricsRecord) -> SinkResult<()> {
        *self.attempts.lock() += 1;
        Err(SinkError::Unavailable("metrics store offline".to_string()))
    }
}

/// Keeps every captured report in memory.
#[derive(Debug, Default)]
pub struct RecordingErrorReporter {
    reports: Mutex<Vec<ErrorReport>>,
}

impl RecordingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl ErrorReporter for RecordingErrorReporter {
    fn capture(&self, report: ErrorReport) {
        self.reports.lock().push(report);
    }
}
