//! Observability sinks the verifier writes to.
//!
//! Both capabilities are injected, so tests swap in recording fakes and production picks a
//! backend from [`Config`](crate::config::Config).

pub mod error;
pub mod metrics;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod report;


use std::sync::Arc;

pub use error::{SinkError, SinkResult};
pub use metrics::{JsonlMetricsSink, MetricsRecord, MetricsSink, NoopMetricsSink, TracingMetricsSink};
#[cfg(any(test, feature = "mock"))]
pub use mock::{FailingMetricsSink, RecordingErrorReporter, RecordingMetricsSink};
pub use report::{ErrorReport, ErrorReporter, NoopErrorReporter, TracingErrorReporter};

use crate::config::Config;

/// JSON-lines file when `metrics_path` is set, otherwise structured logs.
pub fn metrics_sink_from_config(config: &Config) -> Arc<dyn MetricsSink> {
    match &config.metrics_path {
        Some(path) => Arc::new(JsonlMetricsSink::new(path.clone())),
        None => Arc::new(TracingMetricsSink),
    }
}

pub fn error_reporter_from_config(config: &Config) -> Arc<dyn ErrorReporter> {
    if config.error_reporting_enabled {
        Arc::new(TracingErrorReporter)
    } else {
        Arc::new(NoopErrorReporter)
    }
}
