//! Wire records sent to the telemetry backend.
//!
//! Metrics travel as one line-protocol record each:
//! `name,source=<id>[,method=<m>] field=<value> <timestamp-ns>`.
//! Logs travel as a streams envelope carrying one `[timestamp, line]` pair.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::observability::metrics::MetricCounterSet;
use crate::observability::sampler::SystemSample;

/// Nanoseconds since the epoch at whole-second resolution.
pub fn timestamp_ns() -> u128 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    u128::from(secs) * 1_000_000_000
}

/// Numeric value of a metric record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Count(u64),
    Gauge(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{n}"),
            MetricValue::Gauge(v) => write!(f, "{v}"),
        }
    }
}

/// One metric for one flush tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub name: &'static str,
    pub method: Option<&'static str>,
    pub field: &'static str,
    pub value: MetricValue,
    pub timestamp_ns: u128,
}

impl MetricRecord {
    fn new(name: &'static str, field: &'static str, value: MetricValue, timestamp_ns: u128) -> Self {
        Self { name, method: None, field, value, timestamp_ns }
    }

    fn with_method(mut self, method: &'static str) -> Self {
        self.method = Some(method);
        self
    }

    /// Render as a line-protocol record labelled with `source`.
    pub fn to_line(&self, source: &str) -> String {
        let mut line = format!("{},source={}", self.name, source);
        if let Some(method) = self.method {
            line.push_str(",method=");
            line.push_str(method);
        }
        format!("{line} {}={} {}", self.field, self.value, self.timestamp_ns)
    }
}

/// Expand a counter window and host sample into one record per metric.
pub fn metric_records(
    counters: &MetricCounterSet,
    system: &SystemSample,
    timestamp_ns: u128,
) -> Vec<MetricRecord> {
    use MetricValue::{Count, Gauge};

    let http = &counters.http;
    let record = |name, field, value| MetricRecord::new(name, field, value, timestamp_ns);

    vec![
        record("request", "total", Count(http.total)).with_method("all"),
        record("request", "total", Count(http.get)).with_method("get"),
        record("request", "total", Count(http.put)).with_method("put"),
        record("request", "total", Count(http.post)).with_method("post"),
        record("request", "total", Count(http.delete)).with_method("delete"),
        record("request", "total", Count(http.unknown)).with_method("unknown"),
        record("auth", "success", Count(counters.auth.successes)),
        record("auth", "failure", Count(counters.auth.failures)),
        record("user", "active", Count(counters.users.count())),
        record("pizza", "sold", Count(counters.pizza.creation_successes)),
        record("pizza", "creation_failures", Count(counters.pizza.creation_failures)),
        record("pizza", "revenue", Gauge(counters.pizza.revenue)),
        record("latency", "service", Gauge(counters.latency.service_avg_ms())),
        record("latency", "pizza_creation", Gauge(counters.latency.pizza_creation_avg_ms())),
        record("system", "cpu", Gauge(system.cpu_usage_percent)),
        record("system", "memory", Gauge(system.memory_usage_percent)),
    ]
}

/// Labels of a log stream.
#[derive(Debug, Clone, Serialize)]
pub struct StreamLabels<'a> {
    pub component: &'a str,
    pub level: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
}

#[derive(Debug, Serialize)]
struct Stream<'a> {
    stream: StreamLabels<'a>,
    values: [[String; 2]; 1],
}

/// Streams envelope carrying a single log line.
#[derive(Debug, Serialize)]
pub struct LogEnvelope<'a> {
    streams: [Stream<'a>; 1],
}

impl<'a> LogEnvelope<'a> {
    pub fn new(labels: StreamLabels<'a>, timestamp_ns: u128, line: String) -> Self {
        Self {
            streams: [Stream {
                stream: labels,
                values: [[timestamp_ns.to_string(), line]],
            }],
        }
    }
}
