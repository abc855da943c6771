//! Periodic metric export.
//!
//! # Responsibilities
//! - Tick on a fixed interval, independent of request traffic
//! - Sample the host, drain the accumulator, post one record per metric
//! - Stop on shutdown after one last best-effort flush
//!
//! # Design Decisions
//! - The host is sampled before the accumulator is drained: a failed sample
//!   skips the tick without discarding the window, which rolls into the next
//! - Sends are spawned; a tick never waits for the backend
//! - Failures are logged locally and never retried

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};

use crate::config::MetricsConfig;
use crate::observability::metrics::MetricAccumulator;
use crate::observability::records::{metric_records, timestamp_ns, MetricRecord};
use crate::observability::sampler::{SamplerError, SystemSampler};
use crate::observability::transport::TelemetryClient;

pub struct TelemetryFlusher {
    metrics: Arc<MetricAccumulator>,
    sampler: Arc<dyn SystemSampler>,
    client: Option<TelemetryClient>,
    source: String,
    interval: Duration,
}

impl TelemetryFlusher {
    /// Build a flusher. With `config.enabled == false` ticks still drain the
    /// accumulator but nothing is posted.
    pub fn new(
        config: &MetricsConfig,
        timeout: Duration,
        metrics: Arc<MetricAccumulator>,
        sampler: Arc<dyn SystemSampler>,
    ) -> Self {
        let client = config
            .enabled
            .then(|| TelemetryClient::new(&config.url, &config.user_id, &config.api_key, timeout));

        Self {
            metrics,
            sampler,
            client,
            source: config.source.clone(),
            interval: Duration::from_secs(config.flush_interval_secs),
        }
    }

    /// Override the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sample the host and drain the current window into wire records.
    pub fn collect(&self) -> Result<Vec<MetricRecord>, SamplerError> {
        let system = self.sampler.sample()?;
        let counters = self.metrics.snapshot_and_reset();
        Ok(metric_records(&counters, &system, timestamp_ns()))
    }

    /// Run one tick, spawning the sends onto `tasks`.
    fn tick(&self, tasks: &mut JoinSet<()>) {
        let records = match self.collect() {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Skipping metrics flush");
                return;
            }
        };

        let Some(client) = &self.client else {
            tracing::debug!(records = records.len(), "Metrics push disabled, window dropped");
            return;
        };

        for record in records {
            let client = client.clone();
            let line = record.to_line(&self.source);
            tasks.spawn(async move {
                if let Err(e) = client.post(line, "text/plain").await {
                    tracing::warn!(metric = record.name, field = record.field, error = %e, "Failed to push metric");
                }
            });
        }
    }

    /// Tick until shutdown, then flush once more and wait for in-flight sends.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Telemetry flusher starting");

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(&mut in_flight);
                    // Reap finished sends so the set stays bounded.
                    while in_flight.try_join_next().is_some() {}
                }
                _ = shutdown.recv() => {
                    tracing::info!("Telemetry flusher received shutdown signal, flushing");
                    break;
                }
            }
        }

        self.tick(&mut in_flight);
        while in_flight.join_next().await.is_some() {}
        tracing::info!("Telemetry flusher stopped");
    }
}
