//! Observability module - structured logging and Prometheus metrics
//!
//! Logging goes through `tracing` with an `EnvFilter` (`RUST_LOG` wins over the
//! configured level). Worker metrics live in a dedicated Prometheus registry
//! so several workers can run in one process (and in tests) without
//! colliding on the global registry.
//!
//! # Usage
//! ```no_run
//! use launch_guard::observability::{init_logging, WorkerMetrics};
//!
//! init_logging("info").expect("logging initialised once");
//! let metrics = WorkerMetrics::new().unwrap();
//! println!("{}", metrics.render());
//! ```

use crate::rules::VerificationStatus;
use anyhow::{Context, Result};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `default_level` applies when `RUST_LOG` is not set. Logs go to stderr so
/// stdout stays free for command output.
pub fn init_logging(default_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

/// Counters and timings of the verification worker
#[derive(Clone)]
pub struct WorkerMetrics {
    registry: Registry,
    reports_total: IntCounterVec,
    evaluation_failures_total: IntCounter,
    cycles_total: IntCounter,
    last_batch_size: IntGauge,
    cycle_duration_seconds: Histogram,
}

impl WorkerMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let reports_total = IntCounterVec::new(
            Opts::new(
                "launch_guard_reports_total",
                "Verification reports generated, by overall status",
            ),
            &["status"],
        )?;
        let evaluation_failures_total = IntCounter::new(
            "launch_guard_evaluation_failures_total",
            "Launches whose evaluation or storage failed",
        )?;
        let cycles_total = IntCounter::new(
            "launch_guard_cycles_total",
            "Completed worker cycles",
        )?;
        let last_batch_size = IntGauge::new(
            "launch_guard_last_batch_size",
            "Launches picked up by the last cycle",
        )?;
        let cycle_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "launch_guard_cycle_duration_seconds",
            "Wall time of one worker cycle",
        ))?;

        registry.register(Box::new(reports_total.clone()))?;
        registry.register(Box::new(evaluation_failures_total.clone()))?;
        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(last_batch_size.clone()))?;
        registry.register(Box::new(cycle_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            reports_total,
            evaluation_failures_total,
            cycles_total,
            last_batch_size,
            cycle_duration_seconds,
        })
    }

    pub fn record_report(&self, status: VerificationStatus) {
        self.reports_total
            .with_label_values(&[status.as_str()])
            .inc();
    }

    pub fn record_failure(&self) {
        self.evaluation_failures_total.inc();
    }

    pub fn record_cycle(&self, batch_size: usize, elapsed_secs: f64) {
        self.cycles_total.inc();
        self.last_batch_size.set(batch_size as i64);
        self.cycle_duration_seconds.observe(elapsed_secs);
    }

    pub fn reports(&self, status: VerificationStatus) -> u64 {
        self.reports_total
            .with_label_values(&[status.as_str()])
            .get()
    }

    pub fn failures(&self) -> u64 {
        self.evaluation_failures_total.get()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles_total.get()
    }

    /// Prometheus text exposition of every worker metric
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}
