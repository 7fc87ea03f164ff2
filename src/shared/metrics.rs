//! Prometheus Metrics Module
//!
//! Counters and gauges for the price index service.
//!
//! ## Metric types
//! - **Counter**: level transitions, no-op transitions, nearest searches,
//!   rejected prices, commands
//! - **Histogram**: command latency
//! - **Gauge**: active levels per side
//!
//! ## Usage
//! ```rust,ignore
//! use price_index::shared::metrics::METRICS;
//!
//! METRICS.level_transitions_total.with_label_values(&["bid", "insert"]).inc();
//!
//! let timer = METRICS.command_duration.with_label_values(&["insert"]).start_timer();
//! // ... apply command ...
//! timer.observe_duration();
//! ```

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder,
    GaugeVec, HistogramVec, TextEncoder,
};

lazy_static! {
    /// Global metrics instance
    pub static ref METRICS: Metrics = Metrics::new();
}

/// Price index metrics
pub struct Metrics {
    /// Levels activated/deactivated (by side, kind)
    pub level_transitions_total: CounterVec,

    /// Inserts of active levels and removes of inactive ones (by side, kind)
    pub noop_transitions_total: CounterVec,

    /// Nearest-price searches (by direction, outcome)
    pub nearest_searches_total: CounterVec,

    /// Prices rejected at the bounds check (by reason)
    pub rejected_prices_total: CounterVec,

    /// Commands applied (by op)
    pub commands_total: CounterVec,

    /// Command latency in seconds (by op)
    pub command_duration: HistogramVec,

    /// Active price levels (by side)
    pub active_levels: GaugeVec,
}

impl Metrics {
    /// Registers every metric with the default registry
    pub fn new() -> Self {
        Self {
            level_transitions_total: register_counter_vec!(
                "price_index_level_transitions_total",
                "Price levels activated or deactivated",
                &["side", "kind"]
            )
            .unwrap(),

            noop_transitions_total: register_counter_vec!(
                "price_index_noop_transitions_total",
                "Insert of an active level or remove of an inactive level",
                &["side", "kind"]
            )
            .unwrap(),

            nearest_searches_total: register_counter_vec!(
                "price_index_nearest_searches_total",
                "Nearest-price searches",
                &["direction", "outcome"]
            )
            .unwrap(),

            rejected_prices_total: register_counter_vec!(
                "price_index_rejected_prices_total",
                "Prices rejected as outside the book's domain",
                &["reason"]
            )
            .unwrap(),

            commands_total: register_counter_vec!(
                "price_index_commands_total",
                "Commands applied by the index service",
                &["op"]
            )
            .unwrap(),

            command_duration: register_histogram_vec!(
                "price_index_command_duration_seconds",
                "Command latency in seconds",
                &["op"],
                vec![1e-7, 5e-7, 1e-6, 5e-6, 1e-5, 5e-5, 1e-4, 1e-3]
            )
            .unwrap(),

            active_levels: register_gauge_vec!(
                "price_index_active_levels",
                "Active price levels",
                &["side"]
            )
            .unwrap(),
        }
    }

    /// Renders all registered metrics in the Prometheus text format
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = vec![];
        if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!(error = %err, "metrics export failed");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
