/// Shared utilities used across all layers
///
/// This module contains:
/// - Bit-scan primitives over 15-bit buckets
/// - Prometheus metrics

pub mod collections;
pub mod metrics;

pub use metrics::METRICS;
