//! Lightweight in-process self-metrics.
//!
//! Tracks what each counter task did (flushes, printed lines, uploads) as
//! atomics keyed by label set, rendered in Prometheus text format on demand.

pub mod metrics;

pub use metrics::{AgentMetrics, CounterVec};
