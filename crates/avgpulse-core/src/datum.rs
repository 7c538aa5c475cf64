//! Metric datum submitted to sinks.
//!
//! Field names follow the backend's `MetricData` shape so a JSON sink can
//! emit them as-is.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Prefix applied to every configured namespace.
pub const NAMESPACE_PREFIX: &str = "AverageCounter/";

/// Unit reported alongside the value. Averages are always sent as `Count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    Count,
}

/// One value for one metric at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDatum {
    /// Namespace-qualified, e.g. `AverageCounter/checkout`.
    pub namespace: String,
    pub metric_name: String,
    pub value: f64,
    pub unit: Unit,
    pub timestamp: DateTime<Utc>,
}

impl MetricDatum {
    /// Build a `Count` datum stamped with the current time.
    pub fn now(namespace: impl Into<String>, metric_name: impl Into<String>, value: f64) -> Self {
        Self {
            namespace: namespace.into(),
            metric_name: metric_name.into(),
            value,
            unit: Unit::Count,
            timestamp: Utc::now(),
        }
    }
}

/// Qualify a bare namespace with [`NAMESPACE_PREFIX`].
pub fn qualified_namespace(ns: &str) -> String {
    format!("{NAMESPACE_PREFIX}{ns}")
}
