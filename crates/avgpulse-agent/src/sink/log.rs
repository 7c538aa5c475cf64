use async_trait::async_trait;

use avgpulse_core::error::Result;
use avgpulse_core::MetricDatum;

use super::MetricSink;

/// Emits each datum as a `tracing` debug event. Never fails.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl MetricSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn put_metric(&self, datum: MetricDatum) -> Result<()> {
        tracing::debug!(
            namespace = %datum.namespace,
            metric = %datum.metric_name,
            value = datum.value,
            timestamp = %datum.timestamp,
            "metric datum"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_fails() {
        let sink = LogSink;
        assert_eq!(sink.name(), "log");
        sink.put_metric(MetricDatum::now("AverageCounter/t", "latency", 1.0))
            .await
            .unwrap();
    }
}
