use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use avgpulse_core::error::{AvgPulseError, Result};
use avgpulse_core::MetricDatum;

use super::MetricSink;

/// Writes each datum as one JSON line.
///
/// Stands in for the remote backend when running the agent locally; the
/// writer is generic so tests can capture output in memory.
pub struct StdoutSink<W = tokio::io::Stdout> {
    out: Mutex<W>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout())
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> StdoutSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn with_writer(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Give back the writer (for inspecting captured output).
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W> MetricSink for StdoutSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn put_metric(&self, datum: MetricDatum) -> Result<()> {
        let mut line = serde_json::to_vec(&datum)
            .map_err(|e| AvgPulseError::SinkUpload(format!("encode failed: {e}")))?;
        line.push(b'\n');

        let mut out = self.out.lock().await;
        out.write_all(&line)
            .await
            .map_err(|e| AvgPulseError::SinkUpload(format!("write failed: {e}")))?;
        out.flush()
            .await
            .map_err(|e| AvgPulseError::SinkUpload(format!("flush failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_one_json_line_per_datum() {
        let sink = StdoutSink::with_writer(Vec::<u8>::new());
        sink.put_metric(MetricDatum::now("AverageCounter/t", "latency", 20.0))
            .await
            .unwrap();
        sink.put_metric(MetricDatum::now("AverageCounter/t", "latency", 2.5))
            .await
            .unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["MetricName"], "latency");
        assert_eq!(first["Value"], 20.0);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["Value"], 2.5);
    }
}
