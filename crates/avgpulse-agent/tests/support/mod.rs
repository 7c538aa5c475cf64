//! Shared test sinks and helpers.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use avgpulse_agent::config::BackendSection;
use avgpulse_agent::{CounterFactory, MetricSink};
use avgpulse_core::error::{AvgPulseError, Result};
use avgpulse_core::MetricDatum;

/// Forwards every datum to a channel the test reads from.
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<MetricDatum>,
}

impl RecordingSink {
    pub fn new(tx: mpsc::UnboundedSender<MetricDatum>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl MetricSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn put_metric(&self, datum: MetricDatum) -> Result<()> {
        let _ = self.tx.send(datum);
        Ok(())
    }
}

/// Always fails, like an unreachable backend.
pub struct FailingSink;

#[async_trait]
impl MetricSink for FailingSink {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn put_metric(&self, _datum: MetricDatum) -> Result<()> {
        Err(AvgPulseError::SinkUpload("backend unavailable".into()))
    }
}

/// Never completes.
pub struct StuckSink;

#[async_trait]
impl MetricSink for StuckSink {
    fn name(&self) -> &'static str {
        "stuck"
    }

    async fn put_metric(&self, _datum: MetricDatum) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Takes `delay` before forwarding the datum.
pub struct SlowSink {
    tx: mpsc::UnboundedSender<MetricDatum>,
    delay: Duration,
}

impl SlowSink {
    pub fn new(tx: mpsc::UnboundedSender<MetricDatum>, delay: Duration) -> Self {
        Self { tx, delay }
    }
}

#[async_trait]
impl MetricSink for SlowSink {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn put_metric(&self, datum: MetricDatum) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        let _ = self.tx.send(datum);
        Ok(())
    }
}

pub fn recording_factory() -> (CounterFactory, mpsc::UnboundedReceiver<MetricDatum>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let factory = CounterFactory::new(
        BackendSection::with_namespace("test"),
        Arc::new(RecordingSink::new(tx)),
    )
    .expect("factory");
    (factory, rx)
}

pub fn factory_with(sink: Arc<dyn MetricSink>) -> CounterFactory {
    CounterFactory::new(BackendSection::with_namespace("test"), sink).expect("factory")
}

/// In-memory log output for the fmt subscriber.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        let buf = self.0.lock().expect("log buffer");
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Install as the thread's default subscriber until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        self.install_at(tracing::Level::INFO)
    }

    pub fn install_at(&self, level: tracing::Level) -> tracing::subscriber::DefaultGuard {
        let capture = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(level)
            .with_writer(move || capture.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
