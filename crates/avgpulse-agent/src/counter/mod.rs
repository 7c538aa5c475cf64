//! Average counters.
//!
//! An [`AverageCounter`] is a cheap, cloneable handle. The batch itself lives
//! in a background task (see `task`) that the handle talks to over an
//! unbounded channel, so `count()` never blocks and never waits on a flush.

mod task;

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use avgpulse_core::error::{AvgPulseError, Result};
use avgpulse_core::{Batch, CounterArgs};

use crate::obs::AgentMetrics;

pub(crate) use task::Emitter;
use task::{Command, CounterWorker};

/// Handle for recording observations against one named counter.
#[derive(Clone)]
pub struct AverageCounter {
    name: Arc<str>,
    interval: Option<Duration>,
    silent: bool,
    tx: mpsc::UnboundedSender<Command>,
    metrics: Arc<AgentMetrics>,
}

impl AverageCounter {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flush period, `None` for a manual-only counter.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Record one observation and return it.
    ///
    /// Returns `None` without touching the batch when the value is not a
    /// finite number or the counter has stopped.
    pub fn count(&self, value: f64) -> Option<f64> {
        if !Batch::accepts(value) {
            self.metrics.rejected.inc(&[("counter", self.name.as_ref())]);
            tracing::debug!(counter = %self.name, value, "rejected non-numeric observation");
            return None;
        }
        self.tx.send(Command::Observe(value)).ok()?;
        Some(value)
    }

    /// Run one flush cycle now and return the reported average, if any.
    ///
    /// The periodic timer keeps its own schedule.
    pub async fn flush(&self) -> Result<Option<f64>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply))
            .map_err(|_| AvgPulseError::CounterClosed)?;
        rx.await.map_err(|_| AvgPulseError::CounterClosed)
    }

    /// Number of observations waiting for the next flush.
    pub async fn pending(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Pending(reply))
            .map_err(|_| AvgPulseError::CounterClosed)?;
        rx.await.map_err(|_| AvgPulseError::CounterClosed)
    }

    /// Final flush, then stop the task. A no-op on a stopped counter.
    pub async fn shutdown(&self) {
        let (ack, rx) = oneshot::channel();
        if self.tx.send(Command::Shutdown(ack)).is_ok() {
            let _ = rx.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// A handle that does not keep the counter alive.
    pub(crate) fn downgrade(&self) -> WeakCounter {
        WeakCounter {
            name: Arc::clone(&self.name),
            interval: self.interval,
            silent: self.silent,
            tx: self.tx.downgrade(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Non-owning counter reference. Once every [`AverageCounter`] is dropped the
/// task does its final flush and stops, and `upgrade` returns `None`.
pub(crate) struct WeakCounter {
    name: Arc<str>,
    interval: Option<Duration>,
    silent: bool,
    tx: mpsc::WeakUnboundedSender<Command>,
    metrics: Arc<AgentMetrics>,
}

impl WeakCounter {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn upgrade(&self) -> Option<AverageCounter> {
        let tx = self.tx.upgrade()?;
        if tx.is_closed() {
            return None;
        }
        Some(AverageCounter {
            name: Arc::clone(&self.name),
            interval: self.interval,
            silent: self.silent,
            tx,
            metrics: Arc::clone(&self.metrics),
        })
    }
}

impl std::fmt::Debug for AverageCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AverageCounter")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("silent", &self.silent)
            .finish()
    }
}

/// Owner's handle on the background flush task.
#[derive(Debug)]
pub struct CounterTask {
    join: JoinHandle<()>,
}

impl CounterTask {
    /// Stop immediately. Pending observations are discarded.
    pub fn abort(&self) {
        self.join.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to end. Cancellation counts as a clean end.
    pub async fn join(self) -> Result<()> {
        match self.join.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(AvgPulseError::Internal(format!("counter task failed: {e}"))),
        }
    }
}

/// Spawn the task for a validated counter on the current tokio runtime.
pub(crate) fn spawn(args: CounterArgs, emitter: Arc<Emitter>) -> Result<(AverageCounter, CounterTask)> {
    let runtime = Handle::try_current()
        .map_err(|e| AvgPulseError::Internal(format!("no tokio runtime: {e}")))?;

    let (tx, rx) = mpsc::unbounded_channel();
    let counter = AverageCounter {
        name: Arc::from(args.name.as_str()),
        interval: args.interval,
        silent: args.silent,
        tx,
        metrics: Arc::clone(&emitter.metrics),
    };

    let worker = CounterWorker::new(args, rx, emitter);
    let join = runtime.spawn(worker.run());

    Ok((counter, CounterTask { join }))
}
