//! Counter task: the single owner of a counter's batch.
//!
//! All mutations arrive as [`Command`]s on one channel and the flush timer is
//! polled in the same `select!`, so an observation and a flush never run at
//! the same time. An observation sent while a flush is due may land in either
//! window.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Duration, Instant};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

use avgpulse_core::{Batch, CounterArgs, MetricDatum};

use crate::obs::AgentMetrics;
use crate::sink::MetricSink;

pub(crate) enum Command {
    Observe(f64),
    Flush(oneshot::Sender<Option<f64>>),
    Pending(oneshot::Sender<usize>),
    Shutdown(oneshot::Sender<()>),
}

/// Where averages go once computed. Shared by every counter of a factory.
pub(crate) struct Emitter {
    pub(crate) namespace: String,
    pub(crate) hostname: String,
    pub(crate) sink: Arc<dyn MetricSink>,
    pub(crate) metrics: Arc<AgentMetrics>,
    /// In-flight uploads, so shutdown can wait for them.
    pub(crate) uploads: TaskTracker,
}

impl Emitter {
    /// Print (unless silent) and hand the average to the sink.
    ///
    /// The upload is spawned on the tracker and never awaited here, so a slow
    /// or failing backend cannot hold up the next flush.
    fn emit(&self, name: &str, silent: bool, average: f64) {
        let labels = [("counter", name)];

        if !silent {
            info!("{} on {}: {}", name, self.hostname, average);
            self.metrics.printed.inc(&labels);
        }

        let datum = MetricDatum::now(self.namespace.as_str(), name, average);
        let sink = Arc::clone(&self.sink);
        let metrics = Arc::clone(&self.metrics);
        let name = name.to_string();

        self.metrics.uploads.inc(&labels);
        self.uploads.spawn(async move {
            if let Err(e) = sink.put_metric(datum).await {
                metrics.upload_failures.inc(&[("counter", name.as_str())]);
                warn!(
                    counter = %name,
                    sink = sink.name(),
                    code = e.code().as_str(),
                    error = %e,
                    "could not upload metric"
                );
            }
        });
    }
}

pub(crate) struct CounterWorker {
    args: CounterArgs,
    batch: Batch,
    rx: mpsc::UnboundedReceiver<Command>,
    emitter: Arc<Emitter>,
}

impl CounterWorker {
    pub(crate) fn new(
        args: CounterArgs,
        rx: mpsc::UnboundedReceiver<Command>,
        emitter: Arc<Emitter>,
    ) -> Self {
        Self {
            args,
            batch: Batch::new(),
            rx,
            emitter,
        }
    }

    /// Run until shutdown is requested or every handle is dropped.
    ///
    /// The timer is single-shot and re-armed after each flush, so the period
    /// is measured from the end of the previous flush.
    pub(crate) async fn run(mut self) {
        let mut interval = self.args.interval;
        debug!(
            counter = %self.args.name,
            interval = ?interval,
            silent = self.args.silent,
            "average counter started"
        );

        let sleep = time::sleep(interval.unwrap_or(Duration::ZERO));
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep, if interval.is_some() => {
                    self.flush();
                    // a deadline past the clock's range disarms the timer
                    match interval.and_then(|period| Instant::now().checked_add(period)) {
                        Some(deadline) => sleep.as_mut().reset(deadline),
                        None => {
                            warn!(counter = %self.args.name, "flush deadline out of range, periodic flush disabled");
                            interval = None;
                        }
                    }
                }
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(Command::Observe(value)) => {
                            self.batch.push(value);
                        }
                        Some(Command::Flush(reply)) => {
                            let _ = reply.send(self.flush());
                        }
                        Some(Command::Pending(reply)) => {
                            let _ = reply.send(self.batch.len());
                        }
                        Some(Command::Shutdown(ack)) => {
                            // handles see the counter as closed once acked
                            self.rx.close();
                            self.flush();
                            let _ = ack.send(());
                            break;
                        }
                        None => {
                            self.flush();
                            break;
                        }
                    }
                }
            }
        }

        debug!(counter = %self.args.name, "average counter stopped");
    }

    /// One flush cycle: average, emit if non-empty, always reset.
    fn flush(&mut self) -> Option<f64> {
        let name = self.args.name.as_str();
        let average = self.batch.take_average();

        match average {
            Some(avg) => {
                self.emitter
                    .metrics
                    .flushes
                    .inc(&[("counter", name), ("outcome", "reported")]);
                self.emitter.emit(name, self.args.silent, avg);
            }
            None => {
                self.emitter
                    .metrics
                    .flushes
                    .inc(&[("counter", name), ("outcome", "empty")]);
                trace!(counter = %name, "nothing to report");
            }
        }

        average
    }
}
