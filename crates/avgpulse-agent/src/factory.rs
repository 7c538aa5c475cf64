//! Counter factory.
//!
//! Built once per process from an explicit [`AgentConfig`] and a sink. Every
//! counter it hands out shares the same namespace, host name, sink and
//! self-metrics.
//!
//! The registry only holds weak references to counters made with
//! `get_average_counter`: dropping the last caller handle stops the counter,
//! and finished counters are pruned. Counters declared in the config are
//! owned by the factory until `shutdown_all`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use avgpulse_core::error::Result;
use avgpulse_core::CounterArgs;

use crate::config::{AgentConfig, BackendSection};
use crate::counter::{self, AverageCounter, CounterTask, Emitter, WeakCounter};
use crate::obs::AgentMetrics;
use crate::sink::MetricSink;

/// Upper bound on how long `shutdown_all` waits for in-flight uploads.
pub const UPLOAD_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

struct Registered {
    counter: WeakCounter,
    /// Set for config-declared counters, which the factory keeps alive.
    owned: Option<AverageCounter>,
    task: CounterTask,
}

impl Registered {
    fn is_live(&self) -> bool {
        !self.task.is_finished() && self.counter.upgrade().is_some()
    }
}

#[derive(Clone)]
pub struct CounterFactory {
    inner: Arc<FactoryInner>,
}

struct FactoryInner {
    backend: BackendSection,
    emitter: Arc<Emitter>,
    counters: DashMap<u64, Registered>,
    seq: AtomicU64,
}

impl CounterFactory {
    /// Build a factory. Resolves the host name once for log lines.
    pub fn new(backend: BackendSection, sink: Arc<dyn MetricSink>) -> Result<Self> {
        backend.validate()?;

        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());

        info!(
            region = %backend.region,
            namespace = %backend.qualified_namespace(),
            credentials = backend.has_credentials(),
            sink = sink.name(),
            host = %hostname,
            "counter factory ready"
        );

        let emitter = Emitter {
            namespace: backend.qualified_namespace(),
            hostname,
            sink,
            metrics: Arc::new(AgentMetrics::default()),
            uploads: TaskTracker::new(),
        };

        Ok(Self {
            inner: Arc::new(FactoryInner {
                backend,
                emitter: Arc::new(emitter),
                counters: DashMap::new(),
                seq: AtomicU64::new(1),
            }),
        })
    }

    /// Build a factory and spawn every counter declared in the config.
    pub fn from_config(cfg: AgentConfig, sink: Arc<dyn MetricSink>) -> Result<Self> {
        cfg.validate()?;
        let factory = Self::new(cfg.backend, sink)?;
        for c in &cfg.counters {
            factory.register(c.args()?, true)?;
        }
        Ok(factory)
    }

    /// Create a counter, logging and returning `None` on bad arguments.
    ///
    /// `pulse_secs` defaults to `0` (no periodic flush), `silent` to `false`.
    pub fn get_average_counter(
        &self,
        name: &str,
        pulse_secs: Option<f64>,
        silent: Option<bool>,
    ) -> Option<AverageCounter> {
        match self.try_get_average_counter(name, pulse_secs, silent) {
            Ok(counter) => Some(counter),
            Err(e) => {
                error!(counter = %name, code = e.code().as_str(), error = %e, "could not create average counter");
                None
            }
        }
    }

    /// Same as [`get_average_counter`](Self::get_average_counter) but returns the error.
    pub fn try_get_average_counter(
        &self,
        name: &str,
        pulse_secs: Option<f64>,
        silent: Option<bool>,
    ) -> Result<AverageCounter> {
        let args = CounterArgs::new(name, pulse_secs, silent)?;
        self.register(args, false)
    }

    /// Spawn a counter the caller owns outright. It is not registered, so
    /// [`shutdown_all`](Self::shutdown_all) does not touch it.
    pub fn spawn_counter(&self, args: CounterArgs) -> Result<(AverageCounter, CounterTask)> {
        counter::spawn(args, Arc::clone(&self.inner.emitter))
    }

    fn register(&self, args: CounterArgs, owned: bool) -> Result<AverageCounter> {
        self.prune();
        let (counter, task) = self.spawn_counter(args)?;
        let id = self.inner.seq.fetch_add(1, Ordering::Relaxed);
        self.inner.counters.insert(
            id,
            Registered {
                counter: counter.downgrade(),
                owned: owned.then(|| counter.clone()),
                task,
            },
        );
        Ok(counter)
    }

    /// Forget counters whose task has ended or whose handles are all gone.
    fn prune(&self) {
        self.inner.counters.retain(|_, reg| reg.is_live());
    }

    /// Live registered counters, in creation order.
    fn live(&self) -> Vec<AverageCounter> {
        self.prune();
        let mut live: Vec<(u64, AverageCounter)> = self
            .inner
            .counters
            .iter()
            .filter(|e| !e.value().task.is_finished())
            .filter_map(|e| e.value().counter.upgrade().map(|c| (*e.key(), c)))
            .collect();
        live.sort_by_key(|(id, _)| *id);
        live.into_iter().map(|(_, c)| c).collect()
    }

    /// First live registered counter with this name.
    pub fn counter(&self, name: &str) -> Option<AverageCounter> {
        self.live().into_iter().find(|c| c.name() == name)
    }

    /// Names of live registered counters, in creation order.
    pub fn counter_names(&self) -> Vec<String> {
        self.live().iter().map(|c| c.name().to_string()).collect()
    }

    pub fn backend(&self) -> &BackendSection {
        &self.inner.backend
    }

    pub fn hostname(&self) -> &str {
        &self.inner.emitter.hostname
    }

    pub fn metrics(&self) -> Arc<AgentMetrics> {
        Arc::clone(&self.inner.emitter.metrics)
    }

    /// Final-flush and stop every registered counter, then wait (bounded by
    /// [`UPLOAD_DRAIN_TIMEOUT`]) for uploads still in flight.
    pub async fn shutdown_all(&self) {
        let ids: Vec<u64> = self.inner.counters.iter().map(|e| *e.key()).collect();
        for id in ids {
            let Some((_, reg)) = self.inner.counters.remove(&id) else { continue; };
            if let Some(counter) = reg.owned.or_else(|| reg.counter.upgrade()) {
                counter.shutdown().await;
            }
            if let Err(e) = reg.task.join().await {
                error!(counter = %reg.counter.name(), error = %e, "counter task ended abnormally");
            }
        }
        self.drain_uploads(UPLOAD_DRAIN_TIMEOUT).await;
    }

    /// Wait up to `limit` for in-flight uploads. Returns `false` on timeout.
    pub async fn drain_uploads(&self, limit: Duration) -> bool {
        let uploads = &self.inner.emitter.uploads;
        uploads.close();
        let drained = tokio::time::timeout(limit, uploads.wait()).await.is_ok();
        if !drained {
            warn!(in_flight = uploads.len(), "uploads still in flight after drain timeout");
        }
        uploads.reopen();
        drained
    }
}
