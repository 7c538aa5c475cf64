//! Metric sinks.
//!
//! A sink is the external backend an average is reported to. Counters call it
//! fire-and-forget: each upload runs in its own task, and an error is logged
//! by the caller and dropped.

mod log;
mod stdout;

use async_trait::async_trait;

use avgpulse_core::error::Result;
use avgpulse_core::MetricDatum;

pub use self::log::LogSink;
pub use self::stdout::StdoutSink;

/// Backend receiving reported averages.
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    /// Forward one datum. Errors are not retried.
    async fn put_metric(&self, datum: MetricDatum) -> Result<()>;
}
