//! avgpulse agent library.
//!
//! Wires average counters, their flush tasks, the metric sinks, the YAML
//! config and self-metrics into a factory a host application builds once.
//! Consumed by the demo binary (`main.rs`) and by integration tests.

pub mod config;
pub mod counter;
pub mod factory;
pub mod obs;
pub mod sink;

pub use counter::{AverageCounter, CounterTask};
pub use factory::CounterFactory;
pub use sink::{LogSink, MetricSink, StdoutSink};
