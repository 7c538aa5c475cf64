//! Top-level facade crate for avgpulse.
//!
//! Re-exports core types and the agent library so users can depend on a single crate.

pub mod core {
    pub use avgpulse_core::*;
}

pub mod agent {
    pub use avgpulse_agent::*;
}

pub use avgpulse_agent::{AverageCounter, CounterFactory, MetricSink};
