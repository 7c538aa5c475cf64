//! avgpulse core: runtime-free primitives shared by the agent and its sinks.
//!
//! This crate holds the error surface, the observation batch that backs every
//! average counter, and the metric datum handed to sinks. It carries no async
//! runtime so the averaging rules can be tested and reused on their own.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! Bad observations and bad construction input surface as `AvgPulseError` or
//! as a rejection sentinel, never as a crash in the host process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod args;
pub mod batch;
pub mod datum;
pub mod error;

pub use args::CounterArgs;
pub use batch::Batch;
pub use datum::{MetricDatum, Unit};
/// Shared result type.
pub use error::{AvgPulseError, Result};
