//! Counter construction arguments.
//!
//! Validation lives here so every entry point (factory, config file) applies
//! the same rules before a counter task is spawned.

use std::time::Duration;

use crate::error::{AvgPulseError, Result};

/// Longest accepted pulse: one year.
pub const MAX_PULSE_SECS: f64 = 365.0 * 24.0 * 60.0 * 60.0;

/// Validated arguments for one average counter.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterArgs {
    pub name: String,
    /// `None` means manual flushing only.
    pub interval: Option<Duration>,
    pub silent: bool,
}

impl CounterArgs {
    /// Validate raw arguments. `pulse_secs` defaults to `0` (manual) and
    /// `silent` to `false`.
    pub fn new(name: &str, pulse_secs: Option<f64>, silent: Option<bool>) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(AvgPulseError::InvalidArgument(
                "counter name must be a non-empty string".into(),
            ));
        }

        let pulse_secs = pulse_secs.unwrap_or(0.0);
        if !pulse_secs.is_finite() || pulse_secs < 0.0 {
            return Err(AvgPulseError::InvalidArgument(format!(
                "pulse must be a non-negative number of seconds, got {pulse_secs}"
            )));
        }

        if pulse_secs > MAX_PULSE_SECS {
            return Err(AvgPulseError::InvalidArgument(format!(
                "pulse must be at most {MAX_PULSE_SECS} seconds, got {pulse_secs}"
            )));
        }

        let interval = if pulse_secs > 0.0 {
            let d = Duration::try_from_secs_f64(pulse_secs).map_err(|e| {
                AvgPulseError::InvalidArgument(format!("pulse out of range: {e}"))
            })?;
            Some(d)
        } else {
            None
        };

        Ok(Self {
            name: name.to_string(),
            interval,
            silent: silent.unwrap_or(false),
        })
    }

    /// Whether a periodic flush will be scheduled.
    pub fn is_periodic(&self) -> bool {
        self.interval.is_some()
    }
}
