//! Construction argument rules.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use avgpulse_core::error::ErrorCode;
use avgpulse_core::args::MAX_PULSE_SECS;
use avgpulse_core::CounterArgs;

#[test]
fn defaults_to_manual_and_loud() {
    let args = CounterArgs::new("latency", None, None).unwrap();
    assert_eq!(args.name, "latency");
    assert_eq!(args.interval, None);
    assert!(!args.is_periodic());
    assert!(!args.silent);
}

#[test]
fn zero_pulse_is_manual() {
    let args = CounterArgs::new("latency", Some(0.0), Some(true)).unwrap();
    assert!(!args.is_periodic());
    assert!(args.silent);
}

#[test]
fn fractional_pulse() {
    let args = CounterArgs::new("latency", Some(0.25), None).unwrap();
    assert_eq!(args.interval, Some(Duration::from_millis(250)));
}

#[test]
fn empty_name_rejected() {
    for name in ["", "   "] {
        let err = CounterArgs::new(name, Some(1.0), None).expect_err("must fail");
        assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
    }
}

#[test]
fn bad_pulse_rejected() {
    for pulse in [-1.0, f64::NAN, f64::INFINITY, 1e300, 1e19, MAX_PULSE_SECS + 1.0] {
        let err = CounterArgs::new("latency", Some(pulse), None).expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }
}

#[test]
fn longest_pulse_accepted() {
    let args = CounterArgs::new("latency", Some(MAX_PULSE_SECS), None).unwrap();
    assert_eq!(args.interval, Some(Duration::from_secs(365 * 24 * 60 * 60)));
}
