//! Shared error type across avgpulse crates.

use thiserror::Error;

/// Stable error codes (safe to match on or log as strings).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad constructor or observation input.
    InvalidArgument,
    /// The metrics backend rejected or failed an upload.
    SinkUpload,
    /// The counter task is no longer running.
    CounterClosed,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Config could not be read or parsed.
    Config,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::SinkUpload => "SINK_UPLOAD",
            ErrorCode::CounterClosed => "COUNTER_CLOSED",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AvgPulseError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum AvgPulseError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("sink upload failed: {0}")]
    SinkUpload(String),
    #[error("counter closed")]
    CounterClosed,
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AvgPulseError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            AvgPulseError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            AvgPulseError::SinkUpload(_) => ErrorCode::SinkUpload,
            AvgPulseError::CounterClosed => ErrorCode::CounterClosed,
            AvgPulseError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            AvgPulseError::Config(_) => ErrorCode::Config,
            AvgPulseError::Internal(_) => ErrorCode::Internal,
        }
    }
}
