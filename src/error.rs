use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum MarkError {
    #[error("invalid marker format: {0}")]
    InvalidFormat(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("failed to parse timestamp: {0}")]
    TimestampParse(String),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("delay out of range (days={days}, hours={hours})")]
    DelayOutOfRange { days: i64, hours: i64 },

    #[error("resource has no '{0}' field")]
    MissingIdentifier(String),

    #[error("tag API request failed (status {status}): {message}")]
    TagApi { status: u16, message: String },
}
