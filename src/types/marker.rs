//! The deferred-operation marker: an `(operation, due_at)` pair carried in
//! a tag value.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::Duration;

use crate::clock::Clock;
use crate::error::MarkError;
use crate::timestamp::{self, ParsedInstant};

use super::operation::OperationKind;

/// Separator between operation and timestamp in the current format.
pub const SEPARATOR: char = '@';
/// Separator used by the legacy format; read but never written.
pub const LEGACY_SEPARATOR: char = '_';
/// Timestamp layout emitted by [`Marker::render`].
pub const MARKER_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S UTC";
/// Default tag key for markers.
pub const DEFAULT_TAG: &str = "mark-for-op-custodian";

/// A parsed marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    operation: OperationKind,
    due_at: ParsedInstant,
}

impl Marker {
    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn due_at(&self) -> ParsedInstant {
        self.due_at
    }

    /// Render a marker tag value due `days` and `hours` from now.
    ///
    /// The timestamp is always emitted in UTC using
    /// [`MARKER_TIMESTAMP_FORMAT`]; only the current `@` format is ever
    /// written. A negative delay, or one that overflows the representable
    /// time range, is `MarkError::DelayOutOfRange`.
    pub fn render(
        operation: OperationKind,
        days: i64,
        hours: i64,
        clock: &dyn Clock,
    ) -> Result<String, MarkError> {
        let out_of_range = || MarkError::DelayOutOfRange { days, hours };
        if days < 0 || hours < 0 {
            return Err(out_of_range());
        }
        let delay = Duration::try_days(days)
            .zip(Duration::try_hours(hours))
            .and_then(|(d, h)| d.checked_add(&h))
            .ok_or_else(out_of_range)?;
        let due_at = clock
            .now_utc()
            .checked_add_signed(delay)
            .ok_or_else(out_of_range)?;
        Ok(format!(
            "{operation}{SEPARATOR}{}",
            due_at.format(MARKER_TIMESTAMP_FORMAT)
        ))
    }
}

impl Display for Marker {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.due_at {
            ParsedInstant::Aware(dt) => write!(
                f,
                "{}{SEPARATOR}{}",
                self.operation,
                dt.format(MARKER_TIMESTAMP_FORMAT)
            ),
            ParsedInstant::Naive(dt) => write!(
                f,
                "{}{SEPARATOR}{}",
                self.operation,
                dt.format("%Y/%m/%d %H:%M:%S")
            ),
        }
    }
}

impl FromStr for Marker {
    type Err = MarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (op_part, stamp_part) = split(s).ok_or_else(|| {
            MarkError::InvalidFormat(format!(
                "no '{SEPARATOR}' or '{LEGACY_SEPARATOR}' separator in '{s}'"
            ))
        })?;
        let operation = OperationKind::from_str(op_part)
            .map_err(|_| MarkError::UnknownOperation(op_part.to_string()))?;
        let due_at = timestamp::parse_marker_timestamp(stamp_part)?;
        Ok(Marker { operation, due_at })
    }
}

/// Split a tag value into `(operation, timestamp)` parts, preferring the
/// current separator over the legacy one. `None` when neither is present.
pub(crate) fn split(value: &str) -> Option<(&str, &str)> {
    let value = value.trim();
    value
        .split_once(SEPARATOR)
        .or_else(|| value.split_once(LEGACY_SEPARATOR))
}
