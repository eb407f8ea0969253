//! Data model types for deferred-operation markers.
//!
//! Canonical string forms:
//! - Marker: `delete@2026/09/06 12:00:00 UTC` (current) or
//!   `delete_2026-09-06-12-00-00-UTC` (legacy, read-only)
//! - Operation: `delete`, `stop`, `restart`

pub(crate) mod marker;
mod operation;

pub use marker::{DEFAULT_TAG, LEGACY_SEPARATOR, MARKER_TIMESTAMP_FORMAT, Marker, SEPARATOR};
pub use operation::OperationKind;
