// src/lib.rs
pub use action::{MarkForOpAction, MarkForOpConfig, TagUpserter};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::MarkError;
pub use filter::{MarkedForOpConfig, MarkedForOpFilter};
pub use tags::tag_map;
pub use timestamp::{ParsedInstant, parse_flexible, resolve_tz};
pub use types::{
    DEFAULT_TAG, LEGACY_SEPARATOR, MARKER_TIMESTAMP_FORMAT, Marker, OperationKind, SEPARATOR,
};

mod action;
mod clock;
mod error;
mod filter;
mod tags;
mod timestamp;
mod types;
