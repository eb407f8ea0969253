//! The `marked-for-op` filter: keeps resources whose deferred-operation
//! marker is due.

use std::sync::Arc;

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::MarkError;
use crate::tags::tag_map;
use crate::timestamp::{self, ParsedInstant};
use crate::types::{DEFAULT_TAG, OperationKind, marker};

/// Filter configuration as it appears in a policy document.
///
/// ```json
/// {"op": "delete", "tag": "custodian_cleanup", "skew": 1, "tz": "utc"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkedForOpConfig {
    pub op: OperationKind,
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Days the marker may be matched ahead of its timestamp.
    #[serde(default)]
    pub skew: i64,
    /// Hours the marker may be matched ahead of its timestamp.
    #[serde(default)]
    pub skew_hours: i64,
    /// Timezone for the comparison, by alias or IANA name.
    #[serde(default = "default_tz")]
    pub tz: String,
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

fn default_tz() -> String {
    "utc".to_string()
}

/// The compiled filter. Stateless across resources; cloneable.
#[derive(Clone)]
pub struct MarkedForOpFilter {
    op: OperationKind,
    tag: String,
    skew: Duration,
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl MarkedForOpFilter {
    /// Compile a configuration against the system clock.
    pub fn new(config: MarkedForOpConfig) -> Result<Self, MarkError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Compile a configuration with an injected clock.
    pub fn with_clock(config: MarkedForOpConfig, clock: Arc<dyn Clock>) -> Result<Self, MarkError> {
        let tz = timestamp::resolve_tz(&config.tz)
            .ok_or_else(|| MarkError::UnknownTimezone(config.tz.clone()))?;
        let out_of_range = MarkError::DelayOutOfRange {
            days: config.skew,
            hours: config.skew_hours,
        };
        if config.skew < 0 || config.skew_hours < 0 {
            return Err(out_of_range);
        }
        let skew = Duration::try_days(config.skew)
            .zip(Duration::try_hours(config.skew_hours))
            .and_then(|(d, h)| d.checked_add(&h))
            .ok_or(out_of_range)?;
        Ok(MarkedForOpFilter {
            op: config.op,
            tag: config.tag,
            skew,
            tz,
            clock,
        })
    }

    /// Keep the resources whose marker under the configured tag key is
    /// due. Resources are never mutated.
    pub fn process<'a>(&self, resources: &'a [Value]) -> Vec<&'a Value> {
        resources.iter().filter(|r| self.matches(r)).collect()
    }

    /// Evaluate a single resource.
    pub fn matches(&self, resource: &Value) -> bool {
        let tags = tag_map(resource);
        let Some(value) = tags.get(&self.tag) else {
            return false;
        };
        let matched = self.matches_value(value);
        debug!(
            event = "Filter",
            phase = "Evaluated",
            tag = %self.tag,
            value = %value,
            matched
        );
        matched
    }

    /// Evaluate a raw marker value: split, short-circuit on the
    /// operation, parse the timestamp, compare against the clock.
    /// Malformed values are non-matches, never errors.
    pub fn matches_value(&self, tag_value: &str) -> bool {
        let Some((op_part, stamp_part)) = marker::split(tag_value) else {
            return false;
        };
        // Cheap short-circuit: the timestamp is only parsed for the
        // operation being searched for.
        if op_part != self.op.as_ref() {
            return false;
        }
        let due_at = match timestamp::parse_marker_timestamp(stamp_part) {
            Ok(due_at) => due_at,
            Err(error) => {
                warn!(
                    event = "Filter",
                    phase = "Parse",
                    value = tag_value,
                    error = error.to_string()
                );
                return false;
            }
        };
        // A threshold pushed before the representable time range is due by
        // definition.
        match due_at {
            ParsedInstant::Aware(due_at) => {
                let due_at = due_at.with_timezone(&self.tz);
                let now = self.clock.now_utc().with_timezone(&self.tz);
                match due_at.checked_sub_signed(self.skew) {
                    Some(threshold) => now >= threshold,
                    None => true,
                }
            }
            // A zone-less timestamp is compared in the local frame, as the
            // historical implementations did, even though the writer only
            // emits UTC.
            ParsedInstant::Naive(due_at) => match due_at.checked_sub_signed(self.skew) {
                Some(threshold) => self.clock.now_naive() >= threshold,
                None => true,
            },
        }
    }
}
