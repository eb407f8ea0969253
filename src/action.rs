//! The `mark-for-op` action: stamps resources with a deferred-operation
//! marker tag.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::clock::{Clock, SystemClock};
use crate::error::MarkError;
use crate::types::{DEFAULT_TAG, Marker, OperationKind};

/// The external "create-or-update tag" collaborator.
///
/// One upsert per call; an existing value under the same key is
/// overwritten. Failures surface as [`MarkError::TagApi`].
pub trait TagUpserter {
    fn upsert(&self, resource_id: &str, key: &str, value: &str) -> Result<(), MarkError>;
}

/// Action configuration as it appears in a policy document.
///
/// ```json
/// {"op": "delete", "days": 7, "tag": "custodian_cleanup"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkForOpConfig {
    pub op: OperationKind,
    /// Days from now until the operation is due.
    #[serde(default)]
    pub days: i64,
    /// Hours from now until the operation is due.
    #[serde(default)]
    pub hours: i64,
    #[serde(default = "default_tag")]
    pub tag: String,
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

/// The compiled action.
#[derive(Clone)]
pub struct MarkForOpAction {
    config: MarkForOpConfig,
    id_field: String,
    clock: Arc<dyn Clock>,
}

impl MarkForOpAction {
    /// Build an action reading resource identifiers from the `id` field,
    /// against the system clock.
    pub fn new(config: MarkForOpConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: MarkForOpConfig, clock: Arc<dyn Clock>) -> Self {
        MarkForOpAction {
            config,
            id_field: "id".to_string(),
            clock,
        }
    }

    /// Read resource identifiers from a different field (vendor APIs use
    /// names like `instance_id` or `zone_id`).
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// The tag value this action would write right now.
    pub fn tag_value(&self) -> Result<String, MarkError> {
        Marker::render(
            self.config.op,
            self.config.days,
            self.config.hours,
            self.clock.as_ref(),
        )
    }

    /// Stamp every resource with the marker tag, best-effort: a resource
    /// without an identifier or a failed upsert is logged and skipped,
    /// never aborting the batch. Returns the number of resources tagged.
    pub fn process(&self, resources: &[Value], tagger: &dyn TagUpserter) -> usize {
        let value = match self.tag_value() {
            Ok(value) => value,
            Err(e) => {
                error!(
                    event = "Action",
                    phase = "Render",
                    op = %self.config.op,
                    error = e.to_string()
                );
                return 0;
            }
        };

        let mut tagged = 0;
        for resource in resources {
            let Some(id) = resource.get(self.id_field.as_str()).and_then(Value::as_str) else {
                error!(
                    event = "Action",
                    phase = "Identify",
                    field = %self.id_field,
                    error = MarkError::MissingIdentifier(self.id_field.clone()).to_string()
                );
                continue;
            };
            match tagger.upsert(id, &self.config.tag, &value) {
                Ok(()) => {
                    info!(
                        event = "Action",
                        phase = "Tagged",
                        resource = id,
                        tag = %self.config.tag,
                        value = %value
                    );
                    tagged += 1;
                }
                Err(e) => {
                    error!(
                        event = "Action",
                        phase = "Tag",
                        resource = id,
                        tag = %self.config.tag,
                        error = e.to_string()
                    );
                }
            }
        }
        tagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Mutex;
    use yare::parameterized;

    /// Records upserts; fails any resource id listed in `failing`.
    #[derive(Default)]
    struct RecordingUpserter {
        calls: Mutex<Vec<(String, String, String)>>,
        failing: Vec<String>,
    }

    impl TagUpserter for RecordingUpserter {
        fn upsert(&self, resource_id: &str, key: &str, value: &str) -> Result<(), MarkError> {
            if self.failing.iter().any(|f| f == resource_id) {
                return Err(MarkError::TagApi {
                    status: 403,
                    message: "forbidden".to_string(),
                });
            }
            self.calls.lock().unwrap().push((
                resource_id.to_string(),
                key.to_string(),
                value.to_string(),
            ));
            Ok(())
        }
    }

    fn action_at_noon(days: i64, hours: i64, tag: &str) -> MarkForOpAction {
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2026, 9, 6, 12, 0, 0).unwrap());
        MarkForOpAction::with_clock(
            MarkForOpConfig {
                op: OperationKind::Delete,
                days,
                hours,
                tag: tag.to_string(),
            },
            Arc::new(clock),
        )
    }

    #[test]
    fn test_config_defaults() {
        let config: MarkForOpConfig = serde_json::from_value(json!({"op": "stop"})).unwrap();
        assert_eq!(config.op, OperationKind::Stop);
        assert_eq!(config.days, 0);
        assert_eq!(config.hours, 0);
        assert_eq!(config.tag, DEFAULT_TAG);
    }

    #[test]
    fn test_process_tags_every_resource() {
        let action = action_at_noon(7, 0, "custodian_cleanup");
        let tagger = RecordingUpserter::default();
        let resources = vec![json!({"id": "r-1"}), json!({"id": "r-2"})];

        assert_eq!(action.process(&resources, &tagger), 2);

        let calls = tagger.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                (
                    "r-1".to_string(),
                    "custodian_cleanup".to_string(),
                    "delete@2026/09/13 12:00:00 UTC".to_string()
                ),
                (
                    "r-2".to_string(),
                    "custodian_cleanup".to_string(),
                    "delete@2026/09/13 12:00:00 UTC".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_missing_identifier_skips_without_aborting() {
        let action = action_at_noon(0, 0, DEFAULT_TAG);
        let tagger = RecordingUpserter::default();
        let resources = vec![
            json!({"name": "no id here"}),
            json!({"id": "r-2"}),
            json!({"id": 42}),
        ];

        assert_eq!(action.process(&resources, &tagger), 1);
        assert_eq!(tagger.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_failure_is_best_effort() {
        let action = action_at_noon(0, 0, DEFAULT_TAG);
        let tagger = RecordingUpserter {
            failing: vec!["r-1".to_string()],
            ..Default::default()
        };
        let resources = vec![json!({"id": "r-1"}), json!({"id": "r-2"})];

        assert_eq!(action.process(&resources, &tagger), 1);
        let calls = tagger.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "r-2");
    }

    #[parameterized(
        overflowing = { i64::MAX, 0 },
        negative_days = { -5, 0 },
        negative_hours = { 0, -1 },
    )]
    fn test_out_of_range_delay_tags_nothing(days: i64, hours: i64) {
        let action = action_at_noon(days, hours, DEFAULT_TAG);
        let tagger = RecordingUpserter::default();
        let resources = vec![json!({"id": "r-1"})];

        assert_eq!(
            action.tag_value(),
            Err(MarkError::DelayOutOfRange { days, hours })
        );
        assert_eq!(action.process(&resources, &tagger), 0);
        assert!(tagger.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_custom_id_field() {
        let action = action_at_noon(0, 0, DEFAULT_TAG).with_id_field("instance_id");
        let tagger = RecordingUpserter::default();
        let resources = vec![json!({"instance_id": "kafka-1", "id": "ignored"})];

        assert_eq!(action.process(&resources, &tagger), 1);
        assert_eq!(tagger.calls.lock().unwrap()[0].0, "kafka-1");
    }
}
