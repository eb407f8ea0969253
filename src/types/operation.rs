//! The closed set of operations a marker may defer.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A deferred operation. Serialized and displayed in lowercase, matching
/// the `op` field of policy configuration and the marker wire form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Delete,
    Stop,
    Restart,
}
