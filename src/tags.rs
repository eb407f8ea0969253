//! Tag-collection normalization.
//!
//! Resources arrive as opaque JSON objects and carry their tags in one of
//! four shapes, depending on which API produced them:
//!
//! - `Tags: [{"Key": k, "Value": v}, ...]` (normalized list)
//! - `tags: {"k": "v", ...}` (flat map)
//! - `tags: [{"key": k, "value": v}, ...]` (vendor list)
//! - `tags: [{"k": "v"}, ...]` (single-entry maps)
//!
//! The shape is resolved once at this boundary; everything downstream sees
//! a flat string map. An unrecognized shape is an empty map, never an
//! error.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// The recognized tag-collection shapes, borrowed from the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagShape<'a> {
    Normalized(&'a [Value]),
    VendorList(&'a [Value]),
    SingleEntryList(&'a [Value]),
    FlatMap(&'a Map<String, Value>),
}

impl<'a> TagShape<'a> {
    /// Classify the tag-bearing field of a resource. `Tags` takes
    /// precedence over `tags`; a field of the wrong type is no shape at
    /// all.
    fn classify(resource: &'a Value) -> Option<Self> {
        let obj = resource.as_object()?;

        if let Some(field) = obj.get("Tags") {
            return match field {
                Value::Array(items) => Some(TagShape::Normalized(items)),
                _ => None,
            };
        }

        match obj.get("tags")? {
            Value::Object(map) => Some(TagShape::FlatMap(map)),
            Value::Array(items) => {
                if items.iter().all(is_vendor_entry) {
                    Some(TagShape::VendorList(items))
                } else if items.iter().all(is_single_entry) {
                    Some(TagShape::SingleEntryList(items))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Flatten into a string map. Entries that do not carry string keys
    /// and values are skipped; duplicate keys resolve last-write-wins.
    fn flatten(self) -> HashMap<String, String> {
        let mut tags = HashMap::new();
        match self {
            TagShape::Normalized(items) => {
                for item in items {
                    insert_pair(&mut tags, item, "Key", "Value");
                }
            }
            TagShape::VendorList(items) => {
                for item in items {
                    insert_pair(&mut tags, item, "key", "value");
                }
            }
            TagShape::SingleEntryList(items) => {
                for item in items {
                    if let Some(obj) = item.as_object() {
                        for (key, value) in obj {
                            if let Some(value) = value.as_str() {
                                tags.insert(key.clone(), value.to_string());
                            }
                        }
                    }
                }
            }
            TagShape::FlatMap(map) => {
                for (key, value) in map {
                    if let Some(value) = value.as_str() {
                        tags.insert(key.clone(), value.to_string());
                    }
                }
            }
        }
        tags
    }
}

/// Extract a flat tag map from a resource, whatever shape its tag
/// collection takes.
pub fn tag_map(resource: &Value) -> HashMap<String, String> {
    match TagShape::classify(resource) {
        Some(shape) => shape.flatten(),
        None => HashMap::new(),
    }
}

fn is_vendor_entry(item: &Value) -> bool {
    item.as_object()
        .is_some_and(|o| o.contains_key("key") && o.contains_key("value"))
}

fn is_single_entry(item: &Value) -> bool {
    item.as_object().is_some_and(|o| o.len() == 1)
}

fn insert_pair(tags: &mut HashMap<String, String>, item: &Value, key_field: &str, value_field: &str) {
    let Some(obj) = item.as_object() else { return };
    if let (Some(key), Some(value)) = (
        obj.get(key_field).and_then(Value::as_str),
        obj.get(value_field).and_then(Value::as_str),
    ) {
        tags.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use yare::parameterized;

    #[parameterized(
        normalized_list = { json!({"Tags": [{"Key": "environment", "Value": "prod"}]}) },
        flat_map = { json!({"tags": {"environment": "prod"}}) },
        vendor_list = { json!({"tags": [{"key": "environment", "value": "prod"}]}) },
        single_entry_list = { json!({"tags": [{"environment": "prod"}]}) },
    )]
    fn test_all_shapes_normalize_identically(resource: Value) {
        let tags = tag_map(&resource);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("environment").map(String::as_str), Some("prod"));
    }

    #[parameterized(
        no_tag_field = { json!({"id": "r-1"}) },
        not_an_object = { json!("just a string") },
        tags_is_a_number = { json!({"tags": 42}) },
        normalized_not_a_list = { json!({"Tags": {"environment": "prod"}}) },
        mixed_list_shapes = { json!({"tags": [{"key": "a", "value": "b"}, {"c": "d", "e": "f"}]}) },
        empty_list = { json!({"tags": []}) },
    )]
    fn test_unrecognized_shapes_are_empty(resource: Value) {
        assert!(tag_map(&resource).is_empty());
    }

    #[test]
    fn test_normalized_takes_precedence_over_vendor_tags() {
        let resource = json!({
            "Tags": [{"Key": "owner", "Value": "alice"}],
            "tags": {"owner": "bob"},
        });
        assert_eq!(tag_map(&resource).get("owner").map(String::as_str), Some("alice"));
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let resource = json!({
            "tags": [
                {"key": "owner", "value": "alice"},
                {"key": "owner", "value": "bob"},
            ]
        });
        assert_eq!(tag_map(&resource).get("owner").map(String::as_str), Some("bob"));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let resource = json!({
            "Tags": [
                {"Key": "environment", "Value": "prod"},
                {"Key": "orphan"},
                {"Key": "number", "Value": 7},
                "not an object",
            ]
        });
        let tags = tag_map(&resource);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("environment").map(String::as_str), Some("prod"));
    }
}
