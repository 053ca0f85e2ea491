/*
 * field.rs
 * Copyright (c) 2025 Posit, PBC
 */

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identity and hierarchy metadata for one structured custom field.
///
/// `id` is unique among the fields stored on one block. `parent` is either
/// the id of another field (for sub-fields of repeaters, groups and
/// flexible-content layouts) or the id of the field group that owns a
/// top-level field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(alias = "ID", deserialize_with = "string_or_number")]
    pub id: String,

    /// Field-reference token (e.g. `field_5f1a...`) when it differs from `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(
        default,
        alias = "parentId",
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<String>,

    #[serde(rename = "type", alias = "kind", default)]
    pub kind: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "sub_fields", default, skip_serializing_if = "Vec::is_empty")]
    pub sub_fields: Vec<FieldDescriptor>,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: None,
            parent: None,
            kind: kind.into(),
            name: name.into(),
            sub_fields: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_sub_fields(mut self, sub_fields: Vec<FieldDescriptor>) -> Self {
        self.sub_fields = sub_fields;
        self
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number field id, found {}",
            other
        ))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(Some(s)),
        Value::Number(n) if n.as_u64() != Some(0) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_storage_shape() {
        let field: FieldDescriptor = serde_json::from_value(json!({
            "ID": 812,
            "parent": 800,
            "type": "repeater",
            "name": "slides",
            "sub_fields": [
                { "ID": 813, "key": "field_a1", "parent": "field_slides", "type": "tab", "name": "" }
            ]
        }))
        .unwrap();

        assert_eq!(field.id, "812");
        assert_eq!(field.parent.as_deref(), Some("800"));
        assert_eq!(field.kind, "repeater");
        assert_eq!(field.sub_fields[0].id, "813");
        assert_eq!(field.sub_fields[0].key.as_deref(), Some("field_a1"));
        assert_eq!(field.sub_fields[0].kind, "tab");
    }

    #[test]
    fn test_zero_parent_means_no_parent() {
        let field: FieldDescriptor =
            serde_json::from_value(json!({ "ID": 5, "parent": 0, "type": "text", "name": "t" }))
                .unwrap();
        assert_eq!(field.parent, None);
    }
}
