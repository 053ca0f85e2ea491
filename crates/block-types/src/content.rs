/*
 * content.rs
 * Copyright (c) 2025 Posit, PBC
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a stored content item (a post, page, or reusable pattern).
///
/// Every transformation pass runs under exactly one content id, and every
/// collaborator call made during the pass receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub u64);

impl ContentId {
    /// Interpret an attribute value as a content id.
    ///
    /// Editors store references either as JSON numbers or as numeric
    /// strings; both are accepted. Anything else yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(ContentId),
            Value::String(s) => s.trim().parse().ok().map(ContentId),
            _ => None,
        }
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ContentId {
    fn from(id: u64) -> Self {
        ContentId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_accepts_numbers_and_numeric_strings() {
        assert_eq!(ContentId::from_value(&json!(42)), Some(ContentId(42)));
        assert_eq!(ContentId::from_value(&json!("42")), Some(ContentId(42)));
        assert_eq!(ContentId::from_value(&json!(" 7 ")), Some(ContentId(7)));
    }

    #[test]
    fn test_from_value_rejects_other_shapes() {
        assert_eq!(ContentId::from_value(&json!(-1)), None);
        assert_eq!(ContentId::from_value(&json!("abc")), None);
        assert_eq!(ContentId::from_value(&json!(null)), None);
        assert_eq!(ContentId::from_value(&json!([1])), None);
    }
}
