/*
 * raw.rs
 * Copyright (c) 2025 Posit, PBC
 */

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::normalized::Attrs;

/// One node of the raw block tree, as produced by the editor's block parser.
///
/// The serialized shape matches the editor's own parser output
/// (`blockName`, `attrs`, `innerHTML`, `innerBlocks`), so trees can be fed
/// in straight from stored JSON. Raw nodes are never mutated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// The block name (e.g. `core/paragraph`). Freeform HTML between blocks
    /// comes through with no name and is dropped before transformation.
    #[serde(rename = "blockName", alias = "tag", default)]
    pub tag: Option<String>,

    #[serde(default, deserialize_with = "attrs_or_empty")]
    pub attrs: Attrs,

    /// Markup saved for this block, used to infer attributes that are
    /// sourced from HTML.
    #[serde(rename = "innerHTML", alias = "innerMarkup", default)]
    pub inner_markup: String,

    #[serde(rename = "innerBlocks", alias = "children", default)]
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// A nameless container whose children are the top-level blocks of a
    /// content item.
    pub fn document(children: Vec<RawNode>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.inner_markup = markup.into();
        self
    }

    pub fn with_children(mut self, children: Vec<RawNode>) -> Self {
        self.children = children;
        self
    }

    /// The block name, or `""` when the node has none.
    pub fn name(&self) -> &str {
        self.tag.as_deref().unwrap_or("")
    }

    /// Whether this node carries a usable block name.
    pub fn has_tag(&self) -> bool {
        !self.name().is_empty()
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }
}

/// The editor's parser emits `"attrs": []` for blocks without attributes,
/// so an empty array (or null) must read as an empty map.
fn attrs_or_empty<'de, D>(deserializer: D) -> Result<Attrs, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Attrs::new()),
        Value::Array(items) if items.is_empty() => Ok(Attrs::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected block attributes to be an object, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_editor_shape() {
        let node: RawNode = serde_json::from_value(json!({
            "blockName": "core/group",
            "attrs": { "align": "wide" },
            "innerHTML": "<div></div>",
            "innerBlocks": [
                { "blockName": null, "attrs": [], "innerHTML": "\n", "innerBlocks": [] }
            ]
        }))
        .unwrap();

        assert_eq!(node.name(), "core/group");
        assert_eq!(node.attr("align"), Some(&json!("wide")));
        assert_eq!(node.inner_markup, "<div></div>");
        assert_eq!(node.children.len(), 1);
        assert!(!node.children[0].has_tag());
        assert!(node.children[0].attrs.is_empty());
    }

    #[test]
    fn test_deserialize_rejects_scalar_attrs() {
        let result: Result<RawNode, _> =
            serde_json::from_value(json!({ "blockName": "core/paragraph", "attrs": 3 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_tag_is_not_a_tag() {
        assert!(!RawNode::new("").has_tag());
        assert!(RawNode::new("core/paragraph").has_tag());
    }
}
