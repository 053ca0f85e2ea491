/*
 * normalized.rs
 * Copyright (c) 2025 Posit, PBC
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute and field maps keep insertion order so output is stable.
pub type Attrs = Map<String, Value>;

/// Family tags for the two built-in transformers.
pub mod family {
    /// Standard blocks whose attributes are declared by a block schema.
    pub const GENERIC: &str = "generic";
    /// Blocks whose content lives in structured custom fields.
    pub const SCHEMA_FIELD: &str = "schemaField";
}

/// One block of the normalized output tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedNode {
    pub name: String,

    /// The family tag of the transformer that produced this node.
    #[serde(rename = "type")]
    pub family: String,

    pub attrs: Attrs,

    #[serde(
        rename = "innerBlocks",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub inner_blocks: Option<Vec<NormalizedNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Attrs>,
}

impl NormalizedNode {
    pub fn new(name: impl Into<String>, family: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            name: name.into(),
            family: family.into(),
            attrs,
            inner_blocks: None,
            rendered: None,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Attrs) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_inner_blocks(mut self, inner_blocks: Vec<NormalizedNode>) -> Self {
        self.inner_blocks = Some(inner_blocks);
        self
    }

    /// Serialize to a JSON value.
    pub fn to_value(&self) -> Value {
        // A struct of strings and JSON maps always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Depth-first iterator over this node and all of its descendants.
    pub fn descendants(&self) -> Vec<&NormalizedNode> {
        let mut out = vec![self];
        if let Some(children) = &self.inner_blocks {
            for child in children {
                out.extend(child.descendants());
            }
        }
        out
    }
}
