/*
 * schema.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Declarative block attribute schemas.
 */

//! Declarative block attribute schemas.
//!
//! A [`BlockSchema`] lists the attributes a block type supports and, for
//! each one, how to infer its value from the block's saved markup when the
//! value was not stored in the block's comment delimiter. The serialized
//! shape follows the `attributes` / `supports` sections of a `block.json`
//! file.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Declared type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueType {
    String,
    RichText,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl ValueType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(ValueType::String),
            "rich-text" => Some(ValueType::RichText),
            "number" => Some(ValueType::Number),
            "integer" => Some(ValueType::Integer),
            "boolean" => Some(ValueType::Boolean),
            "array" => Some(ValueType::Array),
            "object" => Some(ValueType::Object),
            "null" => Some(ValueType::Null),
            _ => None,
        }
    }
}

/// Where an attribute's value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Attribute,
    Text,
    Html,
    RichText,
    Tag,
    Raw,
    Query,
    Meta,
    #[serde(other)]
    Unsupported,
}

/// Schema entry for one attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSchema {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_value_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub value_type: Option<ValueType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    /// HTML attribute name, for the `attribute` source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Per-element sub-schema, for the `query` source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<IndexMap<String, AttributeSchema>>,

    /// Content metadata key, for the `meta` source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

/// Resolved source rule for an [`AttributeSchema`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceRule<'a> {
    Attribute(&'a str),
    Text,
    Html,
    Tag,
    Raw,
    Query(&'a IndexMap<String, AttributeSchema>),
    Meta(&'a str),
    /// No source: only the declared default can supply a value.
    Default,
    /// A source this engine cannot evaluate (or one missing its parameter).
    Unsupported,
}

impl AttributeSchema {
    /// Attribute read from an HTML attribute of the element matched by `selector`.
    pub fn attribute(selector: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            value_type: Some(ValueType::String),
            source: Some(SourceKind::Attribute),
            selector: Some(selector.into()),
            attribute: Some(attribute.into()),
            ..Self::default()
        }
    }

    /// Attribute read from the text content of the element matched by `selector`.
    pub fn text(selector: impl Into<String>) -> Self {
        Self {
            value_type: Some(ValueType::String),
            source: Some(SourceKind::Text),
            selector: Some(selector.into()),
            ..Self::default()
        }
    }

    /// Attribute read from the inner markup of the element matched by `selector`.
    pub fn html(selector: impl Into<String>) -> Self {
        Self {
            value_type: Some(ValueType::String),
            source: Some(SourceKind::Html),
            selector: Some(selector.into()),
            ..Self::default()
        }
    }

    /// Attribute with no source, only a declared default.
    pub fn with_default(default: Value) -> Self {
        Self {
            default: Some(default),
            ..Self::default()
        }
    }

    pub fn of_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn rule(&self) -> SourceRule<'_> {
        match self.source {
            None => SourceRule::Default,
            Some(SourceKind::Attribute) => match self.attribute.as_deref() {
                Some(name) => SourceRule::Attribute(name),
                None => SourceRule::Unsupported,
            },
            Some(SourceKind::Text) => SourceRule::Text,
            Some(SourceKind::Html) | Some(SourceKind::RichText) => SourceRule::Html,
            Some(SourceKind::Tag) => SourceRule::Tag,
            Some(SourceKind::Raw) => SourceRule::Raw,
            Some(SourceKind::Query) => match &self.query {
                Some(query) => SourceRule::Query(query),
                None => SourceRule::Unsupported,
            },
            Some(SourceKind::Meta) => match self.meta.as_deref() {
                Some(key) => SourceRule::Meta(key),
                None => SourceRule::Unsupported,
            },
            Some(SourceKind::Unsupported) => SourceRule::Unsupported,
        }
    }
}

/// Block features relevant to attribute inference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Supports {
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub anchor: bool,
}

/// Schema for one block type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockSchema {
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeSchema>,

    #[serde(default)]
    pub supports: Supports,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, schema: AttributeSchema) -> Self {
        self.attributes.insert(name.into(), schema);
        self
    }

    pub fn with_anchor_support(mut self) -> Self {
        self.supports.anchor = true;
        self
    }

    pub fn declares(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// `"type"` may be a single type name or a list of alternatives; the first
/// recognized name wins.
fn deserialize_value_type<'de, D>(deserializer: D) -> Result<Option<ValueType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => ValueType::parse(&s),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .find_map(ValueType::parse),
        _ => None,
    })
}

/// Support flags are usually booleans but may be an object of sub-options,
/// which also means "supported".
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Object(_) => true,
        _ => false,
    })
}
