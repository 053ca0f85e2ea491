/*
 * attributes.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Attribute inference from saved block markup.
 */

//! Attribute inference from saved block markup.
//!
//! Many block attributes are never stored in the block's comment
//! delimiter; the editor re-derives them from the saved HTML using the
//! `source` rule in the block schema. [`AttributeResolver`] evaluates those
//! rules against a block's markup.
//!
//! Resolution never fails: a rule that cannot produce a value yields
//! `None` and the attribute is simply left out.

use block_markup::{Element, Fragment, Markup, Selector};
use block_types::{AttributeSchema, ContentId, SourceRule, ValueType};
use serde_json::{Map, Number, Value};

use crate::collaborators::TreeSource;

/// The part of a fragment a rule is evaluated against.
#[derive(Clone, Copy)]
enum Scope<'f, 'a> {
    /// A block's whole markup.
    Fragment(&'f Fragment<'a>),
    /// One element, for the sub-rules of a `query` source.
    Element(&'f Fragment<'a>, Element<'f, 'a>),
}

/// Evaluates attribute source rules.
pub struct AttributeResolver<'a> {
    trees: &'a dyn TreeSource,
}

impl<'a> AttributeResolver<'a> {
    /// `trees` answers `meta`-sourced attributes.
    pub fn new(trees: &'a dyn TreeSource) -> Self {
        Self { trees }
    }

    /// Resolve one attribute against raw markup.
    pub fn resolve(&self, schema: &AttributeSchema, markup: &str, id: ContentId) -> Option<Value> {
        let markup = Markup::new(markup);
        let fragment = markup
            .parse()
            .inspect_err(|e| tracing::trace!(error = %e, "Block markup did not parse"))
            .ok();
        self.resolve_in(schema, fragment.as_ref(), id)
    }

    /// Resolve one attribute against an already-parsed fragment.
    ///
    /// Falls back to the schema's declared default when the rule yields
    /// nothing.
    pub fn resolve_in(
        &self,
        schema: &AttributeSchema,
        fragment: Option<&Fragment<'_>>,
        id: ContentId,
    ) -> Option<Value> {
        let sourced = match schema.rule() {
            SourceRule::Default => None,
            SourceRule::Unsupported => {
                tracing::trace!(source = ?schema.source, "Unsupported attribute source");
                None
            }
            SourceRule::Meta(key) => self.trees.content_meta(id, key),
            rule => fragment.and_then(|f| evaluate(rule, schema, Scope::Fragment(f))),
        };

        sourced
            .and_then(|value| coerce(value, schema.value_type))
            .or_else(|| schema.default.clone())
    }
}

fn evaluate(rule: SourceRule<'_>, schema: &AttributeSchema, scope: Scope<'_, '_>) -> Option<Value> {
    let selector = match schema.selector.as_deref() {
        Some(s) => match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring attribute with invalid selector");
                return None;
            }
        },
        None => None,
    };

    if let SourceRule::Query(sub_schemas) = rule {
        let selector = selector?;
        let (fragment, matches) = match scope {
            Scope::Fragment(f) => (f, f.select(&selector)),
            Scope::Element(f, e) => (f, e.select(&selector)),
        };
        let items = matches
            .into_iter()
            .map(|element| {
                let mut item = Map::new();
                for (key, sub) in sub_schemas {
                    let value = evaluate(sub.rule(), sub, Scope::Element(fragment, element))
                        .and_then(|v| coerce(v, sub.value_type))
                        .or_else(|| sub.default.clone());
                    if let Some(value) = value {
                        item.insert(key.clone(), value);
                    }
                }
                Value::Object(item)
            })
            .collect();
        return Some(Value::Array(items));
    }

    let (fragment, target) = match (scope, &selector) {
        (Scope::Fragment(f), Some(sel)) => (f, Some(f.select_first(sel)?)),
        (Scope::Element(f, e), Some(sel)) => (f, Some(e.select(sel).into_iter().next()?)),
        (Scope::Fragment(f), None) => (f, None),
        (Scope::Element(f, e), None) => (f, Some(e)),
    };

    match (rule, target) {
        (SourceRule::Attribute(name), Some(element)) => {
            if schema.value_type == Some(ValueType::Boolean) {
                Some(Value::Bool(element.has_attribute(name)))
            } else {
                element.attribute(name).map(Value::String)
            }
        }
        (SourceRule::Text, Some(element)) => Some(Value::String(element.text())),
        (SourceRule::Text, None) => Some(Value::String(fragment.text())),
        (SourceRule::Html, Some(element)) => Some(Value::String(element.inner_html())),
        (SourceRule::Html, None) | (SourceRule::Raw, _) => {
            Some(Value::String(fragment.source().to_string()))
        }
        (SourceRule::Tag, Some(element)) => Some(Value::String(element.name().into_owned())),
        _ => None,
    }
}

/// Convert a sourced value to the declared type, or `None` if it cannot be
/// represented as that type.
fn coerce(value: Value, value_type: Option<ValueType>) -> Option<Value> {
    let Some(value_type) = value_type else {
        return Some(value);
    };

    match (value_type, value) {
        (ValueType::String | ValueType::RichText, v @ Value::String(_)) => Some(v),
        (ValueType::String | ValueType::RichText, Value::Number(n)) => {
            Some(Value::String(n.to_string()))
        }
        (ValueType::Number, v @ Value::Number(_)) => Some(v),
        (ValueType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        (ValueType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
            Some(Value::Number(n))
        }
        (ValueType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        (ValueType::Boolean, v @ Value::Bool(_)) => Some(v),
        (ValueType::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (ValueType::Array, v @ Value::Array(_)) => Some(v),
        (ValueType::Object, v @ Value::Object(_)) => Some(v),
        (ValueType::Null, Value::Null) => Some(Value::Null),
        _ => None,
    }
}
