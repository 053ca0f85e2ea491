/*
 * fields.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Custom-field value resolution and cleanup.
 */

use block_types::{Attrs, FieldDescriptor, RawNode};
use indexmap::IndexSet;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::collaborators::FieldStorage;
use crate::config::ParserConfig;

/// Raw attribute holding a block's saved field-storage instance id.
pub const INSTANCE_ID_ATTRIBUTE: &str = "id";

/// Resolves field values through a [`FieldStorage`] backend, hiding
/// layout-only sub-fields at every depth.
pub struct FieldValueResolver<'a> {
    storage: &'a dyn FieldStorage,
    config: &'a ParserConfig,
}

impl<'a> FieldValueResolver<'a> {
    pub fn new(storage: &'a dyn FieldStorage, config: &'a ParserConfig) -> Self {
        Self { storage, config }
    }

    /// Look up `selector` in storage and load its formatted value for
    /// `instance`.
    ///
    /// Returns `None` when the field is unknown or has no stored value.
    pub fn resolve_field(&self, selector: &str, instance: &str) -> Option<Value> {
        let Some(descriptor) = self.storage.field_descriptor(selector, Some(instance)) else {
            tracing::trace!(selector, instance, "Unknown field");
            return None;
        };
        let descriptor = self.without_layout_fields(descriptor);
        let value = self.storage.load_value(instance, &descriptor)?;
        Some(self.storage.format_value(value, instance, &descriptor))
    }

    /// `descriptor` with layout-only kinds removed from its sub-fields,
    /// recursively.
    pub fn without_layout_fields(&self, mut descriptor: FieldDescriptor) -> FieldDescriptor {
        descriptor.sub_fields = std::mem::take(&mut descriptor.sub_fields)
            .into_iter()
            .filter(|sub| !self.config.is_layout_kind(&sub.kind))
            .map(|sub| self.without_layout_fields(sub))
            .collect();
        descriptor
    }

    /// Whether `descriptor` belongs under another field rather than at the
    /// top level of a block's data.
    ///
    /// That is the case when its parent is one of the `sibling_ids` present
    /// on the same block, or when its parent is itself a field reference.
    pub fn is_sub_field(
        &self,
        descriptor: &FieldDescriptor,
        sibling_ids: &IndexSet<String>,
    ) -> bool {
        descriptor
            .parent
            .as_deref()
            .is_some_and(|parent| {
                sibling_ids.contains(parent) || self.config.is_field_reference(parent)
            })
    }
}

/// Whether `value` counts as empty: null, `""`, `[]`, or `{}`.
///
/// `false`, `0`, and `"0"` are values.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Remove empty entries from maps and lists at every depth. A container
/// left empty by the removal is itself removed from its parent.
pub fn strip_empty(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, strip_empty(v)))
                .filter(|(_, v)| !is_empty_value(v))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(strip_empty)
                .filter(|v| !is_empty_value(v))
                .collect(),
        ),
        scalar => scalar,
    }
}

/// The field-storage instance id of a schema-field block.
///
/// Blocks saved with an `id` attribute keep it. Otherwise the id is derived
/// from the block's field entries, so identical blocks share an id and the
/// result is stable across runs.
pub fn instance_id(node: &RawNode, entries: &Attrs) -> String {
    if let Some(id) = node.attr(INSTANCE_ID_ATTRIBUTE).and_then(Value::as_str)
        && !id.is_empty()
    {
        return id.to_string();
    }

    let serialized = Value::Object(entries.clone()).to_string();
    format!("block_{}", hex::encode(Sha256::digest(serialized.as_bytes())))
}
