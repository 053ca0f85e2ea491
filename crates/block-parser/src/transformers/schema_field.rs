/*
 * transformers/schema_field.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Transformer for custom-field blocks.
 */

use std::collections::HashMap;

use block_types::{Attrs, BlockSchema, FieldDescriptor, NormalizedNode, RawNode, family};
use indexmap::IndexSet;
use serde_json::Value;

use super::{apply_defaults, strip_bookkeeping};
use crate::Result;
use crate::config::ParserConfig;
use crate::context::TransformContext;
use crate::fields::{
    FieldValueResolver, INSTANCE_ID_ATTRIBUTE, instance_id, is_empty_value, strip_empty,
};
use crate::hooks::FieldMeta;
use crate::transform::{BlockTransformer, Transformed};

/// Handles blocks whose content lives in custom fields.
///
/// A block stores each field twice: the value under the field name, and the
/// field's reference token under the marked name (`title` and `_title`).
/// The transformer pairs them up, drops sub-fields and layout-only fields,
/// resolves composite values through field storage, and collects the result
/// into the node's `data` map.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaFieldTransformer;

impl SchemaFieldTransformer {
    /// Split raw attributes into field entries and the attributes left over.
    ///
    /// Entries come from the data-carrier attribute when it holds a map.
    /// Otherwise every attribute the schema does not declare is an entry and
    /// is moved out of the attributes.
    fn split_entries(
        &self,
        node: &RawNode,
        schema: Option<&BlockSchema>,
        config: &ParserConfig,
    ) -> (Attrs, Attrs) {
        let mut attrs = node.attrs.clone();
        if let Some(Value::Object(entries)) = node.attrs.get(&config.data_attribute) {
            return (entries.clone(), attrs);
        }

        let mut entries = Attrs::new();
        attrs.retain(|key, value| {
            let keep = key == INSTANCE_ID_ATTRIBUTE
                || config.is_bookkeeping_key(key)
                || schema.is_some_and(|s| s.declares(key));
            if !keep {
                entries.insert(key.clone(), value.clone());
            }
            keep
        });
        (entries, attrs)
    }

    fn resolve_data(&self, node: &RawNode, entries: &Attrs, cx: &TransformContext<'_>) -> Attrs {
        let config = cx.config();
        let storage = cx.collaborators().fields.as_ref();
        let resolver = FieldValueResolver::new(storage, config);
        let instance = instance_id(node, entries);

        cx.ensure_ambient();
        storage.prepare(&instance, entries);

        // Every field present on the block, so sub-fields can be recognized
        // by their parent.
        let mut descriptors: HashMap<&str, FieldDescriptor> = HashMap::new();
        let mut sibling_ids = IndexSet::new();
        for (key, value) in entries {
            let Some(token) = value.as_str().filter(|_| config.is_field_key(key, value)) else {
                continue;
            };
            if let Some(descriptor) = storage.field_descriptor(token, Some(&instance)) {
                sibling_ids.insert(descriptor.id.clone());
                if let Some(field_key) = &descriptor.key {
                    sibling_ids.insert(field_key.clone());
                }
                descriptors.insert(key.as_str(), descriptor);
            }
        }

        let mut data = Attrs::new();
        for (key, value) in entries {
            let Some(token) = value.as_str().filter(|_| config.is_field_key(key, value)) else {
                let marked = format!("{}{}", config.field_key_marker, key);
                if !entries.contains_key(&marked) {
                    data.insert(key.clone(), value.clone());
                }
                continue;
            };

            let name = config.field_name(key);
            let descriptor = descriptors.get(key.as_str());
            if let Some(descriptor) = descriptor {
                if resolver.is_sub_field(descriptor, &sibling_ids) {
                    tracing::trace!(field = name, parent = ?descriptor.parent, "Skipping sub-field");
                    continue;
                }
                if config.is_layout_kind(&descriptor.kind) {
                    tracing::trace!(field = name, kind = %descriptor.kind, "Skipping layout field");
                    continue;
                }
            }

            let kind = descriptor.map_or("", |d| d.kind.as_str());
            let raw = entries.get(name).cloned().unwrap_or(Value::Null);
            let value = if config.requires_indirection(kind, &raw) {
                cx.ensure_ambient();
                resolver
                    .resolve_field(token, &instance)
                    .unwrap_or(Value::Null)
            } else {
                raw
            };

            let meta = FieldMeta {
                kind,
                name,
                block_name: node.name(),
                family: family::SCHEMA_FIELD,
            };
            let value = strip_empty(cx.hooks().apply_field(value, descriptor, &meta));
            if is_empty_value(&value) {
                tracing::trace!(field = name, "Omitting empty field");
                continue;
            }
            data.insert(name.to_string(), value);
        }
        data
    }
}

impl BlockTransformer for SchemaFieldTransformer {
    fn family(&self) -> &str {
        family::SCHEMA_FIELD
    }

    fn transform(&self, node: &RawNode, cx: &mut TransformContext<'_>) -> Result<Transformed> {
        let config = cx.config();
        let schema = cx.schema(node.name());

        let (entries, mut attrs) = self.split_entries(node, schema, config);
        apply_defaults(&mut attrs, schema);
        strip_bookkeeping(&mut attrs, config);

        let data = self.resolve_data(node, &entries, cx);
        Ok(Transformed::Node(
            NormalizedNode::new(node.name(), family::SCHEMA_FIELD, attrs).with_data(data),
        ))
    }
}
