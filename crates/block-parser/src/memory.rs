/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * In-memory collaborators.
 */

//! In-memory collaborators.
//!
//! These implement every collaborator trait over plain maps, for hosts that
//! already hold their content in memory and for tests. [`MemoryFieldStorage`]
//! understands the flattened layout the custom-field plugin uses to store
//! block fields (`items: 2`, `items_0_title: ...`, `items_1_title: ...`).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use block_types::{Attrs, BlockSchema, ContentId, FieldDescriptor, RawNode};
use serde_json::{Map, Value};

use crate::collaborators::{AmbientContext, FieldStorage, Renderer, SchemaRegistry, TreeSource};
use crate::{BlockParserError, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Content trees and metadata keyed by content id.
#[derive(Debug, Default, Clone)]
pub struct MemoryTreeSource {
    trees: HashMap<ContentId, RawNode>,
    meta: HashMap<(ContentId, String), Value>,
}

impl MemoryTreeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ContentId, tree: RawNode) {
        self.trees.insert(id, tree);
    }

    pub fn with_tree(mut self, id: ContentId, tree: RawNode) -> Self {
        self.insert(id, tree);
        self
    }

    pub fn with_meta(mut self, id: ContentId, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert((id, key.into()), value);
        self
    }
}

impl TreeSource for MemoryTreeSource {
    fn load_tree(&self, id: ContentId) -> Result<RawNode> {
        self.trees
            .get(&id)
            .cloned()
            .ok_or(BlockParserError::NotFound(id))
    }

    fn content_meta(&self, id: ContentId, key: &str) -> Option<Value> {
        self.meta.get(&(id, key.to_string())).cloned()
    }
}

/// Block schemas keyed by block name.
#[derive(Debug, Default, Clone)]
pub struct StaticSchemaRegistry {
    schemas: HashMap<String, BlockSchema>,
}

impl StaticSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block_name: impl Into<String>, schema: BlockSchema) {
        self.schemas.insert(block_name.into(), schema);
    }

    pub fn with_schema(mut self, block_name: impl Into<String>, schema: BlockSchema) -> Self {
        self.insert(block_name, schema);
        self
    }

    /// Load schemas from a JSON object mapping block names to schemas.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let schemas = serde_json::from_str(json)
            .map_err(|e| BlockParserError::Config(format!("Invalid block schemas: {}", e)))?;
        Ok(Self { schemas })
    }
}

impl SchemaRegistry for StaticSchemaRegistry {
    fn schema(&self, block_name: &str) -> Option<&BlockSchema> {
        self.schemas.get(block_name)
    }
}

/// Field descriptors plus per-instance stored entries.
///
/// Values are stored the way blocks save them: under the field name, with
/// repeater rows and group members flattened into `{name}_{row}_{sub}` and
/// `{name}_{sub}` entries. Entries arrive through [`FieldStorage::prepare`].
#[derive(Debug, Default)]
pub struct MemoryFieldStorage {
    fields: Vec<FieldDescriptor>,
    attachments: HashMap<u64, Value>,
    instances: Mutex<HashMap<String, Attrs>>,
}

impl MemoryFieldStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level field. Its sub-fields are registered with it.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Register the object an image or gallery id formats to.
    pub fn with_attachment(mut self, id: u64, attachment: Value) -> Self {
        self.attachments.insert(id, attachment);
        self
    }

    /// Stored entries for `instance`, if it has been prepared.
    pub fn entries(&self, instance: &str) -> Option<Attrs> {
        lock(&self.instances).get(instance).cloned()
    }

    fn find<'f>(fields: &'f [FieldDescriptor], selector: &str) -> Option<&'f FieldDescriptor> {
        fields.iter().find_map(|field| {
            if field.id == selector || field.key.as_deref() == Some(selector) {
                Some(field)
            } else {
                Self::find(&field.sub_fields, selector)
            }
        })
    }

    fn load(entries: &Attrs, path: &str, field: &FieldDescriptor) -> Option<Value> {
        let direct = entries.get(path);
        match field.kind.as_str() {
            "repeater" if !matches!(direct, Some(Value::Array(_))) => {
                let rows = direct.and_then(row_count)?;
                let rows = (0..rows)
                    .map(|row| {
                        let prefix = format!("{}_{}", path, row);
                        Value::Object(Self::load_members(entries, &prefix, &field.sub_fields))
                    })
                    .collect();
                Some(Value::Array(rows))
            }
            "group" if !matches!(direct, Some(Value::Object(_))) => {
                let members = Self::load_members(entries, path, &field.sub_fields);
                if members.is_empty() {
                    direct.cloned()
                } else {
                    Some(Value::Object(members))
                }
            }
            _ => direct.cloned(),
        }
    }

    fn load_members(
        entries: &Attrs,
        prefix: &str,
        sub_fields: &[FieldDescriptor],
    ) -> Map<String, Value> {
        sub_fields
            .iter()
            .filter_map(|sub| {
                let path = format!("{}_{}", prefix, sub.name);
                Self::load(entries, &path, sub).map(|value| (sub.name.clone(), value))
            })
            .collect()
    }

    fn format(&self, value: Value, field: &FieldDescriptor) -> Value {
        match (field.kind.as_str(), value) {
            ("true_false", value) => Value::Bool(is_truthy(&value)),
            ("image", Value::Number(n)) => n
                .as_u64()
                .and_then(|id| self.attachments.get(&id).cloned())
                .unwrap_or(Value::Number(n)),
            ("gallery", Value::Array(items)) => Value::Array(
                items
                    .into_iter()
                    .map(|item| match item.as_u64().and_then(|id| self.attachments.get(&id)) {
                        Some(attachment) => attachment.clone(),
                        None => item,
                    })
                    .collect(),
            ),
            ("group", Value::Object(map)) => Value::Object(self.format_members(map, field)),
            ("repeater", Value::Array(rows)) => Value::Array(
                rows.into_iter()
                    .map(|row| match row {
                        Value::Object(map) => Value::Object(self.format_members(map, field)),
                        other => other,
                    })
                    .collect(),
            ),
            (_, value) => value,
        }
    }

    /// Keep only declared members, formatted by their own kind.
    fn format_members(
        &self,
        mut map: Map<String, Value>,
        field: &FieldDescriptor,
    ) -> Map<String, Value> {
        if field.sub_fields.is_empty() {
            return map;
        }
        field
            .sub_fields
            .iter()
            .filter_map(|sub| {
                let value = map
                    .remove(&sub.name)
                    .or_else(|| sub.key.as_ref().and_then(|k| map.remove(k)))
                    .or_else(|| map.remove(&sub.id))?;
                Some((sub.name.clone(), self.format(value, sub)))
            })
            .collect()
    }
}

fn row_count(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

impl FieldStorage for MemoryFieldStorage {
    fn prepare(&self, instance: &str, entries: &Attrs) {
        lock(&self.instances).insert(instance.to_string(), entries.clone());
    }

    fn field_descriptor(&self, selector: &str, instance: Option<&str>) -> Option<FieldDescriptor> {
        if let Some(field) = Self::find(&self.fields, selector) {
            return Some(field.clone());
        }

        // Field names resolve through the key the block saved next to them.
        let instances = lock(&self.instances);
        let key = instances
            .get(instance?)?
            .get(&format!("_{}", selector))?
            .as_str()?
            .to_string();
        drop(instances);
        Self::find(&self.fields, &key).cloned()
    }

    fn load_value(&self, instance: &str, field: &FieldDescriptor) -> Option<Value> {
        let instances = lock(&self.instances);
        let entries = instances.get(instance)?;
        Self::load(entries, &field.name, field)
    }

    fn format_value(&self, value: Value, _instance: &str, field: &FieldDescriptor) -> Value {
        self.format(value, field)
    }
}

/// Renders blocks from fixed markup keyed by block name, falling back to the
/// saved markup.
#[derive(Debug, Default, Clone)]
pub struct StaticRenderer {
    markup: HashMap<String, String>,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markup(mut self, block_name: impl Into<String>, markup: impl Into<String>) -> Self {
        self.markup.insert(block_name.into(), markup.into());
        self
    }
}

impl Renderer for StaticRenderer {
    fn render(&self, node: &RawNode, _content_id: ContentId) -> Result<String> {
        Ok(self
            .markup
            .get(node.name())
            .cloned()
            .unwrap_or_else(|| node.inner_markup.clone()))
    }
}

/// An [`AmbientContext`] that records every switch.
#[derive(Debug, Default)]
pub struct RecordingAmbient {
    current: Mutex<Option<ContentId>>,
    switches: Mutex<Vec<ContentId>>,
}

impl RecordingAmbient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start out pointing at `id`.
    pub fn pointing_at(id: ContentId) -> Self {
        Self {
            current: Mutex::new(Some(id)),
            switches: Mutex::new(Vec::new()),
        }
    }

    /// Every id switched to, in order.
    pub fn switches(&self) -> Vec<ContentId> {
        lock(&self.switches).clone()
    }
}

impl AmbientContext for RecordingAmbient {
    fn current(&self) -> Option<ContentId> {
        *lock(&self.current)
    }

    fn switch_to(&self, id: ContentId) {
        *lock(&self.current) = Some(id);
        lock(&self.switches).push(id);
    }
}
