/*
 * collaborators.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Interfaces to the host system.
 */

//! Interfaces to the host system.
//!
//! The engine never reads storage, schemas, or rendering state directly.
//! Everything it needs from the host comes through these traits, and every
//! call carries the [`ContentId`] of the pass that makes it.
//!
//! Hosts whose rendering or field APIs read a global "current content item"
//! instead of taking an explicit id implement [`AmbientContext`]; the engine
//! repoints it before each such call (see
//! [`TransformContext::ensure_ambient`](crate::context::TransformContext::ensure_ambient)).

use std::sync::Arc;

use block_types::{Attrs, BlockSchema, ContentId, FieldDescriptor, RawNode};
use serde_json::Value;

use crate::Result;

/// Loads the raw block tree of a content item.
pub trait TreeSource: Send + Sync {
    /// Load the tree for `id`. The returned node is a nameless container
    /// whose children are the item's top-level blocks.
    ///
    /// # Errors
    ///
    /// Returns [`BlockParserError::NotFound`](crate::BlockParserError::NotFound)
    /// when the item does not exist.
    fn load_tree(&self, id: ContentId) -> Result<RawNode>;

    /// A metadata value stored on the content item, for attributes sourced
    /// from metadata.
    fn content_meta(&self, _id: ContentId, _key: &str) -> Option<Value> {
        None
    }
}

/// Declares which attributes each block type supports.
pub trait SchemaRegistry: Send + Sync {
    fn schema(&self, block_name: &str) -> Option<&BlockSchema>;

    fn supports_anchor(&self, block_name: &str) -> bool {
        self.schema(block_name).is_some_and(|s| s.supports.anchor)
    }
}

/// Renders a block to its final markup.
pub trait Renderer: Send + Sync {
    /// # Errors
    ///
    /// A renderer that cannot reach its backend should return
    /// [`BlockParserError::Collaborator`](crate::BlockParserError::Collaborator);
    /// the error aborts the whole pass.
    fn render(&self, node: &RawNode, content_id: ContentId) -> Result<String>;
}

/// Field storage and formatting for custom-field blocks.
///
/// A field instance id identifies one block's stored fields; see
/// [`instance_id`](crate::fields::instance_id).
pub trait FieldStorage: Send + Sync {
    /// Make a block's raw field entries available under `instance` before
    /// any of its values are loaded.
    fn prepare(&self, _instance: &str, _entries: &Attrs) {}

    /// Look up a field by reference token, id, or (within `instance`) name.
    fn field_descriptor(&self, selector: &str, instance: Option<&str>) -> Option<FieldDescriptor>;

    /// Load the stored value of `field` for `instance`.
    fn load_value(&self, instance: &str, field: &FieldDescriptor) -> Option<Value>;

    /// Turn a stored value into its presentation form (ids into objects,
    /// sub-field keys into names, and so on).
    fn format_value(&self, value: Value, _instance: &str, _field: &FieldDescriptor) -> Value {
        value
    }
}

/// A host-global "current content item" read implicitly by the renderer or
/// field storage.
pub trait AmbientContext: Send + Sync {
    fn current(&self) -> Option<ContentId>;

    fn switch_to(&self, id: ContentId);
}

/// Renders a block as its saved markup.
///
/// Static blocks render to exactly what the editor saved, so this is a
/// reasonable default for hosts without a server-side renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SavedMarkupRenderer;

impl Renderer for SavedMarkupRenderer {
    fn render(&self, node: &RawNode, _content_id: ContentId) -> Result<String> {
        Ok(node.inner_markup.clone())
    }
}

/// The full set of host collaborators used by a parser.
#[derive(Clone)]
pub struct Collaborators {
    pub trees: Arc<dyn TreeSource>,
    pub schemas: Arc<dyn SchemaRegistry>,
    pub renderer: Arc<dyn Renderer>,
    pub fields: Arc<dyn FieldStorage>,
    pub ambient: Option<Arc<dyn AmbientContext>>,
}
