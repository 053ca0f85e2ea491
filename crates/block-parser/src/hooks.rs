/*
 * hooks.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Extension hooks that rewrite nodes and field values in flight.
 */

//! Extension hooks that rewrite nodes and field values in flight.
//!
//! There are four hook points:
//!
//! - **node** - `(node, raw, content_id) -> node`, after a block and its
//!   inner blocks are transformed
//! - **expansion** - `(nodes, raw, content_id) -> nodes`, for the list a
//!   block expanded into (a synced reference, for example)
//! - **field** - `(value, descriptor, meta) -> value`, for every resolved
//!   custom-field value before it is stored
//! - **render** - `(include, node) -> include`, deciding whether rendered
//!   markup is attached
//!
//! Handlers run in registration order and each receives the previous
//! handler's output. Node, field and render handlers may be scoped to a subset of nodes or fields;
//! handlers whose scope does not match are skipped without breaking the
//! chain.
//!
//! # Example
//!
//! ```ignore
//! let mut hooks = Hooks::new();
//! hooks.on_node(NodeScope::name("core/heading"), |mut node, _raw, _id| {
//!     node.attrs.insert("level".into(), json!(2));
//!     node
//! });
//! ```

use block_types::{ContentId, FieldDescriptor, NormalizedNode, RawNode};
use serde_json::Value;

/// Which nodes a node or render handler applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeScope {
    All,
    /// Nodes with this block name.
    Name(String),
    /// Nodes produced by this transformer family.
    Family(String),
}

impl NodeScope {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn family(family: impl Into<String>) -> Self {
        Self::Family(family.into())
    }

    fn matches(&self, node: &NormalizedNode) -> bool {
        match self {
            NodeScope::All => true,
            NodeScope::Name(name) => node.name == *name,
            NodeScope::Family(family) => node.family == *family,
        }
    }
}

/// Which field values a field handler applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldScope {
    All,
    /// Fields of this kind (`image`, `repeater`, ...).
    Kind(String),
    /// Fields with this name.
    Name(String),
    /// Fields stored on blocks with this block name.
    Block(String),
}

impl FieldScope {
    pub fn kind(kind: impl Into<String>) -> Self {
        Self::Kind(kind.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn block(block_name: impl Into<String>) -> Self {
        Self::Block(block_name.into())
    }

    fn matches(&self, meta: &FieldMeta<'_>) -> bool {
        match self {
            FieldScope::All => true,
            FieldScope::Kind(kind) => meta.kind == kind.as_str(),
            FieldScope::Name(name) => meta.name == name.as_str(),
            FieldScope::Block(block) => meta.block_name == block.as_str(),
        }
    }
}

/// Classification of a field value passed to field handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta<'a> {
    /// Declared field kind, or `""` when the field has no descriptor.
    pub kind: &'a str,
    pub name: &'a str,
    /// Name of the block the field is stored on.
    pub block_name: &'a str,
    /// Family of the transformer resolving the field.
    pub family: &'a str,
}

type NodeHandler = Box<dyn Fn(NormalizedNode, &RawNode, ContentId) -> NormalizedNode + Send + Sync>;
type ExpansionHandler =
    Box<dyn Fn(Vec<NormalizedNode>, &RawNode, ContentId) -> Vec<NormalizedNode> + Send + Sync>;
type FieldHandler =
    Box<dyn Fn(Value, Option<&FieldDescriptor>, &FieldMeta<'_>) -> Value + Send + Sync>;
type RenderHandler = Box<dyn Fn(bool, &NormalizedNode) -> bool + Send + Sync>;

/// Registered handler chains for every hook point.
#[derive(Default)]
pub struct Hooks {
    node: Vec<(NodeScope, NodeHandler)>,
    expansion: Vec<ExpansionHandler>,
    field: Vec<(FieldScope, FieldHandler)>,
    render: Vec<(NodeScope, RenderHandler)>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node handler.
    ///
    /// Nodes that come out of an expansion were already hooked once, under
    /// the content item they were loaded from; the expansion list itself
    /// goes through [`on_expansion`](Self::on_expansion) handlers instead.
    pub fn on_node<F>(&mut self, scope: NodeScope, handler: F) -> &mut Self
    where
        F: Fn(NormalizedNode, &RawNode, ContentId) -> NormalizedNode + Send + Sync + 'static,
    {
        self.node.push((scope, Box::new(handler)));
        self
    }

    /// Register a handler for the node list a block expanded into.
    ///
    /// It receives the block that expanded (the reference, not its target)
    /// and the content item being normalized when the block was reached.
    pub fn on_expansion<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Vec<NormalizedNode>, &RawNode, ContentId) -> Vec<NormalizedNode>
            + Send
            + Sync
            + 'static,
    {
        self.expansion.push(Box::new(handler));
        self
    }

    /// Register a field-value handler.
    pub fn on_field<F>(&mut self, scope: FieldScope, handler: F) -> &mut Self
    where
        F: Fn(Value, Option<&FieldDescriptor>, &FieldMeta<'_>) -> Value + Send + Sync + 'static,
    {
        self.field.push((scope, Box::new(handler)));
        self
    }

    /// Register a render-decision handler.
    pub fn on_render<F>(&mut self, scope: NodeScope, handler: F) -> &mut Self
    where
        F: Fn(bool, &NormalizedNode) -> bool + Send + Sync + 'static,
    {
        self.render.push((scope, Box::new(handler)));
        self
    }

    /// Run the node chain.
    ///
    /// Scopes are checked against the node as the previous handler left it.
    pub fn apply_node(
        &self,
        node: NormalizedNode,
        raw: &RawNode,
        content_id: ContentId,
    ) -> NormalizedNode {
        self.node.iter().fold(node, |node, (scope, handler)| {
            if scope.matches(&node) {
                handler(node, raw, content_id)
            } else {
                node
            }
        })
    }

    /// Run the expansion chain.
    pub fn apply_expansion(
        &self,
        nodes: Vec<NormalizedNode>,
        raw: &RawNode,
        content_id: ContentId,
    ) -> Vec<NormalizedNode> {
        self.expansion
            .iter()
            .fold(nodes, |nodes, handler| handler(nodes, raw, content_id))
    }

    /// Run the field chain.
    pub fn apply_field(
        &self,
        value: Value,
        descriptor: Option<&FieldDescriptor>,
        meta: &FieldMeta<'_>,
    ) -> Value {
        self.field.iter().fold(value, |value, (scope, handler)| {
            if scope.matches(meta) {
                handler(value, descriptor, meta)
            } else {
                value
            }
        })
    }

    /// Run the render-decision chain starting from `initial`.
    pub fn include_rendered(&self, initial: bool, node: &NormalizedNode) -> bool {
        self.render
            .iter()
            .filter(|(scope, _)| scope.matches(node))
            .fold(initial, |include, (_, handler)| handler(include, node))
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_empty()
            && self.expansion.is_empty()
            && self.field.is_empty()
            && self.render.is_empty()
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("node", &self.node.len())
            .field("expansion", &self.expansion.len())
            .field("field", &self.field.len())
            .field("render", &self.render.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_types::{Attrs, family};
    use serde_json::json;

    fn node(name: &str, family: &str) -> NormalizedNode {
        NormalizedNode::new(name, family, Attrs::new())
    }

    fn meta<'a>(kind: &'a str, name: &'a str) -> FieldMeta<'a> {
        FieldMeta {
            kind,
            name,
            block_name: "acf/hero",
            family: family::SCHEMA_FIELD,
        }
    }

    #[test]
    fn test_node_handlers_chain_in_registration_order() {
        let mut hooks = Hooks::new();
        for tag in ["h1", "h2", "h3"] {
            hooks.on_node(NodeScope::All, move |mut node, _raw, _id| {
                node.name = format!("{}({})", tag, node.name);
                node
            });
        }

        let out = hooks.apply_node(node("x", family::GENERIC), &RawNode::new("x"), ContentId(1));
        assert_eq!(out.name, "h3(h2(h1(x)))");
    }

    #[test]
    fn test_node_scope_by_name_and_family() {
        let mut hooks = Hooks::new();
        hooks
            .on_node(NodeScope::name("core/heading"), |mut node, _, _| {
                node.attrs.insert("seen-by-name".into(), json!(true));
                node
            })
            .on_node(NodeScope::family(family::SCHEMA_FIELD), |mut node, _, _| {
                node.attrs.insert("seen-by-family".into(), json!(true));
                node
            });

        let raw = RawNode::new("core/heading");
        let heading = hooks.apply_node(node("core/heading", family::GENERIC), &raw, ContentId(1));
        assert_eq!(heading.attrs.get("seen-by-name"), Some(&json!(true)));
        assert_eq!(heading.attrs.get("seen-by-family"), None);

        let hero = hooks.apply_node(node("acf/hero", family::SCHEMA_FIELD), &raw, ContentId(1));
        assert_eq!(hero.attrs.get("seen-by-name"), None);
        assert_eq!(hero.attrs.get("seen-by-family"), Some(&json!(true)));
    }

    #[test]
    fn test_node_handler_receives_raw_node_and_content_id() {
        let mut hooks = Hooks::new();
        hooks.on_node(NodeScope::All, |mut node, raw, id| {
            node.attrs.insert("raw".into(), json!(raw.name()));
            node.attrs.insert("content".into(), json!(id.0));
            node
        });

        let out = hooks.apply_node(
            node("core/quote", family::GENERIC),
            &RawNode::new("core/quote"),
            ContentId(9),
        );
        assert_eq!(out.attrs.get("raw"), Some(&json!("core/quote")));
        assert_eq!(out.attrs.get("content"), Some(&json!(9)));
    }

    #[test]
    fn test_expansion_handlers_chain_over_the_whole_list() {
        let mut hooks = Hooks::new();
        hooks
            .on_expansion(|mut nodes, raw, id| {
                for node in &mut nodes {
                    node.attrs.insert("via".into(), json!(format!("{}@{}", raw.name(), id.0)));
                }
                nodes
            })
            .on_expansion(|mut nodes, _, _| {
                nodes.truncate(1);
                nodes
            });
        assert!(!hooks.is_empty());

        let out = hooks.apply_expansion(
            vec![node("core/paragraph", family::GENERIC), node("core/image", family::GENERIC)],
            &RawNode::new("core/block"),
            ContentId(3),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].attrs.get("via"), Some(&json!("core/block@3")));
    }

    #[test]
    fn test_field_scopes() {
        let mut hooks = Hooks::new();
        hooks
            .on_field(FieldScope::kind("image"), |_, _, _| json!("image-hook"))
            .on_field(FieldScope::name("title"), |v, _, _| {
                json!(format!("{}!", v.as_str().unwrap_or("")))
            })
            .on_field(FieldScope::block("acf/other"), |_, _, _| json!("never"));

        assert_eq!(
            hooks.apply_field(json!(5), None, &meta("image", "photo")),
            json!("image-hook")
        );
        assert_eq!(
            hooks.apply_field(json!("Hello"), None, &meta("text", "title")),
            json!("Hello!")
        );
        assert_eq!(
            hooks.apply_field(json!("plain"), None, &meta("text", "body")),
            json!("plain")
        );
    }

    #[test]
    fn test_render_decision_defaults_to_initial() {
        let hooks = Hooks::new();
        assert!(hooks.include_rendered(true, &node("core/paragraph", family::GENERIC)));
        assert!(!hooks.include_rendered(false, &node("core/paragraph", family::GENERIC)));
    }

    #[test]
    fn test_render_decision_chain() {
        let mut hooks = Hooks::new();
        hooks
            .on_render(NodeScope::All, |_, _| false)
            .on_render(NodeScope::name("core/html"), |include, _| !include);

        assert!(!hooks.include_rendered(true, &node("core/paragraph", family::GENERIC)));
        assert!(hooks.include_rendered(true, &node("core/html", family::GENERIC)));
    }
}
