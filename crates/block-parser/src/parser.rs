/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The block tree normalization engine.
 */

//! The block tree normalization engine.
//!
//! [`BlockParser`] walks a raw block tree depth first. For every block with
//! a name it picks one transformer family, runs that transformer once,
//! normalizes the block's own children into `innerBlocks`, and finally
//! runs the node hook chain. A block that expands instead runs the
//! expansion hook chain, and the result is spliced into the parent's
//! sequence.
//!
//! A parser is configured once (collaborators, hooks, shortcodes, extra
//! transformers) and then only read while normalizing, so one parser can
//! serve any number of passes.

use std::sync::Arc;

use block_types::{ContentId, NormalizedNode, RawNode, family};

use crate::collaborators::{
    AmbientContext, Collaborators, FieldStorage, Renderer, SavedMarkupRenderer, SchemaRegistry,
    TreeSource,
};
use crate::config::ParserConfig;
use crate::context::TransformContext;
use crate::hooks::Hooks;
use crate::memory::MemoryFieldStorage;
use crate::shortcode::{ShortcodeHandler, ShortcodeRegistry};
use crate::transform::{BlockTransformer, Transformed, TransformerRegistry};
use crate::{BlockParserError, Result};

/// Normalizes raw block trees.
pub struct BlockParser {
    registry: TransformerRegistry,
    collaborators: Collaborators,
    hooks: Hooks,
    shortcodes: ShortcodeRegistry,
    config: ParserConfig,
}

impl BlockParser {
    /// Start configuring a parser over the given tree source and schema
    /// registry. Rendering defaults to [`SavedMarkupRenderer`] and field
    /// storage to an empty [`MemoryFieldStorage`].
    pub fn builder(
        trees: Arc<dyn TreeSource>,
        schemas: Arc<dyn SchemaRegistry>,
    ) -> BlockParserBuilder {
        BlockParserBuilder::new(trees, schemas)
    }

    /// Load content item `id` and normalize its top-level blocks.
    ///
    /// # Errors
    ///
    /// Returns [`BlockParserError::NotFound`] if the item (or any item it
    /// references) cannot be loaded, and propagates any transformer or
    /// collaborator failure. No partial result is returned.
    pub fn normalize_content(&self, id: ContentId) -> Result<Vec<NormalizedNode>> {
        tracing::debug!(content_id = %id, "Normalizing content");
        let tree = self.collaborators.trees.load_tree(id)?;
        self.normalize(&tree, id)
    }

    /// Normalize the children of an already loaded `tree` belonging to
    /// content item `id`.
    pub fn normalize(&self, tree: &RawNode, id: ContentId) -> Result<Vec<NormalizedNode>> {
        let mut cx = TransformContext::new(self, id);
        self.normalize_blocks(&tree.children, &mut cx)
    }

    /// Normalize a sibling sequence, dropping nameless blocks and splicing
    /// expansions in place.
    pub(crate) fn normalize_blocks(
        &self,
        blocks: &[RawNode],
        cx: &mut TransformContext<'_>,
    ) -> Result<Vec<NormalizedNode>> {
        let mut out = Vec::with_capacity(blocks.len());
        for block in blocks {
            if !block.has_tag() {
                tracing::trace!(content_id = %cx.content_id(), "Skipping nameless block");
                continue;
            }
            match self.transform_block(block, cx)? {
                Transformed::Node(node) => out.push(node),
                Transformed::Expansion(nodes) => out.extend(nodes),
            }
        }
        Ok(out)
    }

    fn transform_block(
        &self,
        block: &RawNode,
        cx: &mut TransformContext<'_>,
    ) -> Result<Transformed> {
        let tag = self.classify(block);
        let transformer = self.registry.get(tag).ok_or_else(|| {
            BlockParserError::contract(format!("no transformer registered for family `{}`", tag))
        })?;

        tracing::debug!(
            block = block.name(),
            family = transformer.family(),
            content_id = %cx.content_id(),
            "Transforming block"
        );

        match transformer.transform(block, cx)? {
            Transformed::Node(mut node) => {
                if !block.children.is_empty() {
                    node.inner_blocks = Some(self.normalize_blocks(&block.children, cx)?);
                }
                Ok(Transformed::Node(self.hooks.apply_node(
                    node,
                    block,
                    cx.content_id(),
                )))
            }
            Transformed::Expansion(nodes) => Ok(Transformed::Expansion(
                self.hooks.apply_expansion(nodes, block, cx.content_id()),
            )),
        }
    }

    /// The family tag `block` is dispatched to.
    ///
    /// A registered custom transformer that claims the block wins. Otherwise
    /// the block is a schema-field block when its schema declares the
    /// data-carrier attribute or its name is in the schema-field namespace;
    /// either signal alone is enough. Everything else is generic.
    pub fn classify(&self, block: &RawNode) -> &str {
        let schema = self.collaborators.schemas.schema(block.name());
        if let Some(tag) = self.registry.claimant(block, schema) {
            return tag;
        }

        let declares_data = schema.is_some_and(|s| s.declares(&self.config.data_attribute));
        if declares_data || block.name().starts_with(&self.config.schema_field_prefix) {
            family::SCHEMA_FIELD
        } else {
            family::GENERIC
        }
    }

    /// Register an additional transformer family, replacing any transformer
    /// already registered under `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockParserError::ContractViolation`] when the transformer
    /// does not report `tag` as its family.
    pub fn register_transformer(
        &mut self,
        tag: &str,
        transformer: Box<dyn BlockTransformer>,
    ) -> Result<()> {
        self.registry.register(tag, transformer)
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    pub fn shortcodes(&self) -> &ShortcodeRegistry {
        &self.shortcodes
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.registry
    }
}

/// Builder for [`BlockParser`].
pub struct BlockParserBuilder {
    trees: Arc<dyn TreeSource>,
    schemas: Arc<dyn SchemaRegistry>,
    renderer: Option<Arc<dyn Renderer>>,
    fields: Option<Arc<dyn FieldStorage>>,
    ambient: Option<Arc<dyn AmbientContext>>,
    config: ParserConfig,
    hooks: Hooks,
    shortcodes: ShortcodeRegistry,
    transformers: Vec<(String, Box<dyn BlockTransformer>)>,
}

impl BlockParserBuilder {
    pub fn new(trees: Arc<dyn TreeSource>, schemas: Arc<dyn SchemaRegistry>) -> Self {
        Self {
            trees,
            schemas,
            renderer: None,
            fields: None,
            ambient: None,
            config: ParserConfig::default(),
            hooks: Hooks::new(),
            shortcodes: ShortcodeRegistry::new(),
            transformers: Vec::new(),
        }
    }

    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn field_storage(mut self, fields: Arc<dyn FieldStorage>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Host-global context to keep pointed at the content item being
    /// normalized.
    pub fn ambient(mut self, ambient: Arc<dyn AmbientContext>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    pub fn config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn shortcode(mut self, handler: Box<dyn ShortcodeHandler>) -> Self {
        self.shortcodes.register(handler);
        self
    }

    /// Queue an extra transformer family. Registration is checked by
    /// [`build`](Self::build).
    pub fn transformer(
        mut self,
        tag: impl Into<String>,
        transformer: Box<dyn BlockTransformer>,
    ) -> Self {
        self.transformers.push((tag.into(), transformer));
        self
    }

    /// Finish configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BlockParserError::ContractViolation`] for the first queued
    /// transformer whose registration is invalid.
    pub fn build(self) -> Result<BlockParser> {
        let mut registry = TransformerRegistry::new();
        for (tag, transformer) in self.transformers {
            registry.register(&tag, transformer)?;
        }

        Ok(BlockParser {
            registry,
            collaborators: Collaborators {
                trees: self.trees,
                schemas: self.schemas,
                renderer: self
                    .renderer
                    .unwrap_or_else(|| Arc::new(SavedMarkupRenderer)),
                fields: self
                    .fields
                    .unwrap_or_else(|| Arc::new(MemoryFieldStorage::new())),
                ambient: self.ambient,
            },
            hooks: self.hooks,
            shortcodes: self.shortcodes,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryTreeSource, StaticSchemaRegistry};
    use block_types::{AttributeSchema, BlockSchema};
    use serde_json::json;

    fn parser_with(schemas: StaticSchemaRegistry) -> BlockParser {
        BlockParser::builder(Arc::new(MemoryTreeSource::new()), Arc::new(schemas))
            .build()
            .unwrap()
    }

    #[test]
    fn test_classify_by_prefix_and_data_attribute() {
        let schemas = StaticSchemaRegistry::new().with_schema(
            "theme/card",
            BlockSchema::new().with_attribute("data", AttributeSchema::with_default(json!({}))),
        );
        let parser = parser_with(schemas);

        assert_eq!(parser.classify(&RawNode::new("core/paragraph")), family::GENERIC);
        assert_eq!(parser.classify(&RawNode::new("acf/hero")), family::SCHEMA_FIELD);
        assert_eq!(parser.classify(&RawNode::new("theme/card")), family::SCHEMA_FIELD);
    }

    #[test]
    fn test_prefix_wins_without_data_attribute() {
        let schemas = StaticSchemaRegistry::new().with_schema(
            "acf/plain",
            BlockSchema::new().with_attribute("align", AttributeSchema::with_default(json!("left"))),
        );
        let parser = parser_with(schemas);
        assert_eq!(parser.classify(&RawNode::new("acf/plain")), family::SCHEMA_FIELD);
    }

    #[test]
    fn test_nameless_blocks_are_dropped() {
        let parser = parser_with(StaticSchemaRegistry::new());
        let tree = RawNode::document(vec![
            RawNode::new("").with_children(vec![RawNode::new("core/paragraph")]),
            RawNode::new("core/paragraph"),
        ]);

        let out = parser.normalize(&tree, ContentId(1)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "core/paragraph");
        assert!(out[0].inner_blocks.is_none());
    }

    #[test]
    fn test_missing_content_is_not_found() {
        let parser = parser_with(StaticSchemaRegistry::new());
        let err = parser.normalize_content(ContentId(404)).unwrap_err();
        assert!(matches!(err, BlockParserError::NotFound(ContentId(404))));
    }
}
