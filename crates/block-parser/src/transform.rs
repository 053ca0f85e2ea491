/*
 * transform.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Block transformer infrastructure.
 */

//! Block transformer infrastructure.
//!
//! This module provides the core abstractions for per-block transformation:
//!
//! - [`BlockTransformer`] - The trait implemented by every block family
//! - [`Transformed`] - One normalized node, or an expansion into siblings
//! - [`TransformerRegistry`] - Family tag to transformer mapping
//!
//! # Architecture
//!
//! Each block is classified into exactly one family and handed to that
//! family's transformer exactly once. The registry always holds the
//! built-in `generic` and `schemaField` transformers; unknown families fall
//! back to `generic`, so classification can never fail.
//!
//! # Example
//!
//! ```ignore
//! use block_parser::transform::{BlockTransformer, Transformed};
//!
//! struct EmbedTransformer;
//!
//! impl BlockTransformer for EmbedTransformer {
//!     fn family(&self) -> &str { "embed" }
//!
//!     fn claims(&self, node: &RawNode, _schema: Option<&BlockSchema>) -> bool {
//!         node.name().starts_with("core-embed/")
//!     }
//!
//!     fn transform(&self, node: &RawNode, cx: &mut TransformContext<'_>) -> Result<Transformed> {
//!         Ok(Transformed::Node(NormalizedNode::new(node.name(), "embed", node.attrs.clone())))
//!     }
//! }
//!
//! parser.register_transformer("embed", Box::new(EmbedTransformer))?;
//! ```

use block_types::{BlockSchema, NormalizedNode, RawNode, family};

use crate::context::TransformContext;
use crate::transformers::{GenericTransformer, SchemaFieldTransformer};
use crate::{BlockParserError, Result};

/// Result of transforming one block.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed {
    /// The block became one normalized node.
    Node(NormalizedNode),
    /// The block stands for a sequence of sibling nodes that replace it in
    /// its parent (a synced pattern, for instance).
    Expansion(Vec<NormalizedNode>),
}

/// Trait for block transformers.
///
/// # Thread Safety
///
/// Transformers must be `Send + Sync` so a configured parser can be shared.
pub trait BlockTransformer: Send + Sync {
    /// The family tag this transformer handles. Also used as the `type` of
    /// the nodes it produces.
    fn family(&self) -> &str;

    /// Whether this transformer wants `node` regardless of the built-in
    /// classification rules. Only consulted for registered families other
    /// than the built-ins.
    fn claims(&self, _node: &RawNode, _schema: Option<&BlockSchema>) -> bool {
        false
    }

    /// Transform one block. Inner blocks are handled by the engine.
    ///
    /// # Errors
    ///
    /// Failures propagate to the caller of the normalize pass unchanged.
    fn transform(&self, node: &RawNode, cx: &mut TransformContext<'_>) -> Result<Transformed>;
}

/// Registered transformers, one per family tag.
///
/// Registration order is kept; it decides which custom transformer gets a
/// block when several claim it.
pub struct TransformerRegistry {
    transformers: Vec<Box<dyn BlockTransformer>>,
}

impl TransformerRegistry {
    /// Create a registry holding the built-in transformers.
    pub fn new() -> Self {
        Self {
            transformers: vec![
                Box::new(GenericTransformer),
                Box::new(SchemaFieldTransformer),
            ],
        }
    }

    /// Register `transformer` under `tag`, replacing any transformer
    /// already registered for that tag.
    ///
    /// # Errors
    ///
    /// Returns [`BlockParserError::ContractViolation`] when `tag` is
    /// empty or differs from the tag the transformer reports.
    pub fn register(&mut self, tag: &str, transformer: Box<dyn BlockTransformer>) -> Result<()> {
        if tag.is_empty() {
            return Err(BlockParserError::contract(
                "transformers must be registered under a non-empty family tag",
            ));
        }
        if transformer.family() != tag {
            return Err(BlockParserError::contract(format!(
                "transformer reports family `{}` but was registered as `{}`",
                transformer.family(),
                tag
            )));
        }

        match self.transformers.iter_mut().find(|t| t.family() == tag) {
            Some(slot) => {
                tracing::debug!(family = tag, "Replacing transformer");
                *slot = transformer;
            }
            None => {
                tracing::debug!(family = tag, "Registering transformer");
                self.transformers.push(transformer);
            }
        }
        Ok(())
    }

    /// The transformer for `tag`, falling back to the generic one.
    pub fn get(&self, tag: &str) -> Option<&dyn BlockTransformer> {
        self.find(tag).or_else(|| self.find(family::GENERIC))
    }

    /// The first non-built-in transformer that claims `node`.
    pub fn claimant(&self, node: &RawNode, schema: Option<&BlockSchema>) -> Option<&str> {
        self.transformers
            .iter()
            .filter(|t| !is_builtin(t.family()))
            .find(|t| t.claims(node, schema))
            .map(|t| t.family())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.find(tag).is_some()
    }

    /// Family tags in registration order.
    pub fn families(&self) -> Vec<&str> {
        self.transformers.iter().map(|t| t.family()).collect()
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    fn find(&self, tag: &str) -> Option<&dyn BlockTransformer> {
        self.transformers
            .iter()
            .find(|t| t.family() == tag)
            .map(|t| t.as_ref())
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn is_builtin(tag: &str) -> bool {
    tag == family::GENERIC || tag == family::SCHEMA_FIELD
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_types::Attrs;

    /// A transformer that reports whatever family it was built with.
    struct NamedTransformer {
        family: &'static str,
        prefix: &'static str,
    }

    impl BlockTransformer for NamedTransformer {
        fn family(&self) -> &str {
            self.family
        }

        fn claims(&self, node: &RawNode, _schema: Option<&BlockSchema>) -> bool {
            !self.prefix.is_empty() && node.name().starts_with(self.prefix)
        }

        fn transform(&self, node: &RawNode, _cx: &mut TransformContext<'_>) -> Result<Transformed> {
            Ok(Transformed::Node(NormalizedNode::new(
                node.name(),
                self.family,
                Attrs::new(),
            )))
        }
    }

    fn named(family: &'static str, prefix: &'static str) -> Box<dyn BlockTransformer> {
        Box::new(NamedTransformer { family, prefix })
    }

    #[test]
    fn test_new_registry_has_builtins() {
        let registry = TransformerRegistry::new();
        assert_eq!(registry.families(), vec!["generic", "schemaField"]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_unknown_family_falls_back_to_generic() {
        let registry = TransformerRegistry::new();
        let transformer = registry.get("no-such-family").unwrap();
        assert_eq!(transformer.family(), "generic");
    }

    #[test]
    fn test_register_new_family() {
        let mut registry = TransformerRegistry::new();
        registry.register("embed", named("embed", "core-embed/")).unwrap();

        assert!(registry.contains("embed"));
        assert_eq!(registry.get("embed").unwrap().family(), "embed");
        assert_eq!(registry.families(), vec!["generic", "schemaField", "embed"]);
    }

    #[test]
    fn test_later_registration_replaces_earlier() {
        let mut registry = TransformerRegistry::new();
        registry.register("embed", named("embed", "a/")).unwrap();
        registry.register("embed", named("embed", "b/")).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.claimant(&RawNode::new("b/video"), None), Some("embed"));
        assert_eq!(registry.claimant(&RawNode::new("a/video"), None), None);
    }

    #[test]
    fn test_register_rejects_mismatched_family() {
        let mut registry = TransformerRegistry::new();
        let err = registry.register("embed", named("video", "")).unwrap_err();
        assert!(matches!(err, BlockParserError::ContractViolation(_)));
        assert!(!registry.contains("embed"));
        assert!(!registry.contains("video"));
    }

    #[test]
    fn test_register_rejects_empty_family() {
        let mut registry = TransformerRegistry::new();
        let err = registry.register("", named("", "")).unwrap_err();
        assert!(matches!(err, BlockParserError::ContractViolation(_)));
    }

    #[test]
    fn test_builtins_never_claim() {
        let mut registry = TransformerRegistry::new();
        registry.register("generic", named("generic", "core/")).unwrap();
        assert_eq!(registry.claimant(&RawNode::new("core/paragraph"), None), None);
    }

    #[test]
    fn test_first_registered_claimant_wins() {
        let mut registry = TransformerRegistry::new();
        registry.register("first", named("first", "x/")).unwrap();
        registry.register("second", named("second", "x/")).unwrap();
        assert_eq!(registry.claimant(&RawNode::new("x/y"), None), Some("first"));
    }
}
