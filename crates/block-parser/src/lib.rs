//! Content block tree normalization
//!
//! This crate turns the raw block tree an editor saves for a content item
//! into a uniform, JSON-serializable tree of [`NormalizedNode`]s.
//!
//! # Architecture
//!
//! - [`BlockParser`] - walks the tree, dispatches each block to a family
//!   transformer, splices expansions, and runs node hooks
//! - [`TransformerRegistry`] - family tag to [`BlockTransformer`] mapping,
//!   with the built-in `generic` and `schemaField` families
//! - [`AttributeResolver`] - infers attributes from saved markup using
//!   schema source rules
//! - [`FieldValueResolver`] - resolves custom-field values through
//!   [`FieldStorage`]
//! - [`Hooks`] - node, field, and render-decision handler chains
//!
//! Everything the engine needs from the host (trees, schemas, rendering,
//! field storage, ambient context) comes through the traits in
//! [`collaborators`]. The [`memory`] module implements all of them over
//! plain maps.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use block_parser::{BlockParser, ContentId};
//! use block_parser::memory::{MemoryTreeSource, StaticSchemaRegistry};
//!
//! let parser = BlockParser::builder(Arc::new(trees), Arc::new(schemas))
//!     .field_storage(Arc::new(fields))
//!     .build()?;
//!
//! let nodes = parser.normalize_content(ContentId(42))?;
//! println!("{}", serde_json::to_string_pretty(&nodes)?);
//! ```

pub mod attributes;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod error;
pub mod fields;
pub mod hooks;
pub mod memory;
pub mod parser;
pub mod shortcode;
pub mod transform;
pub mod transformers;

// Re-export commonly used types
pub use attributes::AttributeResolver;
pub use block_types::{
    AttributeSchema, Attrs, BlockSchema, ContentId, FieldDescriptor, NormalizedNode, RawNode,
    family,
};
pub use collaborators::{
    AmbientContext, Collaborators, FieldStorage, Renderer, SavedMarkupRenderer, SchemaRegistry,
    TreeSource,
};
pub use config::ParserConfig;
pub use context::TransformContext;
pub use error::{BlockParserError, Result};
pub use fields::FieldValueResolver;
pub use hooks::{FieldMeta, FieldScope, Hooks, NodeScope};
pub use parser::{BlockParser, BlockParserBuilder};
pub use shortcode::{FnShortcode, Shortcode, ShortcodeHandler, ShortcodeRegistry};
pub use transform::{BlockTransformer, Transformed, TransformerRegistry};
pub use transformers::{GenericTransformer, SchemaFieldTransformer};
