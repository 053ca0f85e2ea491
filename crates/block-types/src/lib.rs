/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Content block tree type definitions.
 *
 * This crate provides pure data types for the raw block tree produced by
 * a content editor, the declarative schemas that describe each block's
 * attributes, structured-field descriptors, and the normalized output tree.
 * It depends only on serde and indexmap so any crate that needs to
 * exchange these structures can use it.
 */

pub mod content;
pub mod field;
pub mod normalized;
pub mod raw;
pub mod schema;

// Re-export commonly used types at the crate root
pub use content::ContentId;
pub use field::FieldDescriptor;
pub use normalized::{Attrs, NormalizedNode, family};
pub use raw::RawNode;
pub use schema::{AttributeSchema, BlockSchema, SourceKind, SourceRule, Supports, ValueType};
