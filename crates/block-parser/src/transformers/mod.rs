/*
 * transformers/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Built-in block transformers.
 */

//! Built-in block transformers.
//!
//! - [`GenericTransformer`] - standard blocks: schema-sourced attributes,
//!   synced-reference expansion, rendered markup
//! - [`SchemaFieldTransformer`] - custom-field blocks: structured `data`
//!   resolved through field storage

mod generic;
mod schema_field;

pub use generic::GenericTransformer;
pub use schema_field::SchemaFieldTransformer;

use block_types::{Attrs, BlockSchema};

use crate::config::ParserConfig;

/// Remove internal keys that must never reach a node's `attrs`.
pub(crate) fn strip_bookkeeping(attrs: &mut Attrs, config: &ParserConfig) {
    attrs.retain(|key, _| !config.is_bookkeeping_key(key));
}

/// Whether a raw attribute value counts as missing for inference purposes.
pub(crate) fn is_unset(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Fill attributes the schema declares a default for but the block left
/// unset.
pub(crate) fn apply_defaults(attrs: &mut Attrs, schema: Option<&BlockSchema>) {
    let Some(schema) = schema else {
        return;
    };
    for (name, attribute) in &schema.attributes {
        if let Some(default) = &attribute.default
            && is_unset(attrs.get(name))
        {
            attrs.insert(name.clone(), default.clone());
        }
    }
}
