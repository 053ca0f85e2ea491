/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Parser policy configuration.
 */

//! Parser policy configuration.
//!
//! Every naming convention the engine relies on (reserved block names, the
//! custom-field key markers, which field kinds are layout-only) lives in
//! [`ParserConfig`]. The defaults match the conventions of the editor and
//! custom-field plugin this engine was built against; hosts with different
//! conventions can override any of them from YAML:
//!
//! ```yaml
//! reference-tag: core/block
//! schema-field-prefix: acf/
//! layout-field-kinds: [accordion, tab, message]
//! include-rendered: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BlockParserError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParserConfig {
    /// Block name of synced-pattern references.
    pub reference_tag: String,

    /// Attribute holding the referenced content id.
    pub reference_attribute: String,

    /// Block-name namespace reserved for custom-field blocks.
    pub schema_field_prefix: String,

    /// Attribute that carries custom-field data. A schema declaring it marks
    /// the block as a custom-field block.
    pub data_attribute: String,

    /// Internal keys removed from every node's `attrs`.
    pub bookkeeping_keys: Vec<String>,

    /// Prefix marking a field-key entry (`_title` describes `title`).
    pub field_key_marker: String,

    /// Prefix of field-reference tokens (`field_5f1a...`).
    pub field_reference_prefix: String,

    /// Field kinds that only structure the editing UI and carry no data.
    pub layout_field_kinds: Vec<String>,

    /// Field kinds whose stored value must be re-read and formatted through
    /// field storage.
    pub indirect_field_kinds: Vec<String>,

    /// Field kinds that need formatting only when the stored value is a
    /// numeric id.
    pub id_valued_field_kinds: Vec<String>,

    /// Initial value of the render decision passed to render hooks.
    pub include_rendered: bool,

    /// Expand registered shortcodes in rendered output.
    pub expand_shortcodes: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            reference_tag: "core/block".to_string(),
            reference_attribute: "ref".to_string(),
            schema_field_prefix: "acf/".to_string(),
            data_attribute: "data".to_string(),
            bookkeeping_keys: strings(&["data", "name", "mode"]),
            field_key_marker: "_".to_string(),
            field_reference_prefix: "field_".to_string(),
            layout_field_kinds: strings(&["accordion", "tab"]),
            indirect_field_kinds: strings(&[
                "repeater",
                "group",
                "flexible_content",
                "relationship",
                "page_link",
                "post_object",
                "true_false",
                "gallery",
            ]),
            id_valued_field_kinds: strings(&["image"]),
            include_rendered: true,
            expand_shortcodes: true,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ParserConfig {
    /// Parse configuration from YAML text. Missing keys keep their defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| BlockParserError::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// Read configuration from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            BlockParserError::Config(msg) => {
                BlockParserError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn is_bookkeeping_key(&self, key: &str) -> bool {
        self.bookkeeping_keys.iter().any(|k| k == key)
    }

    pub fn is_field_reference(&self, token: &str) -> bool {
        token.starts_with(&self.field_reference_prefix)
    }

    /// A field key is a marked entry whose value is a field-reference token.
    pub fn is_field_key(&self, key: &str, value: &Value) -> bool {
        key.starts_with(&self.field_key_marker)
            && value.as_str().is_some_and(|v| self.is_field_reference(v))
    }

    /// The field name a field key describes (`_title` -> `title`).
    pub fn field_name<'k>(&self, key: &'k str) -> &'k str {
        if self.field_key_marker.is_empty() {
            return key;
        }
        key.trim_start_matches(self.field_key_marker.as_str())
    }

    pub fn is_layout_kind(&self, kind: &str) -> bool {
        self.layout_field_kinds.iter().any(|k| k == kind)
    }

    /// Whether a field's raw value must be re-resolved through field storage.
    pub fn requires_indirection(&self, kind: &str, raw: &Value) -> bool {
        self.indirect_field_kinds.iter().any(|k| k == kind)
            || (self.id_valued_field_kinds.iter().any(|k| k == kind)
                && (raw.is_u64() || raw.is_i64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ParserConfig::from_yaml_str(
            "layout-field-kinds: [accordion, tab, message]\ninclude-rendered: false\n",
        )
        .unwrap();

        assert!(config.is_layout_kind("message"));
        assert!(!config.include_rendered);
        assert_eq!(config.reference_tag, "core/block");
        assert_eq!(config.data_attribute, "data");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ParserConfig::from_yaml_str("  \n").unwrap(), ParserConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = ParserConfig::from_yaml_str("include-rendered: [nope").unwrap_err();
        assert!(matches!(err, BlockParserError::Config(_)));
    }

    #[test]
    fn test_from_path_reports_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.yml");
        std::fs::write(&path, "schema-field-prefix: custom/\n").unwrap();
        let config = ParserConfig::from_path(&path).unwrap();
        assert_eq!(config.schema_field_prefix, "custom/");

        let missing = ParserConfig::from_path(dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(missing, BlockParserError::Io(_)));
    }

    #[test]
    fn test_field_key_detection() {
        let config = ParserConfig::default();
        assert!(config.is_field_key("_title", &json!("field_123")));
        assert!(!config.is_field_key("title", &json!("field_123")));
        assert!(!config.is_field_key("_title", &json!("Hello")));
        assert!(!config.is_field_key("_count", &json!(3)));
        assert_eq!(config.field_name("_title"), "title");
        assert_eq!(config.field_name("__nested"), "nested");
    }

    #[test]
    fn test_requires_indirection() {
        let config = ParserConfig::default();
        assert!(config.requires_indirection("repeater", &json!("3")));
        assert!(config.requires_indirection("true_false", &json!("1")));
        assert!(config.requires_indirection("image", &json!(42)));
        assert!(!config.requires_indirection("image", &json!("https://x/a.png")));
        assert!(!config.requires_indirection("text", &json!("Hello")));
    }
}
