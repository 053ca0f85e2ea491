//! Property tests for tree-level guarantees.

use std::sync::Arc;

use block_parser::memory::{MemoryFieldStorage, MemoryTreeSource, StaticSchemaRegistry};
use block_parser::{
    AttributeSchema, BlockParser, BlockSchema, ContentId, FieldDescriptor, NormalizedNode, RawNode,
};
use proptest::prelude::*;
use serde_json::json;

fn block_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("core/paragraph".to_string()),
        Just("core/group".to_string()),
        Just("core/heading".to_string()),
        Just("acf/hero".to_string()),
    ]
}

fn leaf() -> impl Strategy<Value = RawNode> {
    (block_name(), "[a-z ]{0,12}").prop_map(|(name, text)| {
        RawNode {
            tag: if name.is_empty() { None } else { Some(name) },
            ..RawNode::default()
        }
        .with_markup(format!("<h2>{}</h2>", text))
        .with_attr("title", json!(text))
        .with_attr("_title", json!("field_title"))
    })
}

fn tree() -> impl Strategy<Value = RawNode> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        (block_name(), prop::collection::vec(inner, 0..4))
            .prop_map(|(name, children)| RawNode::new(name).with_children(children))
    })
}

fn parser() -> BlockParser {
    let schemas = StaticSchemaRegistry::new().with_schema(
        "core/heading",
        BlockSchema::new()
            .with_attribute("content", AttributeSchema::text("h2"))
            .with_anchor_support(),
    );
    let fields = MemoryFieldStorage::new()
        .with_field(FieldDescriptor::new("1", "text", "title").with_key("field_title"));
    BlockParser::builder(Arc::new(MemoryTreeSource::new()), Arc::new(schemas))
        .field_storage(Arc::new(fields))
        .build()
        .unwrap()
}

/// Named blocks reachable from `children` without passing through a
/// nameless block.
fn reachable(children: &[RawNode]) -> usize {
    children
        .iter()
        .filter(|c| c.has_tag())
        .map(|c| 1 + reachable(&c.children))
        .sum()
}

fn all_nodes(nodes: &[NormalizedNode]) -> Vec<&NormalizedNode> {
    nodes.iter().flat_map(|n| n.descendants()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn normalization_is_deterministic(children in prop::collection::vec(tree(), 0..5)) {
        let parser = parser();
        let document = RawNode::document(children);

        let first = parser.normalize(&document, ContentId(1)).unwrap();
        let second = parser.normalize(&document, ContentId(1)).unwrap();

        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn nameless_blocks_never_reach_the_output(children in prop::collection::vec(tree(), 0..5)) {
        let parser = parser();
        let document = RawNode::document(children);

        let out = parser.normalize(&document, ContentId(1)).unwrap();
        let nodes = all_nodes(&out);

        prop_assert!(nodes.iter().all(|n| !n.name.is_empty()));
        prop_assert_eq!(nodes.len(), reachable(&document.children));
    }
}
