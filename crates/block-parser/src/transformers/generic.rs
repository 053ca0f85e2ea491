/*
 * transformers/generic.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Transformer for standard editor blocks.
 */

use std::borrow::Cow;

use block_markup::Markup;
use block_types::{AttributeSchema, Attrs, ContentId, NormalizedNode, RawNode, family};

use super::{is_unset, strip_bookkeeping};
use crate::Result;
use crate::attributes::AttributeResolver;
use crate::context::TransformContext;
use crate::transform::{BlockTransformer, Transformed};

/// Handles every block that no other family claims.
///
/// Attributes the schema declares but the block did not store are inferred
/// from the saved markup. A synced reference is replaced by the normalized
/// blocks of the content item it points to. Everything else gets its
/// rendered markup attached unless a render hook says otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericTransformer;

impl GenericTransformer {
    fn resolve_attrs(&self, node: &RawNode, cx: &TransformContext<'_>) -> Attrs {
        let mut attrs = node.attrs.clone();
        let schemas = &cx.collaborators().schemas;
        let schema = schemas.schema(node.name());

        let mut declared: Vec<(&str, Cow<'_, AttributeSchema>)> = schema
            .map(|s| {
                s.attributes
                    .iter()
                    .map(|(name, attribute)| (name.as_str(), Cow::Borrowed(attribute)))
                    .collect()
            })
            .unwrap_or_default();
        if schemas.supports_anchor(node.name()) {
            let anchor = AttributeSchema::attribute("*", "id");
            match declared.iter_mut().find(|(name, _)| *name == "anchor") {
                Some(slot) => slot.1 = Cow::Owned(anchor),
                None => declared.push(("anchor", Cow::Owned(anchor))),
            }
        }

        let pending: Vec<_> = declared
            .into_iter()
            .filter(|(name, _)| is_unset(attrs.get(*name)))
            .collect();
        if pending.is_empty() {
            return attrs;
        }

        let markup = Markup::new(&node.inner_markup);
        let fragment = markup
            .parse()
            .inspect_err(|e| {
                tracing::debug!(block = node.name(), error = %e, "Saved markup did not parse")
            })
            .ok();
        let resolver = AttributeResolver::new(cx.collaborators().trees.as_ref());
        for (name, attribute) in pending {
            let value = resolver.resolve_in(&attribute, fragment.as_ref(), cx.content_id());
            if let Some(value) = value {
                attrs.insert(name.to_string(), value);
            }
        }
        attrs
    }

    fn reference_target(
        &self,
        node: &RawNode,
        attrs: &Attrs,
        cx: &TransformContext<'_>,
    ) -> Option<ContentId> {
        let config = cx.config();
        if node.name() != config.reference_tag {
            return None;
        }
        let value = attrs.get(&config.reference_attribute)?;
        let target = ContentId::from_value(value);
        if target.is_none() {
            tracing::warn!(
                block = node.name(),
                reference = %value,
                "Ignoring unusable synced reference"
            );
        }
        target
    }
}

impl BlockTransformer for GenericTransformer {
    fn family(&self) -> &str {
        family::GENERIC
    }

    fn transform(&self, node: &RawNode, cx: &mut TransformContext<'_>) -> Result<Transformed> {
        let mut attrs = self.resolve_attrs(node, cx);
        strip_bookkeeping(&mut attrs, cx.config());

        if let Some(target) = self.reference_target(node, &attrs, cx) {
            return cx.expand_reference(target).map(Transformed::Expansion);
        }

        let mut normalized = NormalizedNode::new(node.name(), family::GENERIC, attrs);
        let include = cx
            .hooks()
            .include_rendered(cx.config().include_rendered, &normalized);
        if include {
            cx.ensure_ambient();
            let rendered = cx.collaborators().renderer.render(node, cx.content_id())?;
            normalized.rendered = Some(if cx.config().expand_shortcodes {
                cx.shortcodes().process(&rendered)
            } else {
                rendered
            });
        }

        Ok(Transformed::Node(normalized))
    }
}
