/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Per-pass transformation state.
 */

//! Per-pass transformation state.
//!
//! A [`TransformContext`] is created for every top-level normalize call and
//! handed to each transformer. It carries the content id the pass runs
//! under, gives transformers access to the parser's configuration,
//! collaborators and hooks, and is the only way to start a nested pass for
//! a synced reference.

use block_types::{BlockSchema, ContentId, NormalizedNode};

use crate::collaborators::Collaborators;
use crate::config::ParserConfig;
use crate::hooks::Hooks;
use crate::parser::BlockParser;
use crate::shortcode::ShortcodeRegistry;
use crate::{BlockParserError, Result};

pub struct TransformContext<'a> {
    parser: &'a BlockParser,
    content_id: ContentId,
    /// Content ids of the passes currently on the stack, outermost first.
    active: Vec<ContentId>,
}

impl<'a> TransformContext<'a> {
    pub(crate) fn new(parser: &'a BlockParser, content_id: ContentId) -> Self {
        Self {
            parser,
            content_id,
            active: vec![content_id],
        }
    }

    /// The content id of the pass currently running.
    pub fn content_id(&self) -> ContentId {
        self.content_id
    }

    /// How many synced references deep the current pass is.
    pub fn depth(&self) -> usize {
        self.active.len() - 1
    }

    pub fn config(&self) -> &'a ParserConfig {
        self.parser.config()
    }

    pub fn collaborators(&self) -> &'a Collaborators {
        self.parser.collaborators()
    }

    pub fn hooks(&self) -> &'a Hooks {
        self.parser.hooks()
    }

    pub fn shortcodes(&self) -> &'a ShortcodeRegistry {
        self.parser.shortcodes()
    }

    pub fn schema(&self, block_name: &str) -> Option<&'a BlockSchema> {
        self.parser.collaborators().schemas.schema(block_name)
    }

    /// Point the host's ambient "current content item" at this pass's
    /// content id if something else left it elsewhere.
    ///
    /// Must be called before every collaborator call that may read ambient
    /// state. A nested pass for a synced reference repoints it to the
    /// referenced item, so without this the blocks after a reference would
    /// resolve against the wrong item.
    pub fn ensure_ambient(&self) {
        let Some(ambient) = &self.collaborators().ambient else {
            return;
        };
        if ambient.current() != Some(self.content_id) {
            tracing::debug!(
                content_id = %self.content_id,
                previous = ?ambient.current(),
                "Repointing ambient content context"
            );
            ambient.switch_to(self.content_id);
        }
    }

    /// Normalize the content item `id` as a nested pass and return its
    /// top-level nodes, for splicing in place of a reference block.
    ///
    /// # Errors
    ///
    /// Returns [`BlockParserError::ReferenceCycle`] if `id` is already being
    /// expanded further up the stack, and propagates any load or transform
    /// failure from the nested pass.
    pub fn expand_reference(&mut self, id: ContentId) -> Result<Vec<NormalizedNode>> {
        if self.active.contains(&id) {
            return Err(BlockParserError::ReferenceCycle(id));
        }

        tracing::debug!(from = %self.content_id, to = %id, "Expanding synced reference");
        let tree = self.collaborators().trees.load_tree(id)?;

        let outer = std::mem::replace(&mut self.content_id, id);
        self.active.push(id);
        let parser = self.parser;
        let result = parser.normalize_blocks(&tree.children, self);
        self.active.pop();
        self.content_id = outer;

        self.ensure_ambient();
        result
    }
}
