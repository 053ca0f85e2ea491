/*
 * shortcode.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Bracket shortcode expansion for rendered block markup.
 */

//! Bracket shortcode expansion for rendered block markup.
//!
//! Rendered markup may contain shortcodes in the editor's bracket syntax:
//!
//! - `[gallery ids="1,2" columns=3]` - attributes and positional values
//! - `[divider /]` - explicitly self-closing
//! - `[note type="info"]Body[/note]` - enclosing, content passed to the handler
//! - `[[gallery]]` - escaped, emitted literally as `[gallery]`
//!
//! Only registered tags are expanded. Anything else, including malformed
//! brackets, is left exactly as written.

use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

/// Attribute list grammar: `name="v"`, `name='v'`, `name=v`, `"v"`, `'v'`, `v`.
static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"([\w-]+)\s*=\s*"([^"]*)"(?:\s|$)|([\w-]+)\s*=\s*'([^']*)'(?:\s|$)|([\w-]+)\s*=\s*([^\s'"]+)(?:\s|$)|"([^"]*)"(?:\s|$)|'([^']*)'(?:\s|$)|(\S+)(?:\s|$)"#,
    )
    .expect("Invalid regex pattern for shortcode attributes")
});

/// A parsed shortcode occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shortcode {
    pub tag: String,
    /// Named attributes, names lower-cased.
    pub attrs: IndexMap<String, String>,
    /// Values given without a name, in order.
    pub positional: Vec<String>,
    /// Enclosed content, for the `[tag]...[/tag]` form.
    pub content: Option<String>,
}

impl Shortcode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// Produces the replacement markup for one shortcode tag.
pub trait ShortcodeHandler: Send + Sync {
    fn tag(&self) -> &str;

    fn render(&self, shortcode: &Shortcode) -> String;
}

/// A [`ShortcodeHandler`] backed by a closure.
pub struct FnShortcode<F> {
    tag: String,
    render: F,
}

impl<F> FnShortcode<F>
where
    F: Fn(&Shortcode) -> String + Send + Sync,
{
    pub fn new(tag: impl Into<String>, render: F) -> Self {
        Self {
            tag: tag.into(),
            render,
        }
    }
}

impl<F> ShortcodeHandler for FnShortcode<F>
where
    F: Fn(&Shortcode) -> String + Send + Sync,
{
    fn tag(&self) -> &str {
        &self.tag
    }

    fn render(&self, shortcode: &Shortcode) -> String {
        (self.render)(shortcode)
    }
}

/// Registered shortcode handlers, keyed by tag.
#[derive(Default)]
pub struct ShortcodeRegistry {
    handlers: HashMap<String, Box<dyn ShortcodeHandler>>,
}

impl ShortcodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any handler for the same tag.
    pub fn register(&mut self, handler: Box<dyn ShortcodeHandler>) {
        tracing::debug!(tag = handler.tag(), "Registering shortcode");
        self.handlers.insert(handler.tag().to_string(), handler);
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Expand every registered shortcode in `text`.
    pub fn process(&self, text: &str) -> String {
        if self.handlers.is_empty() || !text.contains('[') {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut pos = 0;
        while let Some(offset) = text[pos..].find('[') {
            let start = pos + offset;
            out.push_str(&text[pos..start]);

            if text[start + 1..].starts_with('[')
                && let Some(found) = self.scan(text, start + 1)
                && text[found.end..].starts_with(']')
            {
                // Escaped: drop one bracket on each side.
                out.push_str(&text[start + 1..found.end]);
                pos = found.end + 1;
                continue;
            }

            match self.scan(text, start) {
                Some(found) => {
                    if let Some(handler) = self.handlers.get(&found.shortcode.tag) {
                        out.push_str(&handler.render(&found.shortcode));
                    }
                    pos = found.end;
                }
                None => {
                    out.push('[');
                    pos = start + 1;
                }
            }
        }
        out.push_str(&text[pos..]);
        out
    }

    /// Parse a registered shortcode whose opening bracket is at `start`.
    fn scan(&self, text: &str, start: usize) -> Option<Scanned> {
        let rest = &text[start + 1..];
        let close = rest.find(']')?;
        let body = &rest[..close];
        if body.contains('[') {
            return None;
        }
        let open_end = start + 1 + close + 1;

        let tag_len = body
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(body.len());
        let tag = &body[..tag_len];
        if tag.is_empty() || !self.handlers.contains_key(tag) {
            return None;
        }
        let mut arguments = &body[tag_len..];
        if !arguments.is_empty() && !arguments.starts_with(char::is_whitespace) && arguments != "/" {
            return None;
        }

        let self_closing = arguments.trim_end().ends_with('/');
        if self_closing {
            arguments = arguments.trim_end().trim_end_matches('/');
        }

        let mut shortcode = Shortcode {
            tag: tag.to_string(),
            ..Shortcode::default()
        };
        parse_arguments(arguments, &mut shortcode);

        let mut end = open_end;
        if !self_closing {
            let closing = format!("[/{}]", tag);
            if let Some(offset) = text[open_end..].find(&closing) {
                shortcode.content = Some(text[open_end..open_end + offset].to_string());
                end = open_end + offset + closing.len();
            }
        }

        Some(Scanned { shortcode, end })
    }
}

impl std::fmt::Debug for ShortcodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortcodeRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

struct Scanned {
    shortcode: Shortcode,
    /// Byte offset just past the shortcode (and its closing tag, if any).
    end: usize,
}

fn parse_arguments(arguments: &str, shortcode: &mut Shortcode) {
    for caps in ATTRIBUTE_PATTERN.captures_iter(arguments) {
        let named = [(1, 2), (3, 4), (5, 6)]
            .into_iter()
            .find_map(|(n, v)| Some((caps.get(n)?, caps.get(v)?)));
        if let Some((name, value)) = named {
            shortcode
                .attrs
                .insert(name.as_str().to_lowercase(), value.as_str().to_string());
        } else if let Some(value) = [7, 8, 9].into_iter().find_map(|i| caps.get(i)) {
            shortcode.positional.push(value.as_str().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ShortcodeRegistry {
        let mut registry = ShortcodeRegistry::new();
        registry.register(Box::new(FnShortcode::new("year", |_| "2025".to_string())));
        registry.register(Box::new(FnShortcode::new("button", |sc| {
            format!(
                r#"<a href="{}">{}</a>"#,
                sc.attr("href").unwrap_or("#"),
                sc.content.as_deref().unwrap_or("")
            )
        })));
        registry.register(Box::new(FnShortcode::new("debug", |sc| {
            format!("{:?}|{:?}", sc.attrs, sc.positional)
        })));
        registry
    }

    #[test]
    fn test_self_contained_and_self_closing() {
        let registry = registry();
        assert_eq!(registry.process("(c) [year] Acme"), "(c) 2025 Acme");
        assert_eq!(registry.process("(c) [year /] Acme"), "(c) 2025 Acme");
        assert_eq!(registry.process("[year/]"), "2025");
    }

    #[test]
    fn test_enclosing_shortcode() {
        let registry = registry();
        assert_eq!(
            registry.process(r#"<p>[button href="/go"]Go now[/button]</p>"#),
            r#"<p><a href="/go">Go now</a></p>"#
        );
    }

    #[test]
    fn test_escaped_shortcode_is_literal() {
        let registry = registry();
        assert_eq!(registry.process("Use [[year]] for the year"), "Use [year] for the year");
        assert_eq!(
            registry.process("[[button]x[/button]]"),
            "[button]x[/button]"
        );
    }

    #[test]
    fn test_unregistered_tags_left_verbatim() {
        let registry = registry();
        assert_eq!(registry.process("[unknown a=1] [year]"), "[unknown a=1] 2025");
        assert_eq!(registry.process("a [ b ] c"), "a [ b ] c");
        assert_eq!(registry.process("[yearly]"), "[yearly]");
        assert_eq!(registry.process("unclosed [year"), "unclosed [year");
    }

    #[test]
    fn test_attribute_forms() {
        let registry = registry();
        assert_eq!(
            registry.process(r#"[debug Size="large" b='two words' c=3 "quoted" bare]"#),
            r#"{"size": "large", "b": "two words", "c": "3"}|["quoted", "bare"]"#
        );
    }

    #[test]
    fn test_empty_registry_is_identity() {
        let registry = ShortcodeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.process("[year]"), "[year]");
    }
}
