//! Read-only views over a parsed markup fragment.

use std::borrow::Cow;

use crate::entities::decode;

/// A parsed markup fragment: the saved HTML of one block.
///
/// Unlike an XML document a fragment may hold several top-level elements
/// and loose text.
pub struct Fragment<'a> {
    source: &'a str,
    dom: tl::VDom<'a>,
}

impl std::fmt::Debug for Fragment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fragment")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<'a> Fragment<'a> {
    pub(crate) fn new(source: &'a str, dom: tl::VDom<'a>) -> Self {
        Self { source, dom }
    }

    /// The markup as written, before stray `<` were escaped for parsing.
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub(crate) fn parser(&self) -> &tl::Parser<'a> {
        self.dom.parser()
    }

    pub(crate) fn top_level(&self) -> &[tl::NodeHandle] {
        self.dom.children()
    }

    /// Top-level elements, skipping loose text and comments.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_, 'a>> {
        let parser = self.parser();
        self.top_level()
            .iter()
            .filter_map(move |handle| Element::resolve(*handle, parser))
    }

    /// The first top-level element, if any.
    pub fn root(&self) -> Option<Element<'_, 'a>> {
        self.elements().next()
    }

    /// Concatenated text of the whole fragment, references decoded.
    pub fn text(&self) -> String {
        let parser = self.parser();
        let raw: String = self
            .top_level()
            .iter()
            .filter_map(|handle| handle.get(parser))
            .map(|node| node.inner_text(parser))
            .collect();
        decode(&raw).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.top_level().is_empty()
    }
}

/// An element of a [`Fragment`].
#[derive(Clone, Copy)]
pub struct Element<'f, 'a> {
    node: &'f tl::Node<'a>,
    tag: &'f tl::HTMLTag<'a>,
    parser: &'f tl::Parser<'a>,
}

impl std::fmt::Debug for Element<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

impl<'f, 'a> Element<'f, 'a> {
    pub(crate) fn resolve(handle: tl::NodeHandle, parser: &'f tl::Parser<'a>) -> Option<Self> {
        let node = handle.get(parser)?;
        let tag = node.as_tag()?;
        Some(Self { node, tag, parser })
    }

    pub(crate) fn node(&self) -> &'f tl::Node<'a> {
        self.node
    }

    pub(crate) fn tag(&self) -> &'f tl::HTMLTag<'a> {
        self.tag
    }

    pub(crate) fn parser(&self) -> &'f tl::Parser<'a> {
        self.parser
    }

    /// Lower-cased tag name.
    pub fn name(&self) -> Cow<'f, str> {
        let name = self.tag.name().as_utf8_str();
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(name.to_ascii_lowercase())
        } else {
            name
        }
    }

    /// Decoded value of the attribute `name`, compared case-insensitively.
    /// Valueless attributes (`<video controls>`) have an empty value.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.tag
            .attributes()
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.map(|v| decode(&v).into_owned()).unwrap_or_default())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.tag
            .attributes()
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    pub fn id(&self) -> Option<String> {
        self.attribute("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.tag.attributes().is_class_member(class)
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = Element<'f, 'a>> + 'f {
        let parser = self.parser;
        let handles: Vec<tl::NodeHandle> = self.tag.children().top().iter().copied().collect();
        handles
            .into_iter()
            .filter_map(move |handle| Element::resolve(handle, parser))
    }

    /// Concatenated descendant text, references decoded.
    pub fn text(&self) -> String {
        decode(&self.tag.inner_text(self.parser)).into_owned()
    }

    /// The element's content exactly as written between its tags.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        push_verbatim(self.tag, self.parser, &mut out);
        out
    }
}

/// Append the source text of `tag`'s children.
///
/// An element closed by its own end tag carries its whole source span. One
/// that was never closed only carries its start tag, so its children are
/// appended after it.
fn push_verbatim(tag: &tl::HTMLTag<'_>, parser: &tl::Parser<'_>, out: &mut String) {
    for handle in tag.children().top().iter() {
        match handle.get(parser) {
            Some(tl::Node::Raw(bytes) | tl::Node::Comment(bytes)) => {
                out.push_str(&bytes.as_utf8_str())
            }
            Some(tl::Node::Tag(child)) => {
                out.push_str(&child.raw().as_utf8_str());
                if !is_closed(child) {
                    push_verbatim(child, parser, out);
                }
            }
            None => {}
        }
    }
}

fn is_closed(tag: &tl::HTMLTag<'_>) -> bool {
    let raw = tag.raw().as_bytes();
    let name = tag.name().as_bytes();
    raw.strip_suffix(b">")
        .and_then(|r| r.strip_suffix(name))
        .is_some_and(|r| r.ends_with(b"</"))
}

#[cfg(test)]
mod tests {
    use crate::Markup;

    #[test]
    fn test_fragment_text_decodes_references() {
        let markup = Markup::new("<p>Caf&eacute; &euro;5</p> &amp; more");
        let fragment = markup.parse().unwrap();

        assert_eq!(fragment.text(), "Caf\u{00E9} \u{20AC}5 & more");
        assert_eq!(fragment.root().unwrap().text(), "Caf\u{00E9} \u{20AC}5");
    }

    #[test]
    fn test_nested_inner_html_keeps_closed_children_whole() {
        let markup = Markup::new("<div><p>a <em>b</em></p><p>c</div>");
        let fragment = markup.parse().unwrap();
        let div = fragment.root().unwrap();

        assert_eq!(div.inner_html(), "<p>a <em>b</em></p><p>c");
    }

    #[test]
    fn test_class_and_id_accessors() {
        let markup = Markup::new(r#"<a id="go" class="btn primary">x</a>"#);
        let fragment = markup.parse().unwrap();
        let a = fragment.root().unwrap();

        assert_eq!(a.id().as_deref(), Some("go"));
        assert!(a.has_class("btn"));
        assert!(a.has_class("primary"));
        assert!(!a.has_class("btn primary"));
        assert_eq!(a.attribute("class").as_deref(), Some("btn primary"));
    }
}
