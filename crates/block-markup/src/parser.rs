//! Preparing saved block markup for the HTML parser.
//!
//! tl reads any `<` as the start of a tag, even one followed by a space, so
//! prose like `1 < 2` would swallow the rest of the paragraph. Browsers
//! treat a `<` that cannot open a tag as text; [`Markup::new`] does the same
//! by escaping it before parsing.

use std::borrow::Cow;

use crate::{Fragment, Result};

/// Block markup ready to be parsed.
///
/// The parsed [`Fragment`] borrows from this value, so keep it alive for as
/// long as the fragment is in use.
#[derive(Debug, Clone, PartialEq)]
pub struct Markup<'a> {
    raw: &'a str,
    prepared: Cow<'a, str>,
}

impl<'a> Markup<'a> {
    /// Wrap raw markup, escaping every `<` that cannot open a tag, end tag,
    /// comment or doctype. Borrows when nothing needs escaping.
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            prepared: escape_stray_brackets(raw),
        }
    }

    /// The markup the parser will see.
    pub fn as_str(&self) -> &str {
        &self.prepared
    }

    /// Parse into a fragment tree.
    ///
    /// The parser is lenient: unclosed elements swallow what follows them
    /// and end tags that close nothing are dropped.
    ///
    /// # Errors
    ///
    /// Only input too large for the parser's 32-bit node handles fails.
    pub fn parse(&self) -> Result<Fragment<'_>> {
        let dom = tl::parse(&self.prepared, tl::ParserOptions::default())?;
        Ok(Fragment::new(self.raw, dom))
    }
}

fn opens_markup(next: Option<&u8>) -> bool {
    matches!(next, Some(c) if c.is_ascii_alphabetic() || *c == b'/' || *c == b'!')
}

fn escape_stray_brackets(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    let is_stray = |i: usize| bytes[i] == b'<' && !opens_markup(bytes.get(i + 1));

    if !(0..bytes.len()).any(is_stray) {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len() + 8);
    let mut last = 0;
    for (i, _) in raw.match_indices('<') {
        if is_stray(i) {
            out.push_str(&raw[last..i]);
            out.push_str("&lt;");
            last = i + 1;
        }
    }
    out.push_str(&raw[last..]);

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_names(markup: &str) -> Vec<String> {
        let markup = Markup::new(markup);
        let fragment = markup.parse().unwrap();
        fragment.elements().map(|e| e.name().into_owned()).collect()
    }

    #[test]
    fn test_markup_borrows_clean_input() {
        let markup = Markup::new("<p>a <b>b</b></p><!-- c -->");
        assert!(matches!(markup.prepared, Cow::Borrowed(_)));
    }

    #[test]
    fn test_markup_escapes_brackets_that_cannot_open_a_tag() {
        assert_eq!(Markup::new("1 < 2 <b>x</b>").as_str(), "1 &lt; 2 <b>x</b>");
        assert_eq!(Markup::new("a<").as_str(), "a&lt;");
        assert_eq!(Markup::new("<<p>").as_str(), "&lt;<p>");
    }

    #[test]
    fn test_parse_nested_elements() {
        let markup = Markup::new(
            r#"<figure class="wp-block-image"><img src="a.png"><figcaption>Hi</figcaption></figure>"#,
        );
        let fragment = markup.parse().unwrap();

        let figure = fragment.root().unwrap();
        assert_eq!(figure.name(), "figure");
        let children: Vec<_> = figure.elements().map(|e| e.name().into_owned()).collect();
        assert_eq!(children, vec!["img", "figcaption"]);
    }

    #[test]
    fn test_parse_multiple_top_level_elements() {
        assert_eq!(parse_names("<h2>A</h2>\n<p>B</p>text<hr>"), vec!["h2", "p", "hr"]);
    }

    #[test]
    fn test_void_elements_do_not_nest() {
        let markup = Markup::new("<p>a<br>b<img src=x>c</p>");
        let fragment = markup.parse().unwrap();
        let p = fragment.root().unwrap();

        let children: Vec<_> = p.elements().map(|e| e.name().into_owned()).collect();
        assert_eq!(children, vec!["br", "img"]);
        assert_eq!(p.text(), "abc");
    }

    #[test]
    fn test_attribute_forms() {
        let markup =
            Markup::new(r#"<video src=movie.mp4 title='A &amp; B' data-x="1" controls></video>"#);
        let fragment = markup.parse().unwrap();
        let video = fragment.root().unwrap();

        assert_eq!(video.attribute("src").as_deref(), Some("movie.mp4"));
        assert_eq!(video.attribute("title").as_deref(), Some("A & B"));
        assert_eq!(video.attribute("controls").as_deref(), Some(""));
        assert!(video.has_attribute("data-x"));
        assert!(!video.has_attribute("autoplay"));
    }

    #[test]
    fn test_names_compare_case_insensitively() {
        let markup = Markup::new(r#"<DIV Title="x">y</DIV>"#);
        let fragment = markup.parse().unwrap();
        let div = fragment.root().unwrap();

        assert_eq!(div.name(), "div");
        assert_eq!(div.attribute("title").as_deref(), Some("x"));
        assert_eq!(div.text(), "y");
    }

    #[test]
    fn test_inner_html_is_verbatim() {
        let markup = Markup::new("<p>Hello <strong class=x>bold</strong> &amp; <br>more</p>");
        let fragment = markup.parse().unwrap();
        let p = fragment.root().unwrap();

        assert_eq!(p.inner_html(), "Hello <strong class=x>bold</strong> &amp; <br>more");
    }

    #[test]
    fn test_unclosed_elements_swallow_what_follows() {
        let markup = Markup::new("<ul><li>one<li>two");
        let fragment = markup.parse().unwrap();
        let ul = fragment.root().unwrap();

        assert_eq!(ul.text(), "onetwo");
        assert_eq!(ul.inner_html(), "<li>one<li>two");
    }

    #[test]
    fn test_stray_end_tags_are_dropped() {
        let markup = Markup::new("</span><p>a</p></div>");
        let fragment = markup.parse().unwrap();

        assert_eq!(fragment.elements().count(), 1);
        assert_eq!(fragment.text(), "a");
    }

    #[test]
    fn test_comments_are_not_text() {
        let markup = Markup::new("<p>a<!-- hidden -->b</p>");
        let fragment = markup.parse().unwrap();
        let p = fragment.root().unwrap();

        assert_eq!(p.text(), "ab");
        assert_eq!(p.inner_html(), "a<!-- hidden -->b");
    }

    #[test]
    fn test_text_keeps_literal_comparison_signs() {
        let markup = Markup::new("<p>1 < 2 and 3 > 1</p>");
        let fragment = markup.parse().unwrap();

        assert_eq!(fragment.root().unwrap().text(), "1 < 2 and 3 > 1");
    }

    #[test]
    fn test_fragment_source_is_the_markup_as_written() {
        let markup = Markup::new("<p>1 < 2</p>");
        let fragment = markup.parse().unwrap();

        assert_eq!(fragment.source(), "<p>1 < 2</p>");
        assert_eq!(fragment.root().unwrap().inner_html(), "1 &lt; 2");
    }

    #[test]
    fn test_empty_markup() {
        let markup = Markup::new("");
        let fragment = markup.parse().unwrap();
        assert!(fragment.is_empty());
        assert!(fragment.root().is_none());
        assert_eq!(fragment.text(), "");
    }
}
