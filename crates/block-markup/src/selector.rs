//! A CSS selector subset for picking elements out of a fragment.
//!
//! Compound selectors (`p`, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`
//! and the `^=`, `$=`, `*=`, `~=` operators) are compiled by tl. Descendant
//! (whitespace) and child (`>`) combinators and comma-separated
//! alternatives are matched here against the fragment tree, since tl only
//! evaluates those from the document root.

use crate::{Element, Error, Fragment, Result};

/// A compiled selector list, borrowing the text it was compiled from.
#[derive(Debug, Clone)]
pub struct Selector<'s> {
    alternatives: Vec<Complex<'s>>,
}

/// Compound selectors joined by combinators, stored left to right. The
/// first compound's combinator is unused.
type Complex<'s> = Vec<(Combinator, tl::queryselector::Selector<'s>)>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

impl<'s> Selector<'s> {
    /// Compile a selector.
    ///
    /// # Errors
    ///
    /// Fails on empty selectors and on syntax outside the supported subset
    /// (pseudo-classes, sibling combinators, malformed compounds).
    pub fn parse(selector: &'s str) -> Result<Self> {
        let alternatives = selector
            .split(',')
            .map(|alt| parse_complex(alt, selector))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { alternatives })
    }

    /// Whether `element`, reached through `ancestors` (outermost first),
    /// matches any alternative.
    pub fn matches(&self, element: &Element<'_, '_>, ancestors: &[Element<'_, '_>]) -> bool {
        self.alternatives
            .iter()
            .any(|complex| matches_complex(complex, element, ancestors))
    }
}

impl<'a> Fragment<'a> {
    /// Every element matching `selector`, in document order.
    pub fn select(&self, selector: &Selector<'_>) -> Vec<Element<'_, 'a>> {
        let mut out = Vec::new();
        let mut ancestors = Vec::new();
        walk(self.top_level(), self.parser(), selector, &mut ancestors, &mut out);
        out
    }

    /// The first element matching `selector`, in document order.
    pub fn select_first(&self, selector: &Selector<'_>) -> Option<Element<'_, 'a>> {
        self.select(selector).into_iter().next()
    }
}

impl<'f, 'a> Element<'f, 'a> {
    /// Every descendant of this element matching `selector`, in document
    /// order. The element itself is never included, but it does count as an
    /// ancestor for combinators.
    pub fn select(&self, selector: &Selector<'_>) -> Vec<Element<'f, 'a>> {
        let mut out = Vec::new();
        let mut ancestors = vec![*self];
        let children = self.tag().children();
        walk(children.top().as_slice(), self.parser(), selector, &mut ancestors, &mut out);
        out
    }
}

fn walk<'f, 'a>(
    handles: &[tl::NodeHandle],
    parser: &'f tl::Parser<'a>,
    selector: &Selector<'_>,
    ancestors: &mut Vec<Element<'f, 'a>>,
    out: &mut Vec<Element<'f, 'a>>,
) {
    for handle in handles {
        let Some(element) = Element::resolve(*handle, parser) else {
            continue;
        };
        if selector.matches(&element, ancestors) {
            out.push(element);
        }
        ancestors.push(element);
        let children = element.tag().children();
        walk(children.top().as_slice(), parser, selector, ancestors, out);
        ancestors.pop();
    }
}

fn matches_complex(
    parts: &[(Combinator, tl::queryselector::Selector<'_>)],
    element: &Element<'_, '_>,
    ancestors: &[Element<'_, '_>],
) -> bool {
    let Some(((combinator, compound), rest)) = parts.split_last() else {
        return true;
    };
    if !compound.matches(element.node()) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    match combinator {
        Combinator::Child => match ancestors.split_last() {
            Some((parent, above)) => matches_complex(rest, parent, above),
            None => false,
        },
        Combinator::Descendant => (0..ancestors.len())
            .rev()
            .any(|i| matches_complex(rest, &ancestors[i], &ancestors[..i])),
    }
}

fn parse_complex<'s>(input: &'s str, full: &str) -> Result<Complex<'s>> {
    let bytes = input.as_bytes();
    let mut parts = Vec::new();
    let mut pending = Combinator::Descendant;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b if b.is_ascii_whitespace() => pos += 1,
            b'>' => {
                if parts.is_empty() || pending == Combinator::Child {
                    return Err(Error::selector(full, "unexpected `>`"));
                }
                pending = Combinator::Child;
                pos += 1;
            }
            _ => {
                let end = compound_end(bytes, pos);
                parts.push((pending, parse_compound(&input[pos..end], full)?));
                pending = Combinator::Descendant;
                pos = end;
            }
        }
    }

    if pending == Combinator::Child {
        return Err(Error::selector(full, "selector cannot end with `>`"));
    }
    if parts.is_empty() {
        return Err(Error::selector(full, "empty selector"));
    }
    Ok(parts)
}

/// Where the compound starting at `start` ends: the first whitespace or `>`
/// outside an attribute filter.
fn compound_end(bytes: &[u8], start: usize) -> usize {
    let mut in_brackets = false;
    let mut quote = None;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' if in_brackets => quote = Some(b),
                b'[' => in_brackets = true,
                b']' => in_brackets = false,
                b'>' if !in_brackets => return start + offset,
                b if b.is_ascii_whitespace() && !in_brackets => return start + offset,
                _ => {}
            },
        }
    }
    bytes.len()
}

fn parse_compound<'s>(compound: &'s str, full: &str) -> Result<tl::queryselector::Selector<'s>> {
    let mut in_brackets = false;
    for b in compound.bytes() {
        match b {
            b'[' => in_brackets = true,
            b']' => in_brackets = false,
            b':' if !in_brackets => {
                return Err(Error::selector(full, "pseudo-classes are not supported"));
            }
            b'+' | b'~' if !in_brackets => {
                return Err(Error::selector(full, "sibling combinators are not supported"));
            }
            _ => {}
        }
    }

    tl::parse_query_selector(compound)
        .ok_or_else(|| Error::selector(full, format!("cannot parse `{}`", compound)))
}
