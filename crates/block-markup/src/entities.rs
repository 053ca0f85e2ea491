//! Character reference decoding for text and attribute values.
//!
//! tl hands back text and attribute values exactly as written, so named and
//! numeric references are resolved here with quick-xml's HTML5 entity
//! table. Unlike quick-xml, a reference that does not resolve (a bare `&`,
//! an unknown name) is kept literally instead of failing the whole value.

use std::borrow::Cow;

use quick_xml::escape::unescape;

/// Longest `&...;` run worth handing to the resolver. The longest HTML5
/// entity name is 31 bytes.
const MAX_REFERENCE_LEN: usize = 40;

/// Decode character references, leaving anything unrecognized untouched.
///
/// # Example
/// ```
/// use block_markup::entities::decode;
/// assert_eq!(decode("Fish &amp; Chips&#33;"), "Fish & Chips!");
/// assert_eq!(decode("Caf&eacute; &euro;5"), "Café €5");
/// assert_eq!(decode("AT&T"), "AT&T");
/// ```
pub fn decode(s: &str) -> Cow<'_, str> {
    match unescape(s) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Owned(decode_lenient(s)),
    }
}

/// Resolve references one at a time so a single bad one only costs itself.
fn decode_lenient(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let reference = tail
            .find(';')
            .map(|end| &tail[..=end])
            .filter(|r| r.len() <= MAX_REFERENCE_LEN && !r[1..].contains('&'));

        match reference.and_then(|r| unescape(r).ok().map(|d| (r.len(), d))) {
            Some((len, decoded)) => {
                out.push_str(&decoded);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    out
}
