//! Lenient markup-fragment parsing for block attribute inference.
//!
//! Saved block markup is HTML, not XML: void elements are left open,
//! attributes may be unquoted or valueless, and end tags are sometimes
//! implied. [`Markup`] hands it to the [`tl`] HTML parser and exposes the
//! resulting [`Fragment`] of [`Element`]s. Text and attribute values come
//! back with character references decoded; [`Element::inner_html`] gives
//! the markup back verbatim.
//!
//! A small CSS selector subset ([`Selector`]) picks elements out of a
//! fragment the way the editor's attribute sources do.
//!
//! # Example
//!
//! ```rust
//! use block_markup::{Markup, Selector};
//!
//! let markup = Markup::new(r#"<figure class="wp-block-image"><img src="a.png" alt="A"><figcaption>Hi <em>there</em></figcaption></figure>"#);
//! let fragment = markup.parse().unwrap();
//!
//! let img = fragment.select_first(&Selector::parse("img").unwrap()).unwrap();
//! assert_eq!(img.attribute("src").as_deref(), Some("a.png"));
//!
//! let caption = fragment.select_first(&Selector::parse("figcaption").unwrap()).unwrap();
//! assert_eq!(caption.text(), "Hi there");
//! assert_eq!(caption.inner_html(), "Hi <em>there</em>");
//! ```

pub mod entities;
pub mod error;
pub mod parser;
pub mod selector;
pub mod types;

// Re-export main types
pub use error::{Error, Result};
pub use parser::Markup;
pub use selector::Selector;
pub use types::{Element, Fragment};
