//! Error types for fragment parsing and selector compilation.

use thiserror::Error;

/// Result type alias for block-markup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing markup or selectors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The markup could not be handed to the HTML parser at all.
    #[error("markup parse error: {0}")]
    Parse(#[from] tl::ParseError),

    /// A selector outside the supported subset, or malformed.
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
}

impl Error {
    pub(crate) fn selector(selector: &str, message: impl Into<String>) -> Self {
        Error::Selector {
            selector: selector.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = Error::from(tl::ParseError::InvalidLength);
        assert!(err.to_string().starts_with("markup parse error: "));
    }

    #[test]
    fn test_selector_error_display() {
        let err = Error::selector("a:hover", "pseudo-classes are not supported");
        assert_eq!(
            err.to_string(),
            "invalid selector `a:hover`: pseudo-classes are not supported"
        );
    }
}
