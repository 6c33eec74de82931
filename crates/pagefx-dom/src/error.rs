//! Error types for document parsing and selector compilation.

use std::str::Utf8Error;

/// Error while parsing an HTML document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DomError {
    /// Markup parsing error.
    #[error("HTML parse error")]
    Parse(#[from] quick_xml::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error")]
    Utf8(#[from] Utf8Error),

    /// Attribute syntax error.
    #[error("HTML attribute error")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// Encoding error during parsing.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
}

/// Error while compiling a CSS selector.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectorError {
    /// Selector (or one of its comma-separated parts) is empty.
    #[error("empty selector")]
    Empty,

    /// Character outside the supported selector grammar.
    #[error("unsupported character {found:?} at offset {offset} in selector {selector:?}")]
    Unsupported {
        /// Full selector text.
        selector: String,
        /// Offending character.
        found: char,
        /// Byte offset of the offending character.
        offset: usize,
    },

    /// `.` or `#` without a following name.
    #[error("missing name after {marker:?} in selector {selector:?}")]
    MissingName {
        /// Full selector text.
        selector: String,
        /// The `.` or `#` marker.
        marker: char,
    },
}
