//! Lenient HTML document tree for page post-processing.
//!
//! This crate parses rendered documentation pages into an owned tree of
//! [`Node`]s, lets callers locate elements with simple CSS selectors, mutate
//! them in place and serialize the result back to HTML.
//!
//! # Architecture
//!
//! - [`Document`]: parsed page (doctype + synthetic root node)
//! - [`Node`]: element with attributes, leading text, tail text and children
//! - [`Selector`]: tag/class/id compounds joined by descendant combinators
//!
//! Text follows the element-tree model: `text` is the content before the
//! first child, `tail` is the content after an element's end tag inside its
//! parent.
//!
//! # Example
//!
//! ```
//! use pagefx_dom::{Document, Selector};
//!
//! let mut doc = Document::parse("<article><h2>Intro</h2></article>").unwrap();
//! let selector = Selector::parse("article h2").unwrap();
//! let paths = doc.select(&selector);
//! assert_eq!(paths.len(), 1);
//!
//! let heading = doc.node_at_mut(&paths[0]).unwrap();
//! heading.set_attr("id", "intro");
//! assert_eq!(doc.to_html(), r#"<article><h2 id="intro">Intro</h2></article>"#);
//! ```

mod document;
mod entities;
mod error;
mod node;
mod parser;
mod selector;
mod serializer;

pub use document::{Document, NodePath};
pub use error::{DomError, SelectorError};
pub use node::{COMMENT_TAG, Node};
pub use selector::Selector;
