//! HTML serializer for the document tree.

use std::fmt::Write;

use crate::document::Document;
use crate::node::Node;

/// Serialize a document back to HTML.
///
/// The synthetic root element is not written, only its content.
pub(crate) fn serialize_document(document: &Document) -> String {
    let mut out = String::with_capacity(4096);

    if let Some(doctype) = &document.doctype {
        write!(out, "<!DOCTYPE {doctype}>").unwrap();
    }
    serialize_content(&document.root, &mut out);

    out
}

/// Serialize a single node (including its tail) to HTML.
pub(crate) fn serialize_node(node: &Node, out: &mut String) {
    if node.is_comment() {
        write!(out, "<!--{}-->", node.text).unwrap();
        out.push_str(&escape_text(&node.tail));
        return;
    }

    out.push('<');
    out.push_str(&node.tag);
    for (key, value) in &node.attrs {
        if value.is_empty() {
            write!(out, " {key}").unwrap();
        } else {
            write!(out, r#" {}="{}""#, key, escape_attr(value)).unwrap();
        }
    }
    out.push('>');

    if !node.is_void() {
        serialize_content(node, out);
        write!(out, "</{}>", node.tag).unwrap();
    }

    out.push_str(&escape_text(&node.tail));
}

/// Serialize an element's text and children, without its own tags.
fn serialize_content(node: &Node, out: &mut String) {
    if node.is_raw_text() {
        out.push_str(&node.text);
    } else {
        out.push_str(&escape_text(&node.text));
    }
    for child in &node.children {
        serialize_node(child, out);
    }
}

/// Escape text content.
fn escape_text(text: &str) -> String {
    escape_html(text, false)
}

/// Escape attribute values.
fn escape_attr(text: &str) -> String {
    escape_html(text, true)
}

fn escape_html(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}
