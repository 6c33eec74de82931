//! Parsed HTML document with path-based element access.

use crate::error::DomError;
use crate::node::Node;
use crate::parser::{ROOT_TAG, parse_document};
use crate::selector::Selector;
use crate::serializer::serialize_document;

/// Child indices leading from the document root to a node.
///
/// Paths are invalidated by structural changes to the node's ancestors or
/// preceding siblings; apply mutations in reverse document order to keep
/// earlier paths valid.
pub type NodePath = Vec<usize>;

/// Parsed HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Doctype declaration body (e.g., `html`), if the page had one.
    pub doctype: Option<String>,
    /// Synthetic root element; its content is the page.
    pub root: Node,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            doctype: None,
            root: Node::new(ROOT_TAG),
        }
    }
}

impl Document {
    /// Parse an HTML page or fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the markup cannot be tokenized.
    pub fn parse(html: &str) -> Result<Self, DomError> {
        parse_document(html)
    }

    /// Create a document from top-level nodes.
    #[must_use]
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self {
            doctype: None,
            root: Node::new(ROOT_TAG).with_children(nodes),
        }
    }

    /// Serialize the document to HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        serialize_document(self)
    }

    /// Paths of all elements matching `selector`, in document order.
    #[must_use]
    pub fn select(&self, selector: &Selector) -> Vec<NodePath> {
        let mut out = Vec::new();
        collect_matches(
            &self.root,
            selector,
            false,
            &mut Vec::new(),
            &mut Vec::new(),
            &mut out,
        );
        out
    }

    /// Like [`select`](Self::select), but skips matches nested inside another match.
    #[must_use]
    pub fn select_outermost(&self, selector: &Selector) -> Vec<NodePath> {
        let mut out = Vec::new();
        collect_matches(
            &self.root,
            selector,
            true,
            &mut Vec::new(),
            &mut Vec::new(),
            &mut out,
        );
        out
    }

    /// Node at `path` (the empty path is the root).
    #[must_use]
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(&self.root, |node, &index| node.children.get(index))
    }

    /// Mutable node at `path` (the empty path is the root).
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter()
            .try_fold(&mut self.root, |node, &index| node.children.get_mut(index))
    }

    /// Replace the node at `path` with `replacements`, returning the removed node.
    ///
    /// Returns `None` (and changes nothing) for the root or an invalid path.
    pub fn replace_node(&mut self, path: &[usize], replacements: Vec<Node>) -> Option<Node> {
        let (&index, parent_path) = path.split_last()?;
        let parent = self.node_at_mut(parent_path)?;
        if index >= parent.children.len() {
            return None;
        }
        Some(parent.replace_child(index, replacements))
    }

    /// The `<body>` element, or the root when the page is a fragment.
    pub fn body_mut(&mut self) -> &mut Node {
        let path = find_path(&self.root, &mut Vec::new(), &|node: &Node| {
            node.tag.eq_ignore_ascii_case("body")
        })
        .unwrap_or_default();

        let mut node = &mut self.root;
        for index in path {
            node = &mut node.children[index];
        }
        node
    }
}

fn collect_matches<'a>(
    node: &'a Node,
    selector: &Selector,
    outermost: bool,
    ancestors: &mut Vec<&'a Node>,
    path: &mut NodePath,
    out: &mut Vec<NodePath>,
) {
    for (index, child) in node.children.iter().enumerate() {
        path.push(index);
        let matched = selector.matches(child, ancestors);
        if matched {
            out.push(path.clone());
        }
        if !(matched && outermost) {
            ancestors.push(child);
            collect_matches(child, selector, outermost, ancestors, path, out);
            ancestors.pop();
        }
        path.pop();
    }
}

fn find_path(
    node: &Node,
    path: &mut NodePath,
    predicate: &dyn Fn(&Node) -> bool,
) -> Option<NodePath> {
    for (index, child) in node.children.iter().enumerate() {
        path.push(index);
        if predicate(child) {
            return Some(path.clone());
        }
        if let Some(found) = find_path(child, path, predicate) {
            return Some(found);
        }
        path.pop();
    }
    None
}
