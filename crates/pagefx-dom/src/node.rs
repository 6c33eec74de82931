//! Element node of the document tree.

/// Tag used for comment nodes. Their `text` holds the comment body.
pub const COMMENT_TAG: &str = "!--";

/// HTML void elements (never have content or an end tag).
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text (not parsed, not escaped).
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Node in a parsed HTML tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Element tag name as written in the source.
    pub tag: String,
    /// Text before the first child.
    pub text: String,
    /// Text after the element's end tag, inside the parent.
    pub tail: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    /// Child elements.
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Create a comment node.
    #[must_use]
    pub fn comment(body: impl Into<String>) -> Self {
        Self::new(COMMENT_TAG).with_text(body)
    }

    /// Set text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set tail content.
    #[must_use]
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    /// Add (or replace) an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Whether this node is a comment.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.tag == COMMENT_TAG
    }

    /// Whether this element is an HTML void element.
    #[must_use]
    pub fn is_void(&self) -> bool {
        is_void_element(&self.tag)
    }

    /// Whether this element holds raw (unescaped) text.
    #[must_use]
    pub fn is_raw_text(&self) -> bool {
        is_raw_text_element(&self.tag)
    }

    /// Get an attribute value (names compare case-insensitively).
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    /// Remove an attribute and return its previous value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self
            .attrs
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(index).1)
    }

    /// The `id` attribute, if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Whether the whitespace-separated `class` attribute contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Concatenated text of this element and all descendants (DOM `textContent`).
    ///
    /// Comments contribute nothing; the element's own tail is not included.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if self.is_comment() {
            return;
        }
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
            out.push_str(&child.tail);
        }
    }

    /// Append a child element after existing content.
    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Insert a child before all existing content, including leading text.
    ///
    /// The current leading text moves to the new child's tail so document
    /// order is preserved.
    pub fn insert_first_child(&mut self, mut child: Node) {
        let text = std::mem::take(&mut self.text);
        child.tail.push_str(&text);
        self.children.insert(0, child);
    }

    /// Replace the child at `index` with `replacements` and return the removed child.
    ///
    /// The removed child's tail is carried over to the last replacement (or to
    /// the preceding content when `replacements` is empty).
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn replace_child(&mut self, index: usize, mut replacements: Vec<Node>) -> Node {
        let mut removed = self.children.remove(index);
        let tail = std::mem::take(&mut removed.tail);
        if let Some(last) = replacements.last_mut() {
            last.tail.push_str(&tail);
        } else if index == 0 {
            self.text.push_str(&tail);
        } else {
            self.children[index - 1].tail.push_str(&tail);
        }
        let rest = self.children.split_off(index);
        self.children.extend(replacements);
        self.children.extend(rest);
        removed
    }
}

/// Whether `tag` is an HTML void element.
pub(crate) fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

/// Whether `tag` holds raw text content.
pub(crate) fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|raw| raw.eq_ignore_ascii_case(tag))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_text_content_direct_text() {
        let node = Node::new("p").with_text("Hello World");
        assert_eq!(node.text_content(), "Hello World");
    }

    #[test]
    fn test_text_content_with_children_and_tails() {
        let strong = Node::new("strong").with_text("Bold").with_tail(" text");
        let node = Node::new("p")
            .with_text("Some ")
            .with_children(vec![strong]);
        assert_eq!(node.text_content(), "Some Bold text");
    }

    #[test]
    fn test_text_content_excludes_own_tail_and_comments() {
        let comment = Node::comment(" hidden ").with_tail("b");
        let node = Node::new("span")
            .with_text("a")
            .with_tail(" outside")
            .with_children(vec![comment]);
        assert_eq!(node.text_content(), "ab");
    }

    #[test]
    fn test_has_class() {
        let node = Node::new("pre").with_attr("class", "language-js  mermaid");
        assert!(node.has_class("mermaid"));
        assert!(node.has_class("language-js"));
        assert!(!node.has_class("merm"));
    }

    #[test]
    fn test_set_attr_keeps_position() {
        let mut node = Node::new("a").with_attr("class", "x").with_attr("href", "#a");
        node.set_attr("class", "y");
        assert_eq!(
            node.attrs,
            vec![
                ("class".to_owned(), "y".to_owned()),
                ("href".to_owned(), "#a".to_owned())
            ]
        );
    }

    #[test]
    fn test_remove_attr() {
        let mut node = Node::new("h2").with_attr("id", "intro");
        assert_eq!(node.remove_attr("id"), Some("intro".to_owned()));
        assert_eq!(node.id(), None);
        assert_eq!(node.remove_attr("id"), None);
    }

    #[test]
    fn test_insert_first_child_moves_text_to_tail() {
        let em = Node::new("em").with_text("b");
        let mut node = Node::new("h2").with_text("a ").with_children(vec![em]);
        node.insert_first_child(Node::new("a").with_text("#"));

        assert!(node.text.is_empty());
        assert_eq!(node.children[0].tag, "a");
        assert_eq!(node.children[0].tail, "a ");
        assert_eq!(node.text_content(), "#a b");
    }

    #[test]
    fn test_replace_child_carries_tail() {
        let pre = Node::new("pre").with_text("x").with_tail("after");
        let mut parent = Node::new("div").with_children(vec![pre]);
        let removed = parent.replace_child(0, vec![Node::new("div"), Node::new("details")]);

        assert_eq!(removed.text, "x");
        assert!(removed.tail.is_empty());
        assert_eq!(parent.children.len(), 2);
        assert_eq!(parent.children[1].tail, "after");
    }

    #[test]
    fn test_replace_child_with_nothing_keeps_tail() {
        let first = Node::new("b").with_tail(" one");
        let second = Node::new("i").with_tail(" two");
        let mut parent = Node::new("p").with_children(vec![first, second]);
        parent.replace_child(1, Vec::new());

        assert_eq!(parent.children.len(), 1);
        assert_eq!(parent.children[0].tail, " one two");
    }

    #[test]
    fn test_void_and_raw_text() {
        assert!(Node::new("br").is_void());
        assert!(Node::new("BR").is_void());
        assert!(!Node::new("div").is_void());
        assert!(Node::new("script").is_raw_text());
        assert!(!Node::new("pre").is_raw_text());
    }
}
