//! Collaborators that activate browser libraries through `<script>` elements.
//!
//! Scripts are appended to `<body>`, or to the document root for fragments.
//! A page that already carries them keeps a single copy.

use pagefx_dom::{Document, Node};

use crate::diagrams::{DiagramRenderer, MermaidConfig};
use crate::error::EnhanceError;
use crate::highlight::Highlighter;

const MERMAID_INIT: &str = "mermaid.initialize";

const HIGHLIGHT_INIT: &str = "hljs.initHighlightingOnLoad();";

/// Initializes mermaid.js with the page's diagram configuration.
#[derive(Clone, Debug, Default)]
pub struct MermaidScript {
    src: Option<String>,
}

impl MermaidScript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also load the library from `src` before initializing it.
    #[must_use]
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }
}

impl DiagramRenderer for MermaidScript {
    fn initialize(
        &mut self,
        document: &mut Document,
        config: &MermaidConfig,
    ) -> Result<(), EnhanceError> {
        let code = format!("{MERMAID_INIT}({});", config.to_json()?);
        append_scripts(document, self.src.as_deref(), MERMAID_INIT, code);
        Ok(())
    }
}

/// Activates highlight.js once the page has loaded.
#[derive(Clone, Debug, Default)]
pub struct HighlightScript {
    src: Option<String>,
}

impl HighlightScript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also load the library from `src` before activating it.
    #[must_use]
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }
}

impl Highlighter for HighlightScript {
    fn run(&mut self, document: &mut Document) -> Result<(), EnhanceError> {
        append_scripts(document, self.src.as_deref(), HIGHLIGHT_INIT, HIGHLIGHT_INIT);
        Ok(())
    }
}

/// Append the library and its activation code to the body.
///
/// An inline script starting with `marker` is rewritten in place instead,
/// and a library script already loaded from `src` is not added again.
fn append_scripts(
    document: &mut Document,
    src: Option<&str>,
    marker: &str,
    code: impl Into<String>,
) {
    let body = document.body_mut();
    if let Some(src) = src
        && !body.children.iter().any(|c| is_script(c) && c.attr("src") == Some(src))
    {
        body.push_child(Node::new("script").with_attr("src", src));
    }
    let code = code.into();
    match body
        .children
        .iter_mut()
        .find(|c| is_script(c) && c.text.trim_start().starts_with(marker))
    {
        Some(existing) => existing.text = code,
        None => body.push_child(Node::new("script").with_text(code)),
    }
}

fn is_script(node: &Node) -> bool {
    node.tag.eq_ignore_ascii_case("script")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::diagrams::Theme;

    #[test]
    fn test_mermaid_script_appends_to_body() {
        let mut doc = Document::parse("<html><body><p>x</p></body></html>").unwrap();
        MermaidScript::new()
            .initialize(&mut doc, &MermaidConfig::new(Theme::Dark))
            .unwrap();

        assert_eq!(
            doc.to_html(),
            r#"<html><body><p>x</p><script>mermaid.initialize({"logLevel":"error","securityLevel":"loose","theme":"dark"});</script></body></html>"#
        );
    }

    #[test]
    fn test_mermaid_script_with_src() {
        let mut doc = Document::parse("<p>x</p>").unwrap();
        MermaidScript::new()
            .with_src("/js/mermaid.min.js")
            .initialize(&mut doc, &MermaidConfig::default())
            .unwrap();

        assert_eq!(
            doc.to_html(),
            r#"<p>x</p><script src="/js/mermaid.min.js"></script><script>mermaid.initialize({"logLevel":"error","securityLevel":"loose","theme":"default"});</script>"#
        );
    }

    #[test]
    fn test_highlight_script() {
        let mut doc = Document::parse("<body></body>").unwrap();
        HighlightScript::new()
            .with_src("/js/highlight.min.js")
            .run(&mut doc)
            .unwrap();

        assert_eq!(
            doc.to_html(),
            r#"<body><script src="/js/highlight.min.js"></script><script>hljs.initHighlightingOnLoad();</script></body>"#
        );
    }
    #[test]
    fn test_scripts_not_duplicated_on_rerun() {
        let mut doc = Document::parse("<body><p>x</p></body>").unwrap();
        let mut mermaid = MermaidScript::new().with_src("/js/mermaid.min.js");
        let mut highlight = HighlightScript::new();
        for _ in 0..2 {
            mermaid
                .initialize(&mut doc, &MermaidConfig::default())
                .unwrap();
            highlight.run(&mut doc).unwrap();
        }

        let html = doc.to_html();
        assert_eq!(html.matches("mermaid.min.js").count(), 1);
        assert_eq!(html.matches("mermaid.initialize(").count(), 1);
        assert_eq!(html.matches("hljs.initHighlightingOnLoad").count(), 1);
    }

    #[test]
    fn test_rerun_updates_mermaid_config() {
        let mut doc = Document::parse("<body></body>").unwrap();
        let mut mermaid = MermaidScript::new();
        mermaid
            .initialize(&mut doc, &MermaidConfig::new(Theme::Default))
            .unwrap();
        mermaid
            .initialize(&mut doc, &MermaidConfig::new(Theme::Dark))
            .unwrap();

        assert_eq!(
            doc.to_html(),
            r#"<body><script>mermaid.initialize({"logLevel":"error","securityLevel":"loose","theme":"dark"});</script></body>"#
        );
    }
}
