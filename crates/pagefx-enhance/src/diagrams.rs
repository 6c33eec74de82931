//! Diagram source blocks.
//!
//! Mermaid sources arrive as `<pre class="mermaid">` blocks. Each block is
//! replaced by a container the diagram library renders into, followed by a
//! collapsed disclosure that keeps the source readable:
//!
//! ```html
//! <div class="mermaid">graph TD; A-->B</div>
//! <details><summary>Diagram source</summary><pre>graph TD; A-->B</pre></details>
//! ```

use std::sync::LazyLock;

use pagefx_dom::{Document, Node, Selector};
use serde::Serialize;

use crate::error::EnhanceError;
use crate::preference::ColorSchemePreference;

/// Diagram source blocks matched by default.
pub(crate) const DEFAULT_DIAGRAM_SELECTOR: &str = "pre.mermaid";

/// Class of the rendering container.
pub(crate) const DEFAULT_CONTAINER_CLASS: &str = "mermaid";

/// Summary label of the source disclosure.
pub(crate) const DEFAULT_SUMMARY: &str = "Diagram source";

static DIAGRAM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(DEFAULT_DIAGRAM_SELECTOR).expect("invalid diagram selector")
});

/// Diagram library log verbosity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    #[default]
    Error,
    Fatal,
}

/// Diagram library security level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Strict,
    #[default]
    Loose,
    Antiscript,
    Sandbox,
}

/// Diagram color theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dark,
}

impl Theme {
    /// `Dark` when the reader prefers a dark color scheme.
    #[must_use]
    pub fn for_preference(preference: &dyn ColorSchemePreference) -> Self {
        if preference.prefers_dark() {
            Self::Dark
        } else {
            Self::Default
        }
    }
}

/// Configuration passed once per page to the diagram library.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MermaidConfig {
    pub log_level: LogLevel,
    pub security_level: SecurityLevel,
    pub theme: Theme,
}

impl MermaidConfig {
    /// Configuration with `error` logging, `loose` security and the given theme.
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    /// Serialize to the JSON object the library expects.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, EnhanceError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Diagram rendering library.
///
/// Initialized exactly once per page, after source blocks were transformed.
pub trait DiagramRenderer {
    /// Activate rendering of all diagram containers in `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be activated.
    fn initialize(
        &mut self,
        document: &mut Document,
        config: &MermaidConfig,
    ) -> Result<(), EnhanceError>;
}

/// `None` leaves the page without diagram rendering.
impl<R: DiagramRenderer> DiagramRenderer for Option<R> {
    fn initialize(
        &mut self,
        document: &mut Document,
        config: &MermaidConfig,
    ) -> Result<(), EnhanceError> {
        match self {
            Some(renderer) => renderer.initialize(document, config),
            None => Ok(()),
        }
    }
}

/// Replaces diagram source blocks with a container and a source disclosure.
#[derive(Debug, Clone)]
pub struct DiagramTransformer {
    selector: Selector,
    container_class: String,
    summary: String,
}

impl DiagramTransformer {
    /// Create a transformer for `pre.mermaid` blocks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            selector: DIAGRAM_SELECTOR.clone(),
            container_class: DEFAULT_CONTAINER_CLASS.to_owned(),
            summary: DEFAULT_SUMMARY.to_owned(),
        }
    }

    /// Set the selector locating source blocks.
    #[must_use]
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Set the class of the rendering container.
    #[must_use]
    pub fn with_container_class(mut self, class: impl Into<String>) -> Self {
        self.container_class = class.into();
        self
    }

    /// Set the disclosure summary label.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Transform every source block and return how many were replaced.
    ///
    /// Blocks nested inside another matched block are replaced along with it.
    pub fn transform(&self, document: &mut Document) -> usize {
        let paths = document.select_outermost(&self.selector);

        let mut count = 0;
        for path in paths.iter().rev() {
            let Some(source) = document.node_at(path).map(Node::text_content) else {
                continue;
            };
            if document.replace_node(path, self.replacement(source)).is_some() {
                count += 1;
            }
        }

        tracing::debug!(count, "Transformed diagram blocks");
        count
    }

    fn replacement(&self, source: String) -> Vec<Node> {
        let container = Node::new("div")
            .with_attr("class", self.container_class.as_str())
            .with_text(source.as_str());
        let details = Node::new("details").with_children(vec![
            Node::new("summary").with_text(self.summary.as_str()),
            Node::new("pre").with_text(source),
        ]);
        vec![container, details]
    }
}

impl Default for DiagramTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::preference::ColorScheme;

    fn transform(html: &str) -> (String, usize) {
        let mut doc = Document::parse(html).unwrap();
        let count = DiagramTransformer::new().transform(&mut doc);
        (doc.to_html(), count)
    }

    #[test]
    fn test_transform_single_block() {
        let (html, count) = transform(r#"<pre class="mermaid">graph TD; A-->B</pre>"#);

        assert_eq!(count, 1);
        assert_eq!(
            html,
            r#"<div class="mermaid">graph TD; A--&gt;B</div><details><summary>Diagram source</summary><pre>graph TD; A--&gt;B</pre></details>"#
        );
    }

    #[test]
    fn test_transform_decodes_entities_once() {
        let mut doc =
            Document::parse(r#"<pre class="mermaid">A --&gt; B &amp; C</pre>"#).unwrap();
        DiagramTransformer::new().transform(&mut doc);

        let container = doc.node_at(&[0]).unwrap();
        assert_eq!(container.text, "A --> B & C");
        assert_eq!(doc.node_at(&[1, 1]).unwrap().text, "A --> B & C");
        assert!(doc.to_html().starts_with(r#"<div class="mermaid">A --&gt; B &amp; C</div>"#));
    }

    #[test]
    fn test_transform_preserves_bare_lt() {
        let mut doc = Document::parse(
            r#"<pre class="mermaid">x < y --> B</pre><pre class="mermaid">A <--> B; C<--D</pre>"#,
        )
        .unwrap();
        let count = DiagramTransformer::new().transform(&mut doc);

        assert_eq!(count, 2);
        assert_eq!(doc.node_at(&[0]).unwrap().text, "x < y --> B");
        assert_eq!(doc.node_at(&[2]).unwrap().text, "A <--> B; C<--D");
        assert!(doc.to_html().starts_with(r#"<div class="mermaid">x &lt; y --&gt; B</div>"#));
    }

    #[test]
    fn test_transform_rerun_is_noop() {
        let mut doc = Document::parse(r#"<pre class="mermaid">A-->B</pre>"#).unwrap();
        let transformer = DiagramTransformer::new();
        transformer.transform(&mut doc);
        let html = doc.to_html();

        assert_eq!(transformer.transform(&mut doc), 0);
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn test_transform_uses_text_of_nested_markup() {
        let (html, _) = transform(r#"<pre class="mermaid"><code>sequenceDiagram</code></pre>"#);

        assert!(html.starts_with(r#"<div class="mermaid">sequenceDiagram</div>"#));
    }

    #[test]
    fn test_transform_keeps_position_and_tail() {
        let (html, count) = transform(
            r#"<article><p>Before</p><pre class="mermaid">x</pre> after <pre>code</pre></article>"#,
        );

        assert_eq!(count, 1);
        assert_eq!(
            html,
            r#"<article><p>Before</p><div class="mermaid">x</div><details><summary>Diagram source</summary><pre>x</pre></details> after <pre>code</pre></article>"#
        );
    }

    #[test]
    fn test_transform_multiple_blocks_in_order() {
        let (html, count) = transform(
            r#"<pre class="mermaid">first</pre><p>mid</p><pre class="mermaid">second</pre>"#,
        );

        assert_eq!(count, 2);
        let first = html.find(">first<").unwrap();
        let mid = html.find("<p>mid</p>").unwrap();
        let second = html.find(">second<").unwrap();
        assert!(first < mid && mid < second);
        assert_eq!(html.matches("<details>").count(), 2);
    }

    #[test]
    fn test_transform_nested_block_consumed_by_outer() {
        let (html, count) = transform(
            r#"<pre class="mermaid">outer <pre class="mermaid">inner</pre></pre>"#,
        );

        assert_eq!(count, 1);
        assert_eq!(html.matches(r#"class="mermaid""#).count(), 1);
        assert!(html.starts_with(r#"<div class="mermaid">outer inner</div>"#));
    }

    #[test]
    fn test_transform_ignores_other_blocks() {
        let (html, count) = transform(r#"<pre class="language-rust">fn main() {}</pre>"#);

        assert_eq!(count, 0);
        assert_eq!(html, r#"<pre class="language-rust">fn main() {}</pre>"#);
    }

    #[test]
    fn test_transform_details_collapsed() {
        let mut doc = Document::parse(r#"<pre class="mermaid">x</pre>"#).unwrap();
        DiagramTransformer::new().transform(&mut doc);

        let details = doc.node_at(&[1]).unwrap();
        assert_eq!(details.tag, "details");
        assert_eq!(details.attr("open"), None);
    }

    #[test]
    fn test_transform_custom_settings() {
        let mut doc = Document::parse(r#"<div class="diagram">x</div>"#).unwrap();
        let transformer = DiagramTransformer::new()
            .with_selector(Selector::parse("div.diagram").unwrap())
            .with_container_class("diagram-view")
            .with_summary("Source");
        transformer.transform(&mut doc);

        assert_eq!(
            doc.to_html(),
            r#"<div class="diagram-view">x</div><details><summary>Source</summary><pre>x</pre></details>"#
        );
    }

    #[test]
    fn test_mermaid_config_json() {
        assert_eq!(
            MermaidConfig::new(Theme::Dark).to_json().unwrap(),
            r#"{"logLevel":"error","securityLevel":"loose","theme":"dark"}"#
        );
        assert_eq!(
            MermaidConfig::new(Theme::Default).to_json().unwrap(),
            r#"{"logLevel":"error","securityLevel":"loose","theme":"default"}"#
        );
    }

    #[test]
    fn test_theme_for_preference() {
        assert_eq!(Theme::for_preference(&ColorScheme::Dark), Theme::Dark);
        assert_eq!(Theme::for_preference(&ColorScheme::Light), Theme::Default);
    }
}
