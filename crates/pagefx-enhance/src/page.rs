//! Page lifecycle.
//!
//! Enhancements run at two points of a page's life:
//!
//! - **content loaded**: diagram blocks are transformed, the diagram library
//!   is initialized once, then heading anchors are injected
//! - **loaded**: syntax highlighting is activated
//!
//! A failing collaborator never stops the remaining steps; its error is
//! logged and recorded in the report.

use pagefx_dom::Document;
use serde::Serialize;

use crate::anchors::{AnchorInjector, HeadingAnchor};
use crate::diagrams::{DiagramRenderer, DiagramTransformer, MermaidConfig, Theme};
use crate::highlight::Highlighter;
use crate::preference::{ColorScheme, ColorSchemePreference};

/// Outcome of enhancing one page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EnhanceReport {
    /// Number of transformed diagram blocks.
    pub diagrams: usize,
    /// Injected heading anchors, in document order.
    pub anchors: Vec<HeadingAnchor>,
    /// Collaborator failures.
    pub warnings: Vec<String>,
}

/// Runs all page enhancements in lifecycle order.
pub struct PageEnhancer {
    diagrams: DiagramTransformer,
    anchors: AnchorInjector,
    renderer: Box<dyn DiagramRenderer>,
    highlighter: Box<dyn Highlighter>,
    preference: Box<dyn ColorSchemePreference>,
}

impl PageEnhancer {
    /// Create an enhancer with default steps and a light color scheme.
    pub fn new(
        renderer: impl DiagramRenderer + 'static,
        highlighter: impl Highlighter + 'static,
    ) -> Self {
        Self {
            diagrams: DiagramTransformer::new(),
            anchors: AnchorInjector::new(),
            renderer: Box::new(renderer),
            highlighter: Box::new(highlighter),
            preference: Box::new(ColorScheme::default()),
        }
    }

    /// Replace the diagram transform step.
    #[must_use]
    pub fn with_diagram_transformer(mut self, diagrams: DiagramTransformer) -> Self {
        self.diagrams = diagrams;
        self
    }

    /// Replace the heading anchor step.
    #[must_use]
    pub fn with_anchor_injector(mut self, anchors: AnchorInjector) -> Self {
        self.anchors = anchors;
        self
    }

    /// Set the color-scheme preference that selects the diagram theme.
    #[must_use]
    pub fn with_preference(mut self, preference: impl ColorSchemePreference + 'static) -> Self {
        self.preference = Box::new(preference);
        self
    }

    /// Steps run once the document content is available.
    pub fn content_loaded(&mut self, document: &mut Document) -> EnhanceReport {
        let mut report = EnhanceReport {
            diagrams: self.diagrams.transform(document),
            ..EnhanceReport::default()
        };

        let config = MermaidConfig::new(Theme::for_preference(self.preference.as_ref()));
        tracing::debug!(theme = ?config.theme, "Initializing diagram renderer");
        if let Err(e) = self.renderer.initialize(document, &config) {
            tracing::warn!(error = %e, "Diagram renderer initialization failed");
            report.warnings.push(format!("diagram renderer: {e}"));
        }

        report.anchors = self.anchors.inject(document);
        report
    }

    /// Steps run once the page has fully loaded. Returns collaborator failures.
    pub fn loaded(&mut self, document: &mut Document) -> Vec<String> {
        tracing::debug!("Activating syntax highlighting");
        match self.highlighter.run(document) {
            Ok(()) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Syntax highlighting failed");
                vec![format!("highlighter: {e}")]
            }
        }
    }

    /// Run both lifecycle stages.
    pub fn enhance(&mut self, document: &mut Document) -> EnhanceReport {
        let mut report = self.content_loaded(document);
        let warnings = self.loaded(document);
        report.warnings.extend(warnings);
        report
    }
}
