//! CLI command implementations.

pub(crate) mod enhance;
pub(crate) mod slugs;

pub(crate) use enhance::EnhanceArgs;
pub(crate) use slugs::SlugsArgs;

use pagefx_config::Config;
use pagefx_dom::Selector;
use pagefx_enhance::{
    AnchorInjector, ColorScheme, DiagramTransformer, HighlightScript, MermaidScript, PageEnhancer,
};

use crate::error::CliError;

/// Enhancement steps built from configuration.
///
/// Shared across worker threads; each page gets its own [`PageEnhancer`].
#[derive(Clone, Debug)]
pub(crate) struct PageSteps {
    diagrams: DiagramTransformer,
    anchors: AnchorInjector,
    color_scheme: ColorScheme,
    mermaid: Option<MermaidScript>,
    highlight: Option<HighlightScript>,
}

impl PageSteps {
    pub(crate) fn from_config(config: &Config) -> Result<Self, CliError> {
        let diagrams = DiagramTransformer::new()
            .with_selector(parse_selector(&config.diagrams.selector, "diagrams.selector")?)
            .with_container_class(config.diagrams.container_class.as_str())
            .with_summary(config.diagrams.summary.as_str());

        let anchors = AnchorInjector::new()
            .with_selector(parse_selector(&config.anchors.selector, "anchors.selector")?)
            .with_class(config.anchors.class.as_str())
            .with_symbol(config.anchors.symbol.as_str());

        let color_scheme = config
            .appearance
            .color_scheme
            .parse::<ColorScheme>()
            .map_err(|e| CliError::Validation(e.to_string()))?;

        let scripts = &config.scripts;
        let mermaid = scripts.mermaid_init.then(|| {
            let script = MermaidScript::new();
            match &scripts.mermaid_src {
                Some(src) => script.with_src(src.as_str()),
                None => script,
            }
        });
        let highlight = scripts.highlight_init.then(|| {
            let script = HighlightScript::new();
            match &scripts.highlight_src {
                Some(src) => script.with_src(src.as_str()),
                None => script,
            }
        });

        Ok(Self {
            diagrams,
            anchors,
            color_scheme,
            mermaid,
            highlight,
        })
    }

    /// Create an enhancer for one page.
    pub(crate) fn enhancer(&self) -> PageEnhancer {
        PageEnhancer::new(self.mermaid.clone(), self.highlight.clone())
            .with_diagram_transformer(self.diagrams.clone())
            .with_anchor_injector(self.anchors.clone())
            .with_preference(self.color_scheme)
    }

    pub(crate) fn anchors(&self) -> &AnchorInjector {
        &self.anchors
    }
}

fn parse_selector(selector: &str, field: &str) -> Result<Selector, CliError> {
    Selector::parse(selector).map_err(|e| CliError::Validation(format!("{field}: {e}")))
}
