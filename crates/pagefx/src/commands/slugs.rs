//! `pagefx slugs` command implementation.

use std::path::PathBuf;

use clap::Args;
use pagefx_config::Config;
use pagefx_dom::Document;
use pagefx_enhance::HeadingAnchor;

use super::PageSteps;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the slugs command.
#[derive(Args)]
pub(crate) struct SlugsArgs {
    /// HTML page to inspect.
    file: PathBuf,

    /// Path to configuration file (default: auto-discover pagefx.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print anchors as a JSON array.
    #[arg(long)]
    json: bool,
}

impl SlugsArgs {
    /// Execute the slugs command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), None)?;
        let steps = PageSteps::from_config(&config)?;
        let anchors = page_anchors(&steps, &std::fs::read_to_string(&self.file)?)?;

        if anchors.is_empty() {
            output.info("No headings matched");
        }
        if self.json {
            output.result(&serde_json::to_string_pretty(&anchors)?);
        } else {
            for line in format_anchors(&anchors) {
                output.result(&line);
            }
        }
        Ok(())
    }
}

/// Anchors the page would receive, computed on a scratch copy.
fn page_anchors(steps: &PageSteps, html: &str) -> Result<Vec<HeadingAnchor>, CliError> {
    let mut document = Document::parse(html)?;
    Ok(steps.anchors().inject(&mut document))
}

/// One line per anchor: level, slug and title.
fn format_anchors(anchors: &[HeadingAnchor]) -> Vec<String> {
    anchors
        .iter()
        .map(|anchor| {
            let level = anchor
                .level
                .map_or_else(|| "-".to_owned(), |level| format!("h{level}"));
            format!("{level}  #{}  {}", anchor.slug, anchor.title)
        })
        .collect()
}
