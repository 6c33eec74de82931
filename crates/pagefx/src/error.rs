//! CLI error types.

use pagefx_config::ConfigError;
use pagefx_dom::DomError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse HTML: {0}")]
    Dom(#[from] DomError),

    #[error("invalid path pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("{0}")]
    Glob(#[from] glob::GlobError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{failed} of {total} files failed")]
    Failed { failed: usize, total: usize },
}
