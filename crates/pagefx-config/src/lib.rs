//! Configuration management for pagefx.
//!
//! Parses `pagefx.toml` with serde and discovers it in the current directory
//! or its parents. Every section and field is optional.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `scripts.mermaid_src`
//! - `scripts.highlight_src`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "pagefx.toml";

/// Color schemes accepted by `appearance.color_scheme`.
const COLOR_SCHEMES: &[&str] = &["light", "dark"];

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the reader color scheme.
    pub color_scheme: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Diagram block transformation.
    pub diagrams: DiagramsConfig,
    /// Heading anchor injection.
    pub anchors: AnchorsConfig,
    /// Reader appearance.
    pub appearance: AppearanceConfig,
    /// Library activation scripts.
    pub scripts: ScriptsConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Diagram block configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    /// Selector for diagram source blocks.
    pub selector: String,
    /// Class of the rendering container.
    pub container_class: String,
    /// Summary label of the source disclosure.
    pub summary: String,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            selector: "pre.mermaid".to_owned(),
            container_class: "mermaid".to_owned(),
            summary: "Diagram source".to_owned(),
        }
    }
}

/// Heading anchor configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnchorsConfig {
    /// Selector for headings that receive anchors.
    pub selector: String,
    /// Class of the injected anchor.
    pub class: String,
    /// Visible anchor content.
    pub symbol: String,
}

impl Default for AnchorsConfig {
    fn default() -> Self {
        Self {
            selector: "article h2, article h3, article h4, article h5, article h6".to_owned(),
            class: "header-hash".to_owned(),
            symbol: "#".to_owned(),
        }
    }
}

/// Appearance configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Reader color scheme: "light" or "dark".
    pub color_scheme: String,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            color_scheme: "light".to_owned(),
        }
    }
}

/// Library activation script configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// URL of the diagram library, loaded before initialization.
    pub mermaid_src: Option<String>,
    /// URL of the highlighting library, loaded before activation.
    pub highlight_src: Option<String>,
    /// Whether to emit the diagram library initialization.
    pub mermaid_init: bool,
    /// Whether to emit the highlighting activation.
    pub highlight_init: bool,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            mermaid_src: None,
            highlight_src: None,
            mermaid_init: true,
            highlight_init: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`scripts.mermaid_src`").
        field: String,
        /// Error message (e.g., "${`MERMAID_CDN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `pagefx.toml` in the current directory and parents,
    /// falling back to defaults.
    ///
    /// CLI settings are applied last and validated with the rest.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(color_scheme) = &settings.color_scheme {
            self.appearance.color_scheme.clone_from(color_scheme);
        }
    }

    /// Search for the config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.diagrams.selector, "diagrams.selector")?;
        require_non_empty(&self.diagrams.container_class, "diagrams.container_class")?;
        require_non_empty(&self.anchors.selector, "anchors.selector")?;
        require_non_empty(&self.anchors.class, "anchors.class")?;
        self.validate_appearance()?;
        self.validate_scripts()?;
        Ok(())
    }

    fn validate_appearance(&self) -> Result<(), ConfigError> {
        let scheme = self.appearance.color_scheme.as_str();
        if !COLOR_SCHEMES.contains(&scheme) {
            return Err(ConfigError::Validation(format!(
                "appearance.color_scheme must be one of {}, got '{scheme}'",
                COLOR_SCHEMES.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_scripts(&self) -> Result<(), ConfigError> {
        if let Some(src) = &self.scripts.mermaid_src {
            require_non_empty(src, "scripts.mermaid_src")?;
        }
        if let Some(src) = &self.scripts.highlight_src {
            require_non_empty(src, "scripts.highlight_src")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.scripts.mermaid_src =
            expand::expand_env_opt(self.scripts.mermaid_src.as_deref(), "scripts.mermaid_src")?;
        self.scripts.highlight_src = expand::expand_env_opt(
            self.scripts.highlight_src.as_deref(),
            "scripts.highlight_src",
        )?;
        Ok(())
    }
}
