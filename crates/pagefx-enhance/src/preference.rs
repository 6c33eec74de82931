//! Reader color-scheme preference.

use std::fmt;
use std::str::FromStr;

/// Answers whether the reader prefers a dark color scheme.
///
/// Queried once per page, when the diagram library is initialized.
pub trait ColorSchemePreference {
    fn prefers_dark(&self) -> bool;
}

/// Fixed color scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    /// Name used in configuration files and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl ColorSchemePreference for ColorScheme {
    fn prefers_dark(&self) -> bool {
        *self == Self::Dark
    }
}

impl<F> ColorSchemePreference for F
where
    F: Fn() -> bool,
{
    fn prefers_dark(&self) -> bool {
        self()
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown color scheme name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color scheme '{0}' (expected 'light' or 'dark')")]
pub struct UnknownColorScheme(pub String);

impl FromStr for ColorScheme {
    type Err = UnknownColorScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(UnknownColorScheme(s.to_owned())),
        }
    }
}
