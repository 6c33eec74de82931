//! Syntax highlighting activation.

use pagefx_dom::Document;

use crate::error::EnhanceError;

/// Syntax-highlighting library.
///
/// Run once, after the page has fully loaded, with no configuration.
pub trait Highlighter {
    /// Highlight all code blocks in `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be activated.
    fn run(&mut self, document: &mut Document) -> Result<(), EnhanceError>;
}

/// `None` leaves code blocks unhighlighted.
impl<H: Highlighter> Highlighter for Option<H> {
    fn run(&mut self, document: &mut Document) -> Result<(), EnhanceError> {
        match self {
            Some(highlighter) => highlighter.run(document),
            None => Ok(()),
        }
    }
}
