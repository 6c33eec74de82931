//! Page-load enhancements for rendered documentation pages.
//!
//! Three independent steps run over a parsed [`Document`](pagefx_dom::Document):
//!
//! - [`DiagramTransformer`]: turns `pre.mermaid` source blocks into a diagram
//!   container plus a collapsed "Diagram source" disclosure, then the
//!   [`DiagramRenderer`] collaborator is initialized once with a
//!   [`MermaidConfig`] whose theme follows the [`ColorSchemePreference`]
//! - [`Highlighter`]: syntax-highlighting collaborator, activated once the
//!   page has fully loaded
//! - [`AnchorInjector`]: inserts de-duplicated permalink anchors into headings
//!
//! [`PageEnhancer`] runs them in page-lifecycle order. The collaborators are
//! traits so tests can substitute fakes; [`MermaidScript`] and
//! [`HighlightScript`] are the implementations that emit activation
//! `<script>` elements for the browser libraries.
//!
//! # Example
//!
//! ```
//! use pagefx_dom::Document;
//! use pagefx_enhance::{ColorScheme, HighlightScript, MermaidScript, PageEnhancer};
//!
//! let mut doc = Document::parse("<article><h2>Setup</h2></article>").unwrap();
//! let mut enhancer = PageEnhancer::new(MermaidScript::new(), HighlightScript::new())
//!     .with_preference(ColorScheme::Dark);
//!
//! let report = enhancer.enhance(&mut doc);
//! assert_eq!(report.anchors[0].slug, "setup");
//! ```

mod anchors;
mod diagrams;
mod error;
mod highlight;
mod page;
mod preference;
mod script;

pub use anchors::{AnchorInjector, HeadingAnchor, assign_slugs, slugify};
pub use diagrams::{
    DiagramRenderer, DiagramTransformer, LogLevel, MermaidConfig, SecurityLevel, Theme,
};
pub use error::EnhanceError;
pub use highlight::Highlighter;
pub use page::{EnhanceReport, PageEnhancer};
pub use preference::{ColorScheme, ColorSchemePreference, UnknownColorScheme};
pub use script::{HighlightScript, MermaidScript};
