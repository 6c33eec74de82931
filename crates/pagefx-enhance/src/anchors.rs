//! Heading permalink anchors.
//!
//! Slugs are kept as clean as possible:
//! 1. use the `id` already on the heading
//! 2. otherwise slugify the heading text
//! 3. find values that occur more than once across the page
//! 4. suffix every occurrence of those values with one page-wide counter
//!
//! The counter is shared by all duplicated values and increments once per
//! suffixed heading, so `intro, setup, intro` becomes `intro-0, setup, intro-1`
//! and a later duplicate of another value continues at `-2`. Published
//! permalinks depend on this numbering.
//!
//! Headings that already start with an anchor of the configured class keep
//! it, and their slugs are reserved, so enhancing a page twice changes nothing.

use std::collections::HashSet;
use std::sync::LazyLock;

use pagefx_dom::{Document, Node, NodePath, Selector};
use regex::Regex;
use serde::Serialize;

/// Headings that receive anchors by default.
pub(crate) const DEFAULT_HEADING_SELECTOR: &str =
    "article h2, article h3, article h4, article h5, article h6";

/// Class of the injected anchor.
pub(crate) const DEFAULT_ANCHOR_CLASS: &str = "header-hash";

/// Visible content of the injected anchor.
pub(crate) const DEFAULT_ANCHOR_SYMBOL: &str = "#";

static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(DEFAULT_HEADING_SELECTOR).expect("invalid heading selector")
});

static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Anything but ASCII word characters and hyphens.
static NON_WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").expect("invalid non-word regex"));

static HYPHEN_RUN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("invalid hyphen regex"));

/// Anchor injected into a heading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeadingAnchor {
    /// Heading level (1 to 6), `None` for non-heading elements.
    pub level: Option<u8>,
    /// Trimmed heading text.
    pub title: String,
    /// Final slug, used as anchor `id` and `href` fragment.
    pub slug: String,
}

/// Heading state captured before any mutation.
struct HeadingRecord {
    existing_id: Option<String>,
    /// Slug of an anchor injected by an earlier run.
    anchored: Option<String>,
    text_content: String,
    level: Option<u8>,
}

impl HeadingRecord {
    fn read(node: &Node, anchor_class: &str) -> Self {
        let anchor = node
            .children
            .first()
            .filter(|first| {
                node.text.is_empty()
                    && first.tag.eq_ignore_ascii_case("a")
                    && first.has_class(anchor_class)
            });
        let mut text_content = node.text_content();
        if let Some(anchor) = anchor {
            text_content.replace_range(..anchor.text_content().len(), "");
        }
        Self {
            existing_id: node.id().filter(|id| !id.is_empty()).map(str::to_owned),
            anchored: anchor.map(|a| a.id().unwrap_or_default().to_owned()),
            text_content,
            level: heading_level(&node.tag),
        }
    }

    fn candidate_slug(&self) -> String {
        self.existing_id
            .clone()
            .unwrap_or_else(|| slugify(&self.text_content))
    }
}

/// Injects permalink anchors into headings.
///
/// # Example
///
/// ```
/// use pagefx_dom::Document;
/// use pagefx_enhance::AnchorInjector;
///
/// let mut doc = Document::parse("<article><h2>Setup</h2></article>").unwrap();
/// AnchorInjector::new().inject(&mut doc);
/// assert_eq!(
///     doc.to_html(),
///     r##"<article><h2><a class="header-hash" href="#setup" id="setup">#</a>Setup</h2></article>"##
/// );
/// ```
#[derive(Debug, Clone)]
pub struct AnchorInjector {
    selector: Selector,
    class: String,
    symbol: String,
}

impl AnchorInjector {
    /// Create an injector for `article h2` to `h6` with the `header-hash` anchor class.
    #[must_use]
    pub fn new() -> Self {
        Self {
            selector: HEADING_SELECTOR.clone(),
            class: DEFAULT_ANCHOR_CLASS.to_owned(),
            symbol: DEFAULT_ANCHOR_SYMBOL.to_owned(),
        }
    }

    /// Set the selector locating headings.
    #[must_use]
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Set the anchor's class attribute.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Set the anchor's visible content.
    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Insert an anchor as the first child of every matched heading.
    ///
    /// Slugs for all headings are computed before the document is touched.
    /// A heading's own `id` moves to its anchor. Headings that already carry
    /// an anchor are reported with its slug and left as they are.
    pub fn inject(&self, document: &mut Document) -> Vec<HeadingAnchor> {
        let paths: Vec<NodePath> = document.select(&self.selector);
        let records: Vec<HeadingRecord> = paths
            .iter()
            .filter_map(|path| document.node_at(path))
            .map(|node| HeadingRecord::read(node, &self.class))
            .collect();

        let reserved: HashSet<String> = records.iter().filter_map(|r| r.anchored.clone()).collect();
        let candidates: Vec<String> = records
            .iter()
            .filter(|record| record.anchored.is_none())
            .map(HeadingRecord::candidate_slug)
            .collect();
        let mut assigned = assign_slugs_avoiding(&candidates, &reserved).into_iter();
        let slugs: Vec<String> = records
            .iter()
            .map(|record| {
                record
                    .anchored
                    .clone()
                    .or_else(|| assigned.next())
                    .unwrap_or_default()
            })
            .collect();

        // Reverse order keeps the paths of earlier headings valid
        for ((path, record), slug) in paths.iter().zip(&records).zip(&slugs).rev() {
            if record.anchored.is_some() {
                continue;
            }
            let Some(heading) = document.node_at_mut(path) else {
                continue;
            };
            if heading.id().is_some_and(|id| !id.is_empty()) {
                heading.remove_attr("id");
            }
            heading.insert_first_child(self.anchor(slug));
        }

        tracing::debug!(
            count = candidates.len(),
            existing = reserved.len(),
            "Injected heading anchors"
        );

        records
            .into_iter()
            .zip(slugs)
            .map(|(record, slug)| HeadingAnchor {
                level: record.level,
                title: record.text_content.trim().to_owned(),
                slug,
            })
            .collect()
    }

    fn anchor(&self, slug: &str) -> Node {
        Node::new("a")
            .with_attr("class", self.class.as_str())
            .with_attr("href", format!("#{slug}"))
            .with_attr("id", slug)
            .with_text(self.symbol.as_str())
    }
}

impl Default for AnchorInjector {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert heading text to a slug.
///
/// Lowercases, trims, turns whitespace runs into `-`, `&` into `-and-`,
/// drops everything but ASCII word characters and `-`, then collapses `-` runs.
///
/// # Examples
///
/// ```
/// use pagefx_enhance::slugify;
///
/// assert_eq!(slugify("Foo & Bar!! Baz"), "foo-and-bar-baz");
/// assert_eq!(slugify("  Getting   Started "), "getting-started");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let hyphenated = WHITESPACE_PATTERN.replace_all(lower.trim(), "-");
    let anded = hyphenated.replace('&', "-and-");
    let stripped = NON_WORD_PATTERN.replace_all(&anded, "");
    HYPHEN_RUN_PATTERN.replace_all(&stripped, "-").into_owned()
}

/// Make candidate slugs unique, preserving document order.
///
/// Every occurrence of a value that appears more than once gets a `-N`
/// suffix from a single counter starting at 0. Candidates that occur once are
/// kept verbatim. If a suffixed slug would equal a slug that is already in
/// use, the counter moves on to the next free value.
///
/// # Examples
///
/// ```
/// use pagefx_enhance::assign_slugs;
///
/// let candidates = ["intro", "setup", "intro", "setup", "intro"].map(String::from);
/// assert_eq!(
///     assign_slugs(&candidates),
///     ["intro-0", "setup-1", "intro-2", "setup-3", "intro-4"]
/// );
/// ```
#[must_use]
pub fn assign_slugs(candidates: &[String]) -> Vec<String> {
    assign_slugs_avoiding(candidates, &HashSet::new())
}

/// [`assign_slugs`] on a page where `reserved` slugs are already in use.
///
/// A candidate equal to a reserved slug is suffixed like a duplicate.
fn assign_slugs_avoiding(candidates: &[String], reserved: &HashSet<String>) -> Vec<String> {
    let mut duplicates = duplicate_slugs(candidates);
    duplicates.extend(
        candidates
            .iter()
            .map(String::as_str)
            .filter(|candidate| reserved.contains(*candidate)),
    );
    let mut taken: HashSet<String> = candidates
        .iter()
        .filter(|candidate| !duplicates.contains(candidate.as_str()))
        .cloned()
        .chain(reserved.iter().cloned())
        .collect();

    let mut counter = 0usize;
    candidates
        .iter()
        .map(|candidate| {
            if !duplicates.contains(candidate.as_str()) {
                return candidate.clone();
            }
            loop {
                let slug = format!("{candidate}-{counter}");
                counter += 1;
                if taken.insert(slug.clone()) {
                    return slug;
                }
            }
        })
        .collect()
}

/// Values that occur more than once.
fn duplicate_slugs(candidates: &[String]) -> HashSet<&str> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .map(String::as_str)
        .filter(|candidate| !seen.insert(*candidate))
        .collect()
}

/// Heading level from a tag name (`h1` to `h6`).
fn heading_level(tag: &str) -> Option<u8> {
    let mut chars = tag.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('h' | 'H'), Some(digit @ '1'..='6'), None) => {
            digit.to_digit(10).and_then(|d| u8::try_from(d).ok())
        }
        _ => None,
    }
}
