//! CSS selector subset used to locate page elements.
//!
//! Supported grammar:
//!
//! ```text
//! list     := chain ("," chain)*
//! chain    := compound (whitespace compound)*      (descendant combinator)
//! compound := (tag | "*")? ("." class | "#" id)*
//! ```
//!
//! That covers the selectors documentation pages need (`pre.mermaid`,
//! `article h2`, `main .content h3`) without pulling in a browser engine.

use crate::error::SelectorError;
use crate::node::Node;

/// Compiled selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Alternatives of the comma-separated list.
    chains: Vec<Chain>,
}

/// Compounds of one alternative, outermost first.
type Chain = Vec<Compound>;

/// A single compound selector such as `pre.mermaid` or `#intro`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    /// Tag name; `None` matches any element.
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty()
    }

    fn matches(&self, node: &Node) -> bool {
        if node.is_comment() {
            return false;
        }
        if let Some(tag) = &self.tag
            && !node.tag.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && node.id() != Some(id.as_str())
        {
            return false;
        }
        self.classes.iter().all(|class| node.has_class(class))
    }
}

impl Selector {
    /// Compile a selector list.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagefx_dom::Selector;
    ///
    /// assert!(Selector::parse("article h2, article h3").is_ok());
    /// assert!(Selector::parse("div > p").is_err());
    /// ```
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let mut chains = Vec::new();
        let mut chain: Chain = Vec::new();
        let mut compound = Compound::default();
        let mut universal = false;
        let mut chars = selector.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            match ch {
                c if c.is_whitespace() => {
                    finish_compound(&mut chain, &mut compound, &mut universal);
                }
                ',' => {
                    finish_compound(&mut chain, &mut compound, &mut universal);
                    if chain.is_empty() {
                        return Err(SelectorError::Empty);
                    }
                    chains.push(std::mem::take(&mut chain));
                }
                '*' if compound.is_empty() && !universal => universal = true,
                '.' | '#' => {
                    let name = read_name(&mut chars);
                    if name.is_empty() {
                        return Err(SelectorError::MissingName {
                            selector: selector.to_owned(),
                            marker: ch,
                        });
                    }
                    if ch == '.' {
                        compound.classes.push(name);
                    } else {
                        compound.id = Some(name);
                    }
                }
                c if is_name_char(c) && compound.is_empty() && !universal => {
                    let mut name = c.to_string();
                    name.push_str(&read_name(&mut chars));
                    compound.tag = Some(name);
                }
                found => {
                    return Err(SelectorError::Unsupported {
                        selector: selector.to_owned(),
                        found,
                        offset,
                    });
                }
            }
        }

        finish_compound(&mut chain, &mut compound, &mut universal);
        if chain.is_empty() {
            return Err(SelectorError::Empty);
        }
        chains.push(chain);

        Ok(Self { chains })
    }

    /// Whether `node` matches, given its ancestors (outermost first).
    #[must_use]
    pub fn matches(&self, node: &Node, ancestors: &[&Node]) -> bool {
        self.chains
            .iter()
            .any(|chain| chain_matches(chain, node, ancestors))
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn finish_compound(chain: &mut Chain, compound: &mut Compound, universal: &mut bool) {
    if !compound.is_empty() || *universal {
        chain.push(std::mem::take(compound));
    }
    *universal = false;
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn read_name(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> String {
    let mut name = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !is_name_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

/// Match right to left: the last compound against `node`, the rest against
/// ancestors, nearest first. Greedy matching is exact for descendant-only chains.
fn chain_matches(chain: &[Compound], node: &Node, ancestors: &[&Node]) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    if !last.matches(node) {
        return false;
    }

    let mut remaining = ancestors.iter().rev();
    rest.iter()
        .rev()
        .all(|compound| remaining.any(|ancestor| compound.matches(ancestor)))
}
