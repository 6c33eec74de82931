//! Lenient HTML parser built on the `quick-xml` tokenizer.
//!
//! Rendered documentation pages are close to well-formed but not XML: they
//! carry a doctype, named entities, void elements without `/>`, valueless
//! attributes and script bodies containing `<`. Each of those is normalized
//! before or during tokenization; the element tree is then assembled with an
//! explicit open-element stack.

use std::io::BufRead;
use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;

use crate::document::Document;
use crate::entities::normalize_entities;
use crate::error::DomError;
use crate::node::Node;

/// Synthetic wrapper element; becomes the document root.
pub(crate) const ROOT_TAG: &str = "pagefx-root";

/// Leading `<!DOCTYPE ...>` declaration.
static DOCTYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\A\s*<!doctype\s+([^>]*)>").expect("invalid doctype regex")
});

static SCRIPT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<script\b[^>]*>)(.*?)(</script\s*>)").expect("invalid script regex")
});

static STYLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<style\b[^>]*>)(.*?)(</style\s*>)").expect("invalid style regex")
});

/// Marks a masked raw-text body: `\u{E000}<index>\u{E000}`.
const RAW_MARKER: char = '\u{E000}';

/// Parse an HTML page into a [`Document`].
pub(crate) fn parse_document(html: &str) -> Result<Document, DomError> {
    let (doctype, content) = split_doctype(html);

    let mut raw_texts = Vec::new();
    let masked = mask_raw_text(content, &mut raw_texts);
    let normalized = normalize_entities(&masked);
    let wrapped = format!("<{ROOT_TAG}>{normalized}</{ROOT_TAG}>");

    let mut reader = Reader::from_str(&wrapped);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut root = parse_tree(&mut reader)?;
    restore_raw_text(&mut root, &raw_texts);

    Ok(Document { doctype, root })
}

/// Split off a leading doctype declaration.
fn split_doctype(html: &str) -> (Option<String>, &str) {
    match DOCTYPE_PATTERN.captures(html) {
        Some(caps) => {
            let end = caps.get(0).map_or(0, |m| m.end());
            (Some(caps[1].trim().to_owned()), &html[end..])
        }
        None => (None, html),
    }
}

/// Replace `script`/`style` bodies with markers so the tokenizer never sees them.
fn mask_raw_text(html: &str, raw_texts: &mut Vec<String>) -> String {
    let mut masked = html.to_owned();
    for pattern in [&*SCRIPT_PATTERN, &*STYLE_PATTERN] {
        masked = pattern
            .replace_all(&masked, |caps: &regex::Captures| {
                let index = raw_texts.len();
                raw_texts.push(caps[2].to_owned());
                format!("{}{RAW_MARKER}{index}{RAW_MARKER}{}", &caps[1], &caps[3])
            })
            .into_owned();
    }
    masked
}

/// Put masked raw-text bodies back into their elements.
fn restore_raw_text(node: &mut Node, raw_texts: &[String]) {
    if node.is_raw_text()
        && let Some(index) = node
            .text
            .strip_prefix(RAW_MARKER)
            .and_then(|rest| rest.strip_suffix(RAW_MARKER))
            .and_then(|digits| digits.parse::<usize>().ok())
        && let Some(raw) = raw_texts.get(index)
    {
        node.text.clone_from(raw);
    }
    for child in &mut node.children {
        restore_raw_text(child, raw_texts);
    }
}

/// Build the element tree from the token stream.
fn parse_tree<R: BufRead>(reader: &mut Reader<R>) -> Result<Node, DomError> {
    let mut buf = Vec::new();
    let mut stack: Vec<Node> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let node = element(reader, &e);
                close_implied(&mut stack, &node.tag);
                if node.is_void() {
                    append_child(&mut stack, node);
                } else {
                    stack.push(node);
                }
            }
            Event::Empty(e) => {
                let node = element(reader, &e);
                append_child(&mut stack, node);
            }
            Event::End(e) => {
                let tag = decode_name(reader, e.name().as_ref());
                close_element(&mut stack, &tag);
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?.into_owned();
                append_text(&mut stack, &text);
            }
            Event::GeneralRef(e) => {
                // Entity references (e.g., &lt; &gt; &amp;)
                let entity = reader.decoder().decode(&e)?.into_owned();
                append_text(&mut stack, &decode_entity(&entity));
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                append_text(&mut stack, &text);
            }
            Event::Comment(e) => {
                let body = reader.decoder().decode(&e)?.into_owned();
                append_child(&mut stack, Node::comment(body));
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }

    // Close anything left open at end of input
    while stack.len() > 1 {
        pop_into_parent(&mut stack);
    }
    Ok(stack.pop().unwrap_or_else(|| Node::new(ROOT_TAG)))
}

/// Start tags that end an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Elements an implied `</p>` does not reach past.
const PARAGRAPH_SCOPE: &[&str] = &["button", "caption", "table", "td", "th", "template"];

/// Close elements whose end tag is implied by a `tag` start tag.
///
/// A new `<li>` ends the open `<li>` of the same list, `<dt>`/`<dd>` end each
/// other, `<option>` ends `<option>`, `<tr>` ends the open row and `<td>`/`<th>`
/// the open cell. Block-level starts end an open `<p>`.
fn close_implied(stack: &mut Vec<Node>, tag: &str) {
    let tag = tag.to_ascii_lowercase();
    let (closes, scope): (&[&str], &[&str]) = match tag.as_str() {
        "li" => (&["li"][..], &["ol", "ul", "menu"][..]),
        "dt" | "dd" => (&["dt", "dd"][..], &["dl"][..]),
        "option" => (&["option"][..], &["select", "datalist", "optgroup"][..]),
        "tr" => (&["tr"][..], &["table", "thead", "tbody", "tfoot"][..]),
        "td" | "th" => (&["td", "th"][..], &["tr", "table"][..]),
        _ => (&[][..], &[][..]),
    };
    if let Some(pos) = open_in_scope(stack, closes, scope) {
        close_from(stack, pos);
    }
    if CLOSES_PARAGRAPH.contains(&tag.as_str())
        && let Some(pos) = open_in_scope(stack, &["p"], PARAGRAPH_SCOPE)
    {
        close_from(stack, pos);
    }
}

/// Position of the nearest open element named in `tags`, unless a `scope`
/// element is open inside it.
fn open_in_scope(stack: &[Node], tags: &[&str], scope: &[&str]) -> Option<usize> {
    for (pos, node) in stack.iter().enumerate().skip(1).rev() {
        let name = node.tag.to_ascii_lowercase();
        if tags.contains(&name.as_str()) {
            return Some(pos);
        }
        if scope.contains(&name.as_str()) {
            return None;
        }
    }
    None
}

/// Close the nearest open element named `tag`, closing everything opened after it.
///
/// End tags without a matching open element are ignored.
fn close_element(stack: &mut Vec<Node>, tag: &str) {
    let Some(pos) = stack.iter().rposition(|n| n.tag.eq_ignore_ascii_case(tag)) else {
        return;
    };
    close_from(stack, pos);
}

/// Close the element at `pos` and everything opened after it.
fn close_from(stack: &mut Vec<Node>, pos: usize) {
    // The root stays on the stack until end of input
    while stack.len() > pos.max(1) {
        pop_into_parent(stack);
    }
}

fn pop_into_parent(stack: &mut Vec<Node>) {
    if let Some(node) = stack.pop() {
        append_child(stack, node);
    }
}

fn append_child(stack: &mut [Node], child: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(child);
    }
}

/// Append text to the open element's text or its last child's tail.
fn append_text(stack: &mut [Node], text: &str) {
    let Some(node) = stack.last_mut() else {
        return;
    };
    if let Some(last_child) = node.children.last_mut() {
        last_child.tail.push_str(text);
    } else {
        node.text.push_str(text);
    }
}

fn element<R: BufRead>(reader: &Reader<R>, e: &BytesStart) -> Node {
    Node {
        tag: decode_name(reader, e.name().as_ref()),
        attrs: decode_attrs(reader, e),
        ..Default::default()
    }
}

fn decode_name<R: BufRead>(reader: &Reader<R>, name: &[u8]) -> String {
    reader.decoder().decode(name).map_or_else(
        |_| String::from_utf8_lossy(name).into_owned(),
        std::borrow::Cow::into_owned,
    )
}

fn decode_attrs<R: BufRead>(reader: &Reader<R>, e: &BytesStart) -> Vec<(String, String)> {
    e.html_attributes()
        .flatten()
        .map(|attr| {
            let key = decode_name(reader, attr.key.as_ref());
            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                std::borrow::Cow::into_owned,
            );
            (key, value)
        })
        .collect()
}

/// Decode an entity reference body to its character value.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        // Unknown entity - keep as text
        _ => format!("&{entity};"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(html: &str) -> Node {
        parse_document(html).unwrap().root
    }

    #[test]
    fn test_parse_simple_element() {
        let root = parse("<p>Hello</p>");

        assert_eq!(root.tag, ROOT_TAG);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].tag, "p");
        assert_eq!(root.children[0].text, "Hello");
    }

    #[test]
    fn test_parse_nested_elements_with_tail() {
        let root = parse("<p><strong>Bold</strong> text</p>");

        let p = &root.children[0];
        assert!(p.text.is_empty());
        assert_eq!(p.children[0].tag, "strong");
        assert_eq!(p.children[0].text, "Bold");
        assert_eq!(p.children[0].tail, " text");
    }

    #[test]
    fn test_parse_doctype() {
        let doc = parse_document("<!DOCTYPE html>\n<html><body></body></html>").unwrap();

        assert_eq!(doc.doctype.as_deref(), Some("html"));
        assert_eq!(doc.root.text, "\n");
        assert_eq!(doc.root.children[0].tag, "html");
    }

    #[test]
    fn test_parse_void_elements_without_slash() {
        let root = parse("<p>Before<br>After<img src=\"a.png\">End</p>");

        let p = &root.children[0];
        assert_eq!(p.text, "Before");
        assert_eq!(p.children.len(), 2);
        assert_eq!(p.children[0].tag, "br");
        assert_eq!(p.children[0].tail, "After");
        assert_eq!(p.children[1].attr("src"), Some("a.png"));
        assert_eq!(p.children[1].tail, "End");
    }

    #[test]
    fn test_parse_entities_decode_to_text() {
        let root = parse("<pre>A --&gt; B &amp; C&nbsp;D &#955;</pre>");

        assert_eq!(root.children[0].text_content(), "A --> B & C\u{00a0}D \u{03bb}");
    }

    #[test]
    fn test_parse_bare_ampersand() {
        let root = parse("<h2>Foo & Bar</h2>");

        assert_eq!(root.children[0].text_content(), "Foo & Bar");
    }

    #[test]
    fn test_parse_valueless_attribute() {
        let root = parse("<details open><summary>S</summary></details>");

        let details = &root.children[0];
        assert_eq!(details.attr("open"), Some(""));
        assert_eq!(details.children[0].text, "S");
    }

    #[test]
    fn test_parse_unquoted_attribute() {
        let root = parse("<h2 id=intro>Intro</h2>");

        assert_eq!(root.children[0].id(), Some("intro"));
    }

    #[test]
    fn test_parse_script_body_is_raw() {
        let root = parse("<script>if (a < b && c) { x = \"&amp;\"; }</script><p>x</p>");

        assert_eq!(root.children[0].tag, "script");
        assert_eq!(root.children[0].text, "if (a < b && c) { x = \"&amp;\"; }");
        assert_eq!(root.children[1].tag, "p");
    }

    #[test]
    fn test_parse_style_body_is_raw() {
        let root = parse("<style>a > b { color: red }</style>");

        assert_eq!(root.children[0].text, "a > b { color: red }");
    }

    #[test]
    fn test_parse_comment() {
        let root = parse("<p>a<!-- note -->b</p>");

        let p = &root.children[0];
        assert!(p.children[0].is_comment());
        assert_eq!(p.children[0].text, " note ");
        assert_eq!(p.text_content(), "ab");
    }

    #[test]
    fn test_parse_unclosed_element_closed_by_ancestor_end() {
        let root = parse("<ul><li>one<li>two</ul><p>after</p>");

        let ul = &root.children[0];
        assert_eq!(ul.tag, "ul");
        assert_eq!(root.children[1].tag, "p");
        assert_eq!(ul.text_content(), "onetwo");
    }

    #[test]
    fn test_parse_implied_list_item_end() {
        let doc = parse_document("<ul><li>a<li>b</ul>").unwrap();

        let ul = &doc.root.children[0];
        assert_eq!(ul.children.len(), 2);
        assert_eq!(ul.children[1].text, "b");
        assert_eq!(doc.to_html(), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_parse_nested_list_keeps_outer_item_open() {
        let root = parse("<ul><li>a<ul><li>b<li>c</ul><li>d</ul>");

        let outer = &root.children[0];
        assert_eq!(outer.children.len(), 2);
        assert_eq!(outer.children[0].children[0].children.len(), 2);
        assert_eq!(outer.children[1].text, "d");
    }

    #[test]
    fn test_parse_implied_paragraph_end() {
        let doc = parse_document("<p>one<p>two<div>three</div>").unwrap();

        let tags: Vec<&str> = doc.root.children.iter().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["p", "p", "div"]);
        assert_eq!(doc.to_html(), "<p>one</p><p>two</p><div>three</div>");
    }

    #[test]
    fn test_parse_paragraph_kept_open_by_inline_start() {
        let root = parse("<p>a<em>b</em>c</p>");

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].text_content(), "abc");
    }

    #[test]
    fn test_parse_implied_definition_and_row_ends() {
        let root = parse("<dl><dt>t<dd>d</dl><table><tr><td>1<td>2<tr><td>3</table>");

        assert_eq!(root.children[0].children.len(), 2);
        let table = &root.children[1];
        assert_eq!(table.children.len(), 2);
        assert_eq!(table.children[0].children.len(), 2);
        assert_eq!(table.children[1].text_content(), "3");
    }

    #[test]
    fn test_parse_implied_option_end() {
        let root = parse("<select><option>a<option>b</select>");

        assert_eq!(root.children[0].children.len(), 2);
    }

    #[test]
    fn test_parse_bare_less_than_in_text() {
        let root = parse("<pre>x < y</pre><p>A<--B</p>");

        assert_eq!(root.children[0].text, "x < y");
        assert_eq!(root.children[1].text, "A<--B");
    }

    #[test]
    fn test_parse_stray_end_tag_ignored() {
        let root = parse("<p>a</span>b</p>");

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].text, "ab");
    }

    #[test]
    fn test_parse_unclosed_at_end_of_input() {
        let root = parse("<article><h2>Title");

        assert_eq!(root.children[0].tag, "article");
        assert_eq!(root.children[0].children[0].text, "Title");
    }

    #[test]
    fn test_parse_uppercase_end_tag_matches() {
        let root = parse("<DIV>x</div><p>y</p>");

        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].tag, "DIV");
    }

    #[test]
    fn test_decode_entity() {
        assert_eq!(decode_entity("lt"), "<");
        assert_eq!(decode_entity("#x41"), "A");
        assert_eq!(decode_entity("#66"), "B");
        assert_eq!(decode_entity("bogus"), "&bogus;");
    }
}
