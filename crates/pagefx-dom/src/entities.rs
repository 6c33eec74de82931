//! HTML entity normalization ahead of markup parsing.
//!
//! The tokenizer only understands the five XML entities and numeric
//! references. Named HTML entities are converted to Unicode first, and bare
//! ampersands and stray `<` (legal in HTML text) are escaped. Comments are
//! passed through untouched.

use std::sync::LazyLock;

use regex::Regex;

/// Named character reference, e.g. `&nbsp;` or `&frac12;`.
static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*);").expect("invalid entity regex")
});

/// Entities the tokenizer resolves itself.
const XML_ENTITIES: &[&str] = &["amp", "lt", "gt", "quot", "apos"];

/// Names HTML still resolves without the trailing `;`, e.g. `&nbsp` or `&copy`.
const LEGACY_ENTITIES: &[&str] = &[
    "amp", "lt", "gt", "quot", "nbsp", "shy", "copy", "reg", "cent", "pound", "yen", "sect",
    "para", "middot", "laquo", "raquo", "iexcl", "iquest", "deg", "micro", "plusmn", "times",
    "divide", "frac14", "frac12", "frac34", "sup1", "sup2", "sup3",
];

/// Prepare HTML text for the tokenizer.
pub(crate) fn normalize_entities(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&normalize_text(&rest[..start]));
        let end = rest[start + 4..]
            .find("-->")
            .map_or(rest.len(), |offset| start + 4 + offset + 3);
        out.push_str(&rest[start..end]);
        rest = &rest[end..];
    }
    out.push_str(&normalize_text(rest));
    out
}

fn normalize_text(html: &str) -> String {
    convert_html_entities(&escape_bare_ampersands(&escape_bare_less_than(html)))
}

/// Replace known named HTML entities with their Unicode characters.
///
/// XML entities and unknown names are left untouched.
pub(crate) fn convert_html_entities(html: &str) -> String {
    ENTITY_PATTERN
        .replace_all(html, |caps: &regex::Captures| {
            let name = &caps[1];
            if XML_ENTITIES.contains(&name) {
                return caps[0].to_owned();
            }
            entity_to_unicode(name).map_or_else(|| caps[0].to_owned(), str::to_owned)
        })
        .into_owned()
}

/// Escape every `&` that does not start a character reference.
///
/// Legacy names without `;` gain one, unless followed by an alphanumeric or
/// `=` (as in query strings), where HTML leaves them alone too.
pub(crate) fn escape_bare_ampersands(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(offset) = html[pos..].find('&') {
        let amp = pos + offset;
        out.push_str(&html[pos..amp]);
        pos = amp + 1;
        let rest = &html[pos..];
        if starts_reference(rest) {
            out.push('&');
        } else if let Some(name) = legacy_reference(rest) {
            out.push('&');
            out.push_str(name);
            out.push(';');
            pos += name.len();
        } else {
            out.push_str("&amp;");
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Escape every `<` that cannot open a tag, comment or declaration.
///
/// A tag name must start with an ASCII letter, so `x < y` and `A<--B` stay text.
pub(crate) fn escape_bare_less_than(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    for (index, ch) in html.char_indices() {
        if ch == '<' && !starts_markup(&html[index + 1..]) {
            out.push_str("&lt;");
        } else {
            out.push(ch);
        }
    }
    out
}

/// Whether `rest` (the text after a `<`) opens markup.
fn starts_markup(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => true,
        Some('!' | '?') => true,
        Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

/// Whether `rest` (the text after an `&`) is a well-formed reference body.
fn starts_reference(rest: &str) -> bool {
    let Some(end) = rest.find(';') else {
        return false;
    };
    let body = &rest[..end];
    if let Some(numeric) = body.strip_prefix('#') {
        if let Some(hex) = numeric.strip_prefix(['x', 'X']) {
            return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
        }
        return !numeric.is_empty() && numeric.chars().all(|c| c.is_ascii_digit());
    }
    let mut chars = body.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric())
}

/// Longest legacy entity name `rest` starts with.
fn legacy_reference(rest: &str) -> Option<&'static str> {
    LEGACY_ENTITIES
        .iter()
        .copied()
        .filter(|name| rest.starts_with(name))
        .filter(|name| {
            !rest[name.len()..].starts_with(|c: char| c.is_ascii_alphanumeric() || c == '=')
        })
        .max_by_key(|name| name.len())
}

/// Map an HTML entity name to its Unicode character.
fn entity_to_unicode(name: &str) -> Option<&'static str> {
    Some(match name {
        // Spacing and punctuation
        "nbsp" => "\u{00a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "shy" => "\u{00ad}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "middot" => "\u{00b7}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "iexcl" => "\u{00a1}",
        "iquest" => "\u{00bf}",
        "para" => "\u{00b6}",
        "sect" => "\u{00a7}",
        "dagger" => "\u{2020}",
        "Dagger" => "\u{2021}",

        // Arrows
        "larr" => "\u{2190}",
        "uarr" => "\u{2191}",
        "rarr" => "\u{2192}",
        "darr" => "\u{2193}",
        "harr" => "\u{2194}",
        "lArr" => "\u{21d0}",
        "rArr" => "\u{21d2}",
        "hArr" => "\u{21d4}",

        // Math
        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "ne" => "\u{2260}",
        "asymp" => "\u{2248}",
        "plusmn" => "\u{00b1}",
        "minus" => "\u{2212}",
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",
        "infin" => "\u{221e}",
        "deg" => "\u{00b0}",
        "micro" => "\u{00b5}",
        "frac14" => "\u{00bc}",
        "frac12" => "\u{00bd}",
        "frac34" => "\u{00be}",
        "sup1" => "\u{00b9}",
        "sup2" => "\u{00b2}",
        "sup3" => "\u{00b3}",

        // Symbols
        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "cent" => "\u{00a2}",
        "check" => "\u{2713}",

        _ => return None,
    })
}
