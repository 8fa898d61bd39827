//! Content region selection and text normalization.
//!
//! Pages are scanned with a tolerant tag tokenizer rather than a full HTML
//! parser. Region markers are tried in priority order; the first marker whose
//! opening tag appears in the document selects the region, which extends to
//! the matching close tag. When no marker matches, the whole body is used
//! verbatim.
//!
//! Nothing here fails on malformed markup: unclosed regions run to the end of
//! the input and unrecognized constructs are treated as text.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>|<(/?)([A-Za-z][A-Za-z0-9:_-]*)((?:=\s*"[^"]*"|=\s*'[^']*'|[^>])*)>"#,
    )
    .unwrap()
});

static ATTR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#).unwrap()
});

static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,7});").unwrap()
});

static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^([A-Za-z][A-Za-z0-9-]*)(?:\.([A-Za-z0-9_-]+)|\[\s*([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*["']?([^"'\]]+?)["']?\s*\])$"#,
    )
    .unwrap()
});

/// Named references for U+00A0..=U+00FF, in code point order.
const LATIN1_ENTITIES: [&str; 96] = [
    "nbsp", "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf",
    "laquo", "not", "shy", "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro",
    "para", "middot", "cedil", "sup1", "ordm", "raquo", "frac14", "frac12", "frac34", "iquest",
    "Agrave", "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig", "Ccedil", "Egrave",
    "Eacute", "Ecirc", "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve",
    "Oacute", "Ocirc", "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml",
    "Yacute", "THORN", "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig",
    "ccedil", "egrave", "eacute", "ecirc", "euml", "igrave", "iacute", "icirc", "iuml", "eth",
    "ntilde", "ograve", "oacute", "ocirc", "otilde", "ouml", "divide", "oslash", "ugrave",
    "uacute", "ucirc", "uuml", "yacute", "thorn", "yuml",
];

/// Other named references common in page text.
const EXTRA_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("ldquo", '\u{201c}'),
    ("rdquo", '\u{201d}'),
    ("bull", '\u{2022}'),
    ("hellip", '\u{2026}'),
    ("euro", '\u{20ac}'),
    ("trade", '\u{2122}'),
    ("OElig", '\u{152}'),
    ("oelig", '\u{153}'),
];

/// Elements whose content is not document text.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A structural marker identifying a content region.
///
/// Written as `tag[attribute=value]`, or `tag.class` as a shorthand for a
/// class token match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionMarker {
    pub tag: String,
    pub attribute: String,
    pub value: String,
}

impl RegionMarker {
    pub fn new(
        tag: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// `<div role="main">`
    pub fn main_content() -> Self {
        Self::new("div", "role", "main")
    }

    /// `<table class="generaltable">`
    pub fn general_table() -> Self {
        Self::new("table", "class", "generaltable")
    }

    /// Check an opening tag against this marker.
    fn matches(&self, name: &str, attrs: &str) -> bool {
        if !name.eq_ignore_ascii_case(&self.tag) {
            return false;
        }

        attributes(attrs).any(|(key, value)| {
            if !key.eq_ignore_ascii_case(&self.attribute) {
                return false;
            }
            if self.attribute.eq_ignore_ascii_case("class") {
                value.split_ascii_whitespace().any(|class| class == self.value)
            } else {
                value == self.value
            }
        })
    }
}

impl fmt::Display for RegionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attribute.eq_ignore_ascii_case("class") && !self.value.contains(char::is_whitespace)
        {
            write!(f, "{}.{}", self.tag, self.value)
        } else {
            write!(f, "{}[{}={}]", self.tag, self.attribute, self.value)
        }
    }
}

impl FromStr for RegionMarker {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = MARKER_REGEX.captures(s.trim()).ok_or_else(|| {
            crate::Error::config(format!(
                "invalid region marker '{}': expected tag[attribute=value] or tag.class",
                s
            ))
        })?;

        let tag = &caps[1];
        match (caps.get(2), caps.get(3), caps.get(4)) {
            (Some(class), _, _) => Ok(Self::new(tag, "class", class.as_str())),
            (None, Some(attr), Some(value)) => Ok(Self::new(tag, attr.as_str(), value.as_str())),
            _ => Err(crate::Error::config(format!("invalid region marker '{}'", s))),
        }
    }
}

impl TryFrom<String> for RegionMarker {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RegionMarker> for String {
    fn from(marker: RegionMarker) -> Self {
        marker.to_string()
    }
}

/// Where an extracted region came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionSource {
    /// Matched the marker at `index` in the selector's priority list.
    Marker { index: usize, marker: String },
    /// No marker matched; the raw body was used.
    WholeBody,
}

impl fmt::Display for RegionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marker { marker, .. } => write!(f, "{}", marker),
            Self::WholeBody => f.write_str("whole body"),
        }
    }
}

/// Content selected for fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRegion {
    pub source: RegionSource,
    /// Normalized text for marker regions, the raw body for [`RegionSource::WholeBody`].
    pub text: String,
}

/// Prioritized list of region markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSelector {
    markers: Vec<RegionMarker>,
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::new(vec![
            RegionMarker::main_content(),
            RegionMarker::general_table(),
        ])
    }
}

impl RegionSelector {
    pub fn new(markers: Vec<RegionMarker>) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &[RegionMarker] {
        &self.markers
    }

    /// Select the content region of `body`.
    pub fn select(&self, body: &str) -> ExtractedRegion {
        let tokens = tokenize(body);

        for (index, marker) in self.markers.iter().enumerate() {
            if let Some(inner) = find_region(body, &tokens, marker) {
                return ExtractedRegion {
                    source: RegionSource::Marker {
                        index,
                        marker: marker.to_string(),
                    },
                    text: normalize_text(inner),
                };
            }
        }

        ExtractedRegion {
            source: RegionSource::WholeBody,
            text: body.to_string(),
        }
    }
}

/// Flatten an HTML fragment to text.
///
/// Every tag boundary separates text runs; each run is entity-decoded and
/// trimmed, empty runs are dropped and the rest are joined with one space.
pub fn normalize_text(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() / 2);

    for token in tokenize(fragment) {
        if token.kind != TokenKind::Text {
            continue;
        }
        let decoded = decode_entities(&fragment[token.start..token.end]);
        let run = decoded.trim();
        if run.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(run);
    }

    out
}

/// Decode character references in `text`.
///
/// Numeric references, the Latin-1 named set and a few common typographic
/// names are decoded. Other named references are left untouched.
pub fn decode_entities(text: &str) -> std::borrow::Cow<'_, str> {
    ENTITY_REGEX.replace_all(text, |caps: &Captures<'_>| {
        let entity = &caps[1];
        let decoded = if let Some(hex) = entity
            .strip_prefix("#x")
            .or_else(|| entity.strip_prefix("#X"))
        {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = entity.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            named_entity(entity)
        };

        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind<'a> {
    Text,
    Open {
        name: &'a str,
        attrs: &'a str,
        self_closing: bool,
    },
    Close {
        name: &'a str,
    },
    /// Comments, doctypes, processing instructions, script/style bodies.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind<'a>,
    start: usize,
    end: usize,
}

fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        let Some(caps) = TAG_REGEX.captures_at(html, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };

        if whole.start() > pos {
            tokens.push(Token {
                kind: TokenKind::Text,
                start: pos,
                end: whole.start(),
            });
        }
        pos = whole.end();

        let Some(name) = caps.get(2).map(|m| m.as_str()) else {
            tokens.push(Token {
                kind: TokenKind::Ignored,
                start: whole.start(),
                end: whole.end(),
            });
            continue;
        };

        if caps.get(1).is_some_and(|m| !m.is_empty()) {
            tokens.push(Token {
                kind: TokenKind::Close { name },
                start: whole.start(),
                end: whole.end(),
            });
            continue;
        }

        let attrs = caps.get(3).map_or("", |m| m.as_str());
        let self_closing = attrs.trim_end().ends_with('/');
        tokens.push(Token {
            kind: TokenKind::Open {
                name,
                attrs,
                self_closing,
            },
            start: whole.start(),
            end: whole.end(),
        });

        if !self_closing
            && RAW_TEXT_ELEMENTS
                .iter()
                .any(|raw| raw.eq_ignore_ascii_case(name))
        {
            let body_end = find_ascii_case_insensitive(html, pos, &format!("</{}", name))
                .unwrap_or(html.len());
            if body_end > pos {
                tokens.push(Token {
                    kind: TokenKind::Ignored,
                    start: pos,
                    end: body_end,
                });
            }
            pos = body_end;
        }
    }

    if pos < html.len() {
        tokens.push(Token {
            kind: TokenKind::Text,
            start: pos,
            end: html.len(),
        });
    }

    tokens
}

/// Inner content of the first element matching `marker`.
fn find_region<'a>(html: &'a str, tokens: &[Token<'_>], marker: &RegionMarker) -> Option<&'a str> {
    let (open_idx, open) = tokens.iter().enumerate().find(|(_, token)| {
        matches!(token.kind, TokenKind::Open { name, attrs, .. } if marker.matches(name, attrs))
    })?;

    let TokenKind::Open {
        name: tag,
        self_closing,
        ..
    } = open.kind
    else {
        return None;
    };
    if self_closing {
        return Some("");
    }

    let mut depth = 1usize;
    for token in &tokens[open_idx + 1..] {
        match token.kind {
            TokenKind::Open {
                name,
                self_closing: false,
                ..
            } if name.eq_ignore_ascii_case(tag) => depth += 1,
            TokenKind::Close { name } if name.eq_ignore_ascii_case(tag) => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[open.end..token.start]);
                }
            }
            _ => {}
        }
    }

    // Unclosed: the region runs to the end of the input.
    Some(&html[open.end..])
}

fn named_entity(name: &str) -> Option<char> {
    if let Some(index) = LATIN1_ENTITIES.iter().position(|&n| n == name) {
        return char::from_u32(0xA0 + index as u32);
    }
    EXTRA_ENTITIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, c)| c)
}

fn attributes(attrs: &str) -> impl Iterator<Item = (&str, std::borrow::Cow<'_, str>)> {
    ATTR_REGEX.captures_iter(attrs).filter_map(|caps| {
        let key = caps.get(1)?.as_str();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        Some((key, decode_entities(value)))
    })
}

fn find_ascii_case_insensitive(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from >= hay.len() {
        return None;
    }
    hay[from..]
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|offset| from + offset)
}
