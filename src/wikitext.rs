//! Token scanner for the markup constructs the pipeline cares about:
//! heading lines, wikilinks, and template spans. Everything else is plain
//! text. Tokens carry byte spans into the source, never overlap, and cover
//! the input in document order, so higher layers can split the text without
//! re-deriving offsets.

use once_cell::sync::Lazy;
use regex::Regex;

/// A heading line: 1-6 `=` markers, a title, closing markers.
/// Stays within one line so token spans never cross line boundaries.
static HEADING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(={1,6})[ \t]*(.+?)[ \t]*=+[ \t]*$").unwrap());

/// `[[target]]` or `[[target|display text]]`.
pub static LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^|\]]+?)(?:\|([^\]]*))?\]\]").unwrap());

/// One scanned construct with its byte span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// A heading line, including its `=` markers.
    Heading {
        level: u8,
        title: &'a str,
        start: usize,
        end: usize,
    },
    /// A wikilink; empty display text counts as absent.
    WikiLink {
        target: &'a str,
        text: Option<&'a str>,
        start: usize,
        end: usize,
    },
    /// An opaque `{{...}}` template span (unterminated ones run to EOF).
    Other { start: usize, end: usize },
    /// Plain text between the constructs above.
    Text { start: usize, end: usize },
}

impl Token<'_> {
    pub fn start(&self) -> usize {
        match self {
            Token::Heading { start, .. }
            | Token::WikiLink { start, .. }
            | Token::Other { start, .. }
            | Token::Text { start, .. } => *start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Token::Heading { end, .. }
            | Token::WikiLink { end, .. }
            | Token::Other { end, .. }
            | Token::Text { end, .. } => *end,
        }
    }
}

/// Scans `text` into a flat token stream. Headings are recognized only
/// outside template spans, so a heading-shaped line inside `{{...}}` does
/// not split a section. Links inside headings or templates stay part of
/// that token; link *extraction* scans raw text and is unaffected.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let templates = template_spans(text);
    let inside_template =
        |pos: usize| templates.iter().any(|&(start, end)| pos >= start && pos < end);

    let mut claimed: Vec<Token> = Vec::new();

    for caps in HEADING_REGEX.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        if inside_template(whole.start()) {
            continue;
        }
        let markers = caps.get(1).unwrap();
        let title = caps.get(2).unwrap();
        claimed.push(Token::Heading {
            level: markers.as_str().len() as u8,
            title: title.as_str(),
            start: whole.start(),
            end: whole.end(),
        });
    }

    for &(start, end) in &templates {
        let intersects = claimed
            .iter()
            .any(|tok| start < tok.end() && tok.start() < end);
        if !intersects {
            claimed.push(Token::Other { start, end });
        }
    }
    claimed.sort_by_key(Token::start);

    let mut links: Vec<Token> = Vec::new();
    for caps in LINK_REGEX.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let intersects = claimed
            .iter()
            .any(|tok| whole.start() < tok.end() && tok.start() < whole.end());
        if intersects {
            continue;
        }
        let target = caps.get(1).unwrap();
        let display = caps
            .get(2)
            .map(|m| m.as_str())
            .filter(|t| !t.is_empty());
        links.push(Token::WikiLink {
            target: target.as_str(),
            text: display,
            start: whole.start(),
            end: whole.end(),
        });
    }
    claimed.extend(links);
    claimed.sort_by_key(Token::start);

    let mut tokens = Vec::with_capacity(claimed.len() * 2 + 1);
    let mut pos = 0;
    for tok in claimed {
        if tok.start() > pos {
            tokens.push(Token::Text {
                start: pos,
                end: tok.start(),
            });
        }
        pos = tok.end();
        tokens.push(tok);
    }
    if pos < text.len() {
        tokens.push(Token::Text {
            start: pos,
            end: text.len(),
        });
    }
    tokens
}

/// Top-level `{{...}}` spans (nested templates are folded into their outer
/// span). An unterminated `{{` claims the rest of the text.
pub fn template_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            let end = match find_matching_close(bytes, i) {
                Some(close) => close + 2,
                None => bytes.len(),
            };
            spans.push((i, end));
            i = end;
        } else {
            i += 1;
        }
    }
    spans
}

fn find_matching_close(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth: i32 = 0;
    let mut i = start;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'}' && bytes[i + 1] == b'}' {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    None
}

/// Parses a single line as a heading, returning (level, title).
pub fn parse_heading_line(line: &str) -> Option<(u8, &str)> {
    let caps = HEADING_REGEX.captures(line)?;
    let level = caps.get(1)?.as_str().len() as u8;
    Some((level, caps.get(2)?.as_str()))
}
