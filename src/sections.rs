//! Section decomposition: a linear scan over heading tokens that splits the
//! markup into contiguous, non-overlapping spans. The lead span (everything
//! before the first heading) is always section 0, even when empty, so
//! concatenating the spans in order reconstructs the document.

use crate::wikitext::{self, Token};

/// Fallback title for a lead span that exposes nothing title-like.
pub const DEFAULT_LEAD_TITLE: &str = "Introduction";

/// Level assigned to the lead span.
pub const DEFAULT_LEAD_LEVEL: u8 = 1;

/// A contiguous markup span introduced by a heading, or the implicit lead.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection<'a> {
    pub idx: usize,
    pub title: String,
    pub level: u8,
    pub wiki: &'a str,
}

/// Splits `text` at every heading of level 1-6 (headings inside templates
/// don't count). Indices are assigned in document order starting at the
/// lead, never by heading level.
pub fn decompose(text: &str) -> Vec<RawSection<'_>> {
    let tokens = wikitext::tokenize(text);
    let headings: Vec<&Token> = tokens
        .iter()
        .filter(|tok| matches!(tok, Token::Heading { .. }))
        .collect();

    let mut sections = Vec::with_capacity(headings.len() + 1);

    let lead_end = headings.first().map(|h| h.start()).unwrap_or(text.len());
    sections.push(RawSection {
        idx: 0,
        title: lead_title(text, &tokens, lead_end)
            .unwrap_or_else(|| DEFAULT_LEAD_TITLE.to_string()),
        level: DEFAULT_LEAD_LEVEL,
        wiki: &text[..lead_end],
    });

    for (i, heading) in headings.iter().enumerate() {
        let end = headings
            .get(i + 1)
            .map(|next| next.start())
            .unwrap_or(text.len());
        if let Token::Heading {
            level,
            title,
            start,
            ..
        } = heading
        {
            sections.push(RawSection {
                idx: i + 1,
                title: title.to_string(),
                level: *level,
                wiki: &text[*start..end],
            });
        }
    }

    sections
}

/// Title for the lead span: the display text of a wikilink the lead opens
/// with. Body prose and opaque template spans never become titles, so those
/// leads fall back to the default.
fn lead_title(text: &str, tokens: &[Token], lead_end: usize) -> Option<String> {
    for tok in tokens {
        if tok.start() >= lead_end {
            break;
        }
        match tok {
            Token::Text { start, end } => {
                if text[*start..*end].trim().is_empty() {
                    continue;
                }
                return None;
            }
            Token::WikiLink {
                target,
                text: display,
                ..
            } => {
                let title = display.unwrap_or(*target).trim();
                return if title.is_empty() {
                    None
                } else {
                    Some(title.to_string())
                };
            }
            _ => return None,
        }
    }
    None
}
