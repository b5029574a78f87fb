//! Best-effort conversion of a markup span to HTML for human inspection.
//! This is the least reliable step of the pipeline, so it is an isolated
//! failure domain: a span that cannot be rendered yields a typed error and
//! the caller keeps the section's title, level, links, and raw markup.

use crate::wikitext::{self, LINK_REGEX};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EXTERNAL_LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(https?://\S+?)(?:\s+([^\]]+))?\]").unwrap());

/// Why a span could not be rendered. Callers that only need the output
/// contract store a failure as an empty rendering; the reason stays
/// available for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unbalanced template braces")]
    UnbalancedTemplates,
    #[error("unbalanced wikilink brackets")]
    UnbalancedLinks,
}

/// Renders a markup span to HTML: headings, paragraphs, `*`/`#` lists,
/// quote styling, wikilinks, and external links. Templates are stripped.
/// Structurally unbalanced markup is a render error, not a panic.
pub fn render(wiki: &str) -> Result<String, RenderError> {
    if wiki.matches("{{").count() != wiki.matches("}}").count() {
        return Err(RenderError::UnbalancedTemplates);
    }
    if wiki.matches("[[").count() != wiki.matches("]]").count() {
        return Err(RenderError::UnbalancedLinks);
    }

    let stripped = strip_templates(wiki);
    let mut out = String::with_capacity(stripped.len());
    let mut in_para = false;
    let mut list: Option<char> = None;

    for line in stripped.lines() {
        let line = line.trim();
        if let Some((level, title)) = wikitext::parse_heading_line(line) {
            close_blocks(&mut out, &mut in_para, &mut list);
            out.push_str(&format!("<h{level}>{}</h{level}>\n", render_inline(title)));
        } else if let Some(item) = line.strip_prefix('*') {
            open_list(&mut out, &mut in_para, &mut list, '*');
            let item = item.trim_start_matches('*').trim();
            out.push_str(&format!("<li>{}</li>\n", render_inline(item)));
        } else if let Some(item) = line.strip_prefix('#') {
            open_list(&mut out, &mut in_para, &mut list, '#');
            let item = item.trim_start_matches('#').trim();
            out.push_str(&format!("<li>{}</li>\n", render_inline(item)));
        } else if line.is_empty() {
            close_blocks(&mut out, &mut in_para, &mut list);
        } else {
            if list.is_some() {
                close_blocks(&mut out, &mut in_para, &mut list);
            }
            if in_para {
                out.push('\n');
            } else {
                out.push_str("<p>");
                in_para = true;
            }
            out.push_str(&render_inline(line));
        }
    }
    close_blocks(&mut out, &mut in_para, &mut list);

    Ok(out)
}

fn close_blocks(out: &mut String, in_para: &mut bool, list: &mut Option<char>) {
    if *in_para {
        out.push_str("</p>\n");
        *in_para = false;
    }
    if let Some(kind) = list.take() {
        out.push_str(if kind == '*' { "</ul>\n" } else { "</ol>\n" });
    }
}

fn open_list(out: &mut String, in_para: &mut bool, list: &mut Option<char>, kind: char) {
    if *in_para {
        out.push_str("</p>\n");
        *in_para = false;
    }
    match list {
        Some(open) if *open == kind => {}
        _ => {
            if let Some(open) = list.take() {
                out.push_str(if open == '*' { "</ul>\n" } else { "</ol>\n" });
            }
            out.push_str(if kind == '*' { "<ul>\n" } else { "<ol>\n" });
            *list = Some(kind);
        }
    }
}

/// Wikilinks, then external links and quote styling on the plain segments.
fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in LINK_REGEX.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        out.push_str(&render_plain(&text[last..whole.start()]));

        let target = caps.get(1).unwrap().as_str();
        let label = caps
            .get(2)
            .map(|m| m.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(target);
        out.push_str(&format!(
            "<a href=\"{}\">{}</a>",
            html_escape::encode_double_quoted_attribute(target),
            html_escape::encode_text(label)
        ));
        last = whole.end();
    }
    out.push_str(&render_plain(&text[last..]));
    out
}

fn render_plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in EXTERNAL_LINK_REGEX.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        out.push_str(&render_styled(&text[last..whole.start()]));

        let url = caps.get(1).unwrap().as_str();
        let label = caps.get(2).map(|m| m.as_str()).unwrap_or(url);
        out.push_str(&format!(
            "<a href=\"{}\">{}</a>",
            html_escape::encode_double_quoted_attribute(url),
            html_escape::encode_text(label)
        ));
        last = whole.end();
    }
    out.push_str(&render_styled(&text[last..]));
    out
}

/// `'''bold'''` and `''italic''` via delimiter toggling; a dangling opener
/// is closed at the end of the segment.
fn render_styled(text: &str) -> String {
    let parts: Vec<&str> = text.split("'''").collect();
    let mut out = String::with_capacity(text.len());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push_str(if i % 2 == 1 { "<b>" } else { "</b>" });
        }
        out.push_str(&render_italic(part));
    }
    if parts.len() % 2 == 0 {
        out.push_str("</b>");
    }
    out
}

fn render_italic(text: &str) -> String {
    let parts: Vec<&str> = text.split("''").collect();
    let mut out = String::with_capacity(text.len());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push_str(if i % 2 == 1 { "<i>" } else { "</i>" });
        }
        out.push_str(&html_escape::encode_text(part));
    }
    if parts.len() % 2 == 0 {
        out.push_str("</i>");
    }
    out
}

fn strip_templates(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for (start, end) in wikitext::template_spans(text) {
        out.push_str(&text[pos..start]);
        pos = end;
    }
    out.push_str(&text[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_basic() {
        let html = render("Just some text.").unwrap();
        assert_eq!(html, "<p>Just some text.</p>\n");
    }

    #[test]
    fn heading_levels() {
        let html = render("== History ==\ntext").unwrap();
        assert!(html.contains("<h2>History</h2>"));
        let html = render("=== Deep ===").unwrap();
        assert!(html.contains("<h3>Deep</h3>"));
    }

    #[test]
    fn wikilink_becomes_anchor() {
        let html = render("See [[Rust (programming language)|Rust]].").unwrap();
        assert!(html.contains("<a href=\"Rust (programming language)\">Rust</a>"));
    }

    #[test]
    fn bare_wikilink_uses_target_as_label() {
        let html = render("See [[Mozilla]].").unwrap();
        assert!(html.contains("<a href=\"Mozilla\">Mozilla</a>"));
    }

    #[test]
    fn external_link_with_label() {
        let html = render("[https://www.rust-lang.org Official site]").unwrap();
        assert!(html.contains("<a href=\"https://www.rust-lang.org\">Official site</a>"));
    }

    #[test]
    fn bold_and_italic() {
        let html = render("'''Rust''' is ''fast''.").unwrap();
        assert!(html.contains("<b>Rust</b>"));
        assert!(html.contains("<i>fast</i>"));
    }

    #[test]
    fn unordered_list() {
        let html = render("* one\n* two").unwrap();
        assert!(html.contains("<ul>\n<li>one</li>\n<li>two</li>\n</ul>"));
    }

    #[test]
    fn ordered_list() {
        let html = render("# first\n# second").unwrap();
        assert!(html.contains("<ol>\n<li>first</li>\n<li>second</li>\n</ol>"));
    }

    #[test]
    fn templates_are_stripped() {
        let html = render("{{Infobox|name=X}}\nVisible text.").unwrap();
        assert!(!html.contains("Infobox"));
        assert!(html.contains("Visible text."));
    }

    #[test]
    fn blank_line_splits_paragraphs() {
        let html = render("First.\n\nSecond.").unwrap();
        assert_eq!(html.matches("<p>").count(), 2);
    }

    #[test]
    fn text_is_escaped() {
        let html = render("a <script> & more").unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn unbalanced_template_is_an_error() {
        assert_eq!(
            render("{{broken template"),
            Err(RenderError::UnbalancedTemplates)
        );
    }

    #[test]
    fn unbalanced_link_is_an_error() {
        assert_eq!(render("[[broken link"), Err(RenderError::UnbalancedLinks));
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(render("").unwrap(), "");
    }

    #[test]
    fn heading_with_link_renders_anchor() {
        let html = render("== See [[Rust]] ==").unwrap();
        assert!(html.contains("<h2>See <a href=\"Rust\">Rust</a></h2>"));
    }

    #[test]
    fn dangling_bold_is_closed() {
        let html = render("'''open").unwrap();
        assert!(html.contains("<b>open</b>"));
    }
}
