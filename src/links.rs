//! Wikilink extraction and classification: per-span occurrence lists, the
//! whole-document residual ("non-section links"), category membership
//! derivation, and the fragment split used for graph-edge classification.

use crate::config::CATEGORY_NAMESPACE;
use crate::models::Link;
use crate::wikitext::LINK_REGEX;
use rustc_hash::FxHashSet;

/// Every wikilink occurrence in `text`, in document order. Duplicates are
/// kept; an empty display text counts as absent.
pub fn extract_links(text: &str) -> Vec<Link> {
    LINK_REGEX
        .captures_iter(text)
        .map(|caps| Link {
            target: caps.get(1).unwrap().as_str().to_string(),
            text: caps
                .get(2)
                .map(|m| m.as_str())
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        })
        .collect()
}

/// Links visible only at whole-document scope: the document scan minus
/// everything already attributed to a section. Structural equality on
/// (target, text); the residual is deduplicated and sorted so the output is
/// deterministic.
pub fn non_section_links(document_links: &[Link], seen: &FxHashSet<Link>) -> Vec<Link> {
    let residual: FxHashSet<Link> = document_links
        .iter()
        .filter(|link| !seen.contains(*link))
        .cloned()
        .collect();
    let mut residual: Vec<Link> = residual.into_iter().collect();
    residual.sort();
    residual
}

/// Category memberships from the whole-document link list: targets of the
/// form `namespace:rest` whose prefix matches the category keyword
/// case-insensitively. First-occurrence order, duplicates retained.
pub fn extract_categories(document_links: &[Link]) -> Vec<String> {
    document_links
        .iter()
        .filter_map(|link| {
            let (prefix, rest) = link.target.split_once(':')?;
            if prefix.eq_ignore_ascii_case(CATEGORY_NAMESPACE) {
                Some(rest.to_string())
            } else {
                None
            }
        })
        .collect()
}

/// Splits a link target into its article part and optional section anchor.
/// `None` for bare same-page anchors (`#...`), which have no article to
/// resolve against and are dropped from edge output.
pub fn split_fragment(target: &str) -> Option<(&str, Option<&str>)> {
    match target.split_once('#') {
        None => Some((target, None)),
        Some(("", _)) => None,
        Some((article, anchor)) => Some((article, Some(anchor))),
    }
}
