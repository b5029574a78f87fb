//! Cheap redirect stub detection. A large fraction of any dump is redirect
//! stubs, so the probe only looks at the head of the text before committing
//! to full section parsing.

use crate::config::{REDIRECT_MARKERS, REDIRECT_PROBE_CHARS};
use once_cell::sync::Lazy;
use regex::Regex;

static REDIRECT_TARGET_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(.*?)\]\]").unwrap());

/// Checks the case-folded head of `text` for a redirect marker and, if
/// present, extracts the target from the first `[[...]]` span anywhere in
/// the text: trimmed, fragment-stripped.
///
/// A marker without a bracketed span is not treated as a redirect; callers
/// fall through to normal parsing.
pub fn detect(text: &str) -> Option<String> {
    let probe: String = text.chars().take(REDIRECT_PROBE_CHARS).collect();
    let probe = probe.to_lowercase();
    let probe = probe.trim();
    if !REDIRECT_MARKERS
        .iter()
        .any(|marker| probe.starts_with(marker))
    {
        return None;
    }

    let caps = REDIRECT_TARGET_REGEX.captures(text)?;
    let span = caps.get(1).unwrap().as_str().trim();
    let target = span.split('#').next().unwrap_or_default().trim_end();
    Some(target.to_string())
}
