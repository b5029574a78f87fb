use crate::models::{Namespace, NamespaceKind};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Well-known namespace ids. Read-only after startup, shared freely across
/// worker threads.
static NAMESPACES: Lazy<FxHashMap<i64, Namespace>> = Lazy::new(|| {
    use NamespaceKind::{Subject, Talk};
    let table: &[(i64, &str, NamespaceKind)] = &[
        (0, "(Main/Article)", Subject),
        (1, "Talk", Talk),
        (2, "User", Subject),
        (3, "User talk", Talk),
        (4, "Wikipedia", Subject),
        (5, "Wikipedia talk", Talk),
        (6, "File", Subject),
        (7, "File talk", Talk),
        (8, "MediaWiki", Subject),
        (9, "MediaWiki talk", Talk),
        (10, "Template", Subject),
        (11, "Template talk", Talk),
        (12, "Help", Subject),
        (13, "Help talk", Talk),
        (14, "Category", Subject),
        (15, "Category talk", Talk),
        (100, "Portal", Subject),
        (101, "Portal talk", Talk),
        (118, "Draft", Subject),
        (119, "Draft talk", Talk),
        (710, "TimedText", Subject),
        (711, "TimedText talk", Talk),
        (828, "Module", Subject),
        (829, "Module talk", Talk),
    ];
    table
        .iter()
        .map(|&(id, name, kind)| {
            (
                id,
                Namespace {
                    name: name.to_string(),
                    kind,
                },
            )
        })
        .collect()
});

/// Resolves a namespace id to its descriptor. Unrecognized ids resolve to
/// the "Unknown" placeholder rather than failing.
pub fn resolve(id: i64) -> Namespace {
    NAMESPACES.get(&id).cloned().unwrap_or_else(|| Namespace {
        name: "Unknown".to_string(),
        kind: NamespaceKind::Unknown,
    })
}
