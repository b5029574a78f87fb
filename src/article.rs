//! Record assembly: the single entry point that turns one (envelope, markup)
//! pair into a structured record. Everything that can go wrong below this
//! level is absorbed before it gets here -- render failures become empty
//! renderings, unknown namespaces become placeholders, a redirect marker
//! without a target falls through to normal parsing -- so this function
//! never fails for decodable input.

use crate::links;
use crate::models::{self, ArticleEnvelope, ArticleRecord, Link, Section, SectionMeta};
use crate::namespace;
use crate::redirect;
use crate::render;
use crate::sections;
use rustc_hash::FxHashSet;
use tracing::debug;

/// Parses one article. Redirect stubs short-circuit before section
/// decomposition; full articles get ordered sections with per-section links
/// and best-effort renderings, the whole-document link list, the
/// non-section residual, and category memberships.
pub fn parse_article(mut envelope: ArticleEnvelope, text: &str) -> ArticleRecord {
    envelope.namespace = Some(namespace::resolve(envelope.info.namespace));
    let title = envelope.title.clone();

    if let Some(target) = redirect::detect(text) {
        return ArticleRecord::Redirect {
            info: envelope,
            title,
            target,
        };
    }

    let mut seen: FxHashSet<Link> = FxHashSet::default();
    let mut section_records = Vec::new();
    for raw in sections::decompose(text) {
        let section_links = links::extract_links(raw.wiki);
        seen.extend(section_links.iter().cloned());

        let html = match render::render(raw.wiki) {
            Ok(html) => html,
            Err(err) => {
                debug!(article = %title, section = raw.idx, error = %err, "Section did not render");
                String::new()
            }
        };

        section_records.push(Section {
            section: SectionMeta {
                idx: raw.idx,
                id: models::section_id(&title, &raw.title),
                title: raw.title,
                level: raw.level,
            },
            html,
            wiki: raw.wiki.to_string(),
            links: section_links,
        });
    }

    let document_links = links::extract_links(text);
    let non_section_links = links::non_section_links(&document_links, &seen);
    let categories = links::extract_categories(&document_links);

    ArticleRecord::Article {
        info: envelope,
        title,
        sections: section_records,
        links: document_links,
        non_section_links,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NamespaceKind, PageInfo};

    fn envelope(title: &str, namespace: i64) -> ArticleEnvelope {
        ArticleEnvelope {
            title: title.to_string(),
            authors: vec![],
            bucket: "abc".to_string(),
            file_name: format!("{}.wiki", title.to_lowercase()),
            info: PageInfo {
                id: 1,
                namespace,
                extra: serde_json::Map::new(),
            },
            sha1: "da39a3ee".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            parent_id: None,
            namespace: None,
        }
    }

    fn expect_article(
        record: &ArticleRecord,
    ) -> (&Vec<Section>, &Vec<Link>, &Vec<Link>, &Vec<String>) {
        match record {
            ArticleRecord::Article {
                sections,
                links,
                non_section_links,
                categories,
                ..
            } => (sections, links, non_section_links, categories),
            ArticleRecord::Redirect { .. } => panic!("expected an article record"),
        }
    }

    #[test]
    fn redirect_short_circuits() {
        let record = parse_article(envelope("Rust", 0), "#REDIRECT [[Target Page]]");
        match record {
            ArticleRecord::Redirect { target, title, info } => {
                assert_eq!(target, "Target Page");
                assert_eq!(title, "Rust");
                assert!(info.namespace.is_some());
            }
            ArticleRecord::Article { .. } => panic!("expected a redirect record"),
        }
    }

    #[test]
    fn redirect_target_fragment_is_stripped() {
        let record = parse_article(envelope("R", 0), "#REDIRECT [[Foo#Bar]]");
        match record {
            ArticleRecord::Redirect { target, .. } => assert_eq!(target, "Foo"),
            _ => panic!("expected a redirect record"),
        }
    }

    #[test]
    fn redirect_marker_without_span_parses_as_article() {
        let record = parse_article(envelope("R", 0), "#REDIRECT to nowhere in particular");
        assert!(!record.is_redirect());
    }

    #[test]
    fn lead_and_heading_with_section_link() {
        let text = "A lead paragraph.\n\n== Heading ==\nBody with [[Foo#Bar|Foo Text]].";
        let record = parse_article(envelope("Page", 0), text);
        let (sections, links, non_section, _) = expect_article(&record);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section.idx, 0);
        assert_eq!(sections[0].section.title, "Introduction");
        assert_eq!(sections[0].section.level, 1);
        assert!(sections[0].links.is_empty());

        assert_eq!(sections[1].section.title, "Heading");
        assert_eq!(sections[1].section.level, 2);
        assert_eq!(sections[1].section.id, "Page#Heading");
        assert_eq!(
            sections[1].links,
            vec![Link::new("Foo#Bar", Some("Foo Text"))]
        );

        // The link was found inside a section, so the residual is empty.
        assert_eq!(links, &vec![Link::new("Foo#Bar", Some("Foo Text"))]);
        assert!(non_section.is_empty());
    }

    #[test]
    fn section_indices_are_contiguous() {
        let text = "Lead.\n== A ==\na\n=== B ===\nb\n== C ==\nc";
        let record = parse_article(envelope("Page", 0), text);
        let (sections, ..) = expect_article(&record);
        let indices: Vec<usize> = sections.iter().map(|s| s.section.idx).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn categories_from_colon_links() {
        let text = "Lead with [[Kategorie:Biology]] marker.";
        let record = parse_article(envelope("Page", 0), text);
        let (_, _, _, categories) = expect_article(&record);
        assert_eq!(categories, &vec!["Biology".to_string()]);
    }

    #[test]
    fn duplicate_categories_are_kept() {
        let text = "[[Kategorie:X]]\n== A ==\n[[Kategorie:X]]";
        let record = parse_article(envelope("Page", 0), text);
        let (_, _, _, categories) = expect_article(&record);
        assert_eq!(categories, &vec!["X".to_string(), "X".to_string()]);
    }

    #[test]
    fn render_failure_is_isolated_to_its_section() {
        let text = "Lead.\n== Good ==\nFine text with [[L]].\n== Bad ==\n{{broken";
        let record = parse_article(envelope("Page", 0), text);
        let (sections, ..) = expect_article(&record);

        assert_eq!(sections.len(), 3);
        let good = &sections[1];
        assert_eq!(good.section.title, "Good");
        assert!(!good.html.is_empty());
        assert_eq!(good.links, vec![Link::new("L", None)]);

        let bad = &sections[2];
        assert_eq!(bad.section.title, "Bad");
        assert!(bad.html.is_empty());
        assert!(bad.wiki.contains("{{broken"));
    }

    #[test]
    fn namespace_is_resolved_onto_the_envelope() {
        let record = parse_article(envelope("Page", 14), "text");
        let ns = record.envelope().namespace.as_ref().unwrap();
        assert_eq!(ns.name, "Category");
        assert_eq!(ns.kind, NamespaceKind::Subject);
    }

    #[test]
    fn unknown_namespace_gets_placeholder() {
        let record = parse_article(envelope("Page", 4242), "text");
        let ns = record.envelope().namespace.as_ref().unwrap();
        assert_eq!(ns.name, "Unknown");
        assert_eq!(ns.kind, NamespaceKind::Unknown);
    }

    #[test]
    fn link_in_two_sections_is_not_residual() {
        let text = "[[Shared]] lead.\n== A ==\n[[Shared]] again.";
        let record = parse_article(envelope("Page", 0), text);
        let (sections, links, non_section, _) = expect_article(&record);
        assert_eq!(sections[0].links, vec![Link::new("Shared", None)]);
        assert_eq!(sections[1].links, vec![Link::new("Shared", None)]);
        assert_eq!(links.len(), 2);
        assert!(non_section.is_empty());
    }

    #[test]
    fn record_roundtrips_through_json() {
        let text = "Lead [[A|a]].\n== H ==\n[[B]] and [[Kategorie:K]].";
        let record = parse_article(envelope("Page", 0), text);
        let encoded = serde_json::to_string_pretty(&record).unwrap();
        let decoded: ArticleRecord = serde_json::from_str(&encoded).unwrap();
        assert_eq!(record, decoded);
    }
}
