use crate::config::SECTION_ID_MAX_CHARS;
use serde::{Deserialize, Serialize};

/// Whether a namespace holds subject pages or their discussion pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    Subject,
    Talk,
    Unknown,
}

impl NamespaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceKind::Subject => "subject",
            NamespaceKind::Talk => "talk",
            NamespaceKind::Unknown => "unknown",
        }
    }
}

/// Resolved namespace descriptor attached to an envelope by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NamespaceKind,
}

/// One revision author. Anonymous edits carry a name (an address) but no id;
/// some historical entries carry an id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Author {
    /// (id, name) with each side falling back to the other.
    /// `None` when the author carries neither.
    pub fn resolved(&self) -> Option<(String, String)> {
        let id = self
            .id
            .map(|id| id.to_string())
            .or_else(|| self.name.clone())?;
        let name = self.name.clone().unwrap_or_else(|| id.clone());
        Some((id, name))
    }
}

/// Original-source page block nested inside the envelope. Upstream may add
/// fields we don't model; they round-trip through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub id: u64,
    pub namespace: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Metadata envelope paired with an article's markup. Written by the
/// extraction side as the first line of each article file; the parser only
/// reads it and fills in the resolved `namespace` descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleEnvelope {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    pub bucket: String,
    pub file_name: String,
    pub info: PageInfo,
    pub sha1: String,
    pub timestamp: String,
    #[serde(default)]
    pub parent_id: Option<u64>,
    /// Absent in freshly extracted envelopes; populated during parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Namespace>,
}

/// A `[[target|text]]` wikilink occurrence. Value type: two links are equal
/// iff target and display text match exactly (absent text is its own value).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    pub target: String,
    pub text: Option<String>,
}

impl Link {
    pub fn new(target: impl Into<String>, text: Option<&str>) -> Self {
        Self {
            target: target.into(),
            text: text.map(str::to_string),
        }
    }
}

/// Document-level link lists serialize as `(target, text)` pairs rather than
/// objects; section-level lists keep the object form.
pub(crate) mod link_pairs {
    use super::Link;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(links: &[Link], serializer: S) -> Result<S::Ok, S::Error> {
        let pairs: Vec<(&str, Option<&str>)> = links
            .iter()
            .map(|link| (link.target.as_str(), link.text.as_deref()))
            .collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Link>, D::Error> {
        let pairs: Vec<(String, Option<String>)> = Vec::deserialize(deserializer)?;
        Ok(pairs
            .into_iter()
            .map(|(target, text)| Link { target, text })
            .collect())
    }
}

/// Position of a section within its article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMeta {
    pub idx: usize,
    pub title: String,
    pub level: u8,
    /// Natural identifier: "{article-title}#{section-title}", capped.
    pub id: String,
}

/// One decomposed section: metadata, best-effort rendering (empty when the
/// markup failed to render), the raw markup span, and the links found
/// strictly within that span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section: SectionMeta,
    pub html: String,
    pub wiki: String,
    pub links: Vec<Link>,
}

/// The structured record handed downstream: either a full article or a
/// redirect stub, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArticleRecord {
    Article {
        info: ArticleEnvelope,
        title: String,
        sections: Vec<Section>,
        #[serde(with = "link_pairs")]
        links: Vec<Link>,
        #[serde(with = "link_pairs")]
        non_section_links: Vec<Link>,
        categories: Vec<String>,
    },
    Redirect {
        info: ArticleEnvelope,
        title: String,
        /// First bracketed span after the redirect marker, fragment-stripped.
        target: String,
    },
}

impl ArticleRecord {
    pub fn title(&self) -> &str {
        match self {
            ArticleRecord::Article { title, .. } | ArticleRecord::Redirect { title, .. } => title,
        }
    }

    pub fn envelope(&self) -> &ArticleEnvelope {
        match self {
            ArticleRecord::Article { info, .. } | ArticleRecord::Redirect { info, .. } => info,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, ArticleRecord::Redirect { .. })
    }
}

/// Natural identifier for a section, capped for index friendliness.
pub fn section_id(article: &str, section: &str) -> String {
    truncate_chars(&format!("{}#{}", article, section), SECTION_ID_MAX_CHARS).to_string()
}

/// Truncates to at most `max_chars` characters, never splitting a char.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_envelope() -> ArticleEnvelope {
        ArticleEnvelope {
            title: "Rust (programming language)".to_string(),
            authors: vec![
                Author {
                    id: Some(42),
                    name: Some("Graydon".to_string()),
                },
                Author {
                    id: None,
                    name: Some("192.0.2.7".to_string()),
                },
            ],
            bucket: "a3f".to_string(),
            file_name: "rust-programming-language.wiki".to_string(),
            info: PageInfo {
                id: 1,
                namespace: 0,
                extra: serde_json::Map::new(),
            },
            sha1: "abc123".to_string(),
            timestamp: "2024-01-15T10:30:00Z".to_string(),
            parent_id: Some(99),
            namespace: Some(Namespace {
                name: "(Main/Article)".to_string(),
                kind: NamespaceKind::Subject,
            }),
        }
    }

    #[test]
    fn article_record_roundtrip() {
        let record = ArticleRecord::Article {
            info: sample_envelope(),
            title: "Rust (programming language)".to_string(),
            sections: vec![Section {
                section: SectionMeta {
                    idx: 0,
                    title: "Introduction".to_string(),
                    level: 1,
                    id: "Rust (programming language)#Introduction".to_string(),
                },
                html: "<p>Rust is a language.</p>\n".to_string(),
                wiki: "Rust is a language.".to_string(),
                links: vec![Link::new("Mozilla", None)],
            }],
            links: vec![Link::new("Mozilla", None), Link::new("C++", Some("C plus plus"))],
            non_section_links: vec![Link::new("C++", Some("C plus plus"))],
            categories: vec!["Programming languages".to_string()],
        };

        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: ArticleRecord = serde_json::from_str(&encoded).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn redirect_record_roundtrip() {
        let record = ArticleRecord::Redirect {
            info: sample_envelope(),
            title: "Rust".to_string(),
            target: "Rust (programming language)".to_string(),
        };

        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: ArticleRecord = serde_json::from_str(&encoded).unwrap();
        assert_eq!(record, decoded);
        assert!(decoded.is_redirect());
    }

    #[test]
    fn record_is_tagged_by_type() {
        let record = ArticleRecord::Redirect {
            info: sample_envelope(),
            title: "Rust".to_string(),
            target: "Rust (programming language)".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], json!("redirect"));
        assert_eq!(value["target"], json!("Rust (programming language)"));
        assert!(value.get("sections").is_none());
    }

    #[test]
    fn document_links_serialize_as_pairs() {
        let record = ArticleRecord::Article {
            info: sample_envelope(),
            title: "T".to_string(),
            sections: vec![Section {
                section: SectionMeta {
                    idx: 0,
                    title: "Introduction".to_string(),
                    level: 1,
                    id: "T#Introduction".to_string(),
                },
                html: String::new(),
                wiki: String::new(),
                links: vec![Link::new("Foo", Some("Bar"))],
            }],
            links: vec![Link::new("Foo", Some("Bar")), Link::new("Baz", None)],
            non_section_links: vec![Link::new("Baz", None)],
            categories: vec![],
        };

        let value = serde_json::to_value(&record).unwrap();
        // Whole-document lists are (target, text) pairs
        assert_eq!(value["links"], json!([["Foo", "Bar"], ["Baz", null]]));
        assert_eq!(value["non_section_links"], json!([["Baz", null]]));
        // Section lists keep the object form
        assert_eq!(
            value["sections"][0]["links"],
            json!([{"target": "Foo", "text": "Bar"}])
        );
    }

    #[test]
    fn envelope_preserves_unknown_info_fields() {
        let raw = json!({
            "title": "T",
            "authors": [],
            "bucket": "abc",
            "file_name": "t.wiki",
            "info": {"id": 7, "namespace": 0, "redirect": null},
            "sha1": "x",
            "timestamp": "2024-01-01T00:00:00Z",
            "parent_id": null
        });
        let envelope: ArticleEnvelope = serde_json::from_value(raw).unwrap();
        assert_eq!(envelope.info.id, 7);
        assert!(envelope.info.extra.contains_key("redirect"));
        assert!(envelope.namespace.is_none());

        let back = serde_json::to_value(&envelope).unwrap();
        assert_eq!(back["info"]["redirect"], json!(null));
    }

    #[test]
    fn author_resolution_falls_back() {
        let both = Author {
            id: Some(1),
            name: Some("A".to_string()),
        };
        assert_eq!(both.resolved(), Some(("1".to_string(), "A".to_string())));

        let name_only = Author {
            id: None,
            name: Some("192.0.2.7".to_string()),
        };
        assert_eq!(
            name_only.resolved(),
            Some(("192.0.2.7".to_string(), "192.0.2.7".to_string()))
        );

        let id_only = Author {
            id: Some(5),
            name: None,
        };
        assert_eq!(id_only.resolved(), Some(("5".to_string(), "5".to_string())));

        let neither = Author { id: None, name: None };
        assert_eq!(neither.resolved(), None);
    }

    #[test]
    fn links_compare_structurally() {
        assert_eq!(Link::new("A", None), Link::new("A", None));
        assert_ne!(Link::new("A", None), Link::new("A", Some("")));
        assert_ne!(Link::new("A", Some("x")), Link::new("A", Some("y")));
    }

    #[test]
    fn section_id_caps_length() {
        let long = "x".repeat(500);
        let id = section_id(&long, "Heading");
        assert_eq!(id.chars().count(), SECTION_ID_MAX_CHARS);
        assert!(id.starts_with("xxx"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("äöü", 2), "äö");
        assert_eq!(truncate_chars("short", 400), "short");
    }
}
