/// Redirect markers checked against the case-folded head of an article
pub const REDIRECT_MARKERS: &[&str] = &["#redirect", "#weiterleitung"];

/// Number of leading characters inspected for a redirect marker
pub const REDIRECT_PROBE_CHARS: usize = 100;

/// Namespace prefix that marks a category membership link
pub const CATEGORY_NAMESPACE: &str = "kategorie";

/// Maximum length of a section identifier ("{article}#{section}")
pub const SECTION_ID_MAX_CHARS: usize = 400;

/// Buffer size for CSV writers
pub const CSV_BUFFER_CAPACITY: usize = 128 * 1024;

/// Default Neo4j Bolt URI
pub const DEFAULT_BOLT_URI: &str = "bolt://localhost:7687";

/// Import file URI prefix for Neo4j LOAD CSV
pub const DEFAULT_IMPORT_PREFIX: &str = "file:///import";

/// Max parallel LOAD CSV jobs for heavy edge operations
pub const IMPORT_MAX_PARALLEL_EDGES: usize = 4;

/// Max parallel LOAD CSV jobs for lighter relationship operations
pub const IMPORT_MAX_PARALLEL_LIGHT: usize = 8;

/// Connection attempts before giving up on Neo4j
pub const IMPORT_MAX_RETRIES: u32 = 30;

/// Seconds between Neo4j connection attempts
pub const IMPORT_RETRY_DELAY_SECS: u64 = 2;
