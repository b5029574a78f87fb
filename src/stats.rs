use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected during a parse pass
#[derive(Default)]
pub struct ParseStats {
    pub articles_parsed: AtomicU64,
    pub redirects_found: AtomicU64,
    pub sections_extracted: AtomicU64,
    pub links_extracted: AtomicU64,
    pub categories_found: AtomicU64,
    pub files_skipped: AtomicU64,
    pub files_failed: AtomicU64,
}

impl ParseStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_articles(&self) {
        self.articles_parsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_redirects(&self) {
        self.redirects_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_sections(&self, count: u64) {
        self.sections_extracted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_links(&self, count: u64) {
        self.links_extracted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_categories(&self, count: u64) {
        self.categories_found.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn articles(&self) -> u64 {
        self.articles_parsed.load(Ordering::Relaxed)
    }

    pub fn redirects(&self) -> u64 {
        self.redirects_found.load(Ordering::Relaxed)
    }

    pub fn sections(&self) -> u64 {
        self.sections_extracted.load(Ordering::Relaxed)
    }

    pub fn links(&self) -> u64 {
        self.links_extracted.load(Ordering::Relaxed)
    }

    pub fn categories(&self) -> u64 {
        self.categories_found.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.files_skipped.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.files_failed.load(Ordering::Relaxed)
    }
}
