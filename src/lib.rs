//! Asterion: wiki markup structuring and Neo4j import pipeline
//!
//! This crate provides a three-pass pipeline for turning bucketed wiki
//! article files into a property graph:
//!
//! 1. **Parse Pass** -- Convert each article's markup + metadata envelope into
//!    a structured record: redirect detection, section decomposition,
//!    best-effort HTML rendering, link classification, category extraction
//! 2. **Flatten Pass** -- Project structured records into row-oriented CSV
//!    interchange: article/author/category/section rows plus six edge kinds
//!    (authored, links-to, redirects-to, in-category, links-to-section,
//!    part-of)
//! 3. **Import Pass** -- Load CSV data into Neo4j over Bolt with templated
//!    upsert statements keyed on natural identifiers
//!
//! # Architecture
//!
//! The parser core is a pure, synchronous, single-document transformation --
//! no I/O, no shared mutable state -- which keeps the surrounding passes
//! trivially parallel:
//!
//! - **Redirect short-circuit** -- a cheap prefix probe skips section parsing
//!   for the large redirect-stub fraction of any dump
//! - **Explicit grammar** -- a heading/wikilink/template token scanner instead
//!   of a permissive external parse tree
//! - **Per-section failure isolation** -- a section that fails to render keeps
//!   its title, level, links, and raw markup
//! - **Parallel batch driver** -- rayon worker pool, one article per task,
//!   catch-and-log isolation between tasks
//! - **Atomic statistics** -- lock-free counters for batch metrics
//!
//! # Key Modules
//!
//! - [`article`] -- Record assembly (the parse entry point)
//! - [`redirect`] -- Cheap redirect stub detection
//! - [`wikitext`] -- Token scanner for heading/wikilink/template markup
//! - [`sections`] -- Section decomposition over heading tokens
//! - [`links`] -- Link extraction, classification, category derivation
//! - [`render`] -- Best-effort wikitext-to-HTML rendering
//! - [`models`] -- Core data types (ArticleEnvelope, ArticleRecord, Section, Link)
//! - [`namespace`] -- Static namespace id resolution
//! - [`store`] -- Bucketed on-disk article layout and round-trip
//! - [`batch`] -- Parallel parse pass
//! - [`flatten`] -- CSV interchange generation
//! - [`import`] -- Neo4j import over Bolt
//! - [`stats`] -- Thread-safe counters for parse metrics
//! - [`config`] -- Constants for parsing and import
//!
//! # Example Usage
//!
//! ```bash
//! # Parse extracted articles into structured JSON records
//! asterion parse -i articles/ -o parsed/
//!
//! # Flatten records into CSV interchange
//! asterion flatten -i parsed/ -o csv/
//!
//! # Import into Neo4j
//! asterion import -i csv/ --clean
//! ```

pub mod article;
pub mod batch;
pub mod config;
pub mod flatten;
pub mod import;
pub mod links;
pub mod models;
pub mod namespace;
pub mod redirect;
pub mod render;
pub mod sections;
pub mod stats;
pub mod store;
pub mod wikitext;
