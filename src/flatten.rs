//! Flatten pass: projects structured article records into the row-oriented
//! CSV interchange the importer loads. One CSV set per bucket directory so
//! buckets flatten in parallel and the importer can bound its own
//! concurrency per file.
//!
//! Row types: article, person (author), category, section nodes, plus the
//! six edge kinds -- authored, links-to, redirects-to, in-category,
//! links-to-section, part-of.

use crate::config::{CSV_BUFFER_CAPACITY, SECTION_ID_MAX_CHARS};
use crate::links::split_fragment;
use crate::models::{self, ArticleRecord};
use crate::store;
use anyhow::{Context, Result};
use csv::Writer;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CSV base names written per bucket directory.
pub const CSV_TYPES: &[&str] = &[
    "articles",
    "persons",
    "categories",
    "sections",
    "authored",
    "article_links",
    "redirect_links",
    "category_links",
    "section_links",
    "section_of",
];

/// Flattens every bucket of parsed records under `input_dir` into a
/// mirrored bucket of CSV files under `csv_dir`.
pub fn run_flatten(input_dir: &Path, csv_dir: &Path) -> Result<()> {
    fs::create_dir_all(csv_dir)
        .with_context(|| format!("Failed to create CSV directory: {:?}", csv_dir))?;

    let mut buckets: Vec<(PathBuf, OsString)> = Vec::new();
    for entry in fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read input directory: {:?}", input_dir))?
    {
        let entry = entry?;
        if entry.path().is_dir() {
            buckets.push((entry.path(), entry.file_name()));
        }
    }
    buckets.sort();
    info!(buckets = buckets.len(), "Starting flatten pass");

    buckets.par_iter().try_for_each(|(bucket_dir, name)| {
        flatten_bucket(bucket_dir, &csv_dir.join(name))
            .with_context(|| format!("Failed to flatten bucket: {:?}", bucket_dir))
    })?;

    info!("Flatten pass finished");
    Ok(())
}

/// Flattens one bucket of record files into one CSV set. Persons and
/// categories are deduplicated within the bucket; cross-bucket duplicates
/// are left to the importer's MERGE semantics.
pub fn flatten_bucket(bucket_dir: &Path, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory: {:?}", out_dir))?;

    let mut articles = make_writer(
        out_dir,
        "articles",
        &[
            "id",
            "title",
            "namespace_id",
            "namespace_name",
            "namespace_type",
            "parent_id",
            "timestamp",
            "sha1",
            "path",
        ],
    )?;
    let mut persons = make_writer(out_dir, "persons", &["id", "name"])?;
    let mut categories = make_writer(out_dir, "categories", &["name"])?;
    let mut sections = make_writer(out_dir, "sections", &["id", "article", "idx", "title", "level"])?;
    let mut authored = make_writer(out_dir, "authored", &["article", "person"])?;
    let mut article_links = make_writer(out_dir, "article_links", &["from", "to"])?;
    let mut redirect_links = make_writer(out_dir, "redirect_links", &["from", "to"])?;
    let mut category_links = make_writer(out_dir, "category_links", &["article", "category"])?;
    let mut section_links = make_writer(out_dir, "section_links", &["from", "section"])?;
    let mut section_of = make_writer(out_dir, "section_of", &["section", "article"])?;

    let mut seen_persons: FxHashSet<(String, String)> = FxHashSet::default();
    let mut seen_categories: FxHashSet<String> = FxHashSet::default();

    for file in store::list_files_with_extension(bucket_dir, store::RECORD_EXT)? {
        let raw = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read record file: {:?}", file))?;
        let record: ArticleRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = ?file, error = %e, "Skipping undecodable record");
                continue;
            }
        };

        match &record {
            ArticleRecord::Redirect { title, target, .. } => {
                // A fragment-only redirect has no article to point at.
                if !target.is_empty() {
                    redirect_links.write_record([title.as_str(), target.as_str()])?;
                }
            }
            ArticleRecord::Article {
                info,
                title,
                sections: article_sections,
                links,
                categories: article_categories,
                ..
            } => {
                let mut id_buf = itoa::Buffer::new();
                let mut ns_buf = itoa::Buffer::new();
                let mut parent_buf = itoa::Buffer::new();
                let (ns_name, ns_kind) = match &info.namespace {
                    Some(ns) => (ns.name.as_str(), ns.kind.as_str()),
                    None => ("Unknown", "unknown"),
                };
                let path = format!("{}/{}", info.bucket, info.file_name);
                articles.write_record([
                    id_buf.format(info.info.id),
                    title.as_str(),
                    ns_buf.format(info.info.namespace),
                    ns_name,
                    ns_kind,
                    match info.parent_id {
                        Some(parent) => parent_buf.format(parent),
                        None => "",
                    },
                    info.timestamp.as_str(),
                    info.sha1.as_str(),
                    path.as_str(),
                ])?;

                for author in &info.authors {
                    if let Some((person_id, person_name)) = author.resolved() {
                        if seen_persons.insert((person_id.clone(), person_name.clone())) {
                            persons.write_record([person_id.as_str(), person_name.as_str()])?;
                        }
                        authored.write_record([title.as_str(), person_id.as_str()])?;
                    }
                }

                for section in article_sections {
                    let meta = &section.section;
                    let mut idx_buf = itoa::Buffer::new();
                    let mut level_buf = itoa::Buffer::new();
                    sections.write_record([
                        meta.id.as_str(),
                        title.as_str(),
                        idx_buf.format(meta.idx),
                        meta.title.as_str(),
                        level_buf.format(meta.level),
                    ])?;
                    section_of.write_record([meta.id.as_str(), title.as_str()])?;
                }

                for link in links {
                    match split_fragment(&link.target) {
                        None => continue,
                        Some((article, anchor)) => {
                            article_links.write_record([title.as_str(), article])?;
                            if anchor.is_some() {
                                let section_id =
                                    models::truncate_chars(&link.target, SECTION_ID_MAX_CHARS);
                                section_links.write_record([title.as_str(), section_id])?;
                            }
                        }
                    }
                }

                for category in article_categories {
                    if seen_categories.insert(category.clone()) {
                        categories.write_record([category.as_str()])?;
                    }
                    category_links.write_record([title.as_str(), category.as_str()])?;
                }
            }
        }
    }

    articles.flush()?;
    persons.flush()?;
    categories.flush()?;
    sections.flush()?;
    authored.flush()?;
    article_links.flush()?;
    redirect_links.flush()?;
    category_links.flush()?;
    section_links.flush()?;
    section_of.flush()?;

    Ok(())
}

fn make_writer(dir: &Path, name: &str, header: &[&str]) -> Result<Writer<BufWriter<File>>> {
    let path = dir.join(format!("{name}.csv"));
    let file =
        File::create(&path).with_context(|| format!("Failed to create CSV file: {:?}", path))?;
    let mut writer = Writer::from_writer(BufWriter::with_capacity(CSV_BUFFER_CAPACITY, file));
    writer.write_record(header)?;
    Ok(writer)
}
