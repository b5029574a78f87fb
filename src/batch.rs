//! Parallel parse pass: walks a directory of extracted article files and
//! writes one structured JSON record per article, mirroring the bucket
//! layout. Articles are independent tasks with no shared mutable state, so
//! the pool needs no coordination; a file that fails to read or decode is
//! logged and counted, never fatal to the batch.

use crate::article::parse_article;
use crate::models::ArticleRecord;
use crate::stats::ParseStats;
use crate::store;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

enum Outcome {
    Parsed {
        redirect: bool,
        sections: u64,
        links: u64,
        categories: u64,
    },
    Skipped,
}

/// Parses every `.wiki` file under `input_dir` into a `.json` record under
/// `output_dir`. Existing records are kept unless `force` is set; `limit`
/// bounds the number of files considered; `jobs` sizes the worker pool
/// (default: all cores).
pub fn run_parse_batch(
    input_dir: &Path,
    output_dir: &Path,
    limit: Option<u64>,
    force: bool,
    jobs: Option<usize>,
) -> Result<ParseStats> {
    let mut files = store::list_files_with_extension(input_dir, store::ARTICLE_EXT)?;
    if let Some(limit) = limit {
        files.truncate(limit as usize);
    }
    info!(files = files.len(), "Starting parse pass");

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let stats = ParseStats::new();
    let pb = make_progress_bar(files.len() as u64);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.unwrap_or(0))
        .build()
        .context("Failed to build worker pool")?;

    pool.install(|| {
        files.par_iter().for_each(|path| {
            match process_file(path, input_dir, output_dir, force) {
                Ok(Outcome::Parsed {
                    redirect,
                    sections,
                    links,
                    categories,
                }) => {
                    if redirect {
                        stats.inc_redirects();
                    } else {
                        stats.inc_articles();
                    }
                    stats.add_sections(sections);
                    stats.add_links(links);
                    stats.add_categories(categories);
                }
                Ok(Outcome::Skipped) => stats.inc_skipped(),
                Err(e) => {
                    warn!(path = ?path, error = %e, "Failed to process article");
                    stats.inc_failed();
                }
            }
            pb.inc(1);
        });
    });

    pb.finish_and_clear();
    info!(
        articles = stats.articles(),
        redirects = stats.redirects(),
        failed = stats.failed(),
        "Parse pass finished"
    );

    Ok(stats)
}

fn process_file(path: &Path, input_dir: &Path, output_dir: &Path, force: bool) -> Result<Outcome> {
    let rel = path.strip_prefix(input_dir).unwrap_or(path);
    let target = output_dir.join(rel).with_extension(store::RECORD_EXT);
    if target.exists() && !force {
        return Ok(Outcome::Skipped);
    }

    let (envelope, text) = store::read_article(path)?;
    let record = parse_article(envelope, &text);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = File::create(&target)
        .with_context(|| format!("Failed to create record file: {:?}", target))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &record)
        .context("Failed to serialize article record")?;
    writer.flush()?;

    let outcome = match &record {
        ArticleRecord::Article {
            sections,
            links,
            categories,
            ..
        } => Outcome::Parsed {
            redirect: false,
            sections: sections.len() as u64,
            links: links.len() as u64,
            categories: categories.len() as u64,
        },
        ArticleRecord::Redirect { .. } => Outcome::Parsed {
            redirect: true,
            sections: 0,
            links: 0,
            categories: 0,
        },
    };
    Ok(outcome)
}

fn make_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} articles ({eta})")
            .unwrap()
            .progress_chars("=> "),
    );
    pb
}
