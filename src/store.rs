//! Bucketed on-disk article layout. Each article lives in one file --
//! first line JSON metadata envelope, remainder raw markup -- under a
//! deterministic hash bucket so no single directory collects millions of
//! files. The only contract with the parser is that a saved pair reads back
//! unchanged.

use crate::models::ArticleEnvelope;
use anyhow::{Context, Result};
use memchr::memchr;
use rustc_hash::FxHasher;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File extension for extracted article files
pub const ARTICLE_EXT: &str = "wiki";

/// File extension for parsed record files
pub const RECORD_EXT: &str = "json";

/// Lowercases and collapses non-alphanumeric runs to single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Three-hex-digit fan-out bucket for a slug (4096 buckets).
pub fn bucket_for(slug: &str) -> String {
    let mut hasher = FxHasher::default();
    slug.hash(&mut hasher);
    format!("{:03x}", hasher.finish() & 0xfff)
}

/// Bucket and file name for a title's on-disk placement.
pub fn placement_for(title: &str) -> (String, String) {
    let slug = slugify(title);
    let bucket = bucket_for(&slug);
    let file_name = format!("{slug}.{ARTICLE_EXT}");
    (bucket, file_name)
}

/// Writes "envelope JSON\nmarkup" under the envelope's bucket. Returns the
/// path written, or `None` when an existing file was kept (`force` off).
pub fn save_article(
    root: &Path,
    envelope: &ArticleEnvelope,
    text: &str,
    force: bool,
) -> Result<Option<PathBuf>> {
    let path = root.join(&envelope.bucket).join(&envelope.file_name);
    if path.exists() && !force {
        return Ok(None);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let metadata =
        serde_json::to_string(envelope).context("Failed to serialize article envelope")?;
    let file =
        File::create(&path).with_context(|| format!("Failed to create article file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(metadata.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;

    Ok(Some(path))
}

/// Reads back a saved article file: metadata line, then markup.
pub fn read_article(path: &Path) -> Result<(ArticleEnvelope, String)> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read article file: {:?}", path))?;
    let split = memchr(b'\n', raw.as_bytes())
        .with_context(|| format!("Article file has no metadata line: {:?}", path))?;
    let envelope: ArticleEnvelope = serde_json::from_str(&raw[..split])
        .with_context(|| format!("Malformed metadata envelope in: {:?}", path))?;
    Ok((envelope, raw[split + 1..].to_string()))
}

/// Recursively collects files with the given extension, sorted for
/// deterministic iteration order.
pub fn list_files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files(dir, &mut files, &mut |path| {
        path.extension() == Some(OsStr::new(ext))
    })?;
    files.sort();
    Ok(files)
}

/// Recursively collects files whose name matches exactly, sorted.
pub fn list_files_named(dir: &Path, name: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files(dir, &mut files, &mut |path| {
        path.file_name() == Some(OsStr::new(name))
    })?;
    files.sort();
    Ok(files)
}

fn collect_files<F: FnMut(&Path) -> bool>(
    dir: &Path,
    out: &mut Vec<PathBuf>,
    keep: &mut F,
) -> Result<()> {
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out, keep)?;
        } else if keep(&path) {
            out.push(path);
        }
    }
    Ok(())
}
