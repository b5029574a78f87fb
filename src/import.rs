use crate::config;
use crate::store;
use anyhow::{bail, Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use neo4rs::{query, Graph};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Cypher templates. `{file}` is replaced with the CSV URI at runtime.
/// Upserts are keyed on natural identifiers: article title, author id,
/// category name, section id.
const CYPHER_LOAD_ARTICLES: &str = r#"LOAD CSV WITH HEADERS FROM '{file}' AS row
CALL { WITH row
    MERGE (a:Article {title: row.title})
    ON CREATE SET
        a.id = toInteger(row.id),
        a.namespace_id = toInteger(row.namespace_id),
        a.namespace_name = row.namespace_name,
        a.namespace_type = row.namespace_type,
        a.parent_id = toInteger(row.parent_id),
        a.timestamp = row.timestamp,
        a.sha1 = row.sha1,
        a.path = row.path
} IN TRANSACTIONS OF 10000 ROWS;"#;

const CYPHER_LOAD_PERSONS: &str = r#"LOAD CSV WITH HEADERS FROM '{file}' AS row
CALL { WITH row
    MERGE (p:Author {id: row.id})
    ON CREATE SET p.name = row.name
} IN TRANSACTIONS OF 10000 ROWS;"#;

const CYPHER_LOAD_CATEGORIES: &str = r#"LOAD CSV WITH HEADERS FROM '{file}' AS row
CALL { WITH row
    MERGE (c:Category {name: row.name})
} IN TRANSACTIONS OF 10000 ROWS;"#;

const CYPHER_LOAD_SECTIONS: &str = r#"LOAD CSV WITH HEADERS FROM '{file}' AS row
CALL { WITH row
    MERGE (s:Section {id: row.id})
    ON CREATE SET
        s.article = row.article,
        s.idx = toInteger(row.idx),
        s.title = row.title,
        s.level = toInteger(row.level)
} IN TRANSACTIONS OF 10000 ROWS;"#;

const CYPHER_LOAD_AUTHORED: &str = r#"LOAD CSV WITH HEADERS FROM '{file}' AS row
CALL { WITH row
    MATCH (article:Article {title: row.article})
    MATCH (author:Author {id: row.person})
    MERGE (author)-[:AUTHORED]->(article)
} IN TRANSACTIONS OF 10000 ROWS;"#;

const CYPHER_LOAD_ARTICLE_LINKS: &str = r#"LOAD CSV WITH HEADERS FROM '{file}' AS row
CALL { WITH row
    MATCH (a:Article {title: row.from})
    MATCH (b:Article {title: row.to})
    MERGE (a)-[:LINKS_TO]->(b)
} IN TRANSACTIONS OF 10000 ROWS;"#;

const CYPHER_LOAD_REDIRECT_LINKS: &str = r#"LOAD CSV WITH HEADERS FROM '{file}' AS row
CALL { WITH row
    MERGE (a:Article {title: row.from})
    MERGE (b:Article {title: row.to})
    MERGE (a)-[:REDIRECTS_TO]->(b)
} IN TRANSACTIONS OF 10000 ROWS;"#;

const CYPHER_LOAD_CATEGORY_LINKS: &str = r#"LOAD CSV WITH HEADERS FROM '{file}' AS row
CALL { WITH row
    MATCH (a:Article {title: row.article})
    MATCH (c:Category {name: row.category})
    MERGE (a)-[:IN_CATEGORY]->(c)
} IN TRANSACTIONS OF 10000 ROWS;"#;

const CYPHER_LOAD_SECTION_LINKS: &str = r#"LOAD CSV WITH HEADERS FROM '{file}' AS row
CALL { WITH row
    MATCH (a:Article {title: row.from})
    MATCH (s:Section {id: row.section})
    MERGE (a)-[:LINKS_TO_SECTION]->(s)
} IN TRANSACTIONS OF 10000 ROWS;"#;

const CYPHER_LOAD_SECTION_OF: &str = r#"LOAD CSV WITH HEADERS FROM '{file}' AS row
CALL { WITH row
    MATCH (s:Section {id: row.section})
    MATCH (a:Article {title: row.article})
    MERGE (s)-[:PART_OF]->(a)
} IN TRANSACTIONS OF 10000 ROWS;"#;

pub struct ImportConfig {
    pub csv_dir: String,
    pub bolt_uri: String,
    pub username: String,
    pub password: String,
    pub import_prefix: String,
    pub max_parallel_edges: usize,
    pub max_parallel_light: usize,
    pub clean: bool,
}

pub async fn run_import(config: ImportConfig) -> Result<()> {
    let start = Instant::now();
    let csv_root = Path::new(&config.csv_dir);
    if !csv_root.exists() {
        bail!("CSV directory does not exist: {}", config.csv_dir);
    }
    if csv_files_for(csv_root, "articles")?.is_empty() {
        bail!(
            "No articles.csv found under {}.\n\
             Run 'asterion flatten' first.",
            config.csv_dir
        );
    }

    println!();
    println!("==> Connecting to Neo4j at {} ...", config.bolt_uri);
    let graph = connect_with_retry(&config).await?;
    println!("    Connected.");

    if config.clean {
        let pb = make_spinner("Clearing existing data ...");
        run_cypher(&graph, "MATCH (n) DETACH DELETE n;").await?;
        pb.finish_with_message("Database cleared.");
    }

    let mp = MultiProgress::new();

    let pb = mp.add(make_spinner("Creating indexes for import performance ..."));
    run_cypher(
        &graph,
        "CREATE INDEX article_title IF NOT EXISTS FOR (a:Article) ON (a.title);",
    )
    .await?;
    run_cypher(
        &graph,
        "CREATE INDEX author_id IF NOT EXISTS FOR (p:Author) ON (p.id);",
    )
    .await?;
    run_cypher(
        &graph,
        "CREATE INDEX category_name IF NOT EXISTS FOR (c:Category) ON (c.name);",
    )
    .await?;
    run_cypher(
        &graph,
        "CREATE INDEX section_id IF NOT EXISTS FOR (s:Section) ON (s.id);",
    )
    .await?;
    pb.finish_with_message("Pre-import indexes created.");

    // Nodes first: every edge template anchors on node natural keys.
    println!();
    println!("==> Loading nodes ...");
    load_stage(&graph, &config, csv_root, &mp, "articles", CYPHER_LOAD_ARTICLES, config.max_parallel_light).await?;
    load_stage(&graph, &config, csv_root, &mp, "persons", CYPHER_LOAD_PERSONS, config.max_parallel_light).await?;
    load_stage(&graph, &config, csv_root, &mp, "categories", CYPHER_LOAD_CATEGORIES, config.max_parallel_light).await?;
    load_stage(&graph, &config, csv_root, &mp, "sections", CYPHER_LOAD_SECTIONS, config.max_parallel_light).await?;

    let article_count = query_count(&graph, "MATCH (a:Article) RETURN count(a) AS cnt").await?;
    let author_count = query_count(&graph, "MATCH (p:Author) RETURN count(p) AS cnt").await?;
    let category_count = query_count(&graph, "MATCH (c:Category) RETURN count(c) AS cnt").await?;
    let section_count = query_count(&graph, "MATCH (s:Section) RETURN count(s) AS cnt").await?;
    println!(
        "    Loaded {article_count} articles, {author_count} authors, \
         {category_count} categories, {section_count} sections."
    );

    println!();
    println!("==> Loading edges ...");
    load_stage(&graph, &config, csv_root, &mp, "article_links", CYPHER_LOAD_ARTICLE_LINKS, config.max_parallel_edges).await?;
    load_stage(&graph, &config, csv_root, &mp, "redirect_links", CYPHER_LOAD_REDIRECT_LINKS, config.max_parallel_edges).await?;
    load_stage(&graph, &config, csv_root, &mp, "authored", CYPHER_LOAD_AUTHORED, config.max_parallel_light).await?;
    load_stage(&graph, &config, csv_root, &mp, "category_links", CYPHER_LOAD_CATEGORY_LINKS, config.max_parallel_light).await?;
    load_stage(&graph, &config, csv_root, &mp, "section_links", CYPHER_LOAD_SECTION_LINKS, config.max_parallel_light).await?;
    load_stage(&graph, &config, csv_root, &mp, "section_of", CYPHER_LOAD_SECTION_OF, config.max_parallel_light).await?;

    let link_count =
        query_count(&graph, "MATCH ()-[r:LINKS_TO]->() RETURN count(r) AS cnt").await?;
    let redirect_count =
        query_count(&graph, "MATCH ()-[r:REDIRECTS_TO]->() RETURN count(r) AS cnt").await?;
    let in_category_count =
        query_count(&graph, "MATCH ()-[r:IN_CATEGORY]->() RETURN count(r) AS cnt").await?;

    let elapsed = start.elapsed();
    println!();
    println!("============================================");
    println!("  SUCCESS: Import complete!");
    println!("============================================");
    println!();
    println!("Total time:         {:.2}s", elapsed.as_secs_f64());
    println!("Articles:           {article_count}");
    println!("Authors:            {author_count}");
    println!("Categories:         {category_count}");
    println!("Sections:           {section_count}");
    println!("Link edges:         {link_count}");
    println!("Redirect edges:     {redirect_count}");
    println!("Category edges:     {in_category_count}");
    println!();
    println!("Available at:");
    println!("  Bolt:    {}", config.bolt_uri);
    println!("  Browser: http://localhost:7474");

    Ok(())
}

/// CSV files for one row type, as `/`-separated paths relative to the CSV
/// root (the shape LOAD CSV URIs want).
fn csv_files_for(csv_root: &Path, base_name: &str) -> Result<Vec<String>> {
    let files = store::list_files_named(csv_root, &format!("{base_name}.csv"))?;
    Ok(files
        .iter()
        .map(|path| {
            path.strip_prefix(csv_root)
                .unwrap_or(path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect())
}

async fn load_stage(
    graph: &Graph,
    config: &ImportConfig,
    csv_root: &Path,
    mp: &MultiProgress,
    base_name: &str,
    cypher_template: &str,
    max_parallel: usize,
) -> Result<()> {
    let files = csv_files_for(csv_root, base_name)?;
    let pb = mp.add(make_progress_bar(files.len() as u64, base_name));
    load_csv_files(
        graph,
        &files,
        &config.import_prefix,
        cypher_template,
        base_name,
        max_parallel,
        &pb,
    )
    .await
}

async fn connect_with_retry(config: &ImportConfig) -> Result<Graph> {
    let max_retries = config::IMPORT_MAX_RETRIES;
    let delay = tokio::time::Duration::from_secs(config::IMPORT_RETRY_DELAY_SECS);

    for attempt in 1..=max_retries {
        match Graph::new(&config.bolt_uri, &config.username, &config.password) {
            Ok(graph) => match graph.run(query("RETURN 1;")).await {
                Ok(_) => return Ok(graph),
                Err(e) if attempt < max_retries => {
                    info!(attempt, "Connection test failed, retrying: {e}");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(e).context(format!(
                        "Cannot connect to Neo4j at {} after {max_retries} attempts.\n\
                         Is the database running?",
                        config.bolt_uri
                    ));
                }
            },
            Err(e) if attempt < max_retries => {
                info!(
                    attempt,
                    "Cannot connect to Neo4j at {}, retrying: {e}", config.bolt_uri
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(e).context(format!(
                    "Cannot connect to Neo4j at {} after {max_retries} attempts.\n\
                     Is the database running?",
                    config.bolt_uri
                ));
            }
        }
    }

    bail!(
        "Cannot connect to Neo4j at {} after {max_retries} attempts",
        config.bolt_uri
    );
}

async fn run_cypher(graph: &Graph, cypher: &str) -> Result<()> {
    graph
        .run(query(cypher))
        .await
        .with_context(|| format!("Failed to execute: {cypher}"))?;
    Ok(())
}

async fn query_count(graph: &Graph, cypher: &str) -> Result<i64> {
    let mut result = graph
        .execute(query(cypher))
        .await
        .with_context(|| format!("Failed to execute count query: {cypher}"))?;

    if let Some(row) = result.next().await? {
        let count: i64 = row.get("cnt").context("Missing 'cnt' field in result")?;
        Ok(count)
    } else {
        Ok(0)
    }
}

/// Loads CSV files into Neo4j via LOAD CSV, throttled to `max_parallel`
/// concurrent queries.
async fn load_csv_files(
    graph: &Graph,
    files: &[String],
    import_prefix: &str,
    cypher_template: &str,
    label: &str,
    max_parallel: usize,
    pb: &ProgressBar,
) -> Result<()> {
    if files.is_empty() {
        pb.finish_with_message(format!("{label}: nothing to load"));
        return Ok(());
    }

    let mut in_flight = FuturesUnordered::new();
    let mut file_iter = files.iter();
    let mut failed = 0u64;
    let mut completed = 0u64;

    let initial = max_parallel.min(files.len());
    for _ in 0..initial {
        if let Some(file) = file_iter.next() {
            let cypher = cypher_template.replace("{file}", &format!("{import_prefix}/{file}"));
            let file_name = file.clone();
            let graph = graph.clone();
            in_flight.push(tokio::spawn(async move {
                let result = graph.run(query(&cypher)).await;
                (file_name, result)
            }));
        }
    }

    while let Some(join_result) = in_flight.next().await {
        let (file_name, result) = join_result.context("Task join error")?;
        match result {
            Ok(_) => {
                completed += 1;
            }
            Err(e) => {
                failed += 1;
                warn!(file = %file_name, error = %e, "LOAD CSV failed");
                eprintln!("    FAILED: {file_name}: {e}");
            }
        }
        pb.inc(1);

        if let Some(file) = file_iter.next() {
            let cypher = cypher_template.replace("{file}", &format!("{import_prefix}/{file}"));
            let file_name = file.clone();
            let graph = graph.clone();
            in_flight.push(tokio::spawn(async move {
                let result = graph.run(query(&cypher)).await;
                (file_name, result)
            }));
        }
    }

    pb.finish_with_message(format!("{label}: {completed} loaded, {failed} failed"));

    if failed > 0 {
        bail!("{failed} of {} {label} loads failed", files.len());
    }

    Ok(())
}

fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

fn make_progress_bar(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "    {{spinner:.cyan}} {label:<14} [{{bar:30.cyan/blue}}] {{pos}}/{{len}} files"
            ))
            .unwrap()
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn cypher_template_replacement() {
        let cypher = CYPHER_LOAD_ARTICLES.replace("{file}", "file:///000/articles.csv");
        assert!(cypher.contains("file:///000/articles.csv"));
        assert!(!cypher.contains("{file}"));
        assert!(cypher.contains("WITH HEADERS"));
        assert!(cypher.contains("IN TRANSACTIONS"));
        assert!(cypher.contains("MERGE (a:Article {title: row.title})"));
    }

    #[test]
    fn cypher_edges_anchor_on_natural_keys() {
        assert!(CYPHER_LOAD_AUTHORED.contains("MATCH (article:Article {title: row.article})"));
        assert!(CYPHER_LOAD_AUTHORED.contains("MERGE (author)-[:AUTHORED]->(article)"));
        assert!(CYPHER_LOAD_ARTICLE_LINKS.contains("MERGE (a)-[:LINKS_TO]->(b)"));
        assert!(CYPHER_LOAD_REDIRECT_LINKS.contains("MERGE (a)-[:REDIRECTS_TO]->(b)"));
        assert!(CYPHER_LOAD_CATEGORY_LINKS.contains("MERGE (a)-[:IN_CATEGORY]->(c)"));
        assert!(CYPHER_LOAD_SECTION_LINKS.contains("MERGE (a)-[:LINKS_TO_SECTION]->(s)"));
        assert!(CYPHER_LOAD_SECTION_OF.contains("MERGE (s)-[:PART_OF]->(a)"));
    }

    #[test]
    fn cypher_sections_upsert_on_id() {
        assert!(CYPHER_LOAD_SECTIONS.contains("MERGE (s:Section {id: row.id})"));
        assert!(CYPHER_LOAD_SECTIONS.contains("toInteger(row.level)"));
    }

    #[test]
    fn csv_files_discovered_per_bucket() {
        let dir = TempDir::new().unwrap();
        for bucket in ["00a", "00b"] {
            fs::create_dir_all(dir.path().join(bucket)).unwrap();
            fs::write(dir.path().join(bucket).join("articles.csv"), "header\n").unwrap();
        }
        fs::write(dir.path().join("00a").join("persons.csv"), "header\n").unwrap();

        let files = csv_files_for(dir.path(), "articles").unwrap();
        assert_eq!(files, vec!["00a/articles.csv", "00b/articles.csv"]);

        let persons = csv_files_for(dir.path(), "persons").unwrap();
        assert_eq!(persons, vec!["00a/persons.csv"]);
    }

    #[test]
    fn csv_files_empty_when_none_exist() {
        let dir = TempDir::new().unwrap();
        let files = csv_files_for(dir.path(), "articles").unwrap();
        assert!(files.is_empty());
    }
}
