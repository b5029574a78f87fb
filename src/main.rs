use anyhow::Result;
use asterion::import::ImportConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "asterion")]
#[command(about = "Structure wiki markup archives and import them into graph databases")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse extracted wiki articles into structured JSON records
    Parse(ParseArgs),
    /// Flatten structured records into CSV interchange for import
    Flatten(FlattenArgs),
    /// Import flattened CSV files into Neo4j
    Import(ImportArgs),
}

#[derive(Args)]
struct ParseArgs {
    /// Directory containing extracted .wiki article files
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for structured JSON records
    #[arg(short, long)]
    output: PathBuf,

    /// Limit number of articles to process (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Overwrite existing records
    #[arg(long)]
    force: bool,

    /// Number of worker threads (default: all cores)
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(Args)]
struct FlattenArgs {
    /// Directory containing structured JSON records
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for CSV interchange files
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct ImportArgs {
    /// Directory containing flattened CSV files
    #[arg(short, long)]
    input: String,

    /// Neo4j Bolt URI
    #[arg(long, default_value = asterion::config::DEFAULT_BOLT_URI)]
    bolt_uri: String,

    /// Neo4j username
    #[arg(long, default_value = "neo4j")]
    username: String,

    /// Neo4j password
    #[arg(long, default_value = "password")]
    password: String,

    /// Import file URI prefix for Neo4j LOAD CSV
    #[arg(long, default_value = asterion::config::DEFAULT_IMPORT_PREFIX)]
    import_prefix: String,

    /// Max parallel LOAD CSV jobs for edge operations
    #[arg(long, default_value_t = asterion::config::IMPORT_MAX_PARALLEL_EDGES)]
    max_parallel_edges: usize,

    /// Max parallel LOAD CSV jobs for lighter relationship operations
    #[arg(long, default_value_t = asterion::config::IMPORT_MAX_PARALLEL_LIGHT)]
    max_parallel_light: usize,

    /// Clear existing Neo4j data before importing
    #[arg(long)]
    clean: bool,
}

fn run_parse(args: ParseArgs) -> Result<()> {
    let start = Instant::now();
    let stats =
        asterion::batch::run_parse_batch(&args.input, &args.output, args.limit, args.force, args.jobs)?;
    let duration = start.elapsed();
    info!(
        duration_secs = duration.as_secs_f64(),
        "Parse pass complete"
    );

    println!();
    println!("=== Summary ===");
    println!("Parse time:         {:.2}s", duration.as_secs_f64());
    println!();
    println!("Articles parsed:    {}", stats.articles());
    println!("Redirects found:    {}", stats.redirects());
    println!("Sections extracted: {}", stats.sections());
    println!("Links extracted:    {}", stats.links());
    println!("Categories found:   {}", stats.categories());
    println!("Files skipped:      {}", stats.skipped());
    println!("Files failed:       {}", stats.failed());

    Ok(())
}

fn run_flatten(args: FlattenArgs) -> Result<()> {
    let start = Instant::now();
    asterion::flatten::run_flatten(&args.input, &args.output)?;
    println!();
    println!("Flatten time:       {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn run_import(args: ImportArgs) -> Result<()> {
    let config = ImportConfig {
        csv_dir: args.input,
        bolt_uri: args.bolt_uri,
        username: args.username,
        password: args.password,
        import_prefix: args.import_prefix,
        max_parallel_edges: args.max_parallel_edges,
        max_parallel_light: args.max_parallel_light,
        clean: args.clean,
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("asterion-import-worker")
        .enable_io()
        .enable_time()
        .build()?;
    rt.block_on(asterion::import::run_import(config))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Parse(args) => run_parse(args),
        Commands::Flatten(args) => run_flatten(args),
        Commands::Import(args) => run_import(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
