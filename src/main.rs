//! Site-Harvest main entry point
//!
//! This is the command-line interface for the crawl and extraction passes.

use anyhow::Context;
use clap::{Parser, Subcommand};
use site_harvest::config::{load_config_with_hash, Config};
use site_harvest::crawler::run_crawl;
use site_harvest::extract::{ExtractionRules, Extractor};
use site_harvest::output::{print_crawl_stats, print_extraction_stats};
use site_harvest::storage::{FsObjectStore, SqliteDocumentStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Site-Harvest: crawl a company website and extract its text
///
/// `crawl` captures raw pages into the object store; `extract` turns the
/// captures into one normalized record per URL in the document store.
#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(version)]
#[command(about = "Crawl, capture and extract a company website", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the site and write one Page Capture per fetched page
    Crawl,

    /// Extract normalized records from the stored captures
    Extract {
        /// Drop the company collection before extracting
        #[arg(long)]
        full_reload: bool,

        /// Debug logging (same as -v)
        #[arg(long)]
        debug: bool,

        /// Company whose captures are extracted (defaults to the site name)
        #[arg(long, value_name = "NAME")]
        company: Option<String>,
    },

    /// Validate the configuration and print what would run
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Command::Extract { debug: true, .. } => cli.verbose.max(1),
        _ => cli.verbose,
    };
    setup_logging(verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("invalid configuration in {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Crawl => handle_crawl(config).await,
        Command::Extract {
            full_reload,
            company,
            ..
        } => handle_extract(&config, full_reload, company),
        Command::Check => handle_check(&config, &config_hash),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvest=info,warn"),
            1 => EnvFilter::new("site_harvest=debug,info"),
            _ => EnvFilter::new("site_harvest=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the `crawl` command
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} from {} seeds, allowed domains: {}",
        config.site.name,
        config.crawler.seeds.len(),
        config.crawler.allowed_domains.join(", ")
    );

    let stats = run_crawl(config).await.context("crawl failed")?;
    print_crawl_stats(&stats);
    Ok(())
}

/// Handles the `extract` command
fn handle_extract(config: &Config, full_reload: bool, company: Option<String>) -> anyhow::Result<()> {
    let company = company.unwrap_or_else(|| config.site.name.clone());
    let rules = ExtractionRules::from_config(&config.extraction)?;

    let objects = FsObjectStore::open(&config.storage.object_store_path).with_context(|| {
        format!(
            "failed to open object store at {}",
            config.storage.object_store_path
        )
    })?;
    let mut documents =
        SqliteDocumentStore::open(Path::new(&config.storage.document_store_path), &company)
            .with_context(|| {
                format!(
                    "failed to open document store at {}",
                    config.storage.document_store_path
                )
            })?;

    tracing::info!("Starting {} extraction...", company);
    let stats = Extractor::new(
        &objects,
        &mut documents,
        rules,
        &company,
        config.extraction.invalid_pages.clone(),
    )
    .run(full_reload)
    .context("extraction failed")?;

    documents.close().context("failed to close document store")?;
    tracing::info!("Finished {} extraction!", company);

    print_extraction_stats(&company, &stats);
    Ok(())
}

/// Handles the `check` command: prints the effective configuration
fn handle_check(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    println!("=== Site-Harvest Check ===\n");

    println!("Site: {}", config.site.name);
    println!("Config hash: {}", config_hash);

    println!("\nCrawler:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Obey robots.txt: {}", config.crawler.obey_robots);
    println!(
        "  Respect Crawl-delay: {}",
        config.crawler.respect_crawl_delay
    );
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Download delay: {}ms", config.crawler.download_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    if config.crawler.max_pages > 0 {
        println!("  Max pages: {}", config.crawler.max_pages);
    }
    println!("  User agent: {}", config.crawler.user_agent);

    println!(
        "\nAllowed Domains ({}):",
        config.crawler.allowed_domains.len()
    );
    for domain in &config.crawler.allowed_domains {
        println!("  - {}", domain);
    }

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  - {}", seed);
    }

    println!("\nStorage:");
    println!("  Object store: {}", config.storage.object_store_path);
    println!("  Document store: {}", config.storage.document_store_path);

    println!("\nExtraction:");
    println!("  Title: {}", config.extraction.title_selector);
    println!("  Description: {}", config.extraction.description_selector);
    println!("  Text: {}", config.extraction.text_selector);
    println!("  Payload: {}", config.extraction.payload_selector);
    println!("  Payload keys: {}", config.extraction.payload_keys.join(", "));
    println!(
        "  Invalid pages: {}",
        config.extraction.invalid_pages.join(", ")
    );

    println!("\n✓ Configuration is valid");
    Ok(())
}
