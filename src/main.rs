//! Folio-Harvest main entry point
//!
//! This is the command-line interface for the Folio-Harvest publication harvester.

use clap::Parser;
use folio_harvest::config::{load_config_with_hash, Config};
use folio_harvest::crawler::run_crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Folio-Harvest: a polite publication harvester
///
/// Folio-Harvest walks the paginated listings of publication sites, saves
/// every linked article or book as HTML and plain text, and never fetches a
/// document twice.
#[derive(Parser, Debug)]
#[command(name = "folio-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite publication harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Retrieve pages through headless Chrome ([browser] section)
    #[arg(long)]
    rendered: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, cli.rendered)?;
    } else {
        handle_harvest(config, cli.rendered).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("folio_harvest=info,warn"),
            1 => EnvFilter::new("folio_harvest=debug,info"),
            2 => EnvFilter::new("folio_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config, rendered: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Folio-Harvest Dry Run ===\n");

    println!("Fetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    if let Some(language) = &config.fetcher.accept_language {
        println!("  Accept-Language: {}", language);
    }
    if let Some(referer) = &config.fetcher.referer {
        println!("  Referer: {}", referer);
    }
    println!("  Timeout: {}ms", config.fetcher.timeout_ms);
    println!(
        "  Delay: {}-{}ms",
        config.fetcher.min_delay_ms, config.fetcher.max_delay_ms
    );

    println!("\nOutput:");
    println!("  Root: {}", config.output.root);
    println!("  Page snapshots: {}", config.output.save_page_snapshots);
    println!("  HTML: {}", config.output.save_html);
    println!("  Text: {}", config.output.save_text);
    println!("  Attachments: {}", config.output.download_attachments);

    println!("\nExtraction:");
    println!("  Entry container: {}", config.extraction.entry_container);
    println!(
        "  Content selectors: {}",
        config.extraction.content_selectors.join(", ")
    );

    match (&config.browser, rendered) {
        (Some(browser), true) => {
            println!("\nBrowser:");
            match (&browser.debug_url, &browser.chrome_executable) {
                (Some(url), _) => println!("  Attach to: {}", url),
                (None, Some(executable)) => println!("  Launch: {}", executable),
                (None, None) => println!("  Launch: auto-detected Chrome"),
            }
            println!("  Headless: {}", browser.headless);
            println!("  Ready marker: {}", browser.ready_marker);
            println!("  Wait: {}ms", browser.wait_timeout_ms);
        }
        (None, true) => {
            return Err("--rendered requires a [browser] section in the configuration".into());
        }
        _ => {}
    }

    println!("\nTargets ({}):", config.targets.len());
    for target in &config.targets {
        println!("  - {}: {}", target.group, target.seed);
        if let Some(total) = target.default_total_pages {
            println!("    default total pages: {}", total);
        }
        if let Some(path) = target.document_path(&config.extraction) {
            println!("    document path: {}", path);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest {} target(s) into {}",
        config.targets.len(),
        config.output.root
    );

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, rendered: bool) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Targets: {}, output root: {}",
        config.targets.len(),
        config.output.root
    );

    let report = run_crawl(config, rendered).await;
    println!("{}", report.stats);

    match report.result {
        Ok(()) => {
            tracing::info!("Harvest completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
