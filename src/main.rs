use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod error;
mod pages;
mod scrape;
mod tcg;
mod utils;

use error::FetchError;
use pages::SnapshotDir;
use scrape::{ScrapeConfig, Scraper};
use utils::files::{ensure_directories, write_catalog, RunLayout};
use utils::http::DEFAULT_TIMEOUT_SECS;
use utils::images::{download_all, HttpFetcher, DEFAULT_CONCURRENCY};

/// Extract the Weiß Schwarz card list into per-product JSON and card images
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the catalog from saved result pages and download card images
    Fetch {
        /// Series the result pages belong to (e.g. 甘神さんちの縁結び)
        #[arg(short, long)]
        series: String,

        /// Directory holding the saved result-table pages, one HTML file per page
        #[arg(long)]
        pages: PathBuf,

        /// Root directory for timestamped run output
        #[arg(short, long, default_value = "data")]
        output: PathBuf,

        /// Maximum number of concurrent image downloads
        #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
        threads: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Site the image paths are relative to
        #[arg(long, default_value = tcg::ws::BASE_URL)]
        base_url: String,

        /// Only write the catalog, skip image downloads
        #[arg(long, default_value_t = false)]
        no_images: bool,
    },
}

fn init_tracing(log_file: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Fetch {
            series,
            pages,
            output,
            threads,
            timeout,
            base_url,
            no_images,
        } => {
            let layout = RunLayout::timestamped(&output);
            ensure_directories(&layout)?;
            init_tracing(&layout.log_file)?;

            info!("Series: {}", series);
            info!("Results will be stored in {}", layout.root.display());

            let settings = FetchSettings {
                pages,
                threads,
                timeout: Duration::from_secs(timeout),
                base_url,
                download_images: !no_images,
            };

            if let Err(e) = fetch(&layout, settings).await {
                error!("Scrape failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

struct FetchSettings {
    pages: PathBuf,
    threads: usize,
    timeout: Duration,
    base_url: String,
    download_images: bool,
}

async fn fetch(layout: &RunLayout, settings: FetchSettings) -> Result<(), FetchError> {
    let mut source = SnapshotDir::open(&settings.pages)?;
    info!("Found {} result pages in {}", source.remaining(), settings.pages.display());

    let scraper = Scraper::new(ScrapeConfig {
        base_url: settings.base_url,
        image_root: layout.image_dir.clone(),
    });
    let outcome = scraper.run(&mut source)?;

    if outcome.catalog.is_empty() {
        warn!("No cards found in the result pages");
    }

    if settings.download_images && !outcome.tasks.is_empty() {
        let fetcher = HttpFetcher::new(settings.timeout)?;
        let report = download_all(&fetcher, &outcome.tasks, settings.threads).await;
        if report.failed > 0 {
            warn!("{} of {} image downloads failed", report.failed, report.total());
        }
    }

    write_catalog(&outcome.catalog, &layout.data_dir)?;

    if !outcome.prefixes.is_empty() {
        info!(
            "Card number prefixes seen: {:?}",
            outcome.prefixes.iter().collect::<Vec<_>>()
        );
    }

    Ok(())
}
