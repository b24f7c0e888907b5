use crate::error::FetchError;
use crate::pages::PageSource;
use crate::tcg::catalog::{resolve_product_id, Catalog, DownloadTask};
use crate::tcg::ws::{RowOutcome, RowParser};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub image_root: PathBuf,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeStats {
    pub pages: usize,
    pub parsed: usize,
    pub not_data: usize,
    pub malformed: usize,
}

#[derive(Debug)]
pub struct ScrapeOutcome {
    pub catalog: Catalog,
    pub tasks: Vec<DownloadTask>,
    pub stats: ScrapeStats,
    /// Card number prefixes seen during the run
    pub prefixes: BTreeSet<String>,
}

/// Walks result pages in order, building the catalog and the image queue
pub struct Scraper {
    parser: RowParser,
    image_root: PathBuf,
}

impl Scraper {
    pub fn new(config: ScrapeConfig) -> Self {
        Self {
            parser: RowParser::new(&config.base_url),
            image_root: config.image_root,
        }
    }

    pub fn run<P>(&self, pages: &mut P) -> Result<ScrapeOutcome, FetchError>
    where
        P: PageSource + ?Sized,
    {
        let mut catalog = Catalog::new();
        let mut tasks = Vec::new();
        let mut stats = ScrapeStats::default();
        let mut prefixes = BTreeSet::new();

        while let Some(html) = pages.next_page()? {
            stats.pages += 1;
            info!("Processing page {}...", stats.pages);

            for (index, outcome) in self.parser.parse_page(&html).into_iter().enumerate() {
                let card = match outcome {
                    RowOutcome::Parsed(card) => card,
                    RowOutcome::NotData => {
                        stats.not_data += 1;
                        continue;
                    }
                    RowOutcome::Malformed(reason) => {
                        warn!("Skipping malformed row {} on page {}: {}", index, stats.pages, reason);
                        stats.malformed += 1;
                        continue;
                    }
                };
                stats.parsed += 1;

                let product = resolve_product_id(&card.key, &card.product_name_raw, &card.rarity);
                prefixes.insert(product.prefix);

                if let Some(task) = DownloadTask::for_card(&self.image_root, &product.id, &card) {
                    tasks.push(task);
                }
                debug!("{} -> {}", card.printed_number, product.id);
                catalog.ingest(&product.id, card);
            }
        }

        info!(
            "Reached the last page: {} pages, {} rows parsed into {} cards across {} products ({} skipped, {} malformed)",
            stats.pages,
            stats.parsed,
            catalog.card_count(),
            catalog.len(),
            stats.not_data,
            stats.malformed
        );

        Ok(ScrapeOutcome {
            catalog,
            tasks,
            stats,
            prefixes,
        })
    }
}
