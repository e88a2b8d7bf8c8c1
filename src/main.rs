mod analyzer;
mod config;
mod export;
mod filter;
mod model;
mod normalizer;
mod notifier;
mod scraper;
mod storage;
mod utils;

use analyzer::Ranker;
use analyzer::ranker::RankSummary;
use chrono::{DateTime, Datelike, Utc};
use clap::{CommandFactory, Parser};
use config::{AppConfig, load_config};
use filter::ScopeFilter;
use futures::future::join_all;
use model::{RankedSet, RawLot};
use notifier::TelegramNotifier;
use scraper::{JsonFileSource, SourceFetcher};
use storage::SqliteStorage;
use tracing::{Level, error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "auction-radar", about = "Regional vehicle auction radar", version)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: String,
    /// Fetch all sources, rank the lots and store the ranked set
    #[arg(long)]
    crawl: bool,
    /// Send the ranked digest to Telegram
    #[arg(long)]
    notify: bool,
    /// Export the ranked set to a CSV file
    #[arg(long, value_name = "PATH")]
    export_csv: Option<String>,
    /// Remove stored lots whose sale already happened
    #[arg(long)]
    cleanup: bool,
    /// Show database statistics
    #[arg(long)]
    stats: bool,
    /// Override the configured sale-date window in days
    #[arg(long)]
    since_days: Option<i64>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn needs_ranking(&self) -> bool {
        self.crawl || self.notify || self.export_csv.is_some()
    }

    fn has_action(&self) -> bool {
        self.needs_ranking() || self.cleanup || self.stats
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    if !cli.has_action() {
        if let Err(e) = Cli::command().print_help() {
            error!("Cannot print help: {}", e);
        }
        return;
    }

    let mut config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };
    if let Some(days) = cli.since_days {
        config.since_days = days;
    }
    let now = Utc::now();

    if cli.needs_ranking() {
        let Some(ranked) = run_pipeline(&config, now).await else {
            return;
        };

        if cli.crawl {
            store_ranked(&config, &ranked, now);
        }
        if let Some(path) = &cli.export_csv {
            if ranked.is_empty() {
                info!("No target matches to export");
            } else {
                match export::export_csv(path, &ranked) {
                    Ok(n) => info!("Exported {} target matches to {}", n, path),
                    Err(e) => warn!("CSV export failed: {}", e),
                }
            }
        }
        if cli.notify {
            send_digest(&config, &ranked).await;
        }
    }

    if cli.cleanup || cli.stats {
        match SqliteStorage::new(&config.database_path) {
            Ok(storage) => {
                if cli.cleanup {
                    match storage.delete_sold_before(now) {
                        Ok(n) => info!("Cleaned up {} sold lots", n),
                        Err(e) => warn!("Cleanup failed: {}", e),
                    }
                }
                if cli.stats {
                    show_stats(&storage);
                }
            }
            Err(e) => warn!("Failed to initialize storage: {}", e),
        }
    }

    info!("Run finished.");
}

/// Fetch, scope and rank. `None` only when the pipeline cannot be built or the
/// ranking task dies; failing sources are skipped.
async fn run_pipeline(config: &AppConfig, now: DateTime<Utc>) -> Option<RankedSet> {
    let reference_year = config.reference_year.unwrap_or_else(|| now.year());
    let ranker = match Ranker::from_config(config, reference_year) {
        Ok(r) => r,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return None;
        }
    };

    let sources: Vec<Box<dyn SourceFetcher>> = config
        .sources
        .iter()
        .map(|s| Box::new(JsonFileSource::new(s.name.clone(), s.path.clone())) as Box<dyn SourceFetcher>)
        .collect();
    info!("Sources to process: {}", sources.len());

    let raw_lots = fetch_all(&sources).await;
    let scope = ScopeFilter::new(now, config.since_days, &config.target_states);
    let in_scope = scope.apply(raw_lots);
    info!("{} lots in scope after date/state filtering", in_scope.len());

    let ranking = tokio::task::spawn_blocking(move || ranker.rank_with_summary(&in_scope)).await;
    let (ranked, summary) = match ranking {
        Ok(result) => result,
        Err(e) => {
            error!("Ranking task failed: {}", e);
            return None;
        }
    };

    log_summary(&ranked, &summary);
    Some(ranked)
}

fn log_summary(ranked: &RankedSet, summary: &RankSummary) {
    info!(
        "Ranked {} lots ({} matched, {} duplicates collapsed)",
        summary.ranked, summary.matched, summary.duplicates_removed
    );
    for (category, count) in &summary.by_category {
        info!("  {}: {}", category, count);
    }
    for (state, count) in &summary.by_state {
        info!("  in {}: {}", state, count);
    }
    if let Some(best) = ranked.first() {
        info!(
            "Best match: {} {} {} (score {:.2})",
            best.lot().year.map_or_else(|| "Unknown".to_string(), |y| y.to_string()),
            best.lot().make.as_deref().unwrap_or_default(),
            best.lot().model.as_deref().unwrap_or_default(),
            best.final_score
        );
    }
}

fn store_ranked(config: &AppConfig, ranked: &RankedSet, now: DateTime<Utc>) {
    match SqliteStorage::new(&config.database_path) {
        Ok(storage) => match storage.save_ranked(ranked, now) {
            Ok(n) => info!("Saved {} ranked lots", n),
            Err(e) => warn!("DB save error: {}", e),
        },
        Err(e) => warn!("Failed to initialize storage: {}", e),
    }
}

fn show_stats(storage: &SqliteStorage) {
    match storage.stats() {
        Ok(stats) => {
            info!("Database holds {} lots", stats.total_lots);
            for (source, count) in &stats.by_source {
                info!("  {}: {}", source, count);
            }
        }
        Err(e) => warn!("Stats query failed: {}", e),
    }
    match storage.top_lots(5) {
        Ok(top) => {
            for lot in top {
                info!(
                    "  top: {:.2} {} {}/{} {}",
                    lot.final_score,
                    lot.category,
                    lot.source,
                    lot.source_lot_id,
                    lot.sale_date_utc.format("%Y-%m-%d")
                );
            }
        }
        Err(e) => warn!("Top lots query failed: {}", e),
    }
}

async fn send_digest(config: &AppConfig, ranked: &RankedSet) {
    let Some(telegram) = &config.telegram else {
        warn!("Telegram is not configured; skipping digest");
        return;
    };
    info!("Sending Telegram digest...");
    match TelegramNotifier::new(telegram.bot_token.clone(), telegram.chat_id) {
        Ok(notifier) => {
            if let Err(e) = notifier
                .notify_digest(ranked, telegram.top_n, telegram.days_ahead)
                .await
            {
                warn!("Digest send failed: {}", e);
            }
        }
        Err(e) => warn!("Notifier setup failed: {}", e),
    }
}

/// Fetches every source concurrently. A failing source is logged and skipped.
async fn fetch_all(sources: &[Box<dyn SourceFetcher>]) -> Vec<RawLot> {
    let results = join_all(sources.iter().map(|s| s.fetch())).await;

    let mut lots = Vec::new();
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(batch) => {
                info!("{}: {} lots", source.name(), batch.len());
                lots.extend(batch);
            }
            Err(e) => warn!("Source {} failed: {}", source.name(), e),
        }
    }
    lots
}
