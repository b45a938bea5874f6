use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

mod config;
mod crawl;
mod models;
mod output;
mod stats;
mod teams;

use config::{Cli, Command, GameDayArgs};
use crawl::Crawler;
use output::{OutputLayout, ParquetSink};
use stats::StatsClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::GameDay(args) => game_day(args).await,
    }
}

async fn game_day(args: GameDayArgs) -> Result<()> {
    args.validate()?;

    let (start, end) = args.date_range(Local::now().date_naive());
    info!(
        "Crawling game-day from {} to {}. Results are in {}",
        start,
        end,
        args.output_path.display()
    );
    if start > end {
        warn!("Start date {} is after end date {}; no games will be crawled", start, end);
    }

    // Ensure the output directories exist
    let layout = OutputLayout::new(&args.output_path);
    info!("Creating target directories in {}", layout.root().display());
    let days = layout.prepare(start, end).await?;
    info!("Prepared output directories for {} day(s)", days);

    let client = StatsClient::new(&args.stats_base_url, args.timeout(), args.max_connections)?;
    let crawler = Crawler::new(Arc::new(client), Arc::new(ParquetSink::new()), layout)
        .with_max_connections(args.max_connections)
        .with_request_delay(args.request_delay());

    let summary = crawler.crawl(start, end).await;
    info!(
        "Crawling complete. {} game(s) over {} day(s): {} succeeded, {} skipped, {} failed. Results in {}",
        summary.games,
        summary.days,
        summary.succeeded,
        summary.skipped,
        summary.failed,
        args.output_path.display()
    );

    Ok(())
}
