use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::crawl::DEFAULT_MAX_CONNECTIONS;
use crate::stats::client::DEFAULT_BASE_URL;

/// Accepted spellings for `--start-date` / `--end-date`.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid date '{0}': expected YYYY-MM-DD, YYYYMMDD or YYYY/MM/DD")]
    InvalidDate(String),
}

/// NBA Stats crawler
#[derive(Parser, Debug, Clone)]
#[command(name = "nba-crawler", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Retrieve and store game-day information across a range of days
    GameDay(GameDayArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GameDayArgs {
    /// Start date to crawl (defaults to today)
    #[arg(short = 's', long, env = "START_DATE", value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// End date to crawl, inclusive (defaults to today)
    #[arg(short = 'e', long, env = "END_DATE", value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,

    /// Location of output directory
    #[arg(short = 'o', long, env = "OUTPUT_PATH", default_value = ".")]
    pub output_path: PathBuf,

    /// Total timeout per HTTP request, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "60")]
    pub timeout: u64,

    /// Maximum simultaneous in-flight win probability requests
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,

    /// Pause between team game-log requests during discovery, in milliseconds
    #[arg(long, env = "REQUEST_DELAY_MS", default_value = "1000")]
    pub request_delay_ms: u64,

    /// Stats API base URL
    #[arg(long, env = "STATS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub stats_base_url: String,
}

impl GameDayArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout == 0 {
            anyhow::bail!("timeout must be at least 1 second");
        }
        if self.max_connections == 0 {
            anyhow::bail!("max_connections must be at least 1");
        }
        if !self.stats_base_url.starts_with("http://") && !self.stats_base_url.starts_with("https://") {
            anyhow::bail!("stats_base_url must be an http(s) URL");
        }
        Ok(())
    }

    /// Resolve the crawl window, filling missing bounds with `today`.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (
            self.start_date.unwrap_or(today),
            self.end_date.unwrap_or(today),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, ConfigError> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| ConfigError::InvalidDate(s.to_string()))
}
