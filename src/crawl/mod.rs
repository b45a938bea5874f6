//! Two-stage crawl: serialized game discovery, then a bounded concurrent
//! fan-out of per-game detail fetches.
//!
//! ```text
//!  teams ──(one at a time, delayed)──▶ discover ──▶ {day → game ids}
//!                                                        │
//!                               ┌────────────────────────┘
//!                               ▼
//!           one task per (day, game) ── semaphore(max_connections)
//!                               │
//!                               ▼
//!       <root>/<day>/{win_probability,game_info}/<game_id>.parquet.gz
//! ```
//!
//! Every per-game failure stops at the task boundary: it is logged with the
//! game id and day, counted, and the game simply has no artifacts.

pub mod detail;
pub mod discovery;

pub use detail::fetch_game_detail;
pub use discovery::discover;

use anyhow::Result;
use chrono::NaiveDate;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::models::{
    CrawlSummary, DayBuckets, FetchOutcome, GameDetail, GameFetchState, Team,
};
use crate::output::{OutputLayout, TableKind, TableSink};
use crate::stats::StatsSource;
use crate::teams::NBA_TEAMS;

/// Simultaneous in-flight detail requests.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;
/// Pause between consecutive team game-log requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);

pub struct Crawler {
    source: Arc<dyn StatsSource>,
    sink: Arc<dyn TableSink>,
    layout: OutputLayout,
    teams: Vec<Team>,
    max_connections: usize,
    request_delay: Duration,
}

impl Crawler {
    pub fn new(source: Arc<dyn StatsSource>, sink: Arc<dyn TableSink>, layout: OutputLayout) -> Self {
        Crawler {
            source,
            sink,
            layout,
            teams: NBA_TEAMS.to_vec(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn with_request_delay(mut self, request_delay: Duration) -> Self {
        self.request_delay = request_delay;
        self
    }

    #[cfg(test)]
    pub fn with_teams(mut self, teams: &[Team]) -> Self {
        self.teams = teams.to_vec();
        self
    }

    /// Crawl every game played in `[start, end]`.
    ///
    /// Returns once every detail fetch has reached a terminal state; never
    /// fails. Completeness is judged by the artifacts on disk (or the
    /// returned counts).
    pub async fn crawl(&self, start: NaiveDate, end: NaiveDate) -> CrawlSummary {
        info!(
            "Crawling data from {} to {} via {}",
            start,
            end,
            self.source.name()
        );

        let buckets = discover(
            self.source.as_ref(),
            &self.teams,
            start,
            end,
            self.request_delay,
        )
        .await;
        let pairs = flatten(&buckets);

        let mut summary = CrawlSummary {
            days: buckets.len(),
            games: pairs.len(),
            ..Default::default()
        };
        if pairs.is_empty() {
            info!("No games found between {} and {}", start, end);
            return summary;
        }

        info!(
            "Fetching details for {} game(s), at most {} in flight",
            pairs.len(),
            self.max_connections
        );

        let permits = Arc::new(Semaphore::new(self.max_connections));
        let mut tasks = JoinSet::new();
        for (day, game_id) in pairs {
            let job = GameJob {
                source: Arc::clone(&self.source),
                sink: Arc::clone(&self.sink),
                layout: self.layout.clone(),
                permits: Arc::clone(&permits),
                day,
                game_id,
            };
            tasks.spawn(job.run());
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(state) => summary.record(&state),
                Err(e) => {
                    error!("Detail task aborted: {}", e);
                    summary.record(&GameFetchState::Failed(e.to_string()));
                }
            }
        }

        info!(
            "Crawl complete: {} succeeded, {} skipped, {} failed, {} artifact(s) written",
            summary.succeeded, summary.skipped, summary.failed, summary.tables_written
        );
        summary
    }
}

/// `(day, game_id)` pairs in bucket order.
pub fn flatten(buckets: &DayBuckets) -> Vec<(String, String)> {
    buckets
        .iter()
        .flat_map(|(day, ids)| ids.iter().map(move |id| (day.clone(), id.clone())))
        .collect()
}

/// Everything one detail task owns.
struct GameJob {
    source: Arc<dyn StatsSource>,
    sink: Arc<dyn TableSink>,
    layout: OutputLayout,
    permits: Arc<Semaphore>,
    day: String,
    game_id: String,
}

impl GameJob {
    async fn run(self) -> GameFetchState {
        let res = AssertUnwindSafe(self.fetch_and_store()).catch_unwind().await;
        res.unwrap_or_else(|_| {
            error!(
                "Detail fetch for game {} on {} panicked",
                self.game_id, self.day
            );
            GameFetchState::Failed("panicked".to_string())
        })
    }

    async fn fetch_and_store(&self) -> GameFetchState {
        let outcome = {
            let _permit = match self.permits.acquire().await {
                Ok(p) => p,
                Err(e) => return GameFetchState::Failed(e.to_string()),
            };
            info!(
                "Retrieving win probability for game {} on {}",
                self.game_id, self.day
            );
            fetch_game_detail(self.source.as_ref(), &self.game_id).await
        };

        match outcome {
            FetchOutcome::Data(detail) if detail.is_empty() => {
                warn!(
                    "No win probability or game info rows for game {} on {}",
                    self.game_id, self.day
                );
                GameFetchState::SkippedNoData
            }
            FetchOutcome::Data(detail) => match self.store(detail).await {
                Ok(tables_written) => GameFetchState::Succeeded { tables_written },
                Err(e) => {
                    error!(
                        "Failed to store tables for game {} on {}: {:#}",
                        self.game_id, self.day, e
                    );
                    GameFetchState::Failed(format!("{:#}", e))
                }
            },
            FetchOutcome::Empty => {
                error!(
                    "Unable to retrieve win probability data for {} on {}",
                    self.game_id, self.day
                );
                GameFetchState::SkippedNoData
            }
            FetchOutcome::Failed(e) => {
                error!(
                    "Exception while retrieving win probability for {} on {}: {:#}",
                    self.game_id, self.day, e
                );
                GameFetchState::Failed(format!("{:#}", e))
            }
        }
    }

    /// Write every present table. If any write fails, the artifacts already
    /// written for this game are removed so a failed game leaves nothing
    /// behind.
    async fn store(&self, detail: GameDetail) -> Result<usize> {
        let tables = [
            (TableKind::WinProbability, detail.win_probability),
            (TableKind::GameInfo, detail.game_info),
        ];
        let mut written = Vec::new();
        for (kind, table) in tables {
            let Some(table) = table else { continue };
            let path = self.layout.artifact_path(&self.day, kind, &self.game_id);
            if let Err(e) = self.sink.write_table(&path, table).await {
                self.discard(&written).await;
                return Err(e);
            }
            written.push(path);
        }
        Ok(written.len())
    }

    async fn discard(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = self.sink.remove(path).await {
                warn!(
                    "Failed to remove partial output {} for game {}: {:#}",
                    path.display(),
                    self.game_id,
                    e
                );
            }
        }
    }
}
