use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Day key (`YYYYMMDD`) → unique game ids played that day.
pub type DayBuckets = BTreeMap<String, BTreeSet<String>>;

/// Format a date as a day-bucket key.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// A franchise from the static team registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub id: u32,
    pub abbreviation: &'static str,
}

/// One row of a team's game log, as seen from that team's perspective.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub game_id: String,
    pub game_date: NaiveDate,
    pub team_id: Option<u64>,
    pub team_abbreviation: Option<String>,
    /// e.g. "BOS vs. MIL" or "BOS @ MIL"
    pub matchup: Option<String>,
    /// Remaining team-scoped statistics keyed by lowercased header.
    pub stats: Map<String, Value>,
}

/// Row-oriented table built from one upstream result set.
///
/// Column names are the upstream headers, lowercased. Every row has exactly
/// `columns.len()` values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Iterate the rows as column → value maps.
    pub fn records(&self) -> impl Iterator<Item = Map<String, Value>> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect::<Map<String, Value>>()
        })
    }
}

/// Win-probability and game-info tables for one game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameDetail {
    pub win_probability: Option<Table>,
    pub game_info: Option<Table>,
}

impl GameDetail {
    pub fn is_empty(&self) -> bool {
        self.win_probability.is_none() && self.game_info.is_none()
    }
}

/// Result of one isolated upstream fetch.
///
/// `Empty` means the upstream answered without the expected result
/// container; `Failed` carries the cause of a request or parse error.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Data(T),
    Empty,
    Failed(anyhow::Error),
}

#[cfg(test)]
impl<T> FetchOutcome<T> {
    pub fn is_data(&self) -> bool {
        matches!(self, FetchOutcome::Data(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FetchOutcome::Empty)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

impl<T> From<anyhow::Result<Option<T>>> for FetchOutcome<T> {
    fn from(res: anyhow::Result<Option<T>>) -> Self {
        match res {
            Ok(Some(data)) => FetchOutcome::Data(data),
            Ok(None) => FetchOutcome::Empty,
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

/// Terminal state of one game's detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameFetchState {
    Succeeded { tables_written: usize },
    SkippedNoData,
    Failed(String),
}

/// Totals for one crawl invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub days: usize,
    pub games: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub tables_written: usize,
}

impl CrawlSummary {
    pub fn record(&mut self, state: &GameFetchState) {
        match state {
            GameFetchState::Succeeded { tables_written } => {
                self.succeeded += 1;
                self.tables_written += tables_written;
            }
            GameFetchState::SkippedNoData => self.skipped += 1,
            GameFetchState::Failed(_) => self.failed += 1,
        }
    }
}
