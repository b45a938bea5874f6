//! Game discovery: walk the team registry one team at a time, pull each
//! team's full game log and keep the games inside the requested window.
//!
//! The game-log endpoint is not date-filtered upstream, so every team costs
//! one full-history request regardless of how narrow the window is. Requests
//! are strictly serialized with a pause in between; a burst of thirty
//! concurrent game-log calls is what gets clients throttled.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{day_key, DayBuckets, FetchOutcome, GameRecord, Team};
use crate::stats::{parse_result_sets, StatsSource};

/// Discover every game played in `[start, end]` (inclusive), bucketed by day.
///
/// A team that fails or answers without a result container contributes no
/// games; the remaining teams are still queried.
pub async fn discover(
    source: &dyn StatsSource,
    teams: &[Team],
    start: NaiveDate,
    end: NaiveDate,
    request_delay: Duration,
) -> DayBuckets {
    if start > end {
        warn!("Start date {} is after end date {}; nothing to discover", start, end);
        return DayBuckets::new();
    }

    info!(
        "Retrieving nba games from {} to {} over {} teams",
        start,
        end,
        teams.len()
    );

    let mut all_games = Vec::new();
    for (idx, team) in teams.iter().enumerate() {
        match discover_team(source, team, start, end).await {
            FetchOutcome::Data(games) => {
                info!(
                    "Completed retrieval for team {} ({}): {} game(s) in range. {} out of {}",
                    team.abbreviation,
                    team.id,
                    games.len(),
                    idx + 1,
                    teams.len()
                );
                all_games.extend(games);
            }
            FetchOutcome::Empty => {
                warn!(
                    "No result sets for team {} ({}); skipping. {} out of {}",
                    team.abbreviation,
                    team.id,
                    idx + 1,
                    teams.len()
                );
            }
            FetchOutcome::Failed(e) => {
                warn!(
                    "Game log retrieval failed for team {} ({}): {:#}. {} out of {}",
                    team.abbreviation,
                    team.id,
                    e,
                    idx + 1,
                    teams.len()
                );
            }
        }

        if idx + 1 < teams.len() && !request_delay.is_zero() {
            tokio::time::sleep(request_delay).await;
        }
    }

    let buckets = bucket_by_day(&all_games);
    info!(
        "Discovered {} game(s) across {} day(s)",
        buckets.values().map(|ids| ids.len()).sum::<usize>(),
        buckets.len()
    );
    buckets
}

/// Fetch one team's game log and keep the rows inside `[start, end]`.
pub async fn discover_team(
    source: &dyn StatsSource,
    team: &Team,
    start: NaiveDate,
    end: NaiveDate,
) -> FetchOutcome<Vec<GameRecord>> {
    let res = async {
        let raw = source.team_game_log(team.id).await?;
        let games = parse_game_log(&raw)?;
        Ok::<_, anyhow::Error>(games.map(|games| filter_in_range(games, start, end)))
    }
    .await;
    res.into()
}

/// Parse a `leaguegamefinder` body. `None` when the container is missing or
/// holds no result set.
pub fn parse_game_log(raw: &Value) -> Result<Option<Vec<GameRecord>>> {
    let Some(mut sets) = parse_result_sets(raw) else {
        return Ok(None);
    };
    let Some(table) = sets.take_first().context("malformed game log")? else {
        return Ok(None);
    };

    let total = table.len();
    let games: Vec<GameRecord> = table.records().filter_map(game_record).collect();
    if games.len() < total {
        debug!(
            "Dropped {} game log row(s) without a usable game id or date",
            total - games.len()
        );
    }
    Ok(Some(games))
}

pub fn filter_in_range(games: Vec<GameRecord>, start: NaiveDate, end: NaiveDate) -> Vec<GameRecord> {
    games
        .into_iter()
        .filter(|g| start <= g.game_date && g.game_date <= end)
        .collect()
}

/// Group games by `YYYYMMDD`, collapsing both teams' rows for the same game.
pub fn bucket_by_day(games: &[GameRecord]) -> DayBuckets {
    let mut buckets = DayBuckets::new();
    for game in games {
        buckets
            .entry(day_key(game.game_date))
            .or_default()
            .insert(game.game_id.clone());
    }
    buckets
}

fn game_record(mut row: Map<String, Value>) -> Option<GameRecord> {
    let game_id = match row.remove("game_id")? {
        Value::String(s) if !s.is_empty() => s,
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let game_date = row.remove("game_date")?.as_str().and_then(parse_game_date)?;
    let team_id = row.remove("team_id").and_then(|v| v.as_u64());
    let team_abbreviation = row
        .remove("team_abbreviation")
        .and_then(|v| v.as_str().map(str::to_string));
    let matchup = row
        .remove("matchup")
        .and_then(|v| v.as_str().map(str::to_string));

    Some(GameRecord {
        game_id,
        game_date,
        team_id,
        team_abbreviation,
        matchup,
        stats: row,
    })
}

/// Game dates come as `2023-01-01`, `2023-01-01T00:00:00`, or on older
/// seasons `JAN 01, 2023`.
pub fn parse_game_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(s, "%b %d, %Y").ok())
}
