//! In-memory `StatsSource` for tests.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::source::StatsSource;

#[derive(Debug, Clone)]
pub enum FakeResponse {
    Json(Value),
    Error(String),
    /// The call panics instead of answering.
    Panic,
}

/// Canned responses keyed by team id / game id. Unknown keys answer with a
/// body that has no `resultSets` container.
#[derive(Default)]
pub struct FakeStats {
    pub team_logs: HashMap<u32, FakeResponse>,
    pub games: HashMap<String, FakeResponse>,
    /// Held inside each win-probability call to widen the in-flight window.
    pub game_latency: Duration,
    pub requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(mut self, team_id: u32, response: FakeResponse) -> Self {
        self.team_logs.insert(team_id, response);
        self
    }

    pub fn with_game(mut self, game_id: &str, response: FakeResponse) -> Self {
        self.games.insert(game_id.to_string(), response);
        self
    }

    pub fn with_game_latency(mut self, latency: Duration) -> Self {
        self.game_latency = latency;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn request_log(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn game_requests(&self) -> usize {
        self.request_log()
            .iter()
            .filter(|r| r.starts_with("game:"))
            .count()
    }

    fn answer(response: Option<&FakeResponse>) -> Result<Value> {
        match response {
            Some(FakeResponse::Json(v)) => Ok(v.clone()),
            Some(FakeResponse::Error(msg)) => Err(anyhow::anyhow!("{}", msg)),
            Some(FakeResponse::Panic) => panic!("upstream handler blew up"),
            None => Ok(json!({ "message": "no data" })),
        }
    }
}

#[async_trait]
impl StatsSource for FakeStats {
    fn name(&self) -> &str {
        "fake"
    }

    async fn team_game_log(&self, team_id: u32) -> Result<Value> {
        self.requests.lock().unwrap().push(format!("team:{}", team_id));
        Self::answer(self.team_logs.get(&team_id))
    }

    async fn win_probability(&self, game_id: &str) -> Result<Value> {
        self.requests.lock().unwrap().push(format!("game:{}", game_id));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.game_latency.is_zero() {
            tokio::time::sleep(self.game_latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Self::answer(self.games.get(game_id))
    }
}

/// A `leaguegamefinder` body for one team with the given (game id, date) rows.
pub fn game_log(team_id: u32, abbreviation: &str, games: &[(&str, &str)]) -> Value {
    let rows: Vec<Value> = games
        .iter()
        .map(|(game_id, date)| {
            json!([
                "22022",
                team_id,
                abbreviation,
                game_id,
                date,
                format!("{} vs. OPP", abbreviation),
                "W",
                112
            ])
        })
        .collect();
    json!({
        "resource": "leaguegamefinder",
        "resultSets": [{
            "name": "LeagueGameFinderResults",
            "headers": ["SEASON_ID", "TEAM_ID", "TEAM_ABBREVIATION", "GAME_ID",
                        "GAME_DATE", "MATCHUP", "WL", "PTS"],
            "rowSet": rows
        }]
    })
}

/// A `winprobabilitypbp` body with the requested result sets.
pub fn win_probability_body(game_id: &str, with_pbp: bool, with_info: bool) -> Value {
    let mut sets = Vec::new();
    if with_pbp {
        sets.push(json!({
            "name": "WinProbPBP",
            "headers": ["GAME_ID", "EVENT_NUM", "HOME_PCT", "VISITOR_PCT",
                        "HOME_PTS", "VISITOR_PTS", "HOME_SCORE_MARGIN", "PERIOD",
                        "SECONDS_REMAINING", "DESCRIPTION"],
            "rowSet": [
                [game_id, 1, 0.55, 0.45, 0, 0, 0, 1, 720.0, "Jump Ball"],
                [game_id, 2, 0.58, 0.42, 2, 0, 2, 1, 701.0, null]
            ]
        }));
    }
    if with_info {
        sets.push(json!({
            "name": "GameInfo",
            "headers": ["GAME_ID", "GAME_DATE", "HOME_TEAM_ID", "HOME_TEAM_ABR",
                        "HOME_TEAM_PTS", "VISITOR_TEAM_ID", "VISITOR_TEAM_ABR",
                        "VISITOR_TEAM_PTS"],
            "rowSet": [[game_id, "2023-01-01", 1610612738, "BOS", 112,
                        1610612749, "MIL", 101]]
        }));
    }
    json!({ "resource": "winprobabilitypbp", "resultSets": sets })
}
