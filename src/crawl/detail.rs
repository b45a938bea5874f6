use anyhow::{Context, Result};
use serde_json::Value;

use crate::models::{FetchOutcome, GameDetail, Table};
use crate::stats::{parse_result_sets, StatsSource};

/// Result set carrying one row per tracked game state.
pub const WIN_PROBABILITY_SET: &str = "WinProbPBP";
/// Result set carrying the game summary rows.
pub const GAME_INFO_SET: &str = "GameInfo";

/// Fetch win probability and game info for one game.
///
/// Never returns an error: request and parse failures come back as
/// `FetchOutcome::Failed`, a body without result sets as `Empty`.
pub async fn fetch_game_detail(source: &dyn StatsSource, game_id: &str) -> FetchOutcome<GameDetail> {
    let res = async {
        let raw = source.win_probability(game_id).await?;
        parse_game_detail(&raw)
    }
    .await;
    res.into()
}

/// Pick the two tables out of a `winprobabilitypbp` body. Other result sets
/// are ignored even if they cannot be read.
pub fn parse_game_detail(raw: &Value) -> Result<Option<GameDetail>> {
    let Some(mut sets) = parse_result_sets(raw) else {
        return Ok(None);
    };

    let win_probability = sets
        .take(WIN_PROBABILITY_SET)
        .context("malformed win probability response")?;
    let game_info = sets
        .take(GAME_INFO_SET)
        .context("malformed win probability response")?;
    Ok(Some(GameDetail {
        win_probability: non_empty(win_probability),
        game_info: non_empty(game_info),
    }))
}

fn non_empty(table: Option<Table>) -> Option<Table> {
    table.filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fake::{win_probability_body, FakeResponse, FakeStats};
    use serde_json::json;

    const GAME: &str = "0022200601";

    #[tokio::test]
    async fn test_both_tables() {
        let source = FakeStats::new().with_game(GAME, FakeResponse::Json(win_probability_body(GAME, true, true)));
        match fetch_game_detail(&source, GAME).await {
            FetchOutcome::Data(detail) => {
                let wp = detail.win_probability.unwrap();
                assert_eq!(wp.len(), 2);
                assert_eq!(wp.columns[2], "home_pct");
                let info = detail.game_info.unwrap();
                assert_eq!(info.len(), 1);
                assert_eq!(info.columns[0], "game_id");
            }
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_one_table_missing() {
        let source = FakeStats::new().with_game(GAME, FakeResponse::Json(win_probability_body(GAME, false, true)));
        match fetch_game_detail(&source, GAME).await {
            FetchOutcome::Data(detail) => {
                assert!(detail.win_probability.is_none());
                assert!(detail.game_info.is_some());
            }
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_container_is_empty() {
        let source = FakeStats::new();
        assert!(fetch_game_detail(&source, GAME).await.is_empty());
    }

    #[tokio::test]
    async fn test_request_error_is_captured() {
        let source = FakeStats::new().with_game(GAME, FakeResponse::Error("connection refused".into()));
        match fetch_game_detail(&source, GAME).await {
            FetchOutcome::Failed(e) => assert!(e.to_string().contains("connection refused")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_result_set_is_failure() {
        let raw = json!({ "resultSets": [{ "name": "WinProbPBP", "headers": ["A"] }] });
        let source = FakeStats::new().with_game(GAME, FakeResponse::Json(raw));
        assert!(fetch_game_detail(&source, GAME).await.is_failed());
    }

    #[test]
    fn test_unrelated_broken_set_is_ignored() {
        let mut raw = win_probability_body(GAME, true, true);
        raw["resultSets"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "name": "Extra", "headers": ["A"] }));
        let detail = parse_game_detail(&raw).unwrap().unwrap();
        assert_eq!(detail.win_probability.unwrap().len(), 2);
        assert_eq!(detail.game_info.unwrap().len(), 1);
    }

    #[test]
    fn test_empty_row_sets_count_as_absent() {
        let raw = json!({
            "resultSets": [
                { "name": "WinProbPBP", "headers": ["GAME_ID"], "rowSet": [] },
                { "name": "GameInfo", "headers": ["GAME_ID"], "rowSet": [] }
            ]
        });
        let detail = parse_game_detail(&raw).unwrap().unwrap();
        assert!(detail.is_empty());
    }
}
