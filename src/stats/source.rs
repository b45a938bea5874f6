use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait every upstream stats backend must implement.
///
/// Both calls return the raw JSON body; interpreting the `resultSets`
/// container is left to the caller.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Full game log for one team (not date-filtered upstream).
    async fn team_game_log(&self, team_id: u32) -> Result<Value>;

    /// Second-by-second win probability and game info for one game.
    async fn win_probability(&self, game_id: &str) -> Result<Value>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
