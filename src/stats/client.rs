use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::source::StatsSource;

pub const DEFAULT_BASE_URL: &str = "https://stats.nba.com/stats";

/// Headers stats.nba.com expects from a browser. Without the origin/token
/// pair the service tends to hang rather than reject.
///
/// `Accept-Encoding` is left to reqwest so it only advertises encodings it
/// can decode (gzip).
const STATS_HEADERS: &[(&str, &str)] = &[
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:72.0) Gecko/20100101 Firefox/72.0",
    ),
    ("accept", "application/json, text/plain, */*"),
    ("accept-language", "en-US,en;q=0.5"),
    ("x-nba-stats-origin", "stats"),
    ("x-nba-stats-token", "true"),
    ("connection", "keep-alive"),
    ("referer", "https://stats.nba.com/"),
    ("pragma", "no-cache"),
    ("cache-control", "no-cache"),
];

/// Client for the stats.nba.com JSON endpoints.
#[derive(Clone)]
pub struct StatsClient {
    http: Client,
    base_url: String,
}

impl StatsClient {
    pub fn new(base_url: &str, timeout: Duration, max_connections: usize) -> Result<Self> {
        let http = Client::builder()
            .default_headers(default_headers())
            .timeout(timeout)
            .pool_max_idle_per_host(max_connections)
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(StatsClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self.endpoint_url(endpoint);
        debug!("GET {} {:?}", url, params);

        let resp = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .with_context(|| format!("stats request to {} failed", endpoint))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("stats API error {} from {}: {}", status, endpoint, body);
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse {} response", endpoint))
    }
}

#[async_trait]
impl StatsSource for StatsClient {
    fn name(&self) -> &str {
        "stats.nba.com"
    }

    async fn team_game_log(&self, team_id: u32) -> Result<Value> {
        self.get_json(
            "leaguegamefinder",
            &[
                ("PlayerOrTeam", "T".to_string()),
                ("TeamID", team_id.to_string()),
            ],
        )
        .await
    }

    async fn win_probability(&self, game_id: &str) -> Result<Value> {
        self.get_json(
            "winprobabilitypbp",
            &[
                ("GameID", game_id.to_string()),
                ("RunType", "each second".to_string()),
            ],
        )
        .await
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(STATS_HEADERS.len());
    for &(name, value) in STATS_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}
