// live football off the aoneroom match list. There's no detail endpoint, the list already carries
// the play path so single matches are looked up in it.
use async_trait::async_trait;
use mockall::automock;
use reqwest::header;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    config::AppConfig,
    database::catalog::Match,
    server::error::{AppResult, Error},
};

pub type DynSportsService = Arc<dyn SportsServiceTrait + Send + Sync>;

const HOUR_MS: i64 = 60 * 60 * 1000;
// far enough back to still catch matches in progress, far enough ahead for the next two days
const WINDOW_BACK_MS: i64 = 12 * HOUR_MS;
const WINDOW_AHEAD_MS: i64 = 48 * HOUR_MS;

/// (start, end) in epoch millis of the listing window around `now_ms`
pub fn match_window(now_ms: i64) -> (i64, i64) {
    (now_ms - WINDOW_BACK_MS, now_ms + WINDOW_AHEAD_MS)
}

/// flattens the league groups of a match list response into one list
///
/// anything other than `code == 0` with a `data.list` array is treated as no matches. Matches
/// without their own league name inherit the group's.
pub fn flatten_match_list(payload: &Value) -> Vec<Match> {
    if payload.get("code").and_then(Value::as_i64) != Some(0) {
        return Vec::new();
    }

    let Some(groups) = payload
        .get("data")
        .and_then(|data| data.get("list"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    groups
        .iter()
        .flat_map(|group| {
            let league = group
                .get("league")
                .and_then(Value::as_str)
                .unwrap_or_default();

            group
                .get("matchList")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(move |raw| match serde_json::from_value::<Match>(raw.clone()) {
                    Ok(mut parsed) => {
                        if parsed.league.is_empty() {
                            parsed.league = league.to_string();
                        }
                        Some(parsed)
                    }
                    Err(e) => {
                        warn!("skipping malformed match: {}", e);
                        None
                    }
                })
        })
        .collect()
}

#[automock]
#[async_trait]
pub trait SportsServiceTrait {
    async fn live_matches(&self) -> AppResult<Vec<Match>>;
    async fn match_by_id(&self, id: &str) -> AppResult<Option<Match>>;
}

pub struct SportsService {
    http_client: reqwest::Client,
    api_url: String,
}

impl SportsService {
    pub fn new(config: &AppConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            api_url: config.sports_api_url.clone(),
        }
    }
}

#[async_trait]
impl SportsServiceTrait for SportsService {
    async fn live_matches(&self) -> AppResult<Vec<Match>> {
        let (start, end) = match_window(chrono::Utc::now().timestamp_millis());

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[
                // 0 covers upcoming and live
                ("status", "0".to_string()),
                ("matchType", "football".to_string()),
                ("startTime", start.to_string()),
                ("endTime", end.to_string()),
            ])
            .header(header::ORIGIN, "https://sportslive.run")
            .header(header::REFERER, "https://sportslive.run/")
            .send()
            .await
            .map_err(|e| {
                error!("Error fetching sports data: {}", e);
                Error::Upstream(format!("match list request failed: {}", e))
            })?;

        if !response.status().is_success() {
            error!("match list returned status: {}", response.status());
            return Err(Error::Upstream(format!(
                "match list returned status: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await?;
        let matches = flatten_match_list(&payload);
        info!("match list returned {} matches", matches.len());

        Ok(matches)
    }

    async fn match_by_id(&self, id: &str) -> AppResult<Option<Match>> {
        Ok(self
            .live_matches()
            .await?
            .into_iter()
            .find(|m| m.id == id))
    }
}
