use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockall::automock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    config::AppConfig,
    database::catalog::{FootballMatch, FootballStream},
    server::error::{AppResult, Error},
};

pub type DynFootballService = Arc<dyn FootballServiceTrait + Send + Sync>;

const HOME_FEED_LIMIT: usize = 7;
// a match that kicked off less than this long ago is still worth showing
const RECENT_GRACE_MS: i64 = 2 * 60 * 60 * 1000;

#[automock]
#[async_trait]
pub trait FootballServiceTrait {
    async fn football_matches(&self) -> AppResult<Vec<FootballMatch>>;
    async fn live_football(&self) -> AppResult<Vec<FootballMatch>>;
    async fn football_match(&self, id: &str) -> AppResult<Option<FootballMatch>>;
    async fn stream(&self, source: &str, id: &str) -> AppResult<Vec<FootballStream>>;
    /// embed url of the first stream of the first source
    async fn watch_link(&self, id: &str) -> AppResult<String>;
}

pub struct FootballService {
    http_client: reqwest::Client,
    api_url: String,
}

impl FootballService {
    pub fn new(config: &AppConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            api_url: config.football_api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> AppResult<Vec<T>> {
        let payload: Value = self.get(path).await?;

        parse_each(&payload).ok_or_else(|| {
            error!("{} did not return a list", path);
            Error::Upstream(format!("football api returned no list for {}", path))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self
            .http_client
            .get(format!("{}{}", self.api_url, path))
            .send()
            .await
            .map_err(|e| {
                error!("Error fetching {}: {}", path, e);
                Error::Upstream(format!("football request failed: {}", e))
            })?;

        if !response.status().is_success() {
            error!("{} returned status: {}", path, response.status());
            return Err(Error::Upstream(format!(
                "football api returned status: {}",
                response.status()
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

/// parses every entry of a json array on its own, one odd entry doesn't cost the whole list.
/// `None` when the payload isn't an array at all
pub fn parse_each<T: DeserializeOwned>(payload: &Value) -> Option<Vec<T>> {
    let entries = payload.as_array()?;

    Some(
        entries
            .iter()
            .filter_map(|entry| match serde_json::from_value::<T>(entry.clone()) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("skipping malformed football entry: {}", e);
                    None
                }
            })
            .collect(),
    )
}

fn day_of(date_ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(date_ms).map(|d| d.date_naive())
}

/// distinct utc days that have at least one match, earliest first
pub fn available_dates(matches: &[FootballMatch]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = matches.iter().filter_map(|m| day_of(m.date)).collect();
    dates.sort();
    dates.dedup();
    dates
}

pub fn matches_on(matches: &[FootballMatch], day: NaiveDate) -> Vec<FootballMatch> {
    matches
        .iter()
        .filter(|m| day_of(m.date) == Some(day))
        .cloned()
        .collect()
}

/// what the home feed shows: anything that started within the last two hours or later, soonest
/// first, a handful at most
pub fn upcoming(mut matches: Vec<FootballMatch>, now_ms: i64) -> Vec<FootballMatch> {
    matches.retain(|m| m.date > now_ms - RECENT_GRACE_MS);
    matches.sort_by_key(|m| m.date);
    matches.truncate(HOME_FEED_LIMIT);
    matches
}

#[async_trait]
impl FootballServiceTrait for FootballService {
    async fn football_matches(&self) -> AppResult<Vec<FootballMatch>> {
        self.get_list("/matches/football").await
    }

    async fn live_football(&self) -> AppResult<Vec<FootballMatch>> {
        self.get_list("/matches/live").await
    }

    async fn football_match(&self, id: &str) -> AppResult<Option<FootballMatch>> {
        Ok(self
            .football_matches()
            .await?
            .into_iter()
            .find(|m| m.id == id))
    }

    async fn stream(&self, source: &str, id: &str) -> AppResult<Vec<FootballStream>> {
        self.get_list(&format!(
            "/stream/{}/{}",
            urlencoding::encode(source),
            urlencoding::encode(id)
        ))
        .await
    }

    async fn watch_link(&self, id: &str) -> AppResult<String> {
        let football_match = self
            .football_match(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("match {} not found", id)))?;

        let source = football_match
            .sources
            .first()
            .ok_or_else(|| Error::NotFound(format!("match {} has no sources", id)))?;

        let streams = self.stream(&source.source, &source.id).await?;
        let first = streams
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no streams for match {}", id)))?;

        let embed_url = first
            .embed_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::NotFound(format!("stream for match {} has no embed url", id)))?;

        info!("watch link for match {} via {}", id, source.source);
        Ok(embed_url)
    }
}
