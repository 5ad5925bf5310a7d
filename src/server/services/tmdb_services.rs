use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    config::AppConfig,
    database::catalog::{EnrichedMedia, SimilarItem},
    server::error::{AppResult, Error},
};

pub type DynTmdbService = Arc<dyn TmdbServiceTrait + Send + Sync>;

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const SIMILAR_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    /// search/multi tags every result, anything that isn't tv is treated as a movie
    pub fn from_result(result: &Value) -> Self {
        match result.get("media_type").and_then(Value::as_str) {
            Some("tv") => Self::Tv,
            _ => Self::Movie,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

/// what the front end already knows about a title before tmdb gets asked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaSeed {
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

#[automock]
#[async_trait]
pub trait TmdbServiceTrait {
    async fn search_multi(&self, query: &str) -> AppResult<Vec<Value>>;
    async fn details(&self, id: i64, media_type: MediaType) -> AppResult<Value>;
    async fn trending(&self, window: TimeWindow) -> AppResult<Vec<Value>>;
    /// imdb id lookup first, title search second, then the full record
    async fn find_details(
        &self,
        imdb_id: Option<String>,
        title: Option<String>,
        year: Option<String>,
        media_type: MediaType,
    ) -> AppResult<Option<Value>>;
    async fn enrich(&self, seed: MediaSeed) -> AppResult<EnrichedMedia>;
}

pub struct TmdbService {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbService {
    pub fn new(config: &AppConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            api_key: config.tmdb_api_key.clone(),
        }
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> AppResult<Value> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, path))
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                error!("TMDb request {} failed: {}", path, e);
                Error::Upstream(format!("tmdb request failed: {}", e))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("tmdb has nothing at {}", path)));
        }
        if !status.is_success() {
            error!("TMDb {} returned status: {}", path, status);
            return Err(Error::Upstream(format!("tmdb returned status: {}", status)));
        }

        Ok(response.json::<Value>().await?)
    }

    async fn find_id(
        &self,
        imdb_id: Option<&str>,
        title: Option<&str>,
        year: Option<&str>,
        media_type: MediaType,
    ) -> AppResult<Option<i64>> {
        if let Some(imdb_id) = imdb_id.filter(|id| !id.is_empty()) {
            let found = self
                .get(
                    &find_path(imdb_id),
                    &[("external_source", "imdb_id")],
                )
                .await?;
            let key = match media_type {
                MediaType::Movie => "movie_results",
                MediaType::Tv => "tv_results",
            };
            if let Some(id) = first_id(found.get(key)) {
                return Ok(Some(id));
            }
        }

        if let Some(title) = title.filter(|t| !t.is_empty()) {
            let mut params = vec![("query", title)];
            if let Some(year) = year.filter(|y| !y.is_empty()) {
                params.push(("year", year));
            }
            let found = self
                .get(&format!("/search/{}", media_type.as_str()), &params)
                .await?;
            return Ok(first_id(found.get("results")));
        }

        Ok(None)
    }
}

fn first_id(results: Option<&Value>) -> Option<i64> {
    results?.as_array()?.first()?.get("id")?.as_i64()
}

fn results_of(value: Value) -> Vec<Value> {
    match value {
        Value::Object(mut fields) => match fields.remove("results") {
            Some(Value::Array(results)) => results,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn year_from(date: Option<&Value>) -> Option<String> {
    date.and_then(Value::as_str)
        .and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .map(str::to_string)
}

fn image_url(size: &str, path: Option<&Value>) -> Option<String> {
    path.and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}/{}{}", IMAGE_BASE, size, p))
}

/// the search result that best matches a title: exact title, or same release year, or the first
/// `/find` lookup path, the id is a path segment so it gets percent-encoded
pub fn find_path(imdb_id: &str) -> String {
    format!("/find/{}", urlencoding::encode(imdb_id.trim()))
}

pub fn pick_match<'a>(results: &'a [Value], title: &str, year: Option<&str>) -> Option<&'a Value> {
    let year = year.filter(|y| !y.is_empty());

    results
        .iter()
        .find(|result| {
            let same_title = result.get("title").and_then(Value::as_str) == Some(title);
            let same_year = match (year, result.get("release_date").and_then(Value::as_str)) {
                (Some(year), Some(date)) => date.starts_with(year),
                _ => false,
            };
            same_title || same_year
        })
        .or_else(|| results.first())
}

pub fn similar_items(details: &Value) -> Vec<SimilarItem> {
    details
        .get("recommendations")
        .and_then(|r| r.get("results"))
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .take(SIMILAR_LIMIT)
                .map(|r| SimilarItem {
                    id: r.get("id").and_then(Value::as_i64).unwrap_or_default(),
                    title: r
                        .get("title")
                        .or_else(|| r.get("name"))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    poster: image_url("w342", r.get("poster_path")),
                    rating: r
                        .get("vote_average")
                        .and_then(Value::as_f64)
                        .unwrap_or_default(),
                    year: year_from(r.get("release_date")).unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// folds tmdb details over what the catalog already had, tmdb wins wherever it has a value
pub fn merge_details(seed: &MediaSeed, details: &Value) -> EnrichedMedia {
    let overview = details
        .get("overview")
        .and_then(Value::as_str)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .or_else(|| seed.overview.clone())
        .unwrap_or_default();

    EnrichedMedia {
        title: seed.title.clone(),
        poster: image_url("w500", details.get("poster_path")).or_else(|| seed.poster.clone()),
        year: year_from(details.get("release_date"))
            .or_else(|| year_from(details.get("first_air_date")))
            .or_else(|| seed.year.clone())
            .unwrap_or_default(),
        rating: details
            .get("vote_average")
            .and_then(Value::as_f64)
            .map(|r| format!("{:.1}", r))
            .or_else(|| seed.rating.clone())
            .unwrap_or_default(),
        overview,
        backdrop: image_url("original", details.get("backdrop_path")),
        tmdb_id: details.get("id").and_then(Value::as_i64),
        similar: similar_items(details),
    }
}

impl From<MediaSeed> for EnrichedMedia {
    fn from(seed: MediaSeed) -> Self {
        Self {
            title: seed.title,
            poster: seed.poster,
            year: seed.year.unwrap_or_default(),
            rating: seed.rating.unwrap_or_default(),
            overview: seed.overview.unwrap_or_default(),
            backdrop: None,
            tmdb_id: None,
            similar: Vec::new(),
        }
    }
}

#[async_trait]
impl TmdbServiceTrait for TmdbService {
    async fn search_multi(&self, query: &str) -> AppResult<Vec<Value>> {
        let found = self.get("/search/multi", &[("query", query)]).await?;
        Ok(results_of(found))
    }

    async fn details(&self, id: i64, media_type: MediaType) -> AppResult<Value> {
        self.get(
            &format!("/{}/{}", media_type.as_str(), id),
            &[(
                "append_to_response",
                "credits,videos,recommendations,similar",
            )],
        )
        .await
    }

    async fn trending(&self, window: TimeWindow) -> AppResult<Vec<Value>> {
        let found = self
            .get(&format!("/trending/all/{}", window.as_str()), &[])
            .await?;
        Ok(results_of(found))
    }

    async fn find_details(
        &self,
        imdb_id: Option<String>,
        title: Option<String>,
        year: Option<String>,
        media_type: MediaType,
    ) -> AppResult<Option<Value>> {
        let Some(id) = self
            .find_id(
                imdb_id.as_deref(),
                title.as_deref(),
                year.as_deref(),
                media_type,
            )
            .await?
        else {
            return Ok(None);
        };

        let details = self
            .get(
                &format!("/{}/{}", media_type.as_str(), id),
                &[("append_to_response", "credits,reviews,recommendations")],
            )
            .await?;

        Ok(Some(details))
    }

    async fn enrich(&self, seed: MediaSeed) -> AppResult<EnrichedMedia> {
        let results = self.search_multi(&seed.title).await?;

        let Some(found) = pick_match(&results, &seed.title, seed.year.as_deref()) else {
            info!("no TMDb match for {}", seed.title);
            return Ok(seed.into());
        };

        let Some(id) = found.get("id").and_then(Value::as_i64) else {
            return Ok(seed.into());
        };

        let details = self.details(id, MediaType::from_result(found)).await?;
        Ok(merge_details(&seed, &details))
    }
}
