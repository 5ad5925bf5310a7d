use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{
    database::catalog::{FootballMatch, MediaItem, StreamSource},
    server::services::tmdb_services::{MediaSeed, TimeWindow},
};

/// everything the landing page shows, in one round trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeFeed {
    pub trending: Vec<MediaItem>,
    pub movies: Vec<MediaItem>,
    pub series: Vec<MediaItem>,
    pub festive: Vec<MediaItem>,
    pub animations: Vec<MediaItem>,
    pub football: Vec<FootballMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourcesResponse {
    pub has_resource: bool,
    pub streams: Vec<StreamSource>,
    pub raw: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatesResponse {
    pub dates: Vec<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchLinkResponse {
    pub id: String,
    pub embed_url: String,
}

fn default_page() -> u32 {
    1
}

fn default_season() -> u32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, message = "query can't be empty"))]
    pub q: String,
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "pages start at 1"))]
    pub page: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct KeywordQuery {
    #[validate(length(min = 1, message = "query can't be empty"))]
    pub q: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DetailsQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 1, message = "detailPath is required"))]
    pub detail_path: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SourcesQuery {
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "detailPath is required"))]
    pub detail_path: String,
    #[serde(default = "default_season")]
    #[validate(range(min = 1, message = "seasons start at 1"))]
    pub season: u32,
    #[serde(default = "default_season")]
    #[validate(range(min = 1, message = "episodes start at 1"))]
    pub episode: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlayerQuery {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TrendingQuery {
    #[serde(default)]
    pub window: TimeWindow,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EnrichQuery {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    pub rating: Option<String>,
    pub overview: Option<String>,
}

impl From<EnrichQuery> for MediaSeed {
    fn from(query: EnrichQuery) -> Self {
        Self {
            title: query.title,
            year: query.year,
            poster: query.poster,
            rating: query.rating,
            overview: query.overview,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FindQuery {
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
}

/// `/moviebox?endpoint=` passthrough, which of the optional fields matter depends on the endpoint
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MovieboxQuery {
    #[validate(length(min = 1, message = "endpoint is required"))]
    pub endpoint: String,
    pub query: Option<String>,
    pub id: Option<String>,
    pub detail_path: Option<String>,
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "pages start at 1"))]
    pub page: u32,
    #[serde(default = "default_season")]
    #[validate(range(min = 1, message = "seasons start at 1"))]
    pub season: u32,
    #[serde(default = "default_season")]
    #[validate(range(min = 1, message = "episodes start at 1"))]
    pub episode: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DateQuery {
    pub date: Option<chrono::NaiveDate>,
}
