use axum::{
    Extension, Json, Router,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;
use tracing::debug;

use crate::server::{
    dtos::catalog_dto::MovieboxQuery,
    error::{AppResult, Error},
    extractors::ValidatedQuery,
    services::{
        app_services::AppServices,
        moviebox_services::{DEFAULT_SEARCH_PAGE_SIZE, DEFAULT_SUGGESTION_PAGE_SIZE},
    },
};

// lets a cdn in front of us hold on to the raw listings
const CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=59";

/// upstream endpoints that can be passed through untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieboxEndpoint {
    Trending,
    Movies,
    Series,
    Search,
    Suggestions,
    Sources,
    Details,
}

impl MovieboxEndpoint {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "trending" => Self::Trending,
            "movies" => Self::Movies,
            "series" => Self::Series,
            "search" => Self::Search,
            "suggestions" => Self::Suggestions,
            "sources" => Self::Sources,
            "details" => Self::Details,
            _ => return None,
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> AppResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::BadRequest(format!("{} is required", name)))
}

pub struct MovieboxController;

impl MovieboxController {
    pub fn app() -> Router {
        Router::new().route("/", get(Self::moviebox_endpoint))
    }

    /// GET /api/v1/moviebox?endpoint=...
    ///
    /// raw upstream json, nothing normalized. `query` for search and suggestions, `id` and
    /// `detailPath` for sources, `detailPath` for details
    pub async fn moviebox_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<MovieboxQuery>,
    ) -> AppResult<Response> {
        let endpoint = MovieboxEndpoint::parse(&params.endpoint)
            .ok_or_else(|| Error::BadRequest("Invalid endpoint".to_string()))?;
        debug!("moviebox passthrough: {:?}", endpoint);

        let moviebox = &services.moviebox;
        let body: Value = match endpoint {
            MovieboxEndpoint::Trending => moviebox.trending().await?,
            MovieboxEndpoint::Movies => moviebox.movies().await?,
            MovieboxEndpoint::Series => moviebox.series().await?,
            MovieboxEndpoint::Search => {
                let query = required(params.query.as_deref(), "query")?;
                moviebox
                    .search(query, params.page, DEFAULT_SEARCH_PAGE_SIZE)
                    .await?
            }
            MovieboxEndpoint::Suggestions => {
                let query = required(params.query.as_deref(), "query")?;
                moviebox
                    .suggestions(query, DEFAULT_SUGGESTION_PAGE_SIZE)
                    .await?
            }
            MovieboxEndpoint::Sources => {
                let id = required(params.id.as_deref(), "id")?;
                let detail_path = required(params.detail_path.as_deref(), "detailPath")?;
                moviebox
                    .sources(id, detail_path, params.season, params.episode)
                    .await?
            }
            MovieboxEndpoint::Details => {
                let detail_path = required(params.detail_path.as_deref(), "detailPath")?;
                moviebox.details(detail_path).await?
            }
        };

        let mut response = Json(body).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));

        Ok(response)
    }
}
