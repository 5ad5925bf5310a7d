use axum::{Extension, Json, Router, routing::get};
use serde_json::Value;
use tracing::info;

use crate::{
    database::catalog::{MediaDetails, MediaItem, PlayerLink},
    server::{
        dtos::catalog_dto::{
            DetailsQuery, HomeFeed, KeywordQuery, PlayerQuery, SearchQuery, SourcesQuery,
            SourcesResponse,
        },
        error::{AppResult, Error},
        extractors::ValidatedQuery,
        services::app_services::AppServices,
        utils::normalize::{has_resource, playable_streams},
    },
};

pub struct CatalogController;

impl CatalogController {
    pub fn app() -> Router {
        Router::new()
            .route("/home", get(Self::home_endpoint))
            .route("/trending", get(Self::trending_endpoint))
            .route("/movies", get(Self::movies_endpoint))
            .route("/series", get(Self::series_endpoint))
            .route("/animations", get(Self::animations_endpoint))
            .route("/festive", get(Self::festive_endpoint))
            .route("/search", get(Self::search_endpoint))
            .route("/suggestions", get(Self::suggestions_endpoint))
            .route("/details", get(Self::details_endpoint))
            .route("/sources", get(Self::sources_endpoint))
            .route("/player", get(Self::player_endpoint))
    }

    /// GET /api/v1/catalog/home
    ///
    /// every row of the landing page in one go, rows that failed upstream come back empty
    pub async fn home_endpoint(Extension(services): Extension<AppServices>) -> Json<HomeFeed> {
        Json(services.catalog.home_feed().await)
    }

    pub async fn trending_endpoint(
        Extension(services): Extension<AppServices>,
    ) -> Json<Vec<MediaItem>> {
        Json(services.catalog.trending().await)
    }

    pub async fn movies_endpoint(
        Extension(services): Extension<AppServices>,
    ) -> Json<Vec<MediaItem>> {
        Json(services.catalog.movies().await)
    }

    pub async fn series_endpoint(
        Extension(services): Extension<AppServices>,
    ) -> Json<Vec<MediaItem>> {
        Json(services.catalog.series().await)
    }

    pub async fn animations_endpoint(
        Extension(services): Extension<AppServices>,
    ) -> Json<Vec<MediaItem>> {
        Json(services.catalog.animations().await)
    }

    pub async fn festive_endpoint(
        Extension(services): Extension<AppServices>,
    ) -> Json<Vec<MediaItem>> {
        Json(services.catalog.festive().await)
    }

    /// GET /api/v1/catalog/search?q=&page=
    pub async fn search_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<SearchQuery>,
    ) -> Json<Vec<MediaItem>> {
        Json(services.catalog.search(&params.q, params.page).await)
    }

    pub async fn suggestions_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<KeywordQuery>,
    ) -> Json<Vec<MediaItem>> {
        Json(services.catalog.suggestions(&params.q).await)
    }

    /// GET /api/v1/catalog/details?id=&detailPath=
    pub async fn details_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<DetailsQuery>,
    ) -> AppResult<Json<MediaDetails>> {
        let details = services
            .catalog
            .details(params.id, &params.detail_path)
            .await
            .ok_or_else(|| Error::NotFound(format!("no details for {}", params.detail_path)))?;

        Ok(Json(details))
    }

    /// GET /api/v1/catalog/sources?id=&detailPath=&season=&episode=
    ///
    /// `raw` is the untouched upstream payload, null when upstream failed
    pub async fn sources_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<SourcesQuery>,
    ) -> Json<SourcesResponse> {
        let raw = services
            .catalog
            .sources(&params.id, &params.detail_path, params.season, params.episode)
            .await
            .unwrap_or(Value::Null);

        Json(SourcesResponse {
            has_resource: has_resource(&raw),
            streams: playable_streams(&raw),
            raw,
        })
    }

    /// GET /api/v1/catalog/player?title=
    pub async fn player_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<PlayerQuery>,
    ) -> AppResult<Json<PlayerLink>> {
        let link = services
            .catalog
            .resolve_player(&params.title)
            .await
            .ok_or_else(|| Error::NotFound(format!("no player for {}", params.title)))?;
        info!("player link for {}: {}", params.title, link.url);

        Ok(Json(link))
    }
}
