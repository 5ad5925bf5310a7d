use axum::{Extension, Json, Router, extract::Path, routing::get};
use serde_json::Value;
use tracing::error;

use crate::{
    database::catalog::EnrichedMedia,
    server::{
        dtos::catalog_dto::{EnrichQuery, FindQuery, KeywordQuery, TrendingQuery},
        error::{AppResult, Error},
        extractors::ValidatedQuery,
        services::{app_services::AppServices, tmdb_services::{MediaSeed, MediaType}},
    },
};

pub struct TmdbController;

impl TmdbController {
    pub fn app() -> Router {
        Router::new()
            .route("/search", get(Self::search_endpoint))
            .route("/trending", get(Self::trending_endpoint))
            .route("/enrich", get(Self::enrich_endpoint))
            .route("/find/{media_type}", get(Self::find_endpoint))
            .route("/{media_type}/{id}", get(Self::details_endpoint))
    }

    /// GET /api/v1/tmdb/search?q=
    pub async fn search_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<KeywordQuery>,
    ) -> Json<Vec<Value>> {
        let results = services
            .tmdb
            .search_multi(&params.q)
            .await
            .unwrap_or_else(|e| {
                error!("TMDb search failed: {}", e);
                Vec::new()
            });

        Json(results)
    }

    /// GET /api/v1/tmdb/trending?window=day|week
    pub async fn trending_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<TrendingQuery>,
    ) -> Json<Vec<Value>> {
        let results = services
            .tmdb
            .trending(params.window)
            .await
            .unwrap_or_else(|e| {
                error!("TMDb trending failed: {}", e);
                Vec::new()
            });

        Json(results)
    }

    /// GET /api/v1/tmdb/{movie|tv}/{id}
    pub async fn details_endpoint(
        Extension(services): Extension<AppServices>,
        Path((media_type, id)): Path<(MediaType, i64)>,
    ) -> AppResult<Json<Value>> {
        Ok(Json(services.tmdb.details(id, media_type).await?))
    }

    /// GET /api/v1/tmdb/find/{movie|tv}?imdbId=&title=&year=
    ///
    /// imdb id wins when both are given
    pub async fn find_endpoint(
        Extension(services): Extension<AppServices>,
        Path(media_type): Path<MediaType>,
        ValidatedQuery(params): ValidatedQuery<FindQuery>,
    ) -> AppResult<Json<Value>> {
        if params.imdb_id.is_none() && params.title.is_none() {
            return Err(Error::BadRequest(
                "either imdbId or title is required".to_string(),
            ));
        }

        let details = services
            .tmdb
            .find_details(params.imdb_id, params.title, params.year, media_type)
            .await?
            .ok_or_else(|| Error::NotFound("nothing on TMDb for that".to_string()))?;

        Ok(Json(details))
    }

    /// GET /api/v1/tmdb/enrich?title=&year=&poster=&rating=
    ///
    /// falls back to what was passed in when TMDb has nothing or is down
    pub async fn enrich_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<EnrichQuery>,
    ) -> Json<EnrichedMedia> {
        let seed: MediaSeed = params.into();

        match services.tmdb.enrich(seed.clone()).await {
            Ok(enriched) => Json(enriched),
            Err(e) => {
                error!("TMDb enrich failed for {}: {}", seed.title, e);
                Json(seed.into())
            }
        }
    }
}
