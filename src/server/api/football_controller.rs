use axum::{Extension, Json, Router, extract::Path, routing::get};
use tracing::info;

use crate::{
    database::catalog::{FootballMatch, FootballStream},
    server::{
        dtos::catalog_dto::{DateQuery, DatesResponse, WatchLinkResponse},
        error::{AppResult, Error},
        extractors::ValidatedQuery,
        services::{
            app_services::AppServices,
            football_services::{available_dates, matches_on},
        },
    },
};

pub struct FootballController;

impl FootballController {
    pub fn app() -> Router {
        Router::new()
            .route("/matches", get(Self::matches_endpoint))
            .route("/matches/{id}", get(Self::match_endpoint))
            .route("/live", get(Self::live_endpoint))
            .route("/dates", get(Self::dates_endpoint))
            .route("/stream/{source}/{id}", get(Self::stream_endpoint))
            .route("/watch/{id}", get(Self::watch_endpoint))
    }

    /// GET /api/v1/football/matches?date=YYYY-MM-DD
    ///
    /// every league, `date` narrows it down to one utc day
    pub async fn matches_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<DateQuery>,
    ) -> AppResult<Json<Vec<FootballMatch>>> {
        let matches = services.football.football_matches().await?;

        Ok(Json(match params.date {
            Some(day) => matches_on(&matches, day),
            None => matches,
        }))
    }

    pub async fn live_endpoint(
        Extension(services): Extension<AppServices>,
    ) -> AppResult<Json<Vec<FootballMatch>>> {
        Ok(Json(services.football.live_football().await?))
    }

    pub async fn match_endpoint(
        Extension(services): Extension<AppServices>,
        Path(id): Path<String>,
    ) -> AppResult<Json<FootballMatch>> {
        let found = services
            .football
            .football_match(&id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("match {} not found", id)))?;

        Ok(Json(found))
    }

    /// GET /api/v1/football/dates
    pub async fn dates_endpoint(
        Extension(services): Extension<AppServices>,
    ) -> AppResult<Json<DatesResponse>> {
        let matches = services.football.football_matches().await?;

        Ok(Json(DatesResponse {
            dates: available_dates(&matches),
        }))
    }

    pub async fn stream_endpoint(
        Extension(services): Extension<AppServices>,
        Path((source, id)): Path<(String, String)>,
    ) -> AppResult<Json<Vec<FootballStream>>> {
        Ok(Json(services.football.stream(&source, &id).await?))
    }

    /// GET /api/v1/football/watch/{id}
    ///
    /// embed url of the first stream, 404 says which step came up empty
    pub async fn watch_endpoint(
        Extension(services): Extension<AppServices>,
        Path(id): Path<String>,
    ) -> AppResult<Json<WatchLinkResponse>> {
        let embed_url = services.football.watch_link(&id).await?;
        info!("watch link for {}: {}", id, embed_url);

        Ok(Json(WatchLinkResponse { id, embed_url }))
    }
}
