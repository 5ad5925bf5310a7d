use axum::{Extension, Json, Router, extract::Path, routing::get};

use crate::{
    database::catalog::Match,
    server::{
        error::{AppResult, Error},
        services::app_services::AppServices,
    },
};

pub struct SportsController;

impl SportsController {
    pub fn app() -> Router {
        Router::new()
            .route("/live", get(Self::live_endpoint))
            .route("/live/{id}", get(Self::match_endpoint))
    }

    /// GET /api/v1/sports/live
    ///
    /// upcoming and in progress football, leagues flattened into one list
    pub async fn live_endpoint(
        Extension(services): Extension<AppServices>,
    ) -> AppResult<Json<Vec<Match>>> {
        Ok(Json(services.sports.live_matches().await?))
    }

    pub async fn match_endpoint(
        Extension(services): Extension<AppServices>,
        Path(id): Path<String>,
    ) -> AppResult<Json<Match>> {
        let found = services
            .sports
            .match_by_id(&id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("match {} not found", id)))?;

        Ok(Json(found))
    }
}
