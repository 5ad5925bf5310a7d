use axum::{Extension, Json, Router, routing::get};
use tracing::error;

use crate::{
    database::catalog::SflixItem,
    server::{
        dtos::catalog_dto::KeywordQuery, extractors::ValidatedQuery,
        services::app_services::AppServices,
    },
};

pub struct SflixController;

impl SflixController {
    pub fn app() -> Router {
        Router::new().route("/search", get(Self::search_endpoint))
    }

    /// GET /api/v1/sflix/search?q=
    pub async fn search_endpoint(
        Extension(services): Extension<AppServices>,
        ValidatedQuery(params): ValidatedQuery<KeywordQuery>,
    ) -> Json<Vec<SflixItem>> {
        let items = services.sflix.search(&params.q).await.unwrap_or_else(|e| {
            error!("Sflix search failed: {}", e);
            Vec::new()
        });

        Json(items)
    }
}
