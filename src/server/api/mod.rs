pub mod catalog_controller;
pub mod football_controller;
pub mod health_controller;
pub mod moviebox_controller;
pub mod proxy_controller;
pub mod sflix_controller;
pub mod sports_controller;
pub mod tmdb_controller;

use axum::{Router, routing::get};

use catalog_controller::CatalogController;
use football_controller::FootballController;
use moviebox_controller::MovieboxController;
use proxy_controller::ProxyController;
use sflix_controller::SflixController;
use sports_controller::SportsController;
use tmdb_controller::TmdbController;

/// every route under /api/v1
pub fn app() -> Router {
    Router::new()
        .route("/health", get(health_controller::health_endpoint))
        .nest("/moviebox", MovieboxController::app())
        .nest("/catalog", CatalogController::app())
        .nest("/tmdb", TmdbController::app())
        .nest("/sports", SportsController::app())
        .nest("/football", FootballController::app())
        .nest("/sflix", SflixController::app())
        .nest("/proxy", ProxyController::app())
}
