pub mod api;
pub mod dtos;
pub mod error;
pub mod extractors;
pub mod services;
pub mod utils;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::{
    Extension, Json, Router, ServiceExt,
    error_handling::HandleErrorLayer,
    extract::Request,
    http::{HeaderValue, Method, StatusCode, header},
};
use once_cell::sync::Lazy;
use serde_json::{Value, json};
use tower::{BoxError, ServiceBuilder, Layer};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    normalize_path::NormalizePathLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{config::AppConfig, database::RedisDatabase};
use services::app_services::AppServices;

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_IN_FLIGHT_REQUESTS: usize = 1024;

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn get_uptime_seconds() -> u64 {
    START_TIME.elapsed().as_secs()
}

/// `*` anywhere opens it up to everyone, otherwise both comma separated lists are allowed
pub fn allowed_origins(config: &AppConfig) -> AllowOrigin {
    let raw = [config.cors_origin.as_str(), config.preview_cors_origin.as_str()];

    if raw.iter().any(|list| list.split(',').any(|o| o.trim() == "*")) {
        return AllowOrigin::any();
    }

    let origins: Vec<HeaderValue> = raw
        .iter()
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!("ignoring invalid cors origin: {}", o);
                None
            }
        })
        .collect();

    AllowOrigin::list(origins)
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "request timed out" })),
        )
    } else {
        error!("unhandled middleware error: {}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "unexpected error occurred" })),
        )
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
    info!("shutting down...");
}

pub struct ApplicationServer;

impl ApplicationServer {
    /// the full router with middleware, minus path normalization which has to wrap it from the
    /// outside to run before routing
    pub fn router(services: AppServices) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(allowed_origins(&services.config))
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::RANGE])
            .expose_headers([
                header::CONTENT_RANGE,
                header::CONTENT_LENGTH,
                header::ACCEPT_RANGES,
            ]);

        Router::new()
            .nest("/api/v1", api::app())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(HandleErrorLayer::new(handle_middleware_error))
                    .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                    .concurrency_limit(MAX_IN_FLIGHT_REQUESTS)
                    .layer(cors)
                    .layer(Extension(services)),
            )
    }

    pub async fn serve(config: Arc<AppConfig>, redis_db: RedisDatabase) -> anyhow::Result<()> {
        Lazy::force(&START_TIME);

        let services = AppServices::new(redis_db, config.clone());
        services.catalog.purge().await;
        let router = Self::router(services);
        let app = NormalizePathLayer::trim_trailing_slash().layer(router);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("failed to bind the listener")?;

        info!("routes initialized, listening on port {}", config.port);

        axum::serve(
            listener,
            ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("error while starting the server")?;

        Ok(())
    }
}
