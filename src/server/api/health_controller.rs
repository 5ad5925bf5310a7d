use axum::Extension;
use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::error;

use crate::logger::Logger;
use crate::server::dtos::health_dto::{
    HealthResponse, HealthStatus, RedisHealth, ServiceHealthDetails,
};
use crate::server::services::app_services::AppServices;
use crate::server::{get_app_version, get_uptime_seconds};

/// health endpoint, redis is the only dependency we own so it's the only one checked. Upstreams
/// going down shows up as empty lists, not as an unhealthy instance
pub async fn health_endpoint(
    Extension(services): Extension<AppServices>,
) -> (StatusCode, Json<HealthResponse>) {
    let redis_health = check_redis_health(&services).await;

    let response = HealthResponse {
        status: redis_health.status,
        timestamp: Utc::now(),
        uptime_seconds: get_uptime_seconds(),
        version: get_app_version().to_string(),
        environment: Logger::environment_name(services.config.cargo_env).to_string(),
        services: ServiceHealthDetails {
            redis: redis_health,
        },
    };

    let http_status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (http_status, Json(response))
}

async fn check_redis_health(services: &AppServices) -> RedisHealth {
    match services.redis.health_check().await {
        // a slow redis still answers, it just makes every cached call slow
        Ok(response_time) if response_time > 500.0 => RedisHealth {
            status: HealthStatus::Degraded,
            response_time_ms: response_time,
        },
        Ok(response_time) => RedisHealth {
            status: HealthStatus::Healthy,
            response_time_ms: response_time,
        },
        Err(e) => {
            error!("Redis health check failed: {:#}", e);
            RedisHealth {
                status: HealthStatus::Unhealthy,
                response_time_ms: 0.0,
            }
        }
    }
}
