use std::sync::Arc;

use redis::AsyncCommands;
use tracing::{debug, error, info, warn};

use crate::database::RedisDatabase;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// maximum requests per window for general API calls
    pub max_requests_per_window: u32,
    /// window duration in seconds for rate limiting
    pub window_seconds: u64,
    /// maximum errors before a user gets timed out
    pub max_errors_before_timeout: u32,
    /// error tracking window in seconds
    pub error_window_seconds: u64,
    /// timeout duration in seconds when error threshold is exceeded
    pub timeout_duration_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            // segment fetches add up fast while a stream plays
            max_requests_per_window: 500,
            window_seconds: 60,
            max_errors_before_timeout: 50,
            error_window_seconds: 600,
            timeout_duration_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateLimitResult {
    /// request is allowed
    Allowed { remaining: u32, reset_at: i64 },
    /// user has exceeded rate limit
    RateLimited { retry_after: u64 },
    /// user is timed out due to too many errors
    TimedOut { reason: String, retry_after: u64 },
}

/// what a window holding `count` requests with `ttl` seconds left means for the next request
pub fn window_verdict(config: &RateLimitConfig, count: u32, ttl: i64, now: i64) -> RateLimitResult {
    if count > config.max_requests_per_window {
        RateLimitResult::RateLimited {
            retry_after: ttl.max(1) as u64,
        }
    } else {
        RateLimitResult::Allowed {
            remaining: config.max_requests_per_window.saturating_sub(count),
            reset_at: now + ttl.max(0),
        }
    }
}

/// true once `count` errors inside the error window should time the client out
pub fn exceeds_error_budget(config: &RateLimitConfig, count: u32) -> bool {
    count >= config.max_errors_before_timeout
}

/// counts one hit in the fixed window behind `key`, answering (count, ttl)
///
/// the expiry is only set when the window is created, a client hammering a full window can't keep
/// pushing its reset out
pub fn window_pipeline(key: &str, window_seconds: u64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .cmd("SET")
        .arg(key)
        .arg(0)
        .arg("EX")
        .arg(window_seconds)
        .arg("NX")
        .ignore()
        .incr(key, 1u32)
        .ttl(key);
    pipe
}

pub type DynRateLimitService = Arc<dyn RateLimitServiceTrait + Send + Sync>;

#[mockall::automock]
#[async_trait::async_trait]
pub trait RateLimitServiceTrait {
    /// check if a request should be allowed
    async fn check_rate_limit(&self, client_id: &str) -> RateLimitResult;

    /// record an error for a client, proxy failures and upstream 4xx
    async fn record_error(&self, client_id: &str, error_type: &str);

    /// check if client is currently timed out
    async fn is_user_timed_out(&self, client_id: &str) -> Option<(String, u64)>;

    async fn timeout_user(&self, client_id: &str, reason: &str, duration_seconds: u64);
}

/// fixed window limiter keyed by client id, plus an error budget that times noisy clients out.
/// Redis trouble lets requests through.
pub struct RateLimitService {
    redis: Arc<RedisDatabase>,
    config: RateLimitConfig,
}

impl RateLimitService {
    pub fn new(redis: Arc<RedisDatabase>) -> Self {
        Self::with_config(redis, RateLimitConfig::default())
    }

    pub fn with_config(redis: Arc<RedisDatabase>, config: RateLimitConfig) -> Self {
        Self { redis, config }
    }

    fn rate_limit_key(&self, client_id: &str) -> String {
        format!("reelbox_rate_limit:{}", client_id)
    }

    fn error_count_key(&self, client_id: &str) -> String {
        format!("reelbox_error_count:{}", client_id)
    }

    fn timeout_key(&self, client_id: &str) -> String {
        format!("reelbox_timeout:{}", client_id)
    }
}

#[async_trait::async_trait]
impl RateLimitServiceTrait for RateLimitService {
    async fn check_rate_limit(&self, client_id: &str) -> RateLimitResult {
        if let Some((reason, retry_after)) = self.is_user_timed_out(client_id).await {
            return RateLimitResult::TimedOut {
                reason,
                retry_after,
            };
        }

        let key = self.rate_limit_key(client_id);
        let mut conn = self.redis.connection.clone();

        let result: Result<(u32, i64), redis::RedisError> =
            window_pipeline(&key, self.config.window_seconds)
                .query_async(&mut conn)
                .await;

        match result {
            Ok((count, ttl)) => {
                let verdict =
                    window_verdict(&self.config, count, ttl, chrono::Utc::now().timestamp());
                if let RateLimitResult::RateLimited { .. } = verdict {
                    debug!(
                        "Client {} rate limited: {} requests in window",
                        client_id, count
                    );
                }
                verdict
            }
            Err(e) => {
                error!("Rate limit check failed for client {}: {}", client_id, e);
                RateLimitResult::Allowed {
                    remaining: 0,
                    reset_at: chrono::Utc::now().timestamp() + self.config.window_seconds as i64,
                }
            }
        }
    }

    async fn record_error(&self, client_id: &str, error_type: &str) {
        let key = self.error_count_key(client_id);
        let mut conn = self.redis.connection.clone();

        let result: Result<(u32, i64), redis::RedisError> =
            window_pipeline(&key, self.config.error_window_seconds)
                .query_async(&mut conn)
                .await;

        match result {
            Ok((count, _ttl)) => {
                debug!(
                    "Client {} error recorded ({}): count now {}",
                    client_id, error_type, count
                );

                if exceeds_error_budget(&self.config, count) {
                    warn!(
                        "Client {} exceeded error threshold ({} errors), applying timeout",
                        client_id, count
                    );
                    self.timeout_user(
                        client_id,
                        &format!(
                            "Automatic timeout: {} errors in {} seconds",
                            count, self.config.error_window_seconds
                        ),
                        self.config.timeout_duration_seconds,
                    )
                    .await;
                }
            }
            Err(e) => {
                error!("Failed to record error for client {}: {}", client_id, e);
            }
        }
    }

    async fn is_user_timed_out(&self, client_id: &str) -> Option<(String, u64)> {
        let key = self.timeout_key(client_id);
        let mut conn = self.redis.connection.clone();

        let result: Result<(Option<String>, i64), redis::RedisError> = redis::pipe()
            .get(&key)
            .ttl(&key)
            .query_async(&mut conn)
            .await;

        match result {
            Ok((Some(reason), ttl)) if ttl > 0 => Some((reason, ttl as u64)),
            Ok(_) => None,
            Err(e) => {
                error!("Failed to check timeout for client {}: {}", client_id, e);
                None
            }
        }
    }

    async fn timeout_user(&self, client_id: &str, reason: &str, duration_seconds: u64) {
        let key = self.timeout_key(client_id);
        let mut conn = self.redis.connection.clone();

        let result: Result<(), redis::RedisError> =
            conn.set_ex(&key, reason, duration_seconds).await;

        match result {
            Ok(_) => {
                info!(
                    "Client {} timed out for {} seconds: {}",
                    client_id, duration_seconds, reason
                );
            }
            Err(e) => {
                error!("Failed to timeout client {}: {}", client_id, e);
            }
        }
    }
}
