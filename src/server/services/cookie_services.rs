use std::sync::Arc;

use redis::AsyncCommands;
use tracing::{debug, error};

use crate::database::RedisDatabase;

/// ttl of 24hrs
const COOKIE_TTL_SECONDS: u64 = 86400;

pub type DynCookieService = Arc<dyn CookieServiceTrait + Send + Sync>;

/// per domain cookie jar, values are stored as a ready to send `Cookie` header
#[mockall::automock]
#[async_trait::async_trait]
pub trait CookieServiceTrait {
    async fn get_cookies(&self, domain: &str) -> Option<String>;

    async fn store_cookies(&self, domain: &str, cookies: &[String]);

    async fn clear_cookies(&self, domain: &str);
}

pub struct CookieService {
    redis: Arc<RedisDatabase>,
}

impl CookieService {
    pub fn new(redis: Arc<RedisDatabase>) -> Self {
        Self { redis }
    }

    fn cookie_key(&self, domain: &str) -> String {
        format!("proxy_cookies:{}", domain)
    }

    pub fn extract_domain(url: &str) -> Option<String> {
        url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }
}

/// `name=value` part of a Set-Cookie header, attributes dropped
fn cookie_pair(set_cookie: &str) -> Option<(&str, &str)> {
    let pair = set_cookie.split(';').next()?.trim();
    let (name, _) = pair.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then_some((name, pair))
}

/// joins the name=value pairs of a batch of Set-Cookie headers into one Cookie header
pub fn session_cookie_header(set_cookies: &[String]) -> Option<String> {
    let pairs: Vec<&str> = set_cookies
        .iter()
        .filter_map(|c| cookie_pair(c))
        .map(|(_, pair)| pair)
        .collect();

    (!pairs.is_empty()).then(|| pairs.join("; "))
}

/// merges fresh Set-Cookie headers into an existing Cookie header, new values win and the
/// original cookie order is kept
pub fn merge_cookies(existing: Option<&str>, set_cookies: &[String]) -> String {
    let mut merged: Vec<(String, String)> = Vec::new();

    let existing_pairs = existing
        .into_iter()
        .flat_map(|header| header.split("; "))
        .filter_map(cookie_pair);
    let fresh_pairs = set_cookies.iter().filter_map(|c| cookie_pair(c));

    for (name, pair) in existing_pairs.chain(fresh_pairs) {
        match merged.iter_mut().find(|(existing, _)| existing == name) {
            Some(slot) => slot.1 = pair.to_string(),
            None => merged.push((name.to_string(), pair.to_string())),
        }
    }

    merged
        .into_iter()
        .map(|(_, pair)| pair)
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait::async_trait]
impl CookieServiceTrait for CookieService {
    async fn get_cookies(&self, domain: &str) -> Option<String> {
        let key = self.cookie_key(domain);
        let mut conn = self.redis.connection.clone();

        let result: Result<Option<String>, redis::RedisError> = conn.get(&key).await;

        match result {
            Ok(Some(cookies)) => {
                debug!(
                    "Loaded cookies for domain {}: {} bytes",
                    domain,
                    cookies.len()
                );
                Some(cookies)
            }
            Ok(None) => None,
            Err(e) => {
                error!("Failed to get cookies for domain {}: {}", domain, e);
                None
            }
        }
    }

    async fn store_cookies(&self, domain: &str, cookies: &[String]) {
        if cookies.is_empty() {
            return;
        }

        let existing = self.get_cookies(domain).await;
        let cookie_header = merge_cookies(existing.as_deref(), cookies);
        if cookie_header.is_empty() {
            return;
        }

        let key = self.cookie_key(domain);
        let mut conn = self.redis.connection.clone();
        let result: Result<(), redis::RedisError> =
            conn.set_ex(&key, &cookie_header, COOKIE_TTL_SECONDS).await;

        match result {
            Ok(_) => debug!(
                "Stored cookies for domain {} (TTL: {}s)",
                domain, COOKIE_TTL_SECONDS
            ),
            Err(e) => error!("Failed to store cookies for domain {}: {}", domain, e),
        }
    }

    async fn clear_cookies(&self, domain: &str) {
        let key = self.cookie_key(domain);
        let mut conn = self.redis.connection.clone();

        let result: Result<i32, redis::RedisError> = conn.del(&key).await;
        if let Err(e) = result {
            error!("Failed to clear cookies for domain {}: {}", domain, e);
        }
    }
}
