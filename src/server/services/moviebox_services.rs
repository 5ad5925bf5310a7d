// client for the moviebox h5 api. None of this is documented, the endpoints and payloads are what
// the web app sends. Every api call wants the session cookies handed out by the app package
// endpoint, so that gets bootstrapped once and shared.
use async_trait::async_trait;
use mockall::automock;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    config::AppConfig,
    database::catalog::MovieboxItem,
    server::{
        error::{AppResult, Error},
        services::cookie_services::{CookieService, DynCookieService, session_cookie_header},
        utils::{
            detail_decoder::{decode_detail_blob, extract_json_script},
            scrape_utils::parse_moviebox_search,
        },
    },
};

pub type DynMovieboxService = Arc<dyn MovieboxServiceTrait + Send + Sync>;

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Mobile Safari/537.36";
const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 24;
pub const DEFAULT_SUGGESTION_PAGE_SIZE: u32 = 10;

// subject_type values the rank endpoint understands, leaving it out means everything
const SUBJECT_TYPE_MOVIE: u8 = 1;
const SUBJECT_TYPE_SERIES: u8 = 2;

#[automock]
#[async_trait]
pub trait MovieboxServiceTrait {
    /// cookie header for the current session, bootstrapping one if needed. `None` when upstream
    /// refused to hand out cookies, calls then go out without them
    async fn ensure_session(&self) -> Option<String>;
    async fn reset_session(&self);
    async fn trending(&self) -> AppResult<Value>;
    async fn movies(&self) -> AppResult<Value>;
    async fn series(&self) -> AppResult<Value>;
    async fn search(&self, keyword: &str, page: u32, per_page: u32) -> AppResult<Value>;
    async fn suggestions(&self, keyword: &str, per_page: u32) -> AppResult<Value>;
    async fn sources(
        &self,
        subject_id: &str,
        detail_path: &str,
        season: u32,
        episode: u32,
    ) -> AppResult<Value>;
    async fn details(&self, detail_path: &str) -> AppResult<Value>;
    async fn scrape_search(&self, keyword: &str) -> AppResult<Vec<MovieboxItem>>;
    fn player_url(&self, slug: &str, subject_id: &str) -> String;
}

pub struct MovieboxService {
    http_client: reqwest::Client,
    cookies: DynCookieService,
    // the mutex also serializes bootstraps so only one is ever in flight
    session: Mutex<Option<String>>,
    host: String,
    site: String,
    player_host: String,
}

impl MovieboxService {
    pub fn new(config: &AppConfig, cookies: DynCookieService) -> Self {
        let host = config.moviebox_host.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Ok(origin) = HeaderValue::from_str(&host) {
            headers.insert(header::ORIGIN, origin);
        }
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/", host)) {
            headers.insert(header::REFERER, referer);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(MOBILE_USER_AGENT)
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            cookies,
            session: Mutex::new(None),
            host,
            site: config.moviebox_site.trim_end_matches('/').to_string(),
            player_host: config.player_host.trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/wefeed-h5-bff/web{}", self.host, path)
    }

    fn session_domain(&self) -> String {
        CookieService::extract_domain(&self.host).unwrap_or_else(|| self.host.clone())
    }

    async fn bootstrap_session(&self) -> Option<String> {
        let url = format!(
            "{}/wefeed-h5-bff/app/get-latest-app-pkgs?app_name=moviebox",
            self.host
        );

        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("MovieBox session init error: {}", e);
                return None;
            }
        };

        let set_cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(|s| s.to_string()))
            .collect();

        let cookie_header = session_cookie_header(&set_cookies)?;
        self.cookies
            .store_cookies(&self.session_domain(), &set_cookies)
            .await;

        info!("MovieBox session initialized ({} cookies)", set_cookies.len());
        Some(cookie_header)
    }

    async fn read_json(&self, response: reqwest::Response, what: &str) -> AppResult<Value> {
        let status = response.status();

        if !status.is_success() {
            error!("MovieBox {} returned status: {}", what, status);
            // an expired session shows up as an auth failure, start over next time
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
            {
                self.reset_session().await;
            }
            return Err(Error::Upstream(format!(
                "moviebox {} returned status: {}",
                what, status
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            error!("MovieBox {} returned invalid json: {}", what, e);
            Error::Upstream(format!("moviebox {} returned invalid json: {}", what, e))
        })
    }

    async fn post_api(&self, path: &str, body: Value, what: &str) -> AppResult<Value> {
        let mut request = self.http_client.post(self.api_url(path)).json(&body);
        if let Some(cookies) = self.ensure_session().await {
            request = request.header(header::COOKIE, cookies);
        }

        let response = request.send().await.map_err(|e| {
            error!("MovieBox {} error: {}", what, e);
            Error::Upstream(format!("moviebox {} request failed: {}", what, e))
        })?;

        self.read_json(response, what).await
    }

    async fn rank(&self, subject_type: Option<u8>, what: &str) -> AppResult<Value> {
        let body = match subject_type {
            Some(subject_type) => json!({ "subject_type": subject_type }),
            None => json!({}),
        };
        self.post_api("/subject/search-rank", body, what).await
    }
}

#[async_trait]
impl MovieboxServiceTrait for MovieboxService {
    async fn ensure_session(&self) -> Option<String> {
        let mut session = self.session.lock().await;

        if let Some(cookies) = session.as_ref() {
            return Some(cookies.clone());
        }

        // another instance may have already bootstrapped one
        if let Some(stored) = self.cookies.get_cookies(&self.session_domain()).await {
            debug!("reusing stored MovieBox session");
            *session = Some(stored.clone());
            return Some(stored);
        }

        let fresh = self.bootstrap_session().await;
        if fresh.is_none() {
            warn!("MovieBox handed out no session cookies, continuing without a session");
        }
        *session = fresh.clone();
        fresh
    }

    async fn reset_session(&self) {
        info!("resetting MovieBox session");
        *self.session.lock().await = None;
        self.cookies.clear_cookies(&self.session_domain()).await;
    }

    async fn trending(&self) -> AppResult<Value> {
        self.rank(None, "trending").await
    }

    async fn movies(&self) -> AppResult<Value> {
        self.rank(Some(SUBJECT_TYPE_MOVIE), "movies").await
    }

    async fn series(&self) -> AppResult<Value> {
        self.rank(Some(SUBJECT_TYPE_SERIES), "series").await
    }

    async fn search(&self, keyword: &str, page: u32, per_page: u32) -> AppResult<Value> {
        info!("MovieBox search: {} (page {})", keyword, page);
        self.post_api(
            "/subject/search",
            json!({ "keyword": keyword, "per_page": per_page, "page": page }),
            "search",
        )
        .await
    }

    async fn suggestions(&self, keyword: &str, per_page: u32) -> AppResult<Value> {
        self.post_api(
            "/subject/search-suggest",
            json!({ "keyword": keyword, "per_page": per_page }),
            "suggestions",
        )
        .await
    }

    async fn sources(
        &self,
        subject_id: &str,
        detail_path: &str,
        season: u32,
        episode: u32,
    ) -> AppResult<Value> {
        info!(
            "MovieBox sources: subject {} season {} episode {}",
            subject_id, season, episode
        );

        // play only answers when the referer is the title's own page
        let mut request = self
            .http_client
            .get(self.api_url("/subject/play"))
            .query(&[
                ("subjectId", subject_id.to_string()),
                ("se", season.to_string()),
                ("ep", episode.to_string()),
            ])
            .header(
                header::REFERER,
                format!("{}/movies/{}", self.host, detail_path),
            );
        if let Some(cookies) = self.ensure_session().await {
            request = request.header(header::COOKIE, cookies);
        }

        let response = request.send().await.map_err(|e| {
            error!("MovieBox sources error: {}", e);
            Error::Upstream(format!("moviebox sources request failed: {}", e))
        })?;

        self.read_json(response, "sources").await
    }

    async fn details(&self, detail_path: &str) -> AppResult<Value> {
        let url = format!("{}/movies/{}", self.host, detail_path);
        info!("fetching MovieBox detail page: {}", url);

        let mut request = self
            .http_client
            .get(&url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8");
        if let Some(cookies) = self.ensure_session().await {
            request = request.header(header::COOKIE, cookies);
        }

        let response = request.send().await.map_err(|e| {
            error!("MovieBox details error: {}", e);
            Error::Upstream(format!("moviebox details request failed: {}", e))
        })?;

        if !response.status().is_success() {
            error!("MovieBox detail page returned status: {}", response.status());
            return Err(Error::Upstream(format!(
                "moviebox detail page returned status: {}",
                response.status()
            )));
        }

        let html = response.text().await.map_err(|e| {
            error!("failed to read MovieBox detail page: {}", e);
            Error::Upstream(format!("failed to read moviebox detail page: {}", e))
        })?;

        let script = extract_json_script(&html)
            .ok_or_else(|| {
                error!("Could not find JSON script in details page");
                Error::NotFound(format!("no detail data for {}", detail_path))
            })?
            .to_string();

        // the blob can be large and the decode is cpu bound, keep it off the async workers
        let decoded = tokio::task::spawn_blocking(move || -> AppResult<Option<Value>> {
            let raw: Value = serde_json::from_str(&script)?;
            Ok(decode_detail_blob(&raw))
        })
        .await
        .map_err(|e| {
            error!("detail page decode task failed: {}", e);
            Error::InternalServerErrorWithContext(format!("detail decode failed: {}", e))
        })??;

        decoded.ok_or_else(|| {
            warn!("Could not resolve details from JSON");
            Error::NotFound(format!("no detail data for {}", detail_path))
        })
    }

    async fn scrape_search(&self, keyword: &str) -> AppResult<Vec<MovieboxItem>> {
        let response = self
            .http_client
            .get(format!("{}/web/searchResult", self.site))
            .query(&[("keyword", keyword)])
            .header(header::USER_AGENT, DESKTOP_USER_AGENT)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| {
                error!("Moviebox Search Error: {}", e);
                Error::Upstream(format!("moviebox search page request failed: {}", e))
            })?;

        if !response.status().is_success() {
            error!("MovieBox search page returned status: {}", response.status());
            return Err(Error::Upstream(format!(
                "moviebox search page returned status: {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        let items = parse_moviebox_search(&html, &self.site);
        debug!("scraped {} MovieBox cards for {}", items.len(), keyword);

        Ok(items)
    }

    fn player_url(&self, slug: &str, subject_id: &str) -> String {
        format!(
            "{}/spa/videoPlayPage/movies/{}?id={}",
            self.player_host, slug, subject_id
        )
    }
}
