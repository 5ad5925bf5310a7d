use std::sync::Arc;

use tracing::info;

use crate::{
    config::AppConfig,
    database::{RedisDatabase, catalog::DynCatalogRepository},
    server::utils::signature_utils::SignatureUtil,
};

use super::{
    catalog_services::{CatalogService, DynCatalogService},
    cookie_services::{CookieService, DynCookieService},
    football_services::{DynFootballService, FootballService},
    moviebox_services::{DynMovieboxService, MovieboxService},
    rate_limit_services::{DynRateLimitService, RateLimitService},
    sflix_services::{DynSflixService, SflixService},
    sports_services::{DynSportsService, SportsService},
    tmdb_services::{DynTmdbService, TmdbService},
};

/// everything a handler can reach, handed out through an `Extension`
/// redis backs the session cookies, the catalog cache and rate limiting
#[derive(Clone)]
pub struct AppServices {
    pub signature_util: Arc<SignatureUtil>,
    pub moviebox: DynMovieboxService,
    pub catalog: DynCatalogService,
    pub tmdb: DynTmdbService,
    pub sports: DynSportsService,
    pub football: DynFootballService,
    pub sflix: DynSflixService,
    pub rate_limit: DynRateLimitService,
    pub cookies: DynCookieService,
    pub http: reqwest::Client,
    pub redis: Arc<RedisDatabase>,
    pub config: Arc<AppConfig>,
}

impl AppServices {
    pub fn new(redis_db: RedisDatabase, config: Arc<AppConfig>) -> Self {
        info!("starting services...");

        let signature_util = Arc::new(SignatureUtil::new(config.access_token_secret.clone()));
        let redis = Arc::new(redis_db);

        // shared by the proxy, per request clients would throw away the connection pool.
        // no total timeout, a streamed film outlives any fixed deadline
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .read_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let cookies = Arc::new(CookieService::new(redis.clone())) as DynCookieService;
        let rate_limit = Arc::new(RateLimitService::new(redis.clone())) as DynRateLimitService;

        let moviebox =
            Arc::new(MovieboxService::new(&config, cookies.clone())) as DynMovieboxService;
        let football = Arc::new(FootballService::new(&config)) as DynFootballService;
        let catalog = Arc::new(CatalogService::new(
            moviebox.clone(),
            football.clone(),
            redis.clone() as DynCatalogRepository,
            config.cache_ttl_seconds,
        )) as DynCatalogService;

        let tmdb = Arc::new(TmdbService::new(&config)) as DynTmdbService;
        let sports = Arc::new(SportsService::new(&config)) as DynSportsService;
        let sflix = Arc::new(SflixService::new(&config)) as DynSflixService;

        info!("services ok");

        Self {
            signature_util,
            moviebox,
            catalog,
            tmdb,
            sports,
            football,
            sflix,
            rate_limit,
            cookies,
            http,
            redis,
            config,
        }
    }
}
