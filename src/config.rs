#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

#[derive(clap::Parser, Clone, Debug)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum)]
    pub cargo_env: CargoEnv,

    // port that the app will bind to
    #[clap(long, env, default_value = "5000")]
    pub port: u16,

    // redis url, holds the moviebox session, proxy cookies, response cache and rate limits
    #[clap(long, env)]
    pub redis_url: String,

    // signs the proxy links handed out in rewritten playlists, have it be anything secure
    // like 'openssl rand -base64 32'
    #[clap(long, env)]
    pub access_token_secret: String,

    // this should be either * for allowing everything, or a comma seperated list of domains like
    // example.com,something.com
    #[clap(long, env)]
    pub cors_origin: String,

    // same as above but used for preview deployments of the front end
    #[clap(long, env)]
    pub preview_cors_origin: String,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,

    // v3 api key for themoviedb
    #[clap(long, env)]
    pub tmdb_api_key: String,

    // host serving the wefeed-h5-bff api and the /movies/{path} detail pages
    #[clap(long, env, default_value = "https://h5.aoneroom.com")]
    pub moviebox_host: String,

    // desktop site, only used for the html search page
    #[clap(long, env, default_value = "https://moviebox.ph")]
    pub moviebox_site: String,

    // where the embeddable player pages live
    #[clap(long, env, default_value = "https://lok-lok.cc")]
    pub player_host: String,

    #[clap(long, env, default_value = "https://api.themoviedb.org/3")]
    pub tmdb_base_url: String,

    #[clap(
        long,
        env,
        default_value = "https://h5.aoneroom.com/wefeed-h5-bff/live/match-list-v3"
    )]
    pub sports_api_url: String,

    #[clap(long, env, default_value = "https://streamed.pk/api")]
    pub football_api_url: String,

    #[clap(long, env, default_value = "https://sflix.to")]
    pub sflix_base_url: String,

    // how long normalized catalog responses stay in redis
    #[clap(long, env, default_value = "3600")]
    pub cache_ttl_seconds: u64,
}

impl Default for AppConfig {
    // defaults aren't really needed here but it's here as a bad fallback
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 5000,
            redis_url: "redis://localhost:6379".to_string(),
            access_token_secret: "default-access-secret".to_string(),
            cors_origin: "*".to_string(),
            preview_cors_origin: "*".to_string(),
            sentry_dsn: None,
            tmdb_api_key: String::new(),
            moviebox_host: "https://h5.aoneroom.com".to_string(),
            moviebox_site: "https://moviebox.ph".to_string(),
            player_host: "https://lok-lok.cc".to_string(),
            tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
            sports_api_url: "https://h5.aoneroom.com/wefeed-h5-bff/live/match-list-v3"
                .to_string(),
            football_api_url: "https://streamed.pk/api".to_string(),
            sflix_base_url: "https://sflix.to".to_string(),
            cache_ttl_seconds: 3600,
        }
    }
}
