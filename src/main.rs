use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;

use tracing::info;

use reelbox::{AppConfig, ApplicationServer, Logger, RedisDatabase};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Arc::new(AppConfig::parse());

    // guards have to outlive the server or buffered logs and sentry events get dropped
    let _guards = Logger::init(config.cargo_env, config.sentry_dsn.clone());

    info!(
        "logger and env prepped ({})...",
        Logger::environment_name(config.cargo_env)
    );

    info!("connecting to redis...");

    let redis_db = RedisDatabase::connect(&config.redis_url)
        .await
        .context("where is the redis connection!!")?;

    info!("redis connection ok, starting server...");

    ApplicationServer::serve(config, redis_db)
        .await
        .context("server failed to start")?;

    Ok(())
}
