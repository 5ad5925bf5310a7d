use async_trait::async_trait;
use mockall::automock;
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    config::AppConfig,
    database::catalog::SflixItem,
    server::{
        error::{AppResult, Error},
        utils::scrape_utils::parse_sflix_search,
    },
};

pub type DynSflixService = Arc<dyn SflixServiceTrait + Send + Sync>;

#[automock]
#[async_trait]
pub trait SflixServiceTrait {
    async fn search(&self, keyword: &str) -> AppResult<Vec<SflixItem>>;
}

pub struct SflixService {
    http_client: reqwest::Client,
    base_url: String,
}

impl SflixService {
    pub fn new(config: &AppConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            base_url: config.sflix_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SflixServiceTrait for SflixService {
    async fn search(&self, keyword: &str) -> AppResult<Vec<SflixItem>> {
        let url = format!("{}/search/{}", self.base_url, urlencoding::encode(keyword));

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            error!("Sflix search error: {}", e);
            Error::Upstream(format!("sflix search failed: {}", e))
        })?;

        if !response.status().is_success() {
            error!("Sflix search returned status: {}", response.status());
            return Err(Error::Upstream(format!(
                "sflix search returned status: {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        let items = parse_sflix_search(&html, &self.base_url);
        debug!("sflix returned {} results for {}", items.len(), keyword);

        Ok(items)
    }
}
