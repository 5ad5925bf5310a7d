// the normalized view of moviebox the front end actually renders. Upstream failures never reach
// callers from here, they're logged and come back as an empty list or None.
use async_trait::async_trait;
use mockall::automock;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    database::catalog::{DynCatalogRepository, MediaDetails, MediaItem, PlayerLink},
    server::{
        dtos::catalog_dto::HomeFeed,
        error::AppResult,
        services::{
            football_services::{DynFootballService, upcoming},
            moviebox_services::{
                DEFAULT_SEARCH_PAGE_SIZE, DEFAULT_SUGGESTION_PAGE_SIZE, DynMovieboxService,
            },
        },
        utils::normalize::{extract_list, map_media_details, map_media_item},
    },
};

pub type DynCatalogService = Arc<dyn CatalogServiceTrait + Send + Sync>;

const CACHE_NAMESPACE: &str = "moviebox";
const HOME_ROW_LIMIT: usize = 30;
const FESTIVE_KEYWORD: &str = "Christmas";
const ANIMATION_KEYWORD: &str = "Animation";

#[automock]
#[async_trait]
pub trait CatalogServiceTrait {
    async fn trending(&self) -> Vec<MediaItem>;
    async fn movies(&self) -> Vec<MediaItem>;
    async fn series(&self) -> Vec<MediaItem>;
    async fn animations(&self) -> Vec<MediaItem>;
    async fn festive(&self) -> Vec<MediaItem>;
    async fn search(&self, query: &str, page: u32) -> Vec<MediaItem>;
    async fn suggestions(&self, query: &str) -> Vec<MediaItem>;
    async fn details(&self, subject_id: Option<String>, detail_path: &str) -> Option<MediaDetails>;
    async fn sources(
        &self,
        subject_id: &str,
        detail_path: &str,
        season: u32,
        episode: u32,
    ) -> Option<Value>;
    async fn home_feed(&self) -> HomeFeed;
    async fn resolve_player(&self, title: &str) -> Option<PlayerLink>;
    /// drops every cached listing, run on startup so a deploy never serves the old shapes
    async fn purge(&self);
}

pub struct CatalogService {
    moviebox: DynMovieboxService,
    football: DynFootballService,
    cache: DynCatalogRepository,
    cache_ttl: u64,
}

impl CatalogService {
    pub fn new(
        moviebox: DynMovieboxService,
        football: DynFootballService,
        cache: DynCatalogRepository,
        cache_ttl: u64,
    ) -> Self {
        Self {
            moviebox,
            football,
            cache,
            cache_ttl,
        }
    }

    // cache trouble is never worth failing a request over
    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get_cached(CACHE_NAMESPACE, key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("ignoring stale cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("catalog cache read failed for {}: {:#}", key, e);
                None
            }
        }
    }

    async fn remember<T: Serialize + Sync>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!("could not serialize {} for the cache: {}", key, e);
                return;
            }
        };

        if let Err(e) = self
            .cache
            .set_cached(CACHE_NAMESPACE, key, &value, self.cache_ttl)
            .await
        {
            warn!("catalog cache write failed for {}: {:#}", key, e);
        }
    }

    /// normalized listing behind `key`, empty lists aren't cached so a failed call is retried
    async fn listing(&self, key: &str, fetched: AppResult<Value>) -> Vec<MediaItem> {
        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => {
                error!("Error fetching {}: {}", key, e);
                return Vec::new();
            }
        };

        let items: Vec<MediaItem> = extract_list(&raw).iter().map(map_media_item).collect();
        if !items.is_empty() {
            self.remember(key, &items).await;
        }
        items
    }
}

fn capped(mut items: Vec<MediaItem>) -> Vec<MediaItem> {
    items.truncate(HOME_ROW_LIMIT);
    items
}

#[async_trait]
impl CatalogServiceTrait for CatalogService {
    async fn trending(&self) -> Vec<MediaItem> {
        if let Some(items) = self.cached("trending").await {
            return items;
        }
        self.listing("trending", self.moviebox.trending().await).await
    }

    async fn movies(&self) -> Vec<MediaItem> {
        if let Some(items) = self.cached("movies").await {
            return items;
        }
        self.listing("movies", self.moviebox.movies().await).await
    }

    async fn series(&self) -> Vec<MediaItem> {
        if let Some(items) = self.cached("series").await {
            return items;
        }
        self.listing("series", self.moviebox.series().await).await
    }

    async fn animations(&self) -> Vec<MediaItem> {
        self.search(ANIMATION_KEYWORD, 1).await
    }

    async fn festive(&self) -> Vec<MediaItem> {
        self.search(FESTIVE_KEYWORD, 1).await
    }

    async fn search(&self, query: &str, page: u32) -> Vec<MediaItem> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let key = format!("search:{}:{}", query.to_lowercase(), page);
        if let Some(items) = self.cached(&key).await {
            return items;
        }

        let fetched = self
            .moviebox
            .search(query, page, DEFAULT_SEARCH_PAGE_SIZE)
            .await;
        self.listing(&key, fetched).await
    }

    async fn suggestions(&self, query: &str) -> Vec<MediaItem> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let key = format!("suggest:{}", query.to_lowercase());
        if let Some(items) = self.cached(&key).await {
            return items;
        }

        let fetched = self
            .moviebox
            .suggestions(query, DEFAULT_SUGGESTION_PAGE_SIZE)
            .await;
        self.listing(&key, fetched).await
    }

    async fn details(&self, subject_id: Option<String>, detail_path: &str) -> Option<MediaDetails> {
        let key = format!("details:{}", detail_path);
        // the entry holds only what the page said, caller ids are filled per request
        let mut details = match self.cached::<MediaDetails>(&key).await {
            Some(details) => details,
            None => {
                let raw = match self.moviebox.details(detail_path).await {
                    Ok(raw) => raw,
                    Err(e) => {
                        error!("Error fetching details for {}: {}", detail_path, e);
                        return None;
                    }
                };
                let details = map_media_details(&raw)?;
                self.remember(&key, &details).await;
                details
            }
        };

        // the page doesn't always repeat the id the caller already had
        if details.id.is_none() {
            details.id = subject_id.filter(|id| !id.is_empty());
            details.imdb_id = details.id.clone();
        }
        if details.detail_path.is_empty() {
            details.detail_path = detail_path.to_string();
        }
        Some(details)
    }

    // stream urls are signed and expire, these never go through the cache
    async fn sources(
        &self,
        subject_id: &str,
        detail_path: &str,
        season: u32,
        episode: u32,
    ) -> Option<Value> {
        match self
            .moviebox
            .sources(subject_id, detail_path, season, episode)
            .await
        {
            Ok(raw) => Some(raw),
            Err(e) => {
                error!("Error fetching sources for {}: {}", subject_id, e);
                None
            }
        }
    }

    async fn home_feed(&self) -> HomeFeed {
        let (trending, movies, series, festive, animations, football) = futures::join!(
            self.trending(),
            self.movies(),
            self.series(),
            self.festive(),
            self.animations(),
            self.football.football_matches(),
        );

        let football = match football {
            Ok(matches) => upcoming(matches, chrono::Utc::now().timestamp_millis()),
            Err(e) => {
                error!("Error fetching football for the home feed: {}", e);
                Vec::new()
            }
        };

        HomeFeed {
            trending: capped(trending),
            movies: capped(movies),
            series: capped(series),
            festive: capped(festive),
            animations: capped(animations),
            football,
        }
    }

    async fn resolve_player(&self, title: &str) -> Option<PlayerLink> {
        let results = match self.moviebox.scrape_search(title).await {
            Ok(results) => results,
            Err(e) => {
                error!("Error resolving player for {}: {}", title, e);
                return None;
            }
        };

        let wanted = title.trim().to_lowercase();
        let found = results
            .iter()
            .find(|item| item.title.trim().to_lowercase() == wanted)
            .or_else(|| results.first())?;
        debug!("player for {} resolved to {}", title, found.id);

        Some(PlayerLink {
            title: found.title.clone(),
            slug: found.id.clone(),
            subject_id: found.subject_id.clone(),
            url: self.moviebox.player_url(&found.id, &found.subject_id),
        })
    }

    async fn purge(&self) {
        match self.cache.clear_namespace(CACHE_NAMESPACE).await {
            Ok(()) => info!("catalog cache purged"),
            Err(e) => warn!("catalog cache purge failed: {:#}", e),
        }
    }
}
