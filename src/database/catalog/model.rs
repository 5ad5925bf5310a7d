use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// type hell part two
///
/// upstream payloads change shape whenever they feel like it so everything coming in from the
/// sports apis is lenient: missing fields default, numbers are accepted where strings are
/// expected. The moviebox payloads aren't typed at all, they go through utils::normalize instead.

/// accepts a string, a number, a bool or null and always hands back a string ("" for null)
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

/// `null` reads as the type's default, plain `#[serde(default)]` only covers a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// true, "true", "1" and non zero numbers, anything else is false
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim(), "true" | "1"),
        _ => false,
    })
}

/// normalized card the front end renders for any moviebox listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Option<String>,
    pub imdb_id: Option<String>,
    pub title: String,
    pub poster_url: String,
    pub cover: String,
    pub year: String,
    pub overview: String,
    pub rating: f64,
    pub subject_type: i64,
    pub is_movie: bool,
    pub detail_path: String,
    pub casts: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDetails {
    pub id: Option<String>,
    pub imdb_id: Option<String>,
    pub title: String,
    pub poster_url: String,
    pub backdrop_url: String,
    pub year: String,
    pub overview: String,
    pub rating: f64,
    pub runtime: String,
    pub seasons: u64,
    pub is_series: bool,
    pub detail_path: String,
}

/// a single playable rendition out of the /subject/play response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSource {
    pub url: String,
    pub format: String,
    pub resolutions: String,
}

/// result card scraped from the html search page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieboxItem {
    pub title: String,
    /// slug, what the player page path wants
    pub id: String,
    pub subject_id: String,
    pub cover: Option<String>,
    pub rating: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLink {
    pub title: String,
    pub slug: String,
    pub subject_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItem {
    pub id: i64,
    pub title: String,
    pub poster: Option<String>,
    pub rating: f64,
    pub year: String,
}

/// a catalog item with whatever tmdb knew better about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMedia {
    pub title: String,
    pub poster: Option<String>,
    pub year: String,
    pub rating: String,
    pub overview: String,
    pub backdrop: Option<String>,
    pub tmdb_id: Option<i64>,
    pub similar: Vec<SimilarItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Team {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub score: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub avatar: String,
}

/// match out of the aoneroom live list, status is "MatchNotStart", "Living" or "MatchEnd"
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team1: Team,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team2: Team,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub league: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_path: Option<String>,
}

impl Match {
    pub fn is_live(&self) -> bool {
        self.status == "Living" || self.status == "Live"
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FootballBadge {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub badge: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FootballTeams {
    #[serde(default)]
    pub home: Option<FootballBadge>,
    #[serde(default)]
    pub away: Option<FootballBadge>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FootballSource {
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
}

/// streamed.pk match, `date` is epoch milliseconds
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FootballMatch {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub popular: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<FootballTeams>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<FootballSource>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootballStream {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub stream_no: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub language: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub hd: bool,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SflixItem {
    pub title: String,
    pub link: String,
    pub poster: Option<String>,
    pub year: String,
}

pub type DynCatalogRepository = Arc<dyn CatalogRepository + Send + Sync>;

/// ttl'd json cache in front of the upstreams, namespaces are things like "moviebox" or "tmdb"
#[mockall::automock]
#[async_trait::async_trait]
pub trait CatalogRepository {
    async fn get_cached(&self, namespace: &str, key: &str) -> Result<Option<Value>>;
    async fn set_cached(&self, namespace: &str, key: &str, value: &Value, ttl_secs: u64)
    -> Result<()>;
    async fn clear_namespace(&self, namespace: &str) -> Result<()>;
}
