use reelbox::server::dtos::catalog_dto::{
    DateQuery, DetailsQuery, MovieboxQuery, SearchQuery, SourcesQuery, TrendingQuery,
};
use reelbox::server::services::tmdb_services::TimeWindow;
use serde_json::json;
use validator::Validate;

#[test]
fn default_search_to_the_first_page() {
    let query: SearchQuery = serde_json::from_value(json!({ "q": "dune" })).unwrap();

    assert_eq!(query.page, 1);
    assert!(query.validate().is_ok());
}

#[test]
fn reject_empty_searches_and_page_zero() {
    let empty: SearchQuery = serde_json::from_value(json!({ "q": "" })).unwrap();
    let page_zero: SearchQuery = serde_json::from_value(json!({ "q": "dune", "page": 0 })).unwrap();

    assert!(empty.validate().is_err());
    assert!(page_zero.validate().is_err());
}

#[test]
fn require_a_detail_path() {
    let query: DetailsQuery = serde_json::from_value(json!({ "id": "42", "detailPath": "" })).unwrap();

    assert!(query.validate().is_err());
    assert!(serde_json::from_value::<DetailsQuery>(json!({ "id": "42" })).is_err());
}

#[test]
fn default_sources_to_the_first_episode() {
    let query: SourcesQuery =
        serde_json::from_value(json!({ "id": "42", "detailPath": "dark-x" })).unwrap();

    assert_eq!((query.season, query.episode), (1, 1));
    assert!(query.validate().is_ok());

    let episode_zero: SourcesQuery =
        serde_json::from_value(json!({ "id": "42", "detailPath": "dark-x", "episode": 0 }))
            .unwrap();
    assert!(episode_zero.validate().is_err());
}

#[test]
fn read_the_passthrough_endpoint_in_camel_case() {
    let query: MovieboxQuery = serde_json::from_value(json!({
        "endpoint": "details",
        "detailPath": "dune-x1"
    }))
    .unwrap();

    assert_eq!(query.detail_path.as_deref(), Some("dune-x1"));
    assert_eq!(query.page, 1);
    assert!(query.validate().is_ok());
}

#[test]
fn default_trending_to_the_week() {
    let default: TrendingQuery = serde_json::from_value(json!({})).unwrap();
    let daily: TrendingQuery = serde_json::from_value(json!({ "window": "day" })).unwrap();

    assert_eq!(default.window, TimeWindow::Week);
    assert_eq!(daily.window, TimeWindow::Day);
    assert!(serde_json::from_value::<TrendingQuery>(json!({ "window": "month" })).is_err());
}

#[test]
fn parse_iso_match_days() {
    let query: DateQuery = serde_json::from_value(json!({ "date": "2024-05-01" })).unwrap();

    assert_eq!(query.date.unwrap().to_string(), "2024-05-01");
    assert!(serde_json::from_value::<DateQuery>(json!({ "date": "yesterday" })).is_err());
}
