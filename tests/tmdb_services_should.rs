use reelbox::database::catalog::EnrichedMedia;
use reelbox::server::services::tmdb_services::{
    MediaSeed, MediaType, find_path, merge_details, pick_match, similar_items,
};
use serde_json::json;

fn seed() -> MediaSeed {
    MediaSeed {
        title: "Dune".to_string(),
        year: Some("2021".to_string()),
        poster: Some("https://img.example.com/moviebox-dune.jpg".to_string()),
        rating: Some("7.9".to_string()),
        overview: Some("from the catalog".to_string()),
    }
}

#[test]
fn prefer_an_exact_title_match() {
    let results = vec![
        json!({ "id": 1, "title": "Dune Drifter", "release_date": "2020-01-01" }),
        json!({ "id": 2, "title": "Dune", "release_date": "1984-12-14" }),
    ];

    let found = pick_match(&results, "Dune", Some("2021")).unwrap();

    assert_eq!(found["id"], 2);
}

#[test]
fn fall_back_to_the_release_year_then_the_first_result() {
    let results = vec![
        json!({ "id": 1, "title": "Dune: Part One", "release_date": "2019-01-01" }),
        json!({ "id": 2, "title": "Dune (2021)", "release_date": "2021-09-15" }),
    ];

    assert_eq!(pick_match(&results, "Dune", Some("2021")).unwrap()["id"], 2);
    assert_eq!(pick_match(&results, "Dune", Some("1990")).unwrap()["id"], 1);
    // an empty year never matches, it would prefix every date
    assert_eq!(pick_match(&results, "Dune", Some("")).unwrap()["id"], 1);
    assert!(pick_match(&[], "Dune", None).is_none());
}

#[test]
fn let_tmdb_values_win_when_merging() {
    let details = json!({
        "id": 438631,
        "overview": "Paul Atreides...",
        "poster_path": "/d5NXSklXo0qyIYkgV94XAgMIckC.jpg",
        "backdrop_path": "/jYEW5xZkZk2WTrdbMGAPFuBqbDc.jpg",
        "release_date": "2021-09-15",
        "vote_average": 7.78,
        "recommendations": { "results": [
            { "id": 1, "title": "Dune: Part Two", "poster_path": "/p2.jpg", "vote_average": 8.2, "release_date": "2024-02-27" },
            { "id": 2, "name": "Arrival" },
            { "id": 3, "title": "c" },
            { "id": 4, "title": "d" },
            { "id": 5, "title": "e" }
        ]}
    });

    let merged = merge_details(&seed(), &details);

    assert_eq!(merged.title, "Dune");
    assert_eq!(
        merged.poster.as_deref(),
        Some("https://image.tmdb.org/t/p/w500/d5NXSklXo0qyIYkgV94XAgMIckC.jpg")
    );
    assert_eq!(
        merged.backdrop.as_deref(),
        Some("https://image.tmdb.org/t/p/original/jYEW5xZkZk2WTrdbMGAPFuBqbDc.jpg")
    );
    assert_eq!(merged.rating, "7.8");
    assert_eq!(merged.year, "2021");
    assert_eq!(merged.overview, "Paul Atreides...");
    assert_eq!(merged.tmdb_id, Some(438631));
    assert_eq!(merged.similar.len(), 4);
    assert_eq!(merged.similar[0].title, "Dune: Part Two");
    assert_eq!(
        merged.similar[0].poster.as_deref(),
        Some("https://image.tmdb.org/t/p/w342/p2.jpg")
    );
    assert_eq!(merged.similar[0].year, "2024");
    assert_eq!(merged.similar[1].title, "Arrival");
    assert_eq!(merged.similar[1].poster, None);
}

#[test]
fn keep_catalog_values_tmdb_lacks() {
    let merged = merge_details(&seed(), &json!({ "id": 7, "overview": "" }));

    assert_eq!(
        merged.poster.as_deref(),
        Some("https://img.example.com/moviebox-dune.jpg")
    );
    assert_eq!(merged.rating, "7.9");
    assert_eq!(merged.year, "2021");
    assert_eq!(merged.overview, "from the catalog");
    assert_eq!(merged.backdrop, None);
    assert!(merged.similar.is_empty());
}

#[test]
fn read_the_year_of_tv_shows_from_first_air_date() {
    let merged = merge_details(
        &MediaSeed {
            title: "Dark".to_string(),
            ..Default::default()
        },
        &json!({ "first_air_date": "2017-12-01" }),
    );

    assert_eq!(merged.year, "2017");
}

#[test]
fn pass_the_seed_through_unchanged() {
    let enriched: EnrichedMedia = seed().into();

    assert_eq!(enriched.title, "Dune");
    assert_eq!(enriched.rating, "7.9");
    assert_eq!(enriched.tmdb_id, None);
    assert!(enriched.similar.is_empty());
}

#[test]
fn tag_search_results_by_media_type() {
    assert_eq!(MediaType::from_result(&json!({ "media_type": "tv" })), MediaType::Tv);
    assert_eq!(MediaType::from_result(&json!({ "media_type": "movie" })), MediaType::Movie);
    assert_eq!(MediaType::from_result(&json!({ "media_type": "person" })), MediaType::Movie);
    assert_eq!(MediaType::from_result(&json!({})), MediaType::Movie);
}

#[test]
fn ignore_missing_recommendations() {
    assert!(similar_items(&json!({})).is_empty());
    assert!(similar_items(&json!({ "recommendations": { "results": "nope" } })).is_empty());
}

#[test]
fn keep_imdb_ids_inside_the_find_path() {
    assert_eq!(find_path("tt1160419"), "/find/tt1160419");
    assert_eq!(find_path(" tt1160419 "), "/find/tt1160419");
    assert_eq!(
        find_path("../movie/550?api_key=x#"),
        "/find/..%2Fmovie%2F550%3Fapi_key%3Dx%23"
    );
}
