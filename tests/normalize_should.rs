use reelbox::server::utils::normalize::{
    PLACEHOLDER_POSTER, extract_list, has_resource, map_media_details, map_media_item,
    playable_streams,
};
use serde_json::json;

#[test]
fn default_every_field_of_an_empty_item() {
    let item = map_media_item(&json!({}));

    assert_eq!(item.title, "Unknown");
    assert_eq!(item.poster_url, PLACEHOLDER_POSTER);
    assert_eq!(item.cover, PLACEHOLDER_POSTER);
    assert_eq!(item.id, None);
    assert_eq!(item.imdb_id, None);
    assert_eq!(item.year, "");
    assert_eq!(item.overview, "");
    assert_eq!(item.rating, 0.0);
    assert_eq!(item.subject_type, 2);
    assert!(!item.is_movie);
    assert_eq!(item.detail_path, "");
    assert!(item.casts.is_empty());
}

#[test]
fn default_items_that_are_not_objects() {
    for value in [json!(null), json!("string"), json!(42), json!([1, 2])] {
        let item = map_media_item(&value);
        assert_eq!(item.title, "Unknown");
        assert_eq!(item.poster_url, PLACEHOLDER_POSTER);
    }
}

#[test]
fn map_a_full_rank_item() {
    let item = map_media_item(&json!({
        "subjectId": 5256777509147918584u64,
        "title": "Dune",
        "cover": { "url": "https://img.example.com/dune.jpg" },
        "releaseDate": "2021-10-22",
        "intro": "Paul goes to Arrakis",
        "score": "8.1",
        "subjectType": 1,
        "detailPath": "dune-abc123",
        "actors": [{ "name": "Zendaya" }]
    }));

    assert_eq!(item.id.as_deref(), Some("5256777509147918584"));
    assert_eq!(item.imdb_id, item.id);
    assert_eq!(item.title, "Dune");
    assert_eq!(item.poster_url, "https://img.example.com/dune.jpg");
    assert_eq!(item.year, "2021");
    assert_eq!(item.overview, "Paul goes to Arrakis");
    assert_eq!(item.rating, 8.1);
    assert_eq!(item.subject_type, 1);
    assert!(item.is_movie);
    assert_eq!(item.detail_path, "dune-abc123");
    assert_eq!(item.casts, vec![json!({ "name": "Zendaya" })]);
}

#[test]
fn skip_empty_values_in_fallback_chains() {
    let item = map_media_item(&json!({
        "title": "",
        "name": null,
        "word": "Suggested",
        "subjectId": 0,
        "id": "abc",
        "poster_url": "",
        "cover": "https://img.example.com/flat.jpg",
        "releaseDate": "",
        "publish_time": "1999-01-01",
        "score": 0,
        "rating": 6.5
    }));

    assert_eq!(item.title, "Suggested");
    assert_eq!(item.id.as_deref(), Some("abc"));
    assert_eq!(item.poster_url, "https://img.example.com/flat.jpg");
    assert_eq!(item.year, "1999");
    assert_eq!(item.rating, 6.5);
}

#[test]
fn use_module_when_subject_type_is_missing() {
    let movie = map_media_item(&json!({ "subjectType": 0, "module": 1 }));
    assert_eq!(movie.subject_type, 1);
    assert!(movie.is_movie);

    let series = map_media_item(&json!({ "module": 2 }));
    assert_eq!(series.subject_type, 2);
    assert!(!series.is_movie);
}

#[test]
fn find_the_list_in_any_response_shape() {
    assert_eq!(extract_list(&json!([1, 2])), vec![json!(1), json!(2)]);
    assert_eq!(
        extract_list(&json!({ "data": { "items": [1] } })),
        vec![json!(1)]
    );
    assert_eq!(
        extract_list(&json!({ "data": { "list": [1], "items": [2] } })),
        vec![json!(1)]
    );
    assert_eq!(
        extract_list(&json!({ "data": null, "results": [3] })),
        vec![json!(3)]
    );
    assert_eq!(
        extract_list(&json!({ "data": { "pager": { "page": 1 }, "subjects": [4] } })),
        vec![json!(4)]
    );
    assert!(extract_list(&json!({ "data": { "pager": {} } })).is_empty());
    assert!(extract_list(&json!("nope")).is_empty());
    assert!(extract_list(&json!(null)).is_empty());
}

#[test]
fn return_none_for_details_that_are_not_objects() {
    assert!(map_media_details(&json!(null)).is_none());
    assert!(map_media_details(&json!([{ "title": "x" }])).is_none());
    assert!(map_media_details(&json!("Dune")).is_none());
}

#[test]
fn lift_the_subject_out_of_decoded_details() {
    let details = map_media_details(&json!({
        "subject": {
            "subjectId": "42",
            "title": "Severance",
            "cover": { "url": "https://img.example.com/sev.jpg" },
            "releaseDate": "2022-02-18",
            "subjectType": 2,
            "detailPath": "severance-xyz"
        },
        "seasons": [{ "se": 1 }, { "se": 2 }]
    }))
    .unwrap();

    assert_eq!(details.id.as_deref(), Some("42"));
    assert_eq!(details.title, "Severance");
    assert_eq!(details.poster_url, "https://img.example.com/sev.jpg");
    assert_eq!(details.backdrop_url, details.poster_url);
    assert_eq!(details.year, "2022");
    assert_eq!(details.seasons, 2);
    assert!(details.is_series);
    assert_eq!(details.detail_path, "severance-xyz");
}

#[test]
fn build_runtime_and_season_count_from_fallbacks() {
    let movie = map_media_details(&json!({ "title": "Heat", "duration": 170 })).unwrap();
    assert_eq!(movie.runtime, "170 min");
    assert_eq!(movie.seasons, 0);
    assert!(!movie.is_series);

    let show = map_media_details(&json!({
        "name": "Dark",
        "runtime": "60 min",
        "seasons_count": "3"
    }))
    .unwrap();
    assert_eq!(show.title, "Dark");
    assert_eq!(show.runtime, "60 min");
    assert_eq!(show.seasons, 3);
    assert!(!show.is_series);

    let empty = map_media_details(&json!({})).unwrap();
    assert_eq!(empty.title, "Unknown");
    assert_eq!(empty.runtime, "");
    assert_eq!(empty.poster_url, PLACEHOLDER_POSTER);
}

#[test]
fn pick_the_first_non_empty_stream_list() {
    let sources = json!({
        "code": 0,
        "data": {
            "hasResource": true,
            "streams": [],
            "hls": [
                { "url": "https://cdn.example.com/a.m3u8", "format": "HLS", "resolutions": 1080 },
                { "url": "", "format": "HLS" }
            ],
            "dash": [{ "url": "https://cdn.example.com/a.mpd" }]
        }
    });

    let streams = playable_streams(&sources);

    assert!(has_resource(&sources));
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].url, "https://cdn.example.com/a.m3u8");
    assert_eq!(streams[0].format, "HLS");
    assert_eq!(streams[0].resolutions, "1080");
}

#[test]
fn report_nothing_playable_for_empty_sources() {
    let sources = json!({ "data": { "hasResource": false } });

    assert!(!has_resource(&sources));
    assert!(playable_streams(&sources).is_empty());
    assert!(playable_streams(&json!(null)).is_empty());
}
