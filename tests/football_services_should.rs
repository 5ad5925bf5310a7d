use chrono::NaiveDate;
use reelbox::database::catalog::{FootballMatch, FootballStream};
use reelbox::server::services::football_services::{
    available_dates, matches_on, parse_each, upcoming,
};
use serde_json::json;

const MAY_1_10H: i64 = 1_714_557_600_000;
const MAY_1_22H: i64 = 1_714_600_800_000;
const MAY_2_01H: i64 = 1_714_611_600_000;
const MAY_3_12H: i64 = 1_714_737_600_000;
const HOUR: i64 = 3_600_000;

fn fixture(id: &str, date: i64) -> FootballMatch {
    FootballMatch {
        id: id.to_string(),
        title: format!("match {}", id),
        date,
        ..Default::default()
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn list_each_match_day_once_in_order() {
    let matches = vec![
        fixture("c", MAY_3_12H),
        fixture("a", MAY_1_22H),
        fixture("b", MAY_2_01H),
        fixture("d", MAY_1_10H),
    ];

    assert_eq!(
        available_dates(&matches),
        vec![day(2024, 5, 1), day(2024, 5, 2), day(2024, 5, 3)]
    );
    assert!(available_dates(&[]).is_empty());
}

#[test]
fn filter_matches_by_utc_day() {
    let matches = vec![
        fixture("a", MAY_1_10H),
        fixture("b", MAY_1_22H),
        fixture("c", MAY_2_01H),
    ];

    let ids: Vec<String> = matches_on(&matches, day(2024, 5, 1))
        .into_iter()
        .map(|m| m.id)
        .collect();

    assert_eq!(ids, vec!["a", "b"]);
    assert!(matches_on(&matches, day(2024, 6, 1)).is_empty());
}

#[test]
fn keep_recent_and_upcoming_matches_for_the_home_feed() {
    let now = MAY_1_22H;
    let matches = vec![
        fixture("later", now + 5 * HOUR),
        fixture("long-over", now - 3 * HOUR),
        fixture("just-started", now - HOUR),
        fixture("soon", now + HOUR),
    ];

    let ids: Vec<String> = upcoming(matches, now).into_iter().map(|m| m.id).collect();

    assert_eq!(ids, vec!["just-started", "soon", "later"]);
}

#[test]
fn cap_the_home_feed_at_seven() {
    let now = MAY_1_10H;
    let matches: Vec<FootballMatch> = (0..12)
        .rev()
        .map(|i| fixture(&i.to_string(), now + i * HOUR))
        .collect();

    let feed = upcoming(matches, now);

    assert_eq!(feed.len(), 7);
    assert_eq!(feed[0].id, "0");
    assert_eq!(feed[6].id, "6");
}

#[test]
fn parse_loosely_typed_matches() {
    let parsed: FootballMatch = serde_json::from_value(json!({
        "id": "arsenal-vs-chelsea",
        "title": "Arsenal vs Chelsea",
        "category": "football",
        "date": "1714557600000",
        "popular": true,
        "teams": {
            "home": { "name": "Arsenal", "badge": "abc" },
            "away": { "name": "Chelsea", "badge": "def" }
        },
        "sources": [{ "source": "alpha", "id": "ars-che" }, { "source": "bravo", "id": 991 }]
    }))
    .unwrap();

    assert_eq!(parsed.date, MAY_1_10H);
    assert!(parsed.popular);
    assert_eq!(
        parsed.teams.and_then(|t| t.home).map(|h| h.name).as_deref(),
        Some("Arsenal")
    );
    assert_eq!(parsed.sources.len(), 2);
    assert_eq!(parsed.sources[1].id, "991");
}

#[test]
fn read_the_embed_url_of_a_stream() {
    let streams: Vec<FootballStream> = serde_json::from_value(json!([{
        "id": "ars-che",
        "streamNo": 1,
        "language": "English",
        "hd": true,
        "embedUrl": "https://embedsports.top/embed/alpha/ars-che/1",
        "source": "alpha"
    }]))
    .unwrap();

    assert_eq!(streams[0].stream_no, 1);
    assert_eq!(
        streams[0].embed_url.as_deref(),
        Some("https://embedsports.top/embed/alpha/ars-che/1")
    );
}

#[test]
fn read_null_fields_as_their_defaults() {
    let matches: Vec<FootballMatch> = serde_json::from_value(json!([
        { "id": "a", "date": MAY_1_10H, "popular": true, "sources": [{ "source": "alpha", "id": "a" }] },
        { "id": "b", "date": MAY_1_22H, "popular": null, "sources": null, "teams": null }
    ]))
    .unwrap();

    assert_eq!(matches.len(), 2);
    assert!(!matches[1].popular);
    assert!(matches[1].sources.is_empty());
    assert_eq!(matches[1].teams, None);

    let stream: FootballStream =
        serde_json::from_value(json!({ "id": "s", "hd": null, "streamNo": null })).unwrap();
    assert!(!stream.hd);
    assert_eq!(stream.stream_no, 0);
}

#[test]
fn accept_flags_sent_as_strings_or_numbers() {
    let parsed: FootballMatch =
        serde_json::from_value(json!({ "id": "a", "popular": "true" })).unwrap();
    let stream: FootballStream = serde_json::from_value(json!({ "hd": 1 })).unwrap();

    assert!(parsed.popular);
    assert!(stream.hd);
}

#[test]
fn skip_only_the_malformed_entries_of_a_list() {
    let payload = json!([
        { "id": "good", "date": MAY_1_10H },
        { "id": "bad", "sources": "alpha" },
        "not a match",
        { "id": "also-good", "date": MAY_2_01H, "popular": null }
    ]);

    let parsed: Vec<FootballMatch> = parse_each(&payload).unwrap();
    let ids: Vec<&str> = parsed.iter().map(|m| m.id.as_str()).collect();

    assert_eq!(ids, vec!["good", "also-good"]);
    assert!(parse_each::<FootballMatch>(&json!({ "error": "rate limited" })).is_none());
}
