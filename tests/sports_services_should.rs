use reelbox::database::catalog::Match;
use reelbox::server::services::sports_services::{flatten_match_list, match_window};
use serde_json::json;

#[test]
fn look_twelve_hours_back_and_two_days_ahead() {
    let now = 1_714_557_600_000;

    assert_eq!(
        match_window(now),
        (now - 12 * 3_600_000, now + 48 * 3_600_000)
    );
}

#[test]
fn flatten_leagues_into_one_list() {
    let payload = json!({
        "code": 0,
        "message": "ok",
        "data": {
            "list": [
                {
                    "league": "Premier League",
                    "matchList": [
                        {
                            "id": "m1",
                            "team1": { "id": 1, "name": "Arsenal", "score": 2, "avatar": "https://img/a.png" },
                            "team2": { "name": "Chelsea", "score": "1" },
                            "status": "Living",
                            "startTime": 1714557600000u64,
                            "playPath": "https://cdn.example.com/m1.m3u8"
                        },
                        { "id": 2, "status": "MatchNotStart", "league": "FA Cup" }
                    ]
                },
                { "league": "Empty" },
                {
                    "league": "La Liga",
                    "matchList": [{ "id": "m3", "status": "MatchEnd" }]
                }
            ]
        }
    });

    let matches = flatten_match_list(&payload);

    assert_eq!(matches.len(), 3);

    let first = &matches[0];
    assert_eq!(first.id, "m1");
    assert_eq!(first.team1.id, "1");
    assert_eq!(first.team1.name, "Arsenal");
    assert_eq!(first.team1.score, "2");
    assert_eq!(first.team2.score, "1");
    assert_eq!(first.team2.avatar, "");
    assert_eq!(first.start_time, "1714557600000");
    assert_eq!(first.league, "Premier League");
    assert_eq!(first.play_path.as_deref(), Some("https://cdn.example.com/m1.m3u8"));
    assert!(first.is_live());

    assert_eq!(matches[1].id, "2");
    assert_eq!(matches[1].league, "FA Cup");
    assert_eq!(matches[1].team1, Default::default());
    assert!(!matches[1].is_live());

    assert_eq!(matches[2].league, "La Liga");
}

#[test]
fn skip_malformed_matches_only() {
    let payload = json!({
        "code": 0,
        "data": { "list": [{
            "league": "Serie A",
            "matchList": [
                { "id": "bad", "team1": "not a team" },
                { "id": "good" },
                "not a match"
            ]
        }]}
    });

    let matches = flatten_match_list(&payload);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, "good");
}

#[test]
fn treat_other_shapes_as_no_matches() {
    assert!(flatten_match_list(&json!({ "code": 1, "data": { "list": [] } })).is_empty());
    assert!(flatten_match_list(&json!({ "code": 0, "data": { "list": {} } })).is_empty());
    assert!(flatten_match_list(&json!({ "code": 0 })).is_empty());
    assert!(flatten_match_list(&json!({ "code": "0", "data": { "list": [] } })).is_empty());
    assert!(flatten_match_list(&json!(null)).is_empty());
}

#[test]
fn serialize_matches_back_in_camel_case() {
    let parsed: Match = serde_json::from_value(json!({
        "id": "m1",
        "startTime": "1714557600000",
        "status": "Living"
    }))
    .unwrap();

    let value = serde_json::to_value(&parsed).unwrap();

    assert_eq!(value["startTime"], "1714557600000");
    assert!(value.get("playPath").is_none());
    assert_eq!(value["team1"]["name"], "");
}
