// moviebox never settles on one shape for anything, so every field is a chain of guesses. The
// order of each chain matters, it's the order the fields were seen in real responses.
use serde_json::{Map, Value};

use crate::database::catalog::{MediaDetails, MediaItem, StreamSource};

pub const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/500x750?text=No+Image";

/// "present" the way the web client saw it: null, false, "", 0 and missing are all absent
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn first_present<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .map(|key| item.get(key))
        .find(|value| truthy(*value))
        .flatten()
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_of(item: &Value, keys: &[&str]) -> Option<String> {
    first_present(item, keys).and_then(as_text)
}

fn number_of(item: &Value, keys: &[&str]) -> f64 {
    match first_present(item, keys) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

fn year_of(item: &Value) -> String {
    text_of(item, &["releaseDate", "publish_time", "year"])
        .map(|date| date.chars().take(4).collect())
        .unwrap_or_default()
}

fn int_field(item: &Value, key: &str) -> Option<i64> {
    item.get(key).and_then(|value| match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

// poster_url -> cover.url -> cover -> poster -> img, cover can be either an object or a url
fn poster_of(item: &Value, with_poster_url: bool) -> String {
    let mut candidates: Vec<Option<&Value>> = Vec::with_capacity(5);
    if with_poster_url {
        candidates.push(item.get("poster_url"));
    }
    candidates.push(item.get("cover").and_then(|cover| cover.get("url")));
    candidates.push(item.get("cover"));
    candidates.push(item.get("poster"));
    candidates.push(item.get("img"));

    candidates
        .into_iter()
        .filter(|candidate| truthy(*candidate))
        .flatten()
        .find_map(|candidate| candidate.as_str().map(str::to_string))
        .unwrap_or_else(|| PLACEHOLDER_POSTER.to_string())
}

/// pulls the result array out of any list-ish response
///
/// looks through `data` first when it's set, then the known list keys, then gives up and takes
/// the first array valued field it can find
pub fn extract_list(data: &Value) -> Vec<Value> {
    let inner = match data.get("data") {
        Some(inner) if truthy(Some(inner)) => inner,
        _ => data,
    };

    if let Value::Array(items) = inner {
        return items.clone();
    }

    let Value::Object(fields) = inner else {
        return Vec::new();
    };

    ["list", "results", "items", "movie", "tv"]
        .iter()
        .filter_map(|key| fields.get(*key))
        .chain(fields.values())
        .find_map(|value| value.as_array().cloned())
        .unwrap_or_default()
}

pub fn map_media_item(item: &Value) -> MediaItem {
    let id = text_of(item, &["subjectId", "id", "mid", "tid"]);
    let poster = poster_of(item, true);
    let module = int_field(item, "module");
    let subject_type = int_field(item, "subjectType");

    MediaItem {
        imdb_id: id.clone(),
        id,
        title: text_of(item, &["title", "name", "word"]).unwrap_or_else(|| "Unknown".to_string()),
        cover: poster.clone(),
        poster_url: poster,
        year: year_of(item),
        overview: text_of(item, &["intro", "description"]).unwrap_or_default(),
        rating: number_of(item, &["score", "rating"]),
        subject_type: subject_type
            .filter(|t| *t != 0)
            .unwrap_or(if module == Some(1) { 1 } else { 2 }),
        is_movie: subject_type == Some(1) || module == Some(1),
        detail_path: text_of(item, &["detailPath"]).unwrap_or_default(),
        casts: first_present(item, &["actors", "casts"])
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

// decoded detail pages keep the interesting bits under `subject`, lift them up so the usual
// chains find them
fn flatten_subject(item: &Value) -> Value {
    let has_title = truthy(item.get("title")) || truthy(item.get("name"));

    match (item, item.get("subject")) {
        (Value::Object(top), Some(Value::Object(subject))) if !has_title => {
            let mut merged: Map<String, Value> = top.clone();
            for (key, value) in subject {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => item.clone(),
    }
}

pub fn map_media_details(item: &Value) -> Option<MediaDetails> {
    if !item.is_object() {
        return None;
    }

    let item = flatten_subject(item);
    let id = text_of(&item, &["subjectId", "id"]);
    let poster = poster_of(&item, false);
    let seasons_present = truthy(item.get("seasons"));

    let runtime = text_of(&item, &["runtime"])
        .or_else(|| text_of(&item, &["duration"]).map(|d| format!("{} min", d)))
        .unwrap_or_default();

    let seasons = match first_present(&item, &["seasons_count"]) {
        Some(count) => count
            .as_u64()
            .or_else(|| count.as_str().and_then(|s| s.parse().ok()))
            .unwrap_or_default(),
        None => item
            .get("seasons")
            .and_then(Value::as_array)
            .map(|seasons| seasons.len() as u64)
            .unwrap_or_default(),
    };

    Some(MediaDetails {
        imdb_id: id.clone(),
        id,
        title: text_of(&item, &["title", "name"]).unwrap_or_else(|| "Unknown".to_string()),
        backdrop_url: poster.clone(),
        poster_url: poster,
        year: year_of(&item),
        overview: text_of(&item, &["intro", "description"]).unwrap_or_default(),
        rating: number_of(&item, &["score", "rating"]),
        runtime,
        seasons,
        is_series: int_field(&item, "subjectType") == Some(2)
            || int_field(&item, "module") == Some(2)
            || seasons_present,
        detail_path: text_of(&item, &["detailPath"]).unwrap_or_default(),
    })
}

pub fn has_resource(sources: &Value) -> bool {
    let data = sources.get("data").unwrap_or(sources);
    truthy(data.get("hasResource"))
}

/// playable renditions from a /subject/play response, first non empty of streams, hls, dash
pub fn playable_streams(sources: &Value) -> Vec<StreamSource> {
    let data = sources.get("data").unwrap_or(sources);

    ["streams", "hls", "dash"]
        .iter()
        .filter_map(|key| data.get(*key).and_then(Value::as_array))
        .find(|list| !list.is_empty())
        .map(|list| {
            list.iter()
                .filter_map(|stream| {
                    let url = stream.get("url").and_then(as_text).filter(|u| !u.is_empty())?;
                    Some(StreamSource {
                        url,
                        format: stream.get("format").and_then(as_text).unwrap_or_default(),
                        resolutions: stream
                            .get("resolutions")
                            .and_then(as_text)
                            .unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthy_follows_loose_semantics() {
        assert!(!truthy(None));
        assert!(!truthy(Some(&json!(null))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(Some(&json!(false))));
        assert!(truthy(Some(&json!([]))));
        assert!(truthy(Some(&json!({}))));
        assert!(truthy(Some(&json!("0"))));
        assert!(truthy(Some(&json!(-1))));
    }

    #[test]
    fn poster_skips_cover_objects_without_url() {
        let item = json!({ "cover": { "width": 10 }, "img": "https://img/x.jpg" });
        assert_eq!(poster_of(&item, true), "https://img/x.jpg");
    }
}
