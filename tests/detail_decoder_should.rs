use reelbox::server::utils::detail_decoder::{
    DetailDecoder, MAX_NODES, decode_detail_blob, extract_json_script,
};
use serde_json::{Value, json};

fn depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        Value::Object(fields) => 1 + fields.values().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}

fn node_count(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(node_count).sum::<usize>(),
        Value::Object(fields) => 1 + fields.values().map(node_count).sum::<usize>(),
        _ => 1,
    }
}

// entry 0 holds a title pointing at 1, every array after it points twice at the next one
fn diamond_chain(levels: usize) -> Value {
    let mut blob = vec![json!({ "title": 1 })];
    blob.extend((1..=levels).map(|i| json!([i + 1, i + 1])));
    blob.push(json!("leaf"));
    Value::Array(blob)
}

#[test]
fn resolve_indices_into_nested_values() {
    let raw = json!([
        { "title": 1, "metadata": 2, "cast": 3 },
        "Dune",
        { "year": 4 },
        [5, 6],
        2021,
        "Paul",
        "Chani"
    ]);

    let decoded = decode_detail_blob(&raw).unwrap();

    assert_eq!(
        decoded,
        json!({
            "title": "Dune",
            "metadata": { "year": 2021 },
            "cast": ["Paul", "Chani"]
        })
    );
}

#[test]
fn prefer_the_entry_with_a_title_or_metadata() {
    let raw = json!([
        { "layout": 2 },
        { "title": 3 },
        "wide",
        "Arrival"
    ]);

    let decoded = decode_detail_blob(&raw).unwrap();

    assert_eq!(decoded, json!({ "title": "Arrival" }));
}

#[test]
fn fall_back_to_the_first_object() {
    let raw = json!(["noise", { "layout": 0 }, { "other": 0 }]);

    let decoded = decode_detail_blob(&raw).unwrap();

    assert_eq!(decoded, json!({ "layout": "noise" }));
}

#[test]
fn return_none_without_objects() {
    assert!(decode_detail_blob(&json!([1, 2, "three"])).is_none());
    assert!(decode_detail_blob(&json!({ "title": "not an array" })).is_none());
    assert!(decode_detail_blob(&json!([])).is_none());
}

#[test]
fn never_leak_bad_indices() {
    let raw = json!([
        { "title": 1, "far": 99, "negative": -1, "fraction": 1.5, "flag": true, "text": "inline" },
        "Heat"
    ]);

    let decoded = decode_detail_blob(&raw).unwrap();

    assert_eq!(
        decoded,
        json!({
            "title": "Heat",
            "far": null,
            "negative": null,
            "fraction": null,
            "flag": true,
            "text": "inline"
        })
    );
}

#[test]
fn break_reference_cycles() {
    let raw = json!([{ "a": 1 }, { "b": 0 }]);

    let decoded = decode_detail_blob(&raw).unwrap();

    assert_eq!(decoded, json!({ "a": { "b": null } }));
}

#[test]
fn stop_at_the_depth_limit() {
    // every entry points at the next one, far deeper than anything real
    let chain: Vec<Value> = (1..=300).map(|next| json!({ "next": next })).collect();
    let raw = Value::Array(chain);

    let decoded = decode_detail_blob(&raw).unwrap();

    assert!(depth(&decoded) <= 66);
}

#[test]
fn expand_shared_references_everywhere_they_appear() {
    let decoded = decode_detail_blob(&diamond_chain(2)).unwrap();

    assert_eq!(
        decoded,
        json!({ "title": [["leaf", "leaf"], ["leaf", "leaf"]] })
    );
}

#[test]
fn cap_the_size_of_deep_shared_references() {
    // 2^40 leaves if expanded naively, from a blob of a few hundred bytes
    let raw = diamond_chain(40);
    let data = raw.as_array().unwrap();

    let mut decoder = DetailDecoder::new(data);
    let decoded = decoder.resolve_entry(0, &data[0]);

    assert!(decoder.nodes() <= MAX_NODES);
    assert!(node_count(&decoded) <= 2 * MAX_NODES);
    assert!(decoded["title"].is_array());
}

#[test]
fn decode_shared_references_shallow_enough_to_fit() {
    let decoded = decode_detail_blob(&diamond_chain(12)).unwrap();

    // 2^12 leaves plus the arrays above them plus the object itself
    assert_eq!(node_count(&decoded), (1 << 13) - 1 + 1);
    assert_eq!(decoded["title"][1][0][1][1][0][0][1][0][1][1][0][0], json!("leaf"));
}

#[test]
fn resolve_standalone_values() {
    let data = vec![json!("zero"), json!(["one", 0])];
    let mut decoder = DetailDecoder::new(&data);

    assert_eq!(decoder.resolve(&json!([1])), json!([["one", "zero"]]));
    assert_eq!(decoder.resolve(&json!("leaf")), json!("leaf"));
}

#[test]
fn find_the_embedded_json_script() {
    let html = r#"<html><head>
        <script type="text/javascript">var x = 1;</script>
        <script type="application/json" id="__NUXT_DATA__" data-ssr="true">[{"title":1},
        "Dune"]</script>
        <script type="application/json">["second"]</script>
        </head></html>"#;

    let script = extract_json_script(html).unwrap();

    assert!(script.starts_with("[{\"title\":1},"));
    let parsed: Value = serde_json::from_str(script).unwrap();
    assert_eq!(decode_detail_blob(&parsed).unwrap(), json!({ "title": "Dune" }));
}

#[test]
fn find_nothing_in_plain_pages() {
    assert!(extract_json_script("<html><body>nothing here</body></html>").is_none());
}
