use reelbox::server::services::cookie_services::{
    CookieService, merge_cookies, session_cookie_header,
};

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn join_set_cookie_pairs_into_one_header() {
    let set_cookies = owned(&[
        "uuid=abc123; Path=/; HttpOnly; Max-Age=86400",
        "token=xyz; Secure",
        "lang=en",
    ]);

    assert_eq!(
        session_cookie_header(&set_cookies).as_deref(),
        Some("uuid=abc123; token=xyz; lang=en")
    );
}

#[test]
fn hand_out_no_header_without_cookies() {
    assert_eq!(session_cookie_header(&[]), None);
    assert_eq!(session_cookie_header(&owned(&["garbage", "=novalue"])), None);
}

#[test]
fn let_fresh_cookies_win_and_keep_the_order() {
    let merged = merge_cookies(
        Some("a=1; b=2; c=3"),
        &owned(&["b=20; Path=/", "d=4; HttpOnly"]),
    );

    assert_eq!(merged, "a=1; b=20; c=3; d=4");
}

#[test]
fn merge_into_an_empty_jar() {
    assert_eq!(merge_cookies(None, &owned(&["a=1; Path=/"])), "a=1");
    assert_eq!(merge_cookies(Some("a=1"), &[]), "a=1");
    assert_eq!(merge_cookies(None, &[]), "");
}

#[test]
fn key_cookies_by_host() {
    assert_eq!(
        CookieService::extract_domain("https://h5.aoneroom.com/wefeed-h5-bff/web/subject/play")
            .as_deref(),
        Some("h5.aoneroom.com")
    );
    assert_eq!(CookieService::extract_domain("not a url"), None);
}
