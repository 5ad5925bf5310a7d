use reelbox::server::utils::{proxy_utils::encode_target_url, signature_utils::SignatureUtil};

#[test]
fn sign_the_same_link_the_same_way() {
    let util = SignatureUtil::new("test_secret".to_string());
    let sig1 = util.generate_signature("client123", 1234567890, "aHR0cHM6Ly9leGFtcGxlLmNvbQ");
    let sig2 = util.generate_signature("client123", 1234567890, "aHR0cHM6Ly9leGFtcGxlLmNvbQ");

    assert_eq!(sig1, sig2);
    // hex of a sha256 mac
    assert_eq!(sig1.len(), 64);
}

#[test]
fn verify_only_the_client_and_url_it_was_signed_for() {
    let util = SignatureUtil::new("test_secret".to_string());
    let expiry = SignatureUtil::generate_expiry(12);
    let url = encode_target_url("https://cdn.example.com/hls/master.m3u8");
    let client_id = "client123";

    let signature = util.generate_signature(client_id, expiry, &url);

    assert!(util.verify_signature(client_id, expiry, &url, &signature));
    assert!(!util.verify_signature(client_id, expiry, &url, "invalid"));
    assert!(!util.verify_signature("different_client", expiry, &url, &signature));

    let other_url = encode_target_url("https://cdn.example.com/hls/other.m3u8");
    assert!(!util.verify_signature(client_id, expiry, &other_url, &signature));
}

#[test]
fn reject_a_signature_made_with_another_secret() {
    let ours = SignatureUtil::new("test_secret".to_string());
    let theirs = SignatureUtil::new("someone_elses".to_string());
    let expiry = SignatureUtil::generate_expiry(1);

    let signature = theirs.generate_signature("client123", expiry, "url");

    assert!(!ours.verify_signature("client123", expiry, "url", &signature));
}

#[test]
fn reject_expired_links() {
    let util = SignatureUtil::new("test_secret".to_string());
    let past_expiry = 1234567890;
    let url = "https://example.com";
    let client_id = "client123";

    let signature = util.generate_signature(client_id, past_expiry, url);

    assert!(!util.verify_signature(client_id, past_expiry, url, &signature));
}

#[test]
fn reject_a_tampered_expiry() {
    let util = SignatureUtil::new("test_secret".to_string());
    let expiry = SignatureUtil::generate_expiry(1);

    let signature = util.generate_signature("client123", expiry, "url");

    assert!(!util.verify_signature("client123", expiry + 3600, "url", &signature));
}
