// pure helpers behind the media proxy, kept out of the controller so they can be tested without
// spinning up the router
use std::io::Read;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use flate2::read::GzDecoder;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::header;
use tracing::error;

use crate::server::{
    error::{AppResult, Error},
    utils::signature_utils::SignatureUtil,
};

// how long a link inside a rewritten playlist stays valid
pub const SIGNED_LINK_TTL_HOURS: i64 = 12;

static URI_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"URI="([^"]+)""#).expect("Static regex should compile"));

/// the url param is either a plain (percent encoded) url or unpadded url safe base64 of one
pub fn decode_target_url(url_param: &str) -> AppResult<String> {
    if url_param.starts_with("http://") || url_param.starts_with("https://") {
        return urlencoding::decode(url_param)
            .map(|s| s.into_owned())
            .map_err(|e| {
                error!("Failed to decode URL: {}", e);
                Error::BadRequest("Invalid URL encoding".to_string())
            });
    }

    // padding is stripped when we encode, tolerate it if someone sends it anyways
    let bytes = URL_SAFE_NO_PAD
        .decode(url_param.trim_end_matches('='))
        .map_err(|e| {
            error!("Failed to decode base64: {}", e);
            Error::BadRequest("Invalid URL encoding".to_string())
        })?;

    String::from_utf8(bytes).map_err(|e| {
        error!("Failed to parse UTF-8: {}", e);
        Error::BadRequest("Invalid URL encoding".to_string())
    })
}

pub fn encode_target_url(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(url.as_bytes())
}

/// undo whatever compression upstream applied, unknown encodings are passed through as is
pub fn decompress_body(bytes: &[u8], content_encoding: Option<&str>) -> AppResult<Vec<u8>> {
    match content_encoding.map(|e| e.trim().to_ascii_lowercase()).as_deref() {
        Some("zstd") => zstd::decode_all(bytes).map_err(|e| {
            error!("Failed to decompress zstd: {}", e);
            Error::InternalServerErrorWithContext("Failed to decompress response".to_string())
        }),
        Some("gzip") | Some("x-gzip") => {
            let mut decoder = GzDecoder::new(bytes);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed).map_err(|e| {
                error!("Failed to decompress gzip response: {}", e);
                Error::InternalServerErrorWithContext("Failed to decompress response".to_string())
            })?;
            Ok(decompressed)
        }
        _ => Ok(bytes.to_vec()),
    }
}

/// inclusive byte range out of a `bytes=start-end` header, clamped to the body
///
/// None when there's no usable range, the caller then serves the full body
pub fn byte_range(range_header: Option<&str>, total_len: usize) -> Option<(usize, usize)> {
    let range = range_header?.trim().strip_prefix("bytes=")?;
    // multi range requests get the full body
    if range.contains(',') || total_len == 0 {
        return None;
    }

    let (start, end) = range.split_once('-')?;
    let last = total_len - 1;

    let (start, end) = match (start.trim(), end.trim()) {
        // suffix form, the last n bytes
        ("", suffix) => {
            let suffix: usize = suffix.parse().ok()?;
            if suffix == 0 {
                return None;
            }
            (total_len.saturating_sub(suffix), last)
        }
        (start, "") => (start.parse().ok()?, last),
        (start, end) => (start.parse().ok()?, end.parse::<usize>().ok()?.min(last)),
    };

    (start <= end && start < total_len).then_some((start, end))
}

pub fn is_playlist(body: &[u8], content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    if content_type.contains("video/mp4") {
        return false;
    }
    body.starts_with(b"#EXT") || content_type.contains("mpegurl") || content_type.contains("m3u8")
}

/// bodies up to this size get buffered when nothing else says whether they're media
pub const MAX_BUFFERED_BODY: u64 = 2 * 1024 * 1024;

/// whether an upstream body has to be read whole before answering: compressed bodies and anything
/// that might be a playlist. Media goes straight through as a stream.
pub fn should_buffer(
    content_type: &str,
    content_encoding: Option<&str>,
    target_url: &str,
    content_length: Option<u64>,
) -> bool {
    let encoded = content_encoding
        .map(str::trim)
        .is_some_and(|e| !e.is_empty() && !e.eq_ignore_ascii_case("identity"));
    if encoded {
        return true;
    }

    let content_type = content_type.to_ascii_lowercase();
    if content_type.contains("mpegurl") || content_type.contains("m3u8") {
        return true;
    }

    let playlist_path = url::Url::parse(target_url).is_ok_and(|u| {
        let path = u.path().to_ascii_lowercase();
        path.ends_with(".m3u8") || path.ends_with(".m3u")
    });
    if playlist_path {
        return true;
    }

    if ["video/", "audio/", "image/", "font/"]
        .iter()
        .any(|prefix| content_type.starts_with(prefix))
    {
        return false;
    }
    if content_type.starts_with("text/") || content_type.contains("json") {
        return true;
    }

    content_length.is_some_and(|len| len <= MAX_BUFFERED_BODY)
}

/// rewrites every uri in an hls playlist into a signed proxy link
///
/// segment and variant lines are resolved against the playlist's own url, `URI="..."`
/// attributes (keys, alternate renditions) get the same treatment. `##` comment lines are
/// dropped.
pub fn rewrite_playlist(
    text: &str,
    target_url: &str,
    schema: &str,
    client_id: &str,
    signer: &SignatureUtil,
) -> AppResult<String> {
    let base = url::Url::parse(target_url).map_err(|e| {
        error!("Failed to parse base URL: {}", e);
        Error::InternalServerErrorWithContext(format!("Invalid base URL: {}", e))
    })?;

    let expiry = SignatureUtil::generate_expiry(SIGNED_LINK_TTL_HOURS);

    let proxied = |uri: &str| -> Option<String> {
        let resolved = match base.join(uri) {
            Ok(resolved) => resolved,
            Err(e) => {
                error!("Failed to resolve: {} - {}", uri, e);
                return None;
            }
        };
        let encoded = encode_target_url(resolved.as_str());
        let signature = signer.generate_signature(client_id, expiry, &encoded);

        Some(format!(
            "/api/v1/proxy?url={}&schema={}&sig={}&exp={}&client={}",
            encoded,
            urlencoding::encode(schema),
            signature,
            expiry,
            urlencoding::encode(client_id)
        ))
    };

    let lines: Vec<String> = text
        .lines()
        .filter(|line| !line.trim().starts_with("##"))
        .map(|line| {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                return line.to_string();
            }

            if trimmed.starts_with('#') {
                return URI_ATTRIBUTE
                    .replace_all(line, |captures: &Captures| match proxied(&captures[1]) {
                        Some(link) => format!("URI=\"{}\"", link),
                        None => captures[0].to_string(),
                    })
                    .into_owned();
            }

            proxied(trimmed).unwrap_or_else(|| line.to_string())
        })
        .collect();

    Ok(lines.join("\n"))
}

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Mobile Safari/537.36";
const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:145.0) Gecko/20100101 Firefox/145.0";
// upstream gets asked for compressed bodies, we undo it before answering
const ACCEPT_ENCODING: &str = "gzip, zstd";

/// which site a proxied request has to look like it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxySchema {
    #[default]
    Moviebox,
    Sports,
    Football,
    Captions,
}

impl ProxySchema {
    /// unknown or missing schemas fall back to moviebox, the links we hand out always carry one
    pub fn parse(schema: Option<&str>) -> Self {
        match schema.map(str::trim) {
            Some("sports") => Self::Sports,
            Some("football") => Self::Football,
            Some("captions") => Self::Captions,
            _ => Self::Moviebox,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moviebox => "moviebox",
            Self::Sports => "sports",
            Self::Football => "football",
            Self::Captions => "captions",
        }
    }

    pub fn headers(&self) -> Vec<(header::HeaderName, &'static str)> {
        match self {
            Self::Moviebox => vec![
                (header::REFERER, "https://h5.aoneroom.com/"),
                (header::USER_AGENT, MOBILE_USER_AGENT),
                (header::ACCEPT, "*/*"),
                (header::ACCEPT_ENCODING, ACCEPT_ENCODING),
            ],
            Self::Sports => vec![
                (header::ORIGIN, "https://sportslive.run"),
                (header::REFERER, "https://sportslive.run/"),
                (header::USER_AGENT, MOBILE_USER_AGENT),
                (header::ACCEPT, "*/*"),
                (header::ACCEPT_ENCODING, ACCEPT_ENCODING),
            ],
            Self::Football => vec![
                (header::REFERER, "https://embedsports.top/"),
                (header::ORIGIN, "https://embedsports.top"),
                (header::USER_AGENT, DESKTOP_USER_AGENT),
                (header::ACCEPT, "*/*"),
                (header::ACCEPT_ENCODING, ACCEPT_ENCODING),
            ],
            Self::Captions => vec![
                (header::USER_AGENT, DESKTOP_USER_AGENT),
                (header::ACCEPT, "*/*"),
            ],
        }
    }
}
