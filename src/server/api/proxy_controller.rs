// same origin proxy for media. Players can't send the Referer/Origin the cdns check for, so the
// request is re-issued here with the right ones and playlists are rewritten to keep every
// follow-up request coming back through us.
use axum::{
    Router,
    body::Body,
    extract::Query,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

use crate::server::{
    error::{AppResult, Error},
    extractors::ClientIdentity,
    services::{
        app_services::AppServices, cookie_services::CookieService,
        rate_limit_services::RateLimitResult,
    },
    utils::proxy_utils::{
        ProxySchema, byte_range, decode_target_url, decompress_body, is_playlist,
        rewrite_playlist, should_buffer,
    },
};

#[derive(Deserialize)]
struct ProxyQuery {
    url: String,
    schema: Option<String>,
}

pub struct ProxyController;

impl ProxyController {
    pub fn app() -> Router {
        Router::new().route("/", get(Self::proxy_get).options(Self::proxy_options))
    }

    fn with_cors(mut response: Response) -> Response {
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        response
    }

    // fire and forget, a slow redis shouldn't hold up the response
    fn record_error(services: &AppServices, client_id: &str, error_type: &'static str) {
        let rate_limit = services.rate_limit.clone();
        let uid = client_id.to_string();
        tokio::spawn(async move {
            rate_limit.record_error(&uid, error_type).await;
        });
    }

    async fn proxy_get(
        ClientIdentity(client_id, services): ClientIdentity,
        Query(params): Query<ProxyQuery>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        match services.rate_limit.check_rate_limit(&client_id).await {
            RateLimitResult::Allowed { .. } => {}
            RateLimitResult::RateLimited { retry_after } => {
                return Err(Error::TooManyRequests(retry_after));
            }
            RateLimitResult::TimedOut {
                reason,
                retry_after,
            } => {
                info!("Client {} is timed out: {}", client_id, reason);
                return Err(Error::TooManyRequests(retry_after));
            }
        }

        let target_url = decode_target_url(&params.url)?;
        match url::Url::parse(&target_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(Error::BadRequest("Invalid URL format".to_string())),
        }

        let schema = ProxySchema::parse(params.schema.as_deref());
        debug!("Proxying (schema={}): {}", schema.as_str(), target_url);

        let domain = CookieService::extract_domain(&target_url);
        let stored_cookies = match domain.as_deref() {
            Some(d) => services.cookies.get_cookies(d).await,
            None => None,
        };

        let range = headers
            .get(header::RANGE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut request_builder = services.http.get(&target_url);
        for (name, value) in schema.headers() {
            // byte ranges only line up with the bytes we hand back when nothing is compressed
            if range.is_some() && name == header::ACCEPT_ENCODING {
                continue;
            }
            request_builder = request_builder.header(name, value);
        }
        if let Some(range) = range.as_deref() {
            request_builder = request_builder
                .header(header::RANGE, range)
                .header(header::ACCEPT_ENCODING, "identity");
        }
        if let Some(cookies) = stored_cookies {
            request_builder = request_builder.header(header::COOKIE, cookies);
        }

        let target_response = request_builder.send().await.map_err(|e| {
            error!("Request failed: {}", e);
            Self::record_error(&services, &client_id, "proxy_request_failed");
            Error::Upstream(format!("proxy request failed: {}", e))
        })?;

        if let Some(d) = domain {
            let set_cookies: Vec<String> = target_response
                .headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok().map(|s| s.to_string()))
                .collect();

            if !set_cookies.is_empty() {
                debug!("Storing {} cookies from response", set_cookies.len());
                let cookie_service = services.cookies.clone();
                tokio::spawn(async move {
                    cookie_service.store_cookies(&d, &set_cookies).await;
                });
            }
        }

        let response_status = target_response.status();
        if !response_status.is_success() {
            error!(
                "User: {}, Response from target not successful: {}",
                client_id, response_status
            );
            // only client-induced failures count against the user
            if response_status.is_client_error() {
                Self::record_error(&services, &client_id, "proxy_upstream_client_error");
            }
            let body = json!({ "error": format!("upstream returned {}", response_status) });
            return Ok(Self::with_cors(
                (response_status, axum::Json(body)).into_response(),
            ));
        }

        // redirects are followed, relative playlist entries resolve against where we ended up
        let final_url = target_response.url().to_string();

        let content_type = target_response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let content_encoding = target_response
            .headers()
            .get(header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if !should_buffer(
            &content_type,
            content_encoding.as_deref(),
            &final_url,
            target_response.content_length(),
        ) {
            debug!("Streaming {} ({})", final_url, content_type);
            return Ok(Self::with_cors(Self::streamed_response(target_response)));
        }

        // upstream already cut the range, don't cut it again
        let upstream_range = (response_status == StatusCode::PARTIAL_CONTENT)
            .then(|| target_response.headers().get(header::CONTENT_RANGE).cloned())
            .flatten();

        let bytes = target_response.bytes().await.map_err(|e| {
            error!("Failed to read response: {}", e);
            Error::Upstream(format!("failed to read proxied response: {}", e))
        })?;

        let body = decompress_body(&bytes, content_encoding.as_deref())?;
        debug!(
            "Read {} bytes ({} decompressed, encoding {:?})",
            bytes.len(),
            body.len(),
            content_encoding
        );

        if is_playlist(&body, &content_type) {
            let text = String::from_utf8(body).map_err(|e| {
                error!("Failed to parse m3u8 as UTF-8: {}", e);
                Error::Upstream("invalid m3u8 encoding".to_string())
            })?;

            let rewritten = rewrite_playlist(
                &text,
                &final_url,
                schema.as_str(),
                &client_id,
                &services.signature_util,
            )?;

            return Ok(Self::with_cors(Self::playlist_response(rewritten)));
        }

        Ok(Self::with_cors(Self::body_response(
            body,
            &content_type,
            range.as_deref(),
            upstream_range,
        )))
    }

    /// media straight through, status and range headers as upstream sent them
    fn streamed_response(target_response: reqwest::Response) -> Response {
        let status = target_response.status();

        let mut response_headers = HeaderMap::new();
        for name in [
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
            header::ETAG,
            header::LAST_MODIFIED,
        ] {
            if let Some(value) = target_response.headers().get(&name) {
                response_headers.insert(name, value.clone());
            }
        }
        if !response_headers.contains_key(header::CONTENT_TYPE) {
            response_headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
        }
        response_headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        );

        let body = Body::from_stream(target_response.bytes_stream());
        (status, response_headers, body).into_response()
    }

    fn playlist_response(body: String) -> Response {
        let mut response_headers = HeaderMap::new();
        response_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/vnd.apple.mpegurl"),
        );
        response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        (StatusCode::OK, response_headers, body).into_response()
    }

    /// buffered bodies that aren't playlists. A range upstream already served is passed on,
    /// otherwise it's cut out of the decompressed body here
    fn body_response(
        body: Vec<u8>,
        content_type: &str,
        range: Option<&str>,
        upstream_range: Option<HeaderValue>,
    ) -> Response {
        let total_len = body.len();

        let mut response_headers = HeaderMap::new();
        let content_type = HeaderValue::from_str(content_type)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(HeaderValue::from_static("application/octet-stream"));
        response_headers.insert(header::CONTENT_TYPE, content_type);
        response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        response_headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        );

        if let Some(content_range) = upstream_range {
            response_headers.insert(header::CONTENT_RANGE, content_range);
            return (StatusCode::PARTIAL_CONTENT, response_headers, body).into_response();
        }

        match byte_range(range, total_len) {
            Some((start, end)) => {
                debug!("Serving range {}-{} of {} bytes", start, end, total_len);
                if let Ok(value) =
                    HeaderValue::from_str(&format!("bytes {}-{}/{}", start, end, total_len))
                {
                    response_headers.insert(header::CONTENT_RANGE, value);
                }
                let sliced = body[start..=end].to_vec();
                (StatusCode::PARTIAL_CONTENT, response_headers, sliced).into_response()
            }
            None => (StatusCode::OK, response_headers, body).into_response(),
        }
    }

    async fn proxy_options() -> impl IntoResponse {
        StatusCode::NO_CONTENT
    }
}
