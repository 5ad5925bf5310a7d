use axum::Extension;
use axum::extract::{ConnectInfo, FromRequestParts, Query};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::Deserialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use tracing::{debug, error};

use crate::server::error::Error;
use crate::server::services::app_services::AppServices;

#[derive(Deserialize, Default)]
struct SignedLinkQuery {
    sig: Option<String>,
    exp: Option<String>,
    // whoever the link was signed for, may differ from the caller behind a shared player
    client: Option<String>,
}

/// who is calling, plus the services so handlers don't need a second extractor
///
/// links written into rewritten playlists carry `sig`/`exp`/`client`; when they're present they
/// have to verify. Plain requests are let through and only rate limited.
pub struct ClientIdentity(pub String, pub AppServices);

/// stable id for a caller out of their ip and user agent
pub fn generate_client_id(ip: Option<&str>, user_agent: Option<&str>) -> String {
    let mut hasher = DefaultHasher::new();
    ip.unwrap_or("unknown").hash(&mut hasher);
    user_agent.unwrap_or("unknown").hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// first hop of X-Forwarded-For, then X-Real-IP
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// raw (still encoded) `url` param, the signature is over exactly what was written in the link
fn raw_url_param(query: Option<&str>) -> Option<&str> {
    query?
        .split('&')
        .find_map(|param| param.strip_prefix("url="))
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(services): Extension<AppServices> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|err| Error::InternalServerErrorWithContext(err.to_string()))?;

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let client_ip = forwarded_ip(&parts.headers).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        });

        let client_id = generate_client_id(client_ip.as_deref(), user_agent.as_deref());
        debug!("client_id {} for {:?}", client_id, client_ip);

        let Query(query): Query<SignedLinkQuery> = Query::from_request_parts(parts, state)
            .await
            .unwrap_or(Query(SignedLinkQuery::default()));

        if let (Some(sig), Some(exp)) = (query.sig.as_deref(), query.exp.as_deref()) {
            let expiry = exp.parse::<i64>().map_err(|_| {
                error!("invalid expiry timestamp");
                Error::Unauthorized
            })?;

            let url_param = raw_url_param(parts.uri.query()).ok_or_else(|| {
                error!("signed link without a url parameter");
                Error::Unauthorized
            })?;

            let signed_for = query.client.as_deref().unwrap_or(&client_id);

            if !services
                .signature_util
                .verify_signature(signed_for, expiry, url_param, sig)
            {
                error!(
                    "Signature invalid - url: {}, client: {}, expiry: {}",
                    url_param, signed_for, expiry
                );
                return Err(Error::Unauthorized);
            }

            debug!("Signature verified for client: {}", signed_for);
        }

        Ok(ClientIdentity(client_id, services))
    }
}
