//! SSR proxy: forwards page requests that no static asset satisfies to the
//! downstream renderer.
//!
//! The `x-nonce` request header set by the edge layer travels with the
//! request, so the renderer can stamp it onto inline scripts.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::net::IpAddr;
use tracing::{debug, warn};

use crate::state::AppState;

/// Headers to strip from the downstream SSR response before returning to the client.
const STRIPPED_HEADERS: &[HeaderName] = &[header::TRANSFER_ENCODING, header::CONNECTION];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Append `client_ip` to any existing `X-Forwarded-For` chain.
fn forwarded_for(existing: Option<&HeaderValue>, client_ip: IpAddr) -> String {
    match existing.and_then(|v| v.to_str().ok()) {
        Some(chain) if !chain.is_empty() => format!("{chain}, {client_ip}"),
        _ => client_ip.to_string(),
    }
}

/// Proxy a request to the downstream SSR server at `downstream`.
pub async fn proxy_to_ssr(
    state: &AppState,
    downstream: &str,
    method: &Method,
    path: &str,
    query: Option<&str>,
    mut forward_headers: HeaderMap,
    client_ip: Option<IpAddr>,
) -> Response {
    // Only proxy GET/HEAD for page requests
    if *method != Method::GET && *method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    if let Some(ip) = client_ip {
        let chain = forwarded_for(forward_headers.get(&X_FORWARDED_FOR), ip);
        if let Ok(value) = HeaderValue::from_str(&chain) {
            forward_headers.insert(X_FORWARDED_FOR, value);
        }
    }
    if let Some(host) = forward_headers.get(header::HOST).cloned() {
        forward_headers.insert(X_FORWARDED_HOST, host);
    }

    let url = match query {
        Some(q) => format!("{downstream}{path}?{q}"),
        None => format!("{downstream}{path}"),
    };

    debug!(url = %url, "proxying to SSR");

    let mut req = state.ssr_client.request(method.clone(), &url);
    for (name, value) in forward_headers.iter() {
        // Don't forward hop-by-hop headers
        if *name == header::HOST || *name == header::CONNECTION {
            continue;
        }
        req = req.header(name, value);
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "SSR proxy request failed");
            return (StatusCode::BAD_GATEWAY, "SSR server unavailable").into_response();
        }
    };

    let status = resp.status();
    let resp_headers = resp.headers().clone();
    let body = match resp.bytes().await {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "Failed to read SSR response body");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let mut headers = HeaderMap::new();
    for (name, value) in resp_headers.iter() {
        if STRIPPED_HEADERS.contains(name) {
            continue;
        }
        // Skip content-length since we're buffering the full body and axum will set it
        if *name == header::CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    (status, headers, body).into_response()
}
