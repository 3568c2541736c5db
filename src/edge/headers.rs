//! Security response headers.
//!
//! Every response gets the same fixed set plus a CSP whose `script-src` is
//! scoped to the request's nonce. CORS headers are granted to `/api` paths
//! only and stripped everywhere else, including values set by lower layers.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_SECURITY_POLICY, InvalidHeaderValue, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
    X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::edge::nonce::{Nonce, ascii_header};

pub const X_NONCE: HeaderName = HeaderName::from_static("x-nonce");
pub const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");
pub const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
pub const CROSS_ORIGIN_RESOURCE_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-resource-policy");
pub const X_PERMITTED_CROSS_DOMAIN_POLICIES: HeaderName =
    HeaderName::from_static("x-permitted-cross-domain-policies");

static HSTS: HeaderValue = HeaderValue::from_static("max-age=31536000; includeSubDomains; preload");
static XFO: HeaderValue = HeaderValue::from_static("DENY");
static XCTO: HeaderValue = HeaderValue::from_static("nosniff");
static REFERRER: HeaderValue = HeaderValue::from_static("strict-origin-when-cross-origin");
static PERMISSIONS: HeaderValue =
    HeaderValue::from_static("camera=(), microphone=(), geolocation=()");
static SAME_ORIGIN: HeaderValue = HeaderValue::from_static("same-origin");
static NONE: HeaderValue = HeaderValue::from_static("none");
static CORS_METHODS: HeaderValue =
    HeaderValue::from_static("GET, POST, PUT, PATCH, DELETE, OPTIONS");
static CORS_HEADERS: HeaderValue = HeaderValue::from_static("Content-Type, Authorization");

const API_PREFIX: &str = "/api";

/// Build the CSP for one request.
///
/// Directive order is fixed; scanners diff this string.
pub fn content_security_policy(nonce: &Nonce) -> String {
    [
        "default-src 'self'".to_owned(),
        format!("script-src 'self' 'nonce-{nonce}' 'strict-dynamic'"),
        "style-src 'self' 'unsafe-inline'".to_owned(),
        "img-src 'self' data: https:".to_owned(),
        "font-src 'self' data:".to_owned(),
        "connect-src 'self'".to_owned(),
        "frame-ancestors 'none'".to_owned(),
        "base-uri 'self'".to_owned(),
        "form-action 'self'".to_owned(),
        "object-src 'none'".to_owned(),
        "upgrade-insecure-requests".to_owned(),
    ]
    .join("; ")
}

/// Whether a request path is granted CORS headers.
pub fn is_api_path(path: &str) -> bool {
    path.starts_with(API_PREFIX)
}

#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    allow_origin: HeaderValue,
}

impl SecurityHeaders {
    /// `canonical_origin` is sent verbatim as `Access-Control-Allow-Origin`.
    pub fn new(canonical_origin: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(canonical_origin)?,
        })
    }

    pub fn allow_origin(&self) -> &HeaderValue {
        &self.allow_origin
    }

    /// Return `headers` with the full security set applied for a request to `path`.
    pub fn apply(&self, path: &str, nonce: &Nonce, mut headers: HeaderMap) -> HeaderMap {
        headers.insert(
            CONTENT_SECURITY_POLICY,
            ascii_header(&content_security_policy(nonce)),
        );
        headers.insert(X_NONCE, nonce.header_value());
        headers.insert(STRICT_TRANSPORT_SECURITY, HSTS.clone());
        headers.insert(X_FRAME_OPTIONS, XFO.clone());
        headers.insert(X_CONTENT_TYPE_OPTIONS, XCTO.clone());
        headers.insert(REFERRER_POLICY, REFERRER.clone());
        headers.insert(PERMISSIONS_POLICY, PERMISSIONS.clone());
        headers.insert(CROSS_ORIGIN_OPENER_POLICY, SAME_ORIGIN.clone());
        headers.insert(CROSS_ORIGIN_RESOURCE_POLICY, SAME_ORIGIN.clone());
        headers.insert(X_PERMITTED_CROSS_DOMAIN_POLICIES, NONE.clone());

        if is_api_path(path) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, CORS_METHODS.clone());
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, CORS_HEADERS.clone());
        } else {
            headers.remove(ACCESS_CONTROL_ALLOW_ORIGIN);
            headers.remove(ACCESS_CONTROL_ALLOW_METHODS);
            headers.remove(ACCESS_CONTROL_ALLOW_HEADERS);
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::nonce::NONCE_LEN;

    fn nonce() -> Nonce {
        Nonce::from_bytes(&[0xAB; NONCE_LEN])
    }

    fn get<'a>(headers: &'a HeaderMap, name: impl axum::http::header::AsHeaderName) -> &'a str {
        headers.get(name).unwrap().to_str().unwrap()
    }

    #[test]
    fn csp_directive_order_is_exact() {
        let nonce = nonce();
        assert_eq!(
            content_security_policy(&nonce),
            format!(
                "default-src 'self'; script-src 'self' 'nonce-{nonce}' 'strict-dynamic'; \
                 style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; \
                 font-src 'self' data:; connect-src 'self'; frame-ancestors 'none'; \
                 base-uri 'self'; form-action 'self'; object-src 'none'; \
                 upgrade-insecure-requests"
            )
        );
    }

    #[test]
    fn fixed_headers_have_exact_values() {
        let headers = SecurityHeaders::new("https://example.com")
            .unwrap()
            .apply("/", &nonce(), HeaderMap::new());

        assert_eq!(
            get(&headers, STRICT_TRANSPORT_SECURITY),
            "max-age=31536000; includeSubDomains; preload"
        );
        assert_eq!(get(&headers, X_FRAME_OPTIONS), "DENY");
        assert_eq!(get(&headers, X_CONTENT_TYPE_OPTIONS), "nosniff");
        assert_eq!(get(&headers, REFERRER_POLICY), "strict-origin-when-cross-origin");
        assert_eq!(
            get(&headers, PERMISSIONS_POLICY),
            "camera=(), microphone=(), geolocation=()"
        );
        assert_eq!(get(&headers, CROSS_ORIGIN_OPENER_POLICY), "same-origin");
        assert_eq!(get(&headers, CROSS_ORIGIN_RESOURCE_POLICY), "same-origin");
        assert_eq!(get(&headers, X_PERMITTED_CROSS_DOMAIN_POLICIES), "none");
        assert_eq!(get(&headers, X_NONCE), nonce().as_str());
    }

    #[test]
    fn nonce_header_appears_in_script_src() {
        let headers = SecurityHeaders::new("https://example.com")
            .unwrap()
            .apply("/", &nonce(), HeaderMap::new());

        let csp = get(&headers, CONTENT_SECURITY_POLICY);
        let script_src = csp
            .split("; ")
            .find(|d| d.starts_with("script-src"))
            .unwrap();
        assert!(script_src.contains(&format!("'nonce-{}'", get(&headers, X_NONCE))));
    }

    #[test]
    fn api_paths_get_cors_for_canonical_origin() {
        let headers = SecurityHeaders::new("https://example.com")
            .unwrap()
            .apply("/api/contact", &nonce(), HeaderMap::new());

        assert_eq!(get(&headers, ACCESS_CONTROL_ALLOW_ORIGIN), "https://example.com");
        assert_eq!(
            get(&headers, ACCESS_CONTROL_ALLOW_METHODS),
            "GET, POST, PUT, PATCH, DELETE, OPTIONS"
        );
        assert_eq!(
            get(&headers, ACCESS_CONTROL_ALLOW_HEADERS),
            "Content-Type, Authorization"
        );
    }

    #[test]
    fn non_api_paths_strip_inherited_cors() {
        let mut inherited = HeaderMap::new();
        inherited.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        inherited.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET"));

        let headers = SecurityHeaders::new("https://example.com")
            .unwrap()
            .apply("/projects", &nonce(), inherited);

        assert!(!headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(!headers.contains_key(ACCESS_CONTROL_ALLOW_METHODS));
        assert!(!headers.contains_key(ACCESS_CONTROL_ALLOW_HEADERS));
    }

    #[test]
    fn downstream_values_are_overwritten() {
        let mut inherited = HeaderMap::new();
        inherited.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
        inherited.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static("default-src *"));
        inherited.insert("content-type", HeaderValue::from_static("text/html"));

        let headers = SecurityHeaders::new("https://example.com")
            .unwrap()
            .apply("/", &nonce(), inherited);

        assert_eq!(get(&headers, X_FRAME_OPTIONS), "DENY");
        assert!(get(&headers, CONTENT_SECURITY_POLICY).starts_with("default-src 'self'"));
        assert_eq!(get(&headers, "content-type"), "text/html");
    }

    #[test]
    fn api_prefix_is_a_plain_prefix_check() {
        assert!(is_api_path("/api"));
        assert!(is_api_path("/api/health"));
        assert!(is_api_path("/apiary"));
        assert!(!is_api_path("/about/api"));
        assert!(!is_api_path("/"));
    }
}
