//! Shared fixtures for driving the full service stack.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, header};
use folio::config::SiteUrl;
use folio::edge::{EdgePolicy, NonceSource, ResumeRouter, SecurityHeaders, SystemNonceSource};
use folio::state::AppState;
use folio::web::{SiteService, create_router, create_service};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;

pub const RESUME_BYTES: &[u8] = b"%PDF-1.7 resume";
pub const INDEX_HTML: &str = "<!doctype html><title>portfolio</title>";

/// A throwaway static directory with an index page and a resume.
pub struct StaticSite {
    pub dir: PathBuf,
}

impl StaticSite {
    pub fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("folio-test-{}", ulid::Ulid::new()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), INDEX_HTML).unwrap();
        std::fs::write(dir.join("resume.pdf"), RESUME_BYTES).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for StaticSite {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

pub struct Harness {
    pub site: StaticSite,
    pub service: SiteService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(None, Arc::new(SystemNonceSource))
    }

    pub fn with(ssr_downstream: Option<String>, nonces: Arc<dyn NonceSource>) -> Self {
        let site = StaticSite::new();
        let site_url = SiteUrl::parse("https://example.com").unwrap();
        let policy = EdgePolicy::new(
            ResumeRouter::default(),
            SecurityHeaders::new(site_url.origin()).unwrap(),
            nonces,
        );
        let state = AppState::new(site_url, ssr_downstream).unwrap();
        let service = create_service(create_router(state, site.path()), policy);
        Self { site, service }
    }

    pub async fn get(&self, host: Option<&str>, uri: &str) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(host) = host {
            builder = builder.header(header::HOST, host);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.service.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub fn header_str<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Every fixed security header with its exact value.
pub const FIXED_HEADERS: &[(&str, &str)] = &[
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains; preload",
    ),
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=()",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("x-permitted-cross-domain-policies", "none"),
];

pub fn assert_security_headers(response: &Response<Body>) {
    for (name, expected) in FIXED_HEADERS {
        assert_eq!(header_str(response, name), Some(*expected), "header {name}");
    }

    let nonce = header_str(response, "x-nonce").expect("x-nonce header");
    let csp = header_str(response, "content-security-policy").expect("CSP header");
    assert!(
        csp.contains(&format!("script-src 'self' 'nonce-{nonce}' 'strict-dynamic'")),
        "CSP {csp:?} does not carry nonce {nonce:?}"
    );
}
