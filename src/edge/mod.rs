//! Edge request handling: resume-subdomain routing and response hardening.
//!
//! ```text
//! request ──▶ prepare() ── nonce, route decision, URI rewrite ──▶ site
//!                                                                  │
//! response ◀── finalize() ── CSP, fixed headers, CORS ◀────────────┘
//! ```
//!
//! Both halves run for every request. The tower wiring lives in
//! [`crate::web::middleware::edge`].

pub mod headers;
pub mod nonce;
pub mod routing;

use axum::http::uri::PathAndQuery;
use axum::http::{Request, Response, Uri, header};
use std::sync::Arc;
use tracing::debug;

pub use headers::{SecurityHeaders, X_NONCE};
pub use nonce::{FixedNonceSource, Nonce, NonceSource, SystemNonceSource};
pub use routing::{ResumeRouter, RouteDecision};

/// Per-request state carried from [`EdgePolicy::prepare`] to [`EdgePolicy::finalize`].
#[derive(Debug, Clone)]
pub struct EdgeContext {
    /// Path as the client sent it, before any rewrite.
    pub original_path: String,
    pub decision: RouteDecision,
    pub nonce: Nonce,
}

/// Routing and header policy shared by all requests.
#[derive(Clone)]
pub struct EdgePolicy {
    router: ResumeRouter,
    headers: SecurityHeaders,
    nonces: Arc<dyn NonceSource>,
}

impl EdgePolicy {
    pub fn new(
        router: ResumeRouter,
        headers: SecurityHeaders,
        nonces: Arc<dyn NonceSource>,
    ) -> Self {
        Self {
            router,
            headers,
            nonces,
        }
    }

    pub fn router(&self) -> &ResumeRouter {
        &self.router
    }

    /// Generate the nonce, route the request and stamp the nonce onto it.
    ///
    /// The nonce is exposed to renderers both as an `x-nonce` request header
    /// (replacing any client-supplied value) and as a [`Nonce`] extension.
    pub fn prepare<B>(&self, req: &mut Request<B>) -> EdgeContext {
        let nonce = Nonce::generate(self.nonces.as_ref());
        let original_path = req.uri().path().to_owned();
        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok());

        let decision = self.router.decide(host, &original_path);

        if decision.is_rewrite() {
            let target = self.router.resume_target();
            debug!(from = %original_path, to = %target, host = ?host, "rewriting to resume");
            let uri = rewrite_path(req.uri(), target);
            *req.uri_mut() = uri;
        }

        req.headers_mut().insert(X_NONCE, nonce.header_value());
        req.extensions_mut().insert(nonce.clone());

        EdgeContext {
            original_path,
            decision,
            nonce,
        }
    }

    /// Attach the security headers for `ctx` to a response.
    pub fn finalize<B>(&self, ctx: &EdgeContext, response: Response<B>) -> Response<B> {
        let (mut parts, body) = response.into_parts();
        let headers = std::mem::take(&mut parts.headers);
        parts.headers = self.headers.apply(&ctx.original_path, &ctx.nonce, headers);
        Response::from_parts(parts, body)
    }
}

/// Replace the path of `uri` with `target`, keeping scheme, authority and
/// query. The path is always `target`, even if the rest cannot be kept.
fn rewrite_path(uri: &Uri, target: &PathAndQuery) -> Uri {
    let path_and_query = match uri.query() {
        Some(query) => PathAndQuery::try_from(format!("{}?{query}", target.path()))
            .unwrap_or_else(|_| target.clone()),
        None => target.clone(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).unwrap_or_else(|_| Uri::from(target.clone()))
}
