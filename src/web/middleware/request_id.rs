//! Per-request tracing spans with upstream-aware request IDs.
//!
//! Reuses an ID assigned by the hosting edge (`X-Railway-Request-Id`, then
//! `X-Request-Id`) so logs correlate with the platform dashboard; otherwise a
//! ULID is generated. The resolved ID is echoed as `X-Request-Id`.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, header};
use axum::response::Response;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;

use crate::utils::fmt_duration;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

static UPSTREAM_REQUEST_IDS: &[&str] = &["x-railway-request-id", "x-request-id"];

/// Pick the upstream request ID, if any edge in front of us assigned one.
fn upstream_request_id(req: &Request) -> Option<String> {
    UPSTREAM_REQUEST_IDS.iter().find_map(|name| {
        req.headers()
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(String::from)
    })
}

#[derive(Clone)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B> Service<Request> for RequestIdService<S>
where
    S: Service<Request, Response = Response<B>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Debug,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let req_id = upstream_request_id(&req).unwrap_or_else(|| ulid::Ulid::new().to_string());

        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let span = tracing::info_span!("request", req_id = %req_id);
        let start = Instant::now();

        let future = self.inner.call(req);

        let header_value = HeaderValue::from_str(&req_id).ok();

        Box::pin(
            async move {
                let mut result = future.await;

                let duration = fmt_duration(start.elapsed());

                match &result {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        match status {
                            200..=399 => {
                                tracing::debug!(method = %method, host = %host, path = %path, status, duration, "response");
                            }
                            400..=499 => {
                                tracing::info!(method = %method, host = %host, path = %path, status, duration, "response");
                            }
                            _ => {
                                tracing::warn!(method = %method, host = %host, path = %path, status, duration, "response");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(method = %method, host = %host, path = %path, error = ?e, duration, "request failed");
                    }
                }

                if let Ok(ref mut response) = result
                    && let Some(value) = header_value
                {
                    response.headers_mut().insert(X_REQUEST_ID, value);
                }

                result
            }
            .instrument(span),
        )
    }
}
