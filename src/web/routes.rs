//! Router construction and the full service stack.

use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    handler::Handler,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tower::Layer;
use tower_http::{compression::CompressionLayer, services::ServeDir, timeout::TimeoutLayer};

use crate::edge::EdgePolicy;
use crate::state::AppState;
use crate::web::middleware::edge::{EdgeLayer, EdgeService};
use crate::web::middleware::request_id::{RequestIdLayer, RequestIdService};
use crate::web::{proxy, status};

/// The complete request pipeline: request IDs, then the edge layer, then the router.
pub type SiteService = RequestIdService<EdgeService<Router>>;

/// Creates the web server router.
///
/// Unmatched paths are served from `static_dir`, then from the SSR
/// downstream, then 404.
pub fn create_router(app_state: AppState, static_dir: &Path) -> Router {
    let api_router = Router::new()
        .route("/health", get(status::health))
        .with_state(app_state.clone());

    let site = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .fallback(site_fallback.with_state(app_state));

    Router::new()
        .nest("/api", api_router)
        .fallback_service(site)
        .layer((
            // Compress responses (gzip/brotli/zstd).
            CompressionLayer::new()
                .zstd(true)
                .br(true)
                .gzip(true)
                .quality(tower_http::CompressionLevel::Fastest),
            TimeoutLayer::new(Duration::from_secs(60)),
        ))
}

/// Wrap `router` in the edge and request-ID layers.
///
/// The edge layer wraps the router as a whole so that the resume rewrite
/// happens before routing and no route can skip header injection.
pub fn create_service(router: Router, policy: EdgePolicy) -> SiteService {
    RequestIdLayer.layer(EdgeLayer::new(policy).layer(router))
}

/// Static miss: proxy to the SSR server if one is configured, else 404.
async fn site_fallback(State(state): State<AppState>, request: Request) -> Response {
    let Some(downstream) = state.ssr_downstream.clone() else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = request.headers().clone();

    proxy::proxy_to_ssr(
        &state,
        &downstream,
        &method,
        uri.path(),
        uri.query(),
        headers,
        client_ip,
    )
    .await
}
