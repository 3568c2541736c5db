use crate::config::Config;
use crate::edge::{EdgePolicy, SecurityHeaders, SystemNonceSource};
use crate::state::AppState;
use crate::utils::fmt_duration;
use crate::web::{SiteService, create_router, create_service};
use anyhow::Context;
use axum::extract::Request;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Main application struct containing all necessary components
pub struct App {
    config: Config,
    service: SiteService,
}

impl App {
    /// Build the service stack from configuration.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let site = config.site();
        let ssr_downstream = config.ssr_downstream();

        let headers = SecurityHeaders::new(site.origin())
            .context("Site origin is not a valid header value")?;
        let policy = EdgePolicy::new(
            config.resume_router()?,
            headers,
            Arc::new(SystemNonceSource),
        );

        let app_state = AppState::new(site.clone(), ssr_downstream.clone())
            .context("Failed to create SSR client")?;

        info!(
            site = site.as_str(),
            origin = site.origin(),
            static_dir = %config.static_dir.display(),
            ssr_downstream = ssr_downstream.as_deref().unwrap_or("-"),
            resume_path = %config.resume_path,
            "site configuration loaded"
        );

        if !config.static_dir.is_dir() {
            warn!(static_dir = %config.static_dir.display(), "static directory does not exist");
        }

        let router = create_router(app_state, &config.static_dir);
        Ok(App {
            service: create_service(router, policy),
            config,
        })
    }

    /// Serve until a shutdown signal arrives, then drain within the configured timeout.
    pub async fn run(self) -> ExitCode {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = match TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) => {
                error!(error = %e, address = %addr, "failed to bind listener");
                return ExitCode::FAILURE;
            }
        };
        info!(address = %addr, "web server listening");

        let make_service = axum::ServiceExt::<Request>::into_make_service_with_connect_info::<
            SocketAddr,
        >(self.service);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, make_service).with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        });
        let mut server = tokio::spawn(server.into_future());

        tokio::select! {
            result = &mut server => {
                // Server exited without being asked to.
                error!(result = ?result, "web server stopped unexpectedly");
                return ExitCode::FAILURE;
            }
            signal = shutdown_signal() => {
                info!(signal, "shutdown signal received, draining connections");
            }
        }

        let _ = shutdown_tx.send(());
        let started = Instant::now();
        let timeout = self.config.shutdown_timeout;

        match tokio::time::timeout(timeout, server).await {
            Ok(Ok(Ok(()))) => {
                info!(duration = fmt_duration(started.elapsed()), "graceful shutdown complete");
                ExitCode::SUCCESS
            }
            Ok(Ok(Err(e))) => {
                error!(error = %e, "web server failed during shutdown");
                ExitCode::FAILURE
            }
            Ok(Err(e)) => {
                error!(error = %e, "web server task panicked");
                ExitCode::FAILURE
            }
            Err(_) => {
                warn!(timeout = fmt_duration(timeout), "shutdown timed out, dropping open connections");
                ExitCode::FAILURE
            }
        }
    }
}

/// Resolve on Ctrl+C, or SIGTERM on unix. Returns the signal name.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
