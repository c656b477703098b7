//! Web layer module
//!
//! Thin handlers over [`WopiService`], wrapped in the middleware chain and
//! mounted under the configured root path.

use anyhow::Result;
use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;
use tower_http::{cors::CorsLayer, normalize_path::NormalizePath, normalize_path::NormalizePathLayer};
use tracing::info;

use crate::config::Config;
use crate::services::WopiService;

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;

pub use extractors::{OpenFileParams, RequestContext};
pub use responses::handle_error;

/// Path of the open endpoint relative to the root
pub const OPEN_FILE_PATH: &str = "/api/v0/wopi/open";

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub wopi: Arc<WopiService>,
}

/// Router with trailing-slash normalisation applied in front of routing
pub type App = NormalizePath<Router>;

/// Build the full application: routes under `web.root` plus the middleware chain
pub fn create_app(state: AppState) -> App {
    let root = state.config.web.normalized_root();
    let request_timeout = state.config.web.request_timeout;

    let routes = Router::new()
        .route(OPEN_FILE_PATH, get(handlers::wopi::open_file))
        .route("/health", get(handlers::health::health_check))
        .route("/live", get(handlers::health::liveness_check));

    // axum refuses to nest at "/"
    let mounted = if root == "/" {
        routes
    } else {
        Router::new().nest(&root, routes)
    };

    let router = mounted
        .fallback(|| async { StatusCode::NOT_FOUND })
        // Middleware (applied in reverse order)
        .layer(from_fn_with_state(request_timeout, middleware::timeout_middleware))
        .layer(from_fn(middleware::version_header_middleware))
        .layer(from_fn(middleware::no_cache_middleware))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state);

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Web server configuration and setup
pub struct WebServer {
    app: App,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &Config, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        info!(
            "Mounting routes under {} ({} request timeout)",
            config.web.normalized_root(),
            humantime::format_duration(config.web.request_timeout)
        );
        Ok(Self {
            app: create_app(state),
            addr,
        })
    }

    /// Serve with a notification when the server is actually listening or fails to bind
    pub async fn serve_with_signal(
        self,
        ready_signal: tokio::sync::oneshot::Sender<Result<()>>,
    ) -> Result<()> {
        match tokio::net::TcpListener::bind(&self.addr).await {
            Ok(listener) => {
                let _ = ready_signal.send(Ok(()));

                let service = axum::ServiceExt::<Request>::into_make_service(self.app);
                axum::serve(listener, service)
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
                Ok(())
            }
            Err(bind_error) => {
                let bind_err_msg = format!("Failed to bind to {}: {}", self.addr, bind_error);
                let _ = ready_signal.send(Err(anyhow::anyhow!("{}", bind_err_msg)));
                Err(anyhow::anyhow!("{}", bind_err_msg))
            }
        }
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Resolves on SIGTERM or SIGINT. If a handler cannot be installed the
/// server keeps running until the other signal arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
        } else {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down gracefully");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
