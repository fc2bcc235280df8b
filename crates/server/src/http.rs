//! HTTP server implementation for logbook.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use logbook_ingest::IngestionService;

use crate::config::ServerConfig;
use crate::handlers::{handle_healthy, handle_ingest, handle_query, AppState};

/// Any origin may call the API; preflight results are cached for 12 hours.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(12 * 60 * 60))
}

/// Build the application router.
///
/// With `ui_dir`, `GET /` serves its `index.html` and `/ui/*` its files.
pub fn build_router(state: AppState, ui_dir: Option<&Path>) -> Router {
    let mut root = post(handle_ingest);
    if let Some(dir) = ui_dir {
        root = root.get_service(ServeFile::new(dir.join("index.html")));
    }

    let mut app = Router::new()
        .route("/", root)
        .route("/logs", get(handle_query))
        .route("/-/healthy", get(handle_healthy));
    if let Some(dir) = ui_dir {
        app = app.nest_service("/ui", ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// HTTP server for the log service.
pub struct LogServer {
    service: IngestionService,
    config: ServerConfig,
}

impl LogServer {
    /// Create a new log server.
    pub fn new(service: IngestionService, config: ServerConfig) -> Self {
        Self { service, config }
    }

    /// Serve until SIGINT or SIGTERM, then close the store.
    pub async fn run(self) -> anyhow::Result<()> {
        let state = AppState {
            service: self.service.clone(),
            insert_timeout: self.config.insert_timeout,
            query_timeout: self.config.query_timeout,
        };
        let app = build_router(state, self.config.ui_dir.as_deref());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        tracing::info!("Starting logbook HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.service.store().close()?;
        tracing::info!("Server shut down gracefully");
        Ok(())
    }
}

/// Listen for SIGTERM and SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
