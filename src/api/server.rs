use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers;
use crate::client::UserApi;
use crate::client::http::HttpUserApi;
use crate::config::{BackendConfig, Config};
use crate::db::SqliteUserApi;
use crate::error::AppError;
use crate::view::UserScreen;

pub struct AppState {
    pub screen: UserScreen,
}

impl AppState {
    pub fn new(api: Arc<dyn UserApi>) -> Self {
        Self {
            screen: UserScreen::new(api),
        }
    }
}

pub async fn connect_backend(config: &BackendConfig) -> Result<Arc<dyn UserApi>, AppError> {
    match config {
        BackendConfig::Http {
            base_url,
            timeout_secs,
        } => {
            info!(%base_url, timeout_secs, "using remote user service");
            let timeout = std::time::Duration::from_secs(*timeout_secs);
            Ok(Arc::new(HttpUserApi::new(base_url, timeout)?))
        }
        BackendConfig::Sqlite { url } => {
            info!(%url, "using local SQLite user store");
            Ok(Arc::new(SqliteUserApi::connect(url).await?))
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(|| async { "OK" }))
        .route("/users", post(handlers::submit))
        .route("/users/{id}/edit", post(handlers::edit))
        .route("/users/{id}/delete", post(handlers::delete))
        .route("/edit/cancel", post(handlers::cancel_edit))
        .route("/reload", post(handlers::reload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: &Config) -> Result<(), AppError> {
    let api = connect_backend(&config.backend).await?;
    let state = Arc::new(AppState::new(api));
    let app = router(state);

    let listener = TcpListener::bind(&config.listen)
        .await
        .map_err(|source| AppError::Bind {
            addr: config.listen.clone(),
            source,
        })?;

    info!("Server running on http://{}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Serve)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
