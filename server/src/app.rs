use crate::auth::session;
use crate::cache::PageCache;
use crate::config::Config;
use crate::db::{self, ConnectionPool, MigrationError};
use crate::filesystem::Directory;
use crate::template;
use crate::time::Timer;
use crate::web;
use ::config::ConfigError;
use axum::Router;
use axum::response::Html;
use diesel::r2d2::PoolError;
use minijinja::Environment;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal::unix::SignalKind;
use tower::layer::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Could not load configuration. Details:\n{0}")]
    Config(#[from] ConfigError),
    #[error("Could not create connection pool. Details:\n{0}")]
    ConnectionPool(#[from] PoolError),
    #[error("Could not create media directory. Details:\n{0}")]
    MediaDirectory(#[from] std::io::Error),
    #[error("Could not run migrations. Details:\n{0}")]
    Migration(MigrationError),
    #[error("Could not purge expired sessions. Details:\n{0}")]
    Query(#[from] diesel::result::Error),
    #[error("Could not compile templates. Details:\n{0:#}")]
    Template(#[from] minijinja::Error),
}

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    connection_pool: ConnectionPool,
    templates: Arc<Environment<'static>>,
    page_cache: Arc<Mutex<PageCache>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, InitializationError> {
        let connection_pool = db::create_connection_pool(&config)?;
        let templates = template::create_environment()?;
        let page_cache = PageCache::new(&config.cache);
        Ok(Self {
            config: Arc::new(config),
            connection_pool,
            templates: Arc::new(templates),
            page_cache: Arc::new(Mutex::new(page_cache)),
        })
    }

    pub fn get_connection(&self) -> Result<db::Connection, PoolError> {
        self.connection_pool.get()
    }

    /// Locks the page cache. A poisoned cache only holds rendered pages, so it is still usable.
    pub fn page_cache(&self) -> MutexGuard<'_, PageCache> {
        self.page_cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Renders the template `name` with the given `context`.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<Html<String>, minijinja::Error> {
        let _timer = Timer::new(name);
        self.templates.get_template(name)?.render(context).map(Html)
    }
}

pub fn enable_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug,tower_http=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Loads the configuration and builds the application state.
pub fn create_state() -> Result<AppState, InitializationError> {
    let config = Config::load()?;
    AppState::new(config)
}

/// Prepares the database and media directory for serving.
pub fn initialize(state: &AppState) -> Result<(), InitializationError> {
    std::fs::create_dir_all(state.config.path(Directory::Posts))?;

    let mut conn = state.get_connection()?;
    db::run_migrations(&mut conn).map_err(InitializationError::Migration)?;
    let purged_sessions = session::purge_expired(&mut conn)?;
    if purged_sessions > 0 {
        info!("Purged {purged_sessions} expired sessions");
    }
    Ok(())
}

/// Builds the router for the whole site. Trailing slashes are trimmed before routing,
/// so `/new` and `/new/` reach the same handler.
pub fn router(state: AppState) -> Router {
    let routes = web::routes(state);
    Router::new().fallback_service(NormalizePathLayer::trim_trailing_slash().layer(routes))
}

pub async fn run(state: AppState) -> std::io::Result<()> {
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler. Details:\n{err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to install signal handler. Details:\n{err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Stopping server...");
}
