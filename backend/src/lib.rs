pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use cache::{IndexPage, LeaderboardCache};
use config::Config;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub db: PgPool,
    /// Ranked leaderboards per mode, expired by timestamp
    pub leaderboard: LeaderboardCache,
    /// Index page, revalidated against the file's modification time
    pub index_page: IndexPage,
}

impl AppState {
    pub fn new(config: Config, db: PgPool) -> Self {
        Self {
            leaderboard: LeaderboardCache::new(config.leaderboard_ttl()),
            index_page: IndexPage::new(config.index_path()),
            config,
            db,
        }
    }
}

/// Full application router: API, index page, and static assets
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .merge(routes::create_routes())
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
