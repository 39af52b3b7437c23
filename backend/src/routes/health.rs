use axum::Json;
use serde::Serialize;

use crate::models::GameMode;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// Modes the API accepts in `/api/init/{mode}` and `/api/leaderboard/{mode}`
    pub modes: Vec<&'static str>,
}

/// Liveness check. Does not touch the database.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        modes: GameMode::ALL.iter().map(|mode| mode.as_str()).collect(),
    })
}
