use std::{sync::Arc, time::Instant};

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::queries, error::ApiError, game::LeaderboardEntry, routes::session::parse_mode, AppState,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub players: Vec<LeaderboardEntry>,
}

/// Top players of a mode. Served from the in-memory cache while fresh;
/// a failed database scan yields an empty board rather than an error.
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<String>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let mode = parse_mode(&mode)?;

    if let Some(players) = state.leaderboard.get(mode, Instant::now()) {
        return Ok(Json(LeaderboardResponse { players }));
    }

    let generation = state.leaderboard.generation(mode);
    let players = match queries::top_players(&state.db, mode, state.config.game.leaderboard_size).await
    {
        Ok(players) => {
            if state.leaderboard.store(mode, players.clone(), Instant::now(), generation) {
                tracing::info!("Refreshed {} leaderboard ({} players)", mode, players.len());
            }
            players
        }
        Err(e) => {
            tracing::error!("Failed to compute {} leaderboard: {}", mode, e);
            Vec::new()
        }
    };

    Ok(Json(LeaderboardResponse { players }))
}
