use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::{game::LeaderboardEntry, models::GameMode};

#[derive(Debug, Clone)]
struct CachedBoard {
    fetched_at: Instant,
    players: Vec<LeaderboardEntry>,
}

/// Per-mode cache slot. `generation` moves on every invalidation so a scan
/// that started earlier cannot store its result afterwards.
#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    board: Option<CachedBoard>,
}

/// Ranked leaderboards per mode, served until they are `ttl` old or
/// explicitly invalidated
#[derive(Debug)]
pub struct LeaderboardCache {
    ttl: Duration,
    slots: DashMap<GameMode, Slot>,
}

impl LeaderboardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: DashMap::new(),
        }
    }

    /// Cached players for `mode` if still fresh at `now`
    pub fn get(&self, mode: GameMode, now: Instant) -> Option<Vec<LeaderboardEntry>> {
        let slot = self.slots.get(&mode)?;
        let board = slot.board.as_ref()?;
        if now.saturating_duration_since(board.fetched_at) >= self.ttl {
            return None;
        }
        Some(board.players.clone())
    }

    /// Token to take before scanning the database and hand back to `store`
    pub fn generation(&self, mode: GameMode) -> u64 {
        self.slots.get(&mode).map_or(0, |slot| slot.generation)
    }

    /// Store a freshly computed board unless `mode` was invalidated after
    /// `generation` was taken. Returns whether the board was kept.
    pub fn store(
        &self,
        mode: GameMode,
        players: Vec<LeaderboardEntry>,
        now: Instant,
        generation: u64,
    ) -> bool {
        let mut slot = self.slots.entry(mode).or_default();
        if slot.generation != generation {
            tracing::debug!("Discarding stale {} leaderboard scan", mode);
            return false;
        }
        slot.board = Some(CachedBoard {
            fetched_at: now,
            players,
        });
        true
    }

    pub fn invalidate(&self, mode: GameMode) {
        let mut slot = self.slots.entry(mode).or_default();
        slot.generation += 1;
        if slot.board.take().is_some() {
            tracing::debug!("Invalidated cached {} leaderboard", mode);
        }
    }
}
