use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::GuessResult;

/// Key under which the session token is persisted
pub const TOKEN_KEY: &str = "wiw-token";
/// Key under which the guess history is persisted
pub const HISTORY_KEY: &str = "wiw-guesses";

/// String key/value storage that outlives a page load, in the manner of
/// browser local storage
pub trait LocalStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// In-memory `LocalStore`
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// One finished round as remembered by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayedRound {
    pub location: i32,
    pub dist_pct: i32,
    pub result: GuessResult,
}

pub fn load_token(store: &impl LocalStore) -> Option<Uuid> {
    store
        .get(TOKEN_KEY)
        .and_then(|raw| Uuid::parse_str(&raw).ok())
}

pub fn save_token(store: &mut impl LocalStore, token: Option<Uuid>) {
    match token {
        Some(token) => store.set(TOKEN_KEY, token.to_string()),
        None => store.remove(TOKEN_KEY),
    }
}

/// Stored history; unreadable data counts as no history
pub fn load_history(store: &impl LocalStore) -> Vec<PlayedRound> {
    store
        .get(HISTORY_KEY)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub fn save_history(store: &mut impl LocalStore, history: &[PlayedRound]) {
    match serde_json::to_string(history) {
        Ok(json) => store.set(HISTORY_KEY, json),
        Err(e) => tracing::error!("Failed to serialize guess history: {}", e),
    }
}
