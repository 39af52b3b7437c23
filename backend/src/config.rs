use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::game::leaderboard::DEFAULT_LEADERBOARD_SIZE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Seconds a request waits for a pooled connection before failing
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `index.html` and the static assets
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// How long a computed leaderboard is served from memory
    pub leaderboard_cache_secs: u64,
    pub leaderboard_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: var_or("DATABASE_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: var_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?,
        };

        let server = ServerConfig {
            host: env::var("SERVER_LISTEN_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: var_or("SERVER_PORT", 3000)?,
            static_dir: env::var("STATIC_DIR")
                .unwrap_or_else(|_| "./static".to_string())
                .into(),
        };

        let game = GameConfig {
            leaderboard_cache_secs: var_or("LEADERBOARD_CACHE_SECS", 60)?,
            leaderboard_size: var_or("LEADERBOARD_SIZE", DEFAULT_LEADERBOARD_SIZE)?,
        };

        Ok(Config {
            database,
            server,
            game,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn index_path(&self) -> PathBuf {
        self.server.static_dir.join("index.html")
    }

    pub fn leaderboard_ttl(&self) -> Duration {
        Duration::from_secs(self.game.leaderboard_cache_secs)
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset
fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}
