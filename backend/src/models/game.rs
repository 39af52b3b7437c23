use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Game variant. Each mode reads from its own location/zone tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Retail,
    Classic,
}

impl GameMode {
    pub const ALL: [GameMode; 2] = [GameMode::Retail, GameMode::Classic];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Retail => "retail",
            GameMode::Classic => "classic",
        }
    }

    /// Table holding this mode's locations
    pub fn locations_table(&self) -> &'static str {
        match self {
            GameMode::Retail => "locations",
            GameMode::Classic => "locations_classic",
        }
    }

    /// Table holding this mode's zones
    pub fn zones_table(&self) -> &'static str {
        match self {
            GameMode::Retail => "zones",
            GameMode::Classic => "zones_classic",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game mode '{0}'")]
pub struct UnknownGameMode(pub String);

impl FromStr for GameMode {
    type Err = UnknownGameMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retail" => Ok(GameMode::Retail),
            "classic" => Ok(GameMode::Classic),
            other => Err(UnknownGameMode(other.to_string())),
        }
    }
}

/// A row of the `sessions` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub token: Uuid,
    pub mode: GameMode,
    /// Location currently being guessed; `None` once the session is over
    /// or the location pool ran dry
    pub location_id: Option<i32>,
    pub lives: i32,
    pub score: i32,
    /// Display name claimed after the game ended
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }
}

/// A location joined with its zone name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub zone_name: String,
    pub lat: f64,
    pub lng: f64,
    /// Sub-map the location sits on (multi-map retail mode only)
    pub map_id: Option<i32>,
}

/// A row of the append-only `guesses` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GuessRecord {
    pub id: i64,
    pub token: Uuid,
    pub location_id: i32,
    pub dist_pct: i32,
    pub created_at: DateTime<Utc>,
}
