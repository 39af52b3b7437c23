use serde::{Deserialize, Serialize};

/// Distance at which a guess stops earning anything
pub const GUESS_THRESHOLD: f64 = 2.4;
/// Fraction of the raw factor above which a guess counts as exact
pub const BENEFIT_OF_DOUBT_RADIUS: f64 = 0.8;

/// A point on the game map. Map space is planar, not geographic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Outcome tier of a guess. Serialized as its wire code (0, 1, 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum GuessResult {
    Miss = 0,
    Close = 1,
    Exact = 2,
}

impl GuessResult {
    pub fn is_hit(&self) -> bool {
        !matches!(self, GuessResult::Miss)
    }
}

impl From<GuessResult> for u8 {
    fn from(result: GuessResult) -> Self {
        result as u8
    }
}

impl TryFrom<u8> for GuessResult {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(GuessResult::Miss),
            1 => Ok(GuessResult::Close),
            2 => Ok(GuessResult::Exact),
            other => Err(format!("invalid guess result code {}", other)),
        }
    }
}

/// Result of scoring one guess
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuessOutcome {
    pub result: GuessResult,
    /// Accuracy recorded in the guess log, 0..=100
    pub dist_pct: i32,
    /// Planar distance between guess and truth
    pub distance: f64,
}

pub struct Scorer;

impl Scorer {
    /// Score a guess against the true location.
    ///
    /// Tiers, checked in order:
    /// - guess made on the wrong sub-map: miss, 0%
    /// - raw factor <= 0 (distance >= threshold): miss, 0%
    /// - raw factor below the benefit-of-doubt radius: close, scaled %
    /// - otherwise: exact, 100%
    pub fn score_guess(guess: Coordinates, truth: Coordinates, map_matches: bool) -> GuessOutcome {
        let distance = Self::distance(guess, truth);

        if !map_matches {
            return GuessOutcome {
                result: GuessResult::Miss,
                dist_pct: 0,
                distance,
            };
        }

        let raw = Self::raw_factor(distance);

        let (result, dist_pct) = if raw <= 0.0 {
            (GuessResult::Miss, 0)
        } else if raw < BENEFIT_OF_DOUBT_RADIUS {
            let pct = (Self::accuracy(raw) * 100.0).round() as i32;
            (GuessResult::Close, pct.clamp(1, 100))
        } else {
            (GuessResult::Exact, 100)
        };

        GuessOutcome {
            result,
            dist_pct,
            distance,
        }
    }

    /// Euclidean distance in map space
    pub fn distance(a: Coordinates, b: Coordinates) -> f64 {
        (a.lat - b.lat).hypot(a.lng - b.lng)
    }

    /// Linear falloff: 1 at the exact spot, 0 at `GUESS_THRESHOLD` and beyond
    pub fn raw_factor(distance: f64) -> f64 {
        (1.0 - distance / GUESS_THRESHOLD).max(0.0)
    }

    /// Raw factor rescaled so that anything inside the benefit-of-doubt
    /// radius is capped at 1
    pub fn accuracy(raw_factor: f64) -> f64 {
        (raw_factor / BENEFIT_OF_DOUBT_RADIUS).min(1.0)
    }

    /// Player-facing distance factor in [0, 1]
    pub fn distance_factor(distance: f64) -> f64 {
        Self::accuracy(Self::raw_factor(distance))
    }

    /// A location without a map id accepts guesses from any map
    pub fn map_matches(location_map: Option<i32>, guess_map: Option<i32>) -> bool {
        match location_map {
            Some(expected) => guess_map == Some(expected),
            None => true,
        }
    }
}
