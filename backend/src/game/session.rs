use super::scorer::GuessResult;

/// Lives every session starts with
pub const MAX_LIVES: i32 = 3;

/// Lives and score of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub lives: i32,
    pub score: i32,
}

impl Default for Standing {
    fn default() -> Self {
        Self {
            lives: MAX_LIVES,
            score: 0,
        }
    }
}

impl Standing {
    pub fn new(lives: i32, score: i32) -> Self {
        Self { lives, score }
    }

    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }

    /// A miss costs a life, any hit earns a point. Lives never go below zero.
    pub fn apply(self, result: GuessResult) -> Self {
        if result.is_hit() {
            Self {
                lives: self.lives,
                score: self.score + 1,
            }
        } else {
            Self {
                lives: (self.lives - 1).max(0),
                score: self.score,
            }
        }
    }
}

/// Why a session may not guess right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("No lives remaining")]
    OutOfLives,
    /// The location pool ran dry on an earlier guess
    #[error("No location left to guess")]
    NoLocation,
}

/// A session cleared to guess, with the location it is guessing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub standing: Standing,
    pub location_id: i32,
}

impl Turn {
    /// Check a locked session before scoring. A dead session is rejected
    /// even if it still points at a location.
    pub fn begin(standing: Standing, location_id: Option<i32>) -> Result<Self, TurnError> {
        if !standing.is_alive() {
            return Err(TurnError::OutOfLives);
        }
        let location_id = location_id.ok_or(TurnError::NoLocation)?;
        Ok(Self {
            standing,
            location_id,
        })
    }

    /// Standing after the guess. A next location is drawn only while it is
    /// still alive; `None` from the draw ends the session's pool.
    pub fn finish(self, result: GuessResult) -> Standing {
        self.standing.apply(result)
    }
}
