pub mod leaderboard;
pub mod scorer;
pub mod session;

pub use leaderboard::{LeaderboardEntry, TopScores};
pub use scorer::{Coordinates, GuessOutcome, GuessResult, Scorer};
pub use session::{Standing, Turn, TurnError, MAX_LIVES};
