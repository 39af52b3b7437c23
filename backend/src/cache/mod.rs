pub mod index_page;
pub mod leaderboard;

pub use index_page::{CachedPage, IndexPage};
pub use leaderboard::LeaderboardCache;
