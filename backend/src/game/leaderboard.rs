use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Number of players shown on the leaderboard
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// One ranked player. Accuracy is the mean guess percentage, rounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: i32,
    pub accuracy: i32,
}

/// Higher score first, then higher accuracy, then name for a stable order
pub fn rank_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.accuracy.cmp(&a.accuracy))
        .then_with(|| a.name.cmp(&b.name))
}

/// Bounded top-N collector. Entries arrive in any order, page by page,
/// and only the best `limit` are ever held.
#[derive(Debug)]
pub struct TopScores {
    limit: usize,
    entries: Vec<LeaderboardEntry>,
}

impl TopScores {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: Vec::with_capacity(limit + 1),
        }
    }

    pub fn push(&mut self, entry: LeaderboardEntry) {
        let pos = self
            .entries
            .partition_point(|held| rank_order(held, &entry) != Ordering::Greater);
        if pos >= self.limit {
            return;
        }
        self.entries.insert(pos, entry);
        self.entries.truncate(self.limit);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once the collector is full and its weakest entry outscores
    /// `score`, i.e. no entry with that score or lower can get in
    pub fn is_closed_below(&self, score: i32) -> bool {
        self.entries.len() >= self.limit
            && self.entries.last().is_none_or(|weakest| weakest.score > score)
    }

    pub fn into_ranked(self) -> Vec<LeaderboardEntry> {
        self.entries
    }
}

impl Extend<LeaderboardEntry> for TopScores {
    fn extend<I: IntoIterator<Item = LeaderboardEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: i32, accuracy: i32) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            score,
            accuracy,
        }
    }

    #[test]
    fn test_score_then_accuracy_ordering() {
        let mut top = TopScores::new(DEFAULT_LEADERBOARD_SIZE);
        top.extend([entry("a", 10, 50), entry("b", 10, 80), entry("c", 5, 99)]);

        let accuracies: Vec<i32> = top.into_ranked().iter().map(|e| e.accuracy).collect();
        assert_eq!(accuracies, vec![80, 50, 99]);
    }

    #[test]
    fn test_only_best_entries_are_kept() {
        let mut top = TopScores::new(3);
        for score in 1..=20 {
            top.push(entry(&format!("p{}", score), score, 50));
        }

        assert_eq!(top.len(), 3);
        let scores: Vec<i32> = top.into_ranked().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![20, 19, 18]);
    }

    #[test]
    fn test_ties_are_broken_by_name() {
        let mut top = TopScores::new(DEFAULT_LEADERBOARD_SIZE);
        top.extend([entry("zed", 4, 70), entry("amy", 4, 70)]);

        let names: Vec<String> = top.into_ranked().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }

    #[test]
    fn test_closed_below_only_when_full() {
        let mut top = TopScores::new(2);
        top.push(entry("a", 9, 10));
        assert!(!top.is_closed_below(1), "A collector with room left is never closed");

        top.push(entry("b", 7, 10));
        assert!(top.is_closed_below(6));
        assert!(!top.is_closed_below(7), "An equal score can still win on accuracy");
    }

    #[test]
    fn test_zero_limit_holds_nothing() {
        let mut top = TopScores::new(0);
        top.push(entry("a", 1, 1));
        assert!(top.is_empty());
    }
}
