//! Leaderboard rows and rank context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the ranked user list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub username: String,
    pub total_points: i64,
    pub quizzes_completed: u32,
    pub average_score: f64,
    pub best_score: i64,
    /// 1-based position after a descending stable sort by points.
    pub rank: usize,
}

impl LeaderboardEntry {
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            total_points: 0,
            quizzes_completed: 0,
            average_score: 0.0,
            best_score: 0,
            rank: 0,
        }
    }

    /// Fold one finished quiz into the row's aggregates. Rank is left for
    /// the caller's re-sort pass.
    pub fn apply_result(&mut self, points: i64) {
        self.total_points += points;
        self.quizzes_completed += 1;
        self.average_score = self.total_points as f64 / self.quizzes_completed as f64;
        if points > self.best_score {
            self.best_score = points;
        }
    }
}

/// A user's rank plus a small window of neighboring rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankContext {
    pub rank: usize,
    pub entry: LeaderboardEntry,
    /// Rows at rank ± the configured window, in rank order, including the
    /// user's own row.
    pub neighbors: Vec<LeaderboardEntry>,
}
