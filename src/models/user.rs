//! Cumulative profile statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aggregate statistics for one user across all completed quizzes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: Uuid,
    pub username: String,
    pub total_points: i64,
    pub quizzes_completed: u32,
    pub average_score: f64,
    pub best_score: i64,
    #[serde(default)]
    pub last_played: Option<DateTime<Utc>>,
}

impl UserStats {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            username: username.into(),
            total_points: 0,
            quizzes_completed: 0,
            average_score: 0.0,
            best_score: 0,
            last_played: None,
        }
    }

    /// Fold one finished quiz into the aggregates.
    pub fn record_quiz(&mut self, points: i64, finished_at: DateTime<Utc>) {
        self.total_points += points;
        self.quizzes_completed += 1;
        self.average_score = self.total_points as f64 / self.quizzes_completed as f64;
        if points > self.best_score {
            self.best_score = points;
        }
        self.last_played = Some(finished_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_quiz_updates_aggregates() {
        let mut stats = UserStats::new("ada");
        stats.record_quiz(120, Utc::now());
        stats.record_quiz(80, Utc::now());

        assert_eq!(stats.total_points, 200);
        assert_eq!(stats.quizzes_completed, 2);
        assert_eq!(stats.average_score, 100.0);
        assert_eq!(stats.best_score, 120);
        assert!(stats.last_played.is_some());
    }
}
