//! Aggregate quiz results and grading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag for a session-end bonus awarded on aggregate performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionBonusKind {
    PerfectScore,
    HighAccuracy,
    FullCompletion,
    SpeedRun,
    CategoryMastery,
}

/// A completion-level bonus line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionBonus {
    pub kind: CompletionBonusKind,
    pub points: i64,
    pub description: String,
}

/// Letter grade derived from accuracy, with display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grade {
    pub letter: &'static str,
    pub description: &'static str,
    /// Terminal color name used by the results screen.
    pub color: &'static str,
}

/// Totals across all answers plus the completion layer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResultBreakdown {
    pub base: i64,
    pub bonus: i64,
    pub penalty: i64,
    pub completion: i64,
}

/// Aggregate over a finished session. Computed once at session end,
/// immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub session_id: Uuid,
    pub category: String,
    /// Final score including completion bonuses; never negative.
    pub total_points: i64,
    pub correct_count: usize,
    pub answered_count: usize,
    /// Percentage rounded to one decimal; 0.0 when nothing was answered.
    pub accuracy: f64,
    /// Sum of answered questions' base values, for display only.
    pub max_possible: i64,
    pub completion_bonuses: Vec<CompletionBonus>,
    pub grade: Grade,
    pub breakdown: ResultBreakdown,
    pub elapsed_secs: u64,
    pub finished_at: DateTime<Utc>,
}

impl QuizResult {
    pub fn incorrect_count(&self) -> usize {
        self.answered_count - self.correct_count
    }
}

/// Compact history row persisted to the local store, most-recent-first
/// on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub category: String,
    pub total_points: i64,
    pub correct_count: usize,
    pub answered_count: usize,
    pub accuracy: f64,
    pub grade: String,
    pub finished_at: DateTime<Utc>,
}

impl From<&QuizResult> for ResultSummary {
    fn from(r: &QuizResult) -> Self {
        Self {
            category: r.category.clone(),
            total_points: r.total_points,
            correct_count: r.correct_count,
            answered_count: r.answered_count,
            accuracy: r.accuracy,
            grade: r.grade.letter.to_string(),
            finished_at: r.finished_at,
        }
    }
}
