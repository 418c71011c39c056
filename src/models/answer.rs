//! Per-answer records and score line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::Difficulty;

/// Tag for a single bonus or penalty applied to one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    Streak,
    Speed,
    HardMastery,
    PerfectAccuracy,
    WrongAnswer,
    SlowAnswer,
}

/// One bonus or penalty line with its magnitude and display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreLineItem {
    pub kind: LineItemKind,
    /// Always positive; the sign is implied by whether it sits in the
    /// bonus or penalty list.
    pub points: i64,
    pub description: String,
}

/// Base / bonus / penalty decomposition of one answer's delta.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnswerBreakdown {
    pub base: i64,
    pub bonus_total: i64,
    pub penalty_total: i64,
    pub net: i64,
}

/// The scoring engine's output for one answer.
#[derive(Debug, Clone)]
pub struct AnswerScore {
    /// Signed final delta after floors are applied.
    pub points: i64,
    pub bonuses: Vec<ScoreLineItem>,
    pub penalties: Vec<ScoreLineItem>,
    pub breakdown: AnswerBreakdown,
}

/// Append-only record of one answered question. Never mutated after
/// creation; exactly one per question index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: Uuid,
    pub question_text: String,
    pub selected: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub points: i64,
    pub bonuses: Vec<ScoreLineItem>,
    pub penalties: Vec<ScoreLineItem>,
    pub breakdown: AnswerBreakdown,
    pub time_spent_secs: u64,
    pub category: String,
    pub difficulty: Difficulty,
    pub answered_at: DateTime<Utc>,
    /// Base value of the question, kept for max-possible accounting.
    pub base_points: i64,
}
