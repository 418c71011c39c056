//! Domain types shared across the crate.

mod answer;
mod leaderboard;
mod question;
mod result;
mod user;

pub use answer::{AnswerBreakdown, AnswerRecord, AnswerScore, LineItemKind, ScoreLineItem};
pub use leaderboard::{LeaderboardEntry, RankContext};
pub use question::{Difficulty, Question, QuestionKind};
pub use result::{
    CompletionBonus, CompletionBonusKind, Grade, QuizResult, ResultBreakdown, ResultSummary,
};
pub use user::UserStats;
