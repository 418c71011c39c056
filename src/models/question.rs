//! Question bank types.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::config;

/// Difficulty tier of a question. Unknown strings degrade to `Medium`
/// rather than failing the whole bank load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Base points for a correct answer at this tier.
    pub fn base_points(self) -> i64 {
        match self {
            Difficulty::Easy => config::EASY_POINTS,
            Difficulty::Medium => config::MEDIUM_POINTS,
            Difficulty::Hard => config::HARD_POINTS,
        }
    }

    /// Seconds under which a correct answer earns the speed bonus.
    pub fn speed_threshold(self) -> u64 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 15,
            Difficulty::Hard => 20,
        }
    }

    /// Parse a difficulty label, falling back to `Medium` for anything
    /// unrecognized.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Difficulty::parse(&s))
    }
}

/// What kind of answer set the question carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
}

/// A single question as loaded from the bank. Immutable once a session
/// holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub text: String,
    pub kind: QuestionKind,
    /// Ordered answer options; exactly two for true/false questions.
    pub options: Vec<String>,
    /// Must match one entry of `options` exactly.
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Explicit point value; tier-derived when absent.
    #[serde(default)]
    pub points: Option<i64>,
}

impl Question {
    /// Base points for this question: the explicit value if set, else the
    /// tier default.
    pub fn base_points(&self) -> i64 {
        self.points.unwrap_or_else(|| self.difficulty.base_points())
    }

    /// True/false questions always present exactly two options.
    pub fn is_well_formed(&self) -> bool {
        let option_count_ok = match self.kind {
            QuestionKind::TrueFalse => self.options.len() == 2,
            QuestionKind::MultipleChoice => self.options.len() >= 2,
        };
        option_count_ok && self.options.iter().any(|o| o == &self.correct_answer)
    }
}
