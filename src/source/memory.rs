//! In-memory adapter: a built-in question bank (optionally replaced by a
//! JSON file) and a recording progress sink. Used when no remote backend
//! is configured, and by tests.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::models::{AnswerRecord, Difficulty, Question, QuestionKind, ResultSummary, UserStats};

use super::{ProgressSink, QuestionFilter, QuestionSource, SourceError};

/// Error loading a question bank from a JSON file.
#[derive(Debug)]
pub enum LoadError {
    Io(io::Error),
    Parse(serde_json::Error),
    /// The file parsed but held no usable questions.
    Empty,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "failed to read question bank: {}", e),
            LoadError::Parse(e) => write!(f, "failed to parse question bank: {}", e),
            LoadError::Empty => write!(f, "question bank contains no usable questions"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Parse(e) => Some(e),
            LoadError::Empty => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Parse(err)
    }
}

/// In-memory question source and progress sink.
pub struct MemorySource {
    questions: Vec<Question>,
    /// Writes land here so tests can observe the mirroring side effects.
    recorded_answers: Mutex<Vec<(Uuid, AnswerRecord)>>,
    finished_sessions: Mutex<Vec<(Uuid, ResultSummary)>>,
}

impl MemorySource {
    /// Source backed by the built-in fallback bank.
    pub fn builtin() -> Self {
        Self::with_questions(fallback_questions())
    }

    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions,
            recorded_answers: Mutex::new(Vec::new()),
            finished_sessions: Mutex::new(Vec::new()),
        }
    }

    /// Load a bank from a JSON file; malformed rows (wrong option count,
    /// correct answer not among the options) are dropped with a warning.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let parsed: Vec<Question> = serde_json::from_str(&raw)?;

        let total = parsed.len();
        let questions: Vec<Question> = parsed.into_iter().filter(|q| q.is_well_formed()).collect();
        if questions.len() < total {
            tracing::warn!(
                "dropped {} malformed questions from {}",
                total - questions.len(),
                path.display()
            );
        }

        if questions.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(Self::with_questions(questions))
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Answers mirrored so far, for tests.
    pub fn recorded_answer_count(&self) -> usize {
        self.recorded_answers.lock().map(|v| v.len()).unwrap_or(0)
    }

    /// Completed sessions recorded so far, for tests.
    pub fn finished_session_count(&self) -> usize {
        self.finished_sessions.lock().map(|v| v.len()).unwrap_or(0)
    }
}

#[async_trait]
impl QuestionSource for MemorySource {
    async fn fetch_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, SourceError> {
        let mut matched: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect();

        matched.shuffle(&mut rand::thread_rng());
        if filter.limit > 0 {
            matched.truncate(filter.limit);
        }
        Ok(matched)
    }
}

#[async_trait]
impl ProgressSink for MemorySource {
    async fn session_started(
        &self,
        session_id: Uuid,
        _user_id: Uuid,
        category: &str,
        question_count: usize,
    ) -> Result<(), SourceError> {
        tracing::debug!(
            "session {} started: {} x{}",
            session_id,
            category,
            question_count
        );
        Ok(())
    }

    async fn answer_recorded(
        &self,
        session_id: Uuid,
        record: &AnswerRecord,
    ) -> Result<(), SourceError> {
        if let Ok(mut answers) = self.recorded_answers.lock() {
            answers.push((session_id, record.clone()));
        }
        Ok(())
    }

    async fn session_finished(
        &self,
        session_id: Uuid,
        _stats: &UserStats,
        summary: &ResultSummary,
    ) -> Result<(), SourceError> {
        if let Ok(mut finished) = self.finished_sessions.lock() {
            finished.push((session_id, summary.clone()));
        }
        Ok(())
    }
}

fn q(
    text: &str,
    options: &[&str],
    correct: &str,
    category: &str,
    difficulty: Difficulty,
    explanation: Option<&str>,
) -> Question {
    let kind = if options.len() == 2 {
        QuestionKind::TrueFalse
    } else {
        QuestionKind::MultipleChoice
    };
    Question {
        id: Uuid::new_v4(),
        text: text.to_string(),
        kind,
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer: correct.to_string(),
        explanation: explanation.map(|e| e.to_string()),
        category: category.to_string(),
        difficulty,
        points: None,
    }
}

/// Small fixed bank used when no file and no backend are available.
pub fn fallback_questions() -> Vec<Question> {
    vec![
        q(
            "Which planet is known as the Red Planet?",
            &["Mars", "Venus", "Jupiter", "Mercury"],
            "Mars",
            "Science",
            Difficulty::Easy,
            Some("Iron oxide on the surface gives Mars its color."),
        ),
        q(
            "Sound travels faster in water than in air.",
            &["True", "False"],
            "True",
            "Science",
            Difficulty::Medium,
            Some("Water is denser, so sound moves roughly four times faster."),
        ),
        q(
            "What is the chemical symbol for gold?",
            &["Au", "Ag", "Gd", "Go"],
            "Au",
            "Science",
            Difficulty::Easy,
            Some("From the Latin aurum."),
        ),
        q(
            "Which particle carries a negative charge?",
            &["Electron", "Proton", "Neutron", "Photon"],
            "Electron",
            "Science",
            Difficulty::Easy,
            None,
        ),
        q(
            "In what year did the Berlin Wall fall?",
            &["1989", "1991", "1987", "1993"],
            "1989",
            "History",
            Difficulty::Medium,
            None,
        ),
        q(
            "The Hundred Years' War lasted exactly 100 years.",
            &["True", "False"],
            "False",
            "History",
            Difficulty::Hard,
            Some("It ran 116 years, from 1337 to 1453."),
        ),
        q(
            "Who was the first emperor of Rome?",
            &["Augustus", "Julius Caesar", "Nero", "Tiberius"],
            "Augustus",
            "History",
            Difficulty::Medium,
            None,
        ),
        q(
            "Which river is the longest in the world?",
            &["Nile", "Amazon", "Yangtze", "Mississippi"],
            "Nile",
            "Geography",
            Difficulty::Medium,
            Some("By most measurements, narrowly ahead of the Amazon."),
        ),
        q(
            "Australia is both a country and a continent.",
            &["True", "False"],
            "True",
            "Geography",
            Difficulty::Easy,
            None,
        ),
        q(
            "What is the capital of Canada?",
            &["Ottawa", "Toronto", "Vancouver", "Montreal"],
            "Ottawa",
            "Geography",
            Difficulty::Hard,
            None,
        ),
        q(
            "How many players are on a standard soccer team on the field?",
            &["11", "10", "9", "12"],
            "11",
            "Sports",
            Difficulty::Easy,
            None,
        ),
        q(
            "A marathon is just over 42 kilometers long.",
            &["True", "False"],
            "True",
            "Sports",
            Difficulty::Medium,
            Some("42.195 km, fixed at the 1908 London Olympics."),
        ),
        q(
            "Which country hosted the first modern Olympic Games?",
            &["Greece", "France", "England", "Italy"],
            "Greece",
            "Sports",
            Difficulty::Hard,
            Some("Athens, 1896."),
        ),
        q(
            "Which composer wrote the Ninth Symphony while almost completely deaf?",
            &["Beethoven", "Mozart", "Bach", "Brahms"],
            "Beethoven",
            "Entertainment",
            Difficulty::Medium,
            None,
        ),
        q(
            "The Mona Lisa has no eyebrows.",
            &["True", "False"],
            "True",
            "Entertainment",
            Difficulty::Hard,
            None,
        ),
    ]
}
