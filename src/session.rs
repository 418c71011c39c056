//! Quiz session state machine and its manager.
//!
//! `QuizSession` is the pure state machine: no IO, no timers, no
//! rendering, so every transition is testable directly. `SessionManager`
//! wires it to a `QuestionSource` for loading and a `ProgressSink` for
//! best-effort mirroring.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config;
use crate::models::{AnswerRecord, Difficulty, Question, QuizResult};
use crate::scoring::{self, QuizInfo, ScoreOptions};
use crate::source::{
    ProgressSink, QuestionFilter, QuestionSource, SourceError, fallback_questions, with_backoff,
};

/// One-directional lifecycle: NotStarted -> Active -> Ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    NotStarted,
    Active,
    Ended,
}

#[derive(Debug)]
pub enum SessionError {
    /// The operation needs an active session.
    NotActive,
    /// A session is already running; no resume, no restart.
    AlreadyStarted,
    /// Every fallback stage came back empty.
    NoQuestions,
    Source(SourceError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotActive => write!(f, "no active quiz session"),
            SessionError::AlreadyStarted => write!(f, "a quiz session is already running"),
            SessionError::NoQuestions => write!(f, "no questions available"),
            SessionError::Source(e) => write!(f, "question source failed: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SourceError> for SessionError {
    fn from(err: SourceError) -> Self {
        SessionError::Source(err)
    }
}

/// What `tick` observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No active session; nothing to count down.
    Inactive,
    /// Seconds still remaining.
    Running(u64),
    /// The budget ran out; the session is now ended.
    TimedOut,
}

/// Result of one accepted answer.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub record: AnswerRecord,
    pub is_correct: bool,
    pub points: i64,
    pub correct_answer: String,
    pub explanation: Option<String>,
    /// True when this was the last question.
    pub finished: bool,
}

/// One quiz attempt: its question set, timer, and answers.
pub struct QuizSession {
    id: Uuid,
    category: String,
    difficulty: Option<Difficulty>,
    requested: usize,
    questions: Vec<Question>,
    answers: Vec<AnswerRecord>,
    time_budget_secs: u64,
    time_remaining_secs: u64,
    current_index: usize,
    question_elapsed_secs: u64,
    score: i64,
    status: SessionStatus,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Build a session from a loaded question set. Duplicates are dropped
    /// (first occurrence wins) and the set is truncated to the requested
    /// count; the time budget follows the actual count.
    pub fn new(
        category: impl Into<String>,
        difficulty: Option<Difficulty>,
        requested: usize,
        questions: Vec<Question>,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut deduped: Vec<Question> = questions
            .into_iter()
            .filter(|q| seen.insert(q.id))
            .collect();
        deduped.truncate(requested.min(deduped.len()));

        let count = deduped.len() as u64;
        let budget = count * config::SECS_PER_QUESTION;

        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            difficulty,
            requested,
            questions: deduped,
            answers: Vec::new(),
            time_budget_secs: budget,
            time_remaining_secs: budget,
            current_index: 0,
            question_elapsed_secs: 0,
            score: 0,
            status: SessionStatus::NotStarted,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn time_budget_secs(&self) -> u64 {
        self.time_budget_secs
    }

    pub fn time_remaining_secs(&self) -> u64 {
        self.time_remaining_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.time_budget_secs - self.time_remaining_secs
    }

    /// 0-based index of the question awaiting an answer.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.status == SessionStatus::Active {
            self.questions.get(self.current_index)
        } else {
            None
        }
    }

    /// Prior consecutive correct answers, counted backward from the most
    /// recent record.
    pub fn streak(&self) -> u32 {
        self.answers
            .iter()
            .rev()
            .take_while(|r| r.is_correct)
            .count() as u32
    }

    /// NotStarted -> Active.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::NotStarted => {
                self.status = SessionStatus::Active;
                self.started_at = Utc::now();
                Ok(())
            }
            _ => Err(SessionError::AlreadyStarted),
        }
    }

    /// Record an answer for the current question. Exactly one record per
    /// index: the index advances on every accepted answer, and the last
    /// one ends the session.
    pub fn submit_answer(&mut self, selected: &str) -> Result<SubmitOutcome, SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::NotActive);
        }
        let Some(question) = self.questions.get(self.current_index) else {
            return Err(SessionError::NotActive);
        };

        let is_correct = selected == question.correct_answer;
        let streak = self.streak();
        let score = scoring::score_answer(
            question,
            is_correct,
            self.question_elapsed_secs,
            streak,
            ScoreOptions::default(),
        );

        let record = AnswerRecord {
            question_id: question.id,
            question_text: question.text.clone(),
            selected: selected.to_string(),
            correct_answer: question.correct_answer.clone(),
            is_correct,
            points: score.points,
            bonuses: score.bonuses,
            penalties: score.penalties,
            breakdown: score.breakdown,
            time_spent_secs: self.question_elapsed_secs,
            category: question.category.clone(),
            difficulty: question.difficulty,
            answered_at: Utc::now(),
            base_points: question.base_points(),
        };

        let correct_answer = record.correct_answer.clone();
        let explanation = question.explanation.clone();

        self.score += record.points;
        self.answers.push(record.clone());
        self.current_index += 1;
        self.question_elapsed_secs = 0;

        let finished = self.current_index >= self.questions.len();
        if finished {
            self.status = SessionStatus::Ended;
        }

        Ok(SubmitOutcome {
            points: record.points,
            is_correct,
            record,
            correct_answer,
            explanation,
            finished,
        })
    }

    /// One-second countdown tick. An answer submitted in the same loop
    /// turn is processed before this, so the answer wins the boundary
    /// race; the session only ends here once the decrement reaches zero.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != SessionStatus::Active {
            return TickOutcome::Inactive;
        }

        self.time_remaining_secs = self.time_remaining_secs.saturating_sub(1);
        self.question_elapsed_secs += 1;

        if self.time_remaining_secs == 0 {
            self.status = SessionStatus::Ended;
            TickOutcome::TimedOut
        } else {
            TickOutcome::Running(self.time_remaining_secs)
        }
    }

    /// Explicit abandonment: Active -> Ended with whatever answers exist.
    pub fn end(&mut self) -> Result<(), SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::NotActive);
        }
        self.status = SessionStatus::Ended;
        Ok(())
    }

    /// Aggregate the session once it has ended.
    pub fn finalize(&self) -> Option<QuizResult> {
        if self.status != SessionStatus::Ended {
            return None;
        }
        let info = QuizInfo {
            session_id: self.id,
            category: self.category.clone(),
            time_budget_secs: self.time_budget_secs,
            elapsed_secs: self.elapsed_secs(),
        };
        Some(scoring::score_quiz(&self.answers, &info))
    }
}

/// How a started session got its questions.
#[derive(Debug, Clone, Copy)]
pub struct StartReport {
    pub question_count: usize,
    /// The external source failed or came back empty everywhere, so the
    /// built-in bank was substituted.
    pub used_local_fallback: bool,
}

/// Owns the active session and its external side effects.
pub struct SessionManager {
    source: Arc<dyn QuestionSource>,
    sink: Option<Arc<dyn ProgressSink>>,
    user_id: Uuid,
    session: Option<QuizSession>,
}

impl SessionManager {
    pub fn new(
        source: Arc<dyn QuestionSource>,
        sink: Option<Arc<dyn ProgressSink>>,
        user_id: Uuid,
    ) -> Self {
        Self {
            source,
            sink,
            user_id,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.status() == SessionStatus::Active)
    }

    /// Idle -> Active. Loads a question set with progressive filter
    /// relaxation, substituting the built-in bank when the source fails
    /// everywhere. Does not transition on failure.
    pub async fn start(
        &mut self,
        category: &str,
        difficulty: Option<Difficulty>,
        count: usize,
    ) -> Result<StartReport, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyStarted);
        }

        let (questions, used_local_fallback) = self.load_questions(category, difficulty, count).await;
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }

        let mut session = QuizSession::new(category, difficulty, count, questions);
        session.begin()?;

        if let Some(sink) = &self.sink {
            let sink = Arc::clone(sink);
            let session_id = session.id();
            let user_id = self.user_id;
            let category = session.category().to_string();
            let question_count = session.question_count();
            tokio::spawn(async move {
                if let Err(e) = sink
                    .session_started(session_id, user_id, &category, question_count)
                    .await
                {
                    tracing::warn!("failed to record session start: {}", e);
                }
            });
        }

        let report = StartReport {
            question_count: session.question_count(),
            used_local_fallback,
        };
        self.session = Some(session);
        Ok(report)
    }

    /// Filter relaxation: category+difficulty, category only, unfiltered,
    /// then the built-in bank. Reads retry with backoff; a stage that
    /// errors out just falls through to the next.
    async fn load_questions(
        &self,
        category: &str,
        difficulty: Option<Difficulty>,
        count: usize,
    ) -> (Vec<Question>, bool) {
        let category_filter = (!category.eq_ignore_ascii_case("all")).then(|| category.to_string());

        let mut stages = vec![QuestionFilter {
            category: category_filter.clone(),
            difficulty,
            limit: count,
        }];
        if difficulty.is_some() {
            stages.push(QuestionFilter {
                category: category_filter.clone(),
                difficulty: None,
                limit: count,
            });
        }
        if category_filter.is_some() {
            stages.push(QuestionFilter {
                category: None,
                difficulty: None,
                limit: count,
            });
        }
        stages.dedup();

        for filter in &stages {
            match with_backoff("fetch questions", || self.source.fetch_questions(filter)).await {
                Ok(questions) if !questions.is_empty() => return (questions, false),
                Ok(_) => {
                    tracing::debug!("no questions for {:?}, relaxing filter", filter);
                }
                Err(e) => {
                    tracing::warn!("question fetch failed for {:?}: {}", filter, e);
                }
            }
        }

        tracing::warn!("all question stages empty, using the built-in bank");
        (fallback_questions(), true)
    }

    /// Record an answer for the current question and mirror it
    /// fire-and-forget. Mirroring failures are logged, never surfaced.
    pub fn submit_answer(&mut self, selected: &str) -> Result<SubmitOutcome, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NotActive)?;
        let session_id = session.id();
        let outcome = session.submit_answer(selected)?;

        if let Some(sink) = &self.sink {
            let sink = Arc::clone(sink);
            let record = outcome.record.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.answer_recorded(session_id, &record).await {
                    tracing::warn!("failed to mirror answer: {}", e);
                }
            });
        }

        Ok(outcome)
    }

    /// Drive the countdown; forces the session over when time runs out.
    pub fn tick(&mut self) -> TickOutcome {
        match self.session.as_mut() {
            Some(session) => session.tick(),
            None => TickOutcome::Inactive,
        }
    }

    /// Explicit abandonment.
    pub fn end(&mut self) -> Result<(), SessionError> {
        self.session
            .as_mut()
            .ok_or(SessionError::NotActive)?
            .end()
    }

    /// Once the session has ended, compute its result, fold it into the
    /// user's stats, persist best-effort, and return to Idle.
    pub fn finalize(&mut self, stats: &mut crate::models::UserStats) -> Option<QuizResult> {
        let ended = self
            .session
            .as_ref()
            .is_some_and(|s| s.status() == SessionStatus::Ended);
        if !ended {
            return None;
        }

        let session = self.session.take()?;
        let result = session.finalize()?;
        stats.record_quiz(result.total_points, result.finished_at);

        if let Some(sink) = &self.sink {
            let sink = Arc::clone(sink);
            let session_id = session.id();
            let stats = stats.clone();
            let summary = crate::models::ResultSummary::from(&result);
            tokio::spawn(async move {
                if let Err(e) = sink.session_finished(session_id, &stats, &summary).await {
                    tracing::warn!("failed to persist quiz result: {}", e);
                }
            });
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionKind, UserStats};
    use crate::source::MemorySource;
    use std::time::Duration;

    fn question(text: &str, category: &str, difficulty: Difficulty) -> Question {
        Question {
            id: Uuid::new_v4(),
            text: text.to_string(),
            kind: QuestionKind::MultipleChoice,
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "a".to_string(),
            explanation: None,
            category: category.to_string(),
            difficulty,
            points: None,
        }
    }

    fn bank(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| question(&format!("q{}", i), "Science", Difficulty::Easy))
            .collect()
    }

    fn active_session(n: usize) -> QuizSession {
        let mut s = QuizSession::new("Science", None, n, bank(n));
        s.begin().unwrap();
        s
    }

    #[test]
    fn duplicates_are_dropped() {
        let mut questions = bank(3);
        questions.push(questions[0].clone());
        questions.push(questions[1].clone());

        let session = QuizSession::new("Science", None, 10, questions);
        assert_eq!(session.question_count(), 3);
    }

    #[test]
    fn requesting_more_than_available_yields_available() {
        let session = QuizSession::new("Science", None, 20, bank(4));
        assert_eq!(session.question_count(), 4);
        assert_eq!(session.time_budget_secs(), 4 * 30);
    }

    #[test]
    fn status_transitions_are_one_directional() {
        let mut session = QuizSession::new("Science", None, 2, bank(2));
        assert_eq!(session.status(), SessionStatus::NotStarted);
        assert!(session.submit_answer("a").is_err());
        assert!(session.end().is_err());

        session.begin().unwrap();
        assert!(session.begin().is_err());
        assert_eq!(session.status(), SessionStatus::Active);

        session.end().unwrap();
        assert_eq!(session.status(), SessionStatus::Ended);
        assert!(session.begin().is_err());
        assert!(session.submit_answer("a").is_err());
        assert!(session.end().is_err());
    }

    #[test]
    fn answering_every_question_ends_the_session() {
        let mut session = active_session(3);
        for i in 0..3 {
            assert_eq!(session.current_index(), i);
            let outcome = session.submit_answer("a").unwrap();
            assert_eq!(outcome.finished, i == 2);
        }
        assert_eq!(session.status(), SessionStatus::Ended);
        assert_eq!(session.answered_count(), 3);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn streak_resets_on_a_miss() {
        let mut session = active_session(4);
        session.submit_answer("a").unwrap();
        session.submit_answer("a").unwrap();
        assert_eq!(session.streak(), 2);

        session.submit_answer("b").unwrap();
        assert_eq!(session.streak(), 0);

        session.submit_answer("a").unwrap();
        assert_eq!(session.answered_count(), 4);
    }

    #[test]
    fn countdown_forces_the_session_over() {
        let mut session = active_session(1);
        assert_eq!(session.time_budget_secs(), 30);

        for i in 0..29 {
            assert_eq!(session.tick(), TickOutcome::Running(29 - i));
        }
        assert_eq!(session.tick(), TickOutcome::TimedOut);
        assert_eq!(session.status(), SessionStatus::Ended);
        assert_eq!(session.time_remaining_secs(), 0);

        // Ended sessions no longer tick.
        assert_eq!(session.tick(), TickOutcome::Inactive);
    }

    #[test]
    fn answer_wins_the_boundary_race() {
        let mut session = active_session(2);
        for _ in 0..59 {
            session.tick();
        }
        assert_eq!(session.time_remaining_secs(), 1);

        // Submitted in the same loop turn as the final tick: processed
        // first, so it lands.
        let outcome = session.submit_answer("a").unwrap();
        assert!(outcome.is_correct);

        assert_eq!(session.tick(), TickOutcome::TimedOut);
        assert!(session.submit_answer("a").is_err());
        assert_eq!(session.answered_count(), 1);
    }

    #[test]
    fn timeout_result_covers_only_answered_questions() {
        let mut session = active_session(3);
        session.submit_answer("a").unwrap();
        session.submit_answer("b").unwrap();
        for _ in 0..90 {
            session.tick();
        }
        assert_eq!(session.status(), SessionStatus::Ended);

        let result = session.finalize().unwrap();
        assert_eq!(result.answered_count, 2);
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.elapsed_secs, 90);
    }

    #[test]
    fn finalize_requires_an_ended_session() {
        let mut session = active_session(2);
        assert!(session.finalize().is_none());
        session.end().unwrap();
        assert!(session.finalize().is_some());
    }

    #[test]
    fn per_question_time_feeds_the_speed_bonus() {
        let mut session = active_session(2);
        // 3 seconds on an easy question, under the 10s threshold.
        for _ in 0..3 {
            session.tick();
        }
        let outcome = session.submit_answer("a").unwrap();
        assert_eq!(outcome.record.time_spent_secs, 3);
        assert!(outcome.record.bonuses.iter().any(|b| b.points > 0));
    }

    #[tokio::test]
    async fn manager_relaxes_filters_to_the_full_pool() {
        let source = Arc::new(MemorySource::with_questions(bank(5)));
        let mut manager = SessionManager::new(source, None, Uuid::new_v4());

        // Nothing matches hard History; the unfiltered pool still serves.
        let report = manager
            .start("History", Some(Difficulty::Hard), 3)
            .await
            .unwrap();
        assert_eq!(report.question_count, 3);
        assert!(!report.used_local_fallback);
        assert!(manager.is_active());
    }

    #[tokio::test]
    async fn manager_falls_back_to_the_builtin_bank() {
        let source = Arc::new(MemorySource::with_questions(Vec::new()));
        let mut manager = SessionManager::new(source, None, Uuid::new_v4());

        let report = manager.start("all", None, 5).await.unwrap();
        assert!(report.used_local_fallback);
        assert_eq!(report.question_count, 5);
    }

    #[tokio::test]
    async fn manager_rejects_a_second_start() {
        let source = Arc::new(MemorySource::with_questions(bank(3)));
        let mut manager = SessionManager::new(source, None, Uuid::new_v4());

        manager.start("all", None, 2).await.unwrap();
        assert!(matches!(
            manager.start("all", None, 2).await,
            Err(SessionError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn manager_mirrors_answers_and_persists_the_result() {
        let source = Arc::new(MemorySource::with_questions(bank(2)));
        let sink: Arc<MemorySource> = Arc::clone(&source);
        let mut manager =
            SessionManager::new(Arc::clone(&source) as _, Some(sink.clone() as _), Uuid::new_v4());

        manager.start("all", None, 2).await.unwrap();
        manager.submit_answer("a").unwrap();
        manager.submit_answer("b").unwrap();

        let mut stats = UserStats::new("ada");
        let result = manager.finalize(&mut stats).unwrap();
        assert_eq!(result.answered_count, 2);
        assert_eq!(stats.quizzes_completed, 1);
        assert!(manager.session().is_none());

        // Let the fire-and-forget mirror tasks run.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(sink.recorded_answer_count(), 2);
        assert_eq!(sink.finished_session_count(), 1);
    }
}
