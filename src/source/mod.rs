//! Capability traits for the external backend, with two implementations:
//! an in-memory adapter and a WebSocket remote adapter, selected at
//! startup.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config;
use crate::models::{
    AnswerRecord, Difficulty, LeaderboardEntry, Question, RankContext, ResultSummary, UserStats,
};

mod memory;
mod remote;

pub use memory::{LoadError, MemorySource, fallback_questions};
pub use remote::RemoteSource;

/// Failure surfaced by a source adapter.
#[derive(Debug)]
pub enum SourceError {
    /// No backend is configured or the connection is gone.
    Unavailable,
    /// The transport failed mid-request.
    Transport(String),
    /// The backend answered but refused the request.
    Rejected { code: String, message: String },
    /// A read timed out waiting for the response frame.
    Timeout,
    /// The bank has nothing matching the filter, even unfiltered.
    NoQuestions,
}

impl SourceError {
    /// Transient failures are worth retrying for idempotent reads.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transport(_) | SourceError::Timeout)
    }

    /// Fixed user-facing message table. Backend text is never echoed for
    /// auth-shaped rejections so a probe can't learn which part of the
    /// credentials was wrong.
    pub fn user_message(&self) -> &'static str {
        match self {
            SourceError::Unavailable => "The server is unavailable right now",
            SourceError::Transport(_) => "Connection trouble, please try again",
            SourceError::Timeout => "The server took too long to respond",
            SourceError::NoQuestions => "No questions match that selection",
            SourceError::Rejected { code, .. } => match code.as_str() {
                "auth" | "invalid_credentials" | "unauthorized" => {
                    "Invalid email or password"
                }
                "rate_limited" => "Too many requests, slow down a little",
                _ => "The server rejected the request",
            },
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Unavailable => write!(f, "source unavailable"),
            SourceError::Transport(e) => write!(f, "transport error: {}", e),
            SourceError::Rejected { code, message } => {
                write!(f, "rejected ({}): {}", code, message)
            }
            SourceError::Timeout => write!(f, "request timed out"),
            SourceError::NoQuestions => write!(f, "no questions available"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Filter for a question read. `limit` of 0 means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub limit: usize,
}

impl QuestionFilter {
    pub fn matches(&self, q: &Question) -> bool {
        if let Some(cat) = &self.category {
            if !q.category.eq_ignore_ascii_case(cat) {
                return false;
            }
        }
        if let Some(diff) = self.difficulty {
            if q.difficulty != diff {
                return false;
            }
        }
        true
    }
}

/// Filtered, limited reads from the question bank.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, SourceError>;
}

/// Ranked reads over cumulative user points.
#[async_trait]
pub trait RankingSource: Send + Sync {
    async fn top_users(
        &self,
        limit: usize,
        category: Option<&str>,
    ) -> Result<Vec<LeaderboardEntry>, SourceError>;

    async fn user_rank(
        &self,
        user_id: Uuid,
        category: Option<&str>,
    ) -> Result<Option<RankContext>, SourceError>;
}

/// Best-effort session-progress writes. Callers fire these and log
/// failures; they never block the quiz flow.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn session_started(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        category: &str,
        question_count: usize,
    ) -> Result<(), SourceError>;

    async fn answer_recorded(
        &self,
        session_id: Uuid,
        record: &AnswerRecord,
    ) -> Result<(), SourceError>;

    async fn session_finished(
        &self,
        session_id: Uuid,
        stats: &UserStats,
        summary: &ResultSummary,
    ) -> Result<(), SourceError>;
}

/// Retry a read with the fixed backoff schedule (1s, 2s, 4s). Only
/// transient failures are retried; writes never go through here.
pub async fn with_backoff<T, F, Fut>(op_name: &str, mut op: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < config::RETRY_DELAYS.len() => {
                let delay = config::RETRY_DELAYS[attempt];
                attempt += 1;
                tracing::warn!(
                    "{} failed ({}), retry {} in {:?}",
                    op_name,
                    e,
                    attempt,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn rejection_messages_never_echo_backend_text() {
        let err = SourceError::Rejected {
            code: "auth".to_string(),
            message: "user alice exists but password mismatched".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid email or password");
        assert!(!err.user_message().contains("alice"));
    }

    #[test]
    fn only_transport_and_timeout_are_transient() {
        assert!(SourceError::Timeout.is_transient());
        assert!(SourceError::Transport("reset".into()).is_transient());
        assert!(!SourceError::Unavailable.is_transient());
        assert!(!SourceError::NoQuestions.is_transient());
        assert!(
            !SourceError::Rejected {
                code: "auth".into(),
                message: String::new()
            }
            .is_transient()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_retries_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_backoff("test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(SourceError::Timeout)
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn backoff_gives_up_on_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_backoff("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::NoQuestions)
        })
        .await;
        assert!(matches!(result, Err(SourceError::NoQuestions)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
