//! Frames exchanged with the hosted backend.
//!
//! Reads carry a `request_id` so responses can be correlated; write-like
//! frames are fire-and-forget and only ever produce an `Ack` or `Error`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AnswerRecord, LeaderboardEntry, Question, RankContext, ResultSummary, UserStats};

/// Frames sent from this client to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Filtered, limited question read.
    FetchQuestions {
        request_id: Uuid,
        category: Option<String>,
        difficulty: Option<String>,
        limit: usize,
    },

    /// Ranked top-N read, global or per-category.
    FetchTopUsers {
        request_id: Uuid,
        limit: usize,
        category: Option<String>,
    },

    /// Single-user rank lookup with a neighbor window.
    FetchUserRank {
        request_id: Uuid,
        user_id: Uuid,
        category: Option<String>,
    },

    /// Session-created write.
    SessionStarted {
        session_id: Uuid,
        user_id: Uuid,
        category: String,
        question_count: usize,
    },

    /// Per-answer append, mirrored best-effort.
    AnswerRecorded {
        session_id: Uuid,
        record: AnswerRecord,
    },

    /// Completion write plus the profile-stats upsert.
    SessionFinished {
        session_id: Uuid,
        stats: UserStats,
        summary: ResultSummary,
    },

    /// Subscribe to pushed leaderboard changes.
    Subscribe { request_id: Uuid },
}

/// Frames sent from the backend to this client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    Questions {
        request_id: Uuid,
        questions: Vec<Question>,
    },

    TopUsers {
        request_id: Uuid,
        entries: Vec<LeaderboardEntry>,
    },

    UserRank {
        request_id: Uuid,
        context: Option<RankContext>,
    },

    /// Acknowledges a write-like frame.
    Ack { request_id: Uuid },

    /// Request rejected; `code` selects the user-facing message table entry.
    Error {
        request_id: Option<Uuid>,
        code: String,
        message: String,
    },

    /// Pushed whenever the backend's profile table changes.
    LeaderboardChanged { entries: Vec<LeaderboardEntry> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_tagged_by_type() {
        let msg = ClientFrame::FetchQuestions {
            request_id: Uuid::new_v4(),
            category: Some("Science".to_string()),
            difficulty: None,
            limit: 10,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"FetchQuestions\""));

        let msg = ServerFrame::Ack {
            request_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"Ack\""));
    }

    #[test]
    fn server_frames_round_trip() {
        let frame = ServerFrame::LeaderboardChanged {
            entries: vec![LeaderboardEntry::new(Uuid::new_v4(), "ada")],
        };
        let json = serde_json::to_string(&frame).unwrap();
        let parsed: ServerFrame = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerFrame::LeaderboardChanged { entries } => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].username, "ada");
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}
