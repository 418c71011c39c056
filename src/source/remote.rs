//! Remote backend adapter: JSON frames over WebSocket.
//!
//! Reads are correlated by request id and time-limited; write-like frames
//! are fire-and-forget. Pushed leaderboard changes are forwarded to a
//! channel the app drains from its event loop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use crate::models::{AnswerRecord, LeaderboardEntry, Question, RankContext, ResultSummary, UserStats};
use crate::protocol::{ClientFrame, ServerFrame};

use super::{ProgressSink, QuestionFilter, QuestionSource, RankingSource, SourceError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

type Pending = Arc<Mutex<HashMap<Uuid, oneshot::Sender<ServerFrame>>>>;
type PushSender = Arc<Mutex<Option<mpsc::UnboundedSender<Vec<LeaderboardEntry>>>>>;

/// WebSocket adapter for the hosted backend.
pub struct RemoteSource {
    tx: mpsc::UnboundedSender<ClientFrame>,
    pending: Pending,
    push_tx: PushSender,
}

impl RemoteSource {
    /// Connect and spawn the send/receive pumps.
    pub async fn connect(url: &str) -> Result<Self, SourceError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<ClientFrame>();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let push_tx: PushSender = Arc::new(Mutex::new(None));

        // Outgoing pump: serialize frames onto the socket.
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("failed to encode frame: {}", e);
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        });

        // Incoming pump: route responses to waiters, pushes to the app.
        let pending_clone = Arc::clone(&pending);
        let push_clone = Arc::clone(&push_tx);
        tokio::spawn(async move {
            while let Some(msg) = ws_receiver.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text.to_string(),
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        tracing::warn!("websocket error: {}", e);
                        break;
                    }
                    _ => continue,
                };

                let frame: ServerFrame = match serde_json::from_str(&text) {
                    Ok(f) => f,
                    Err(e) => {
                        tracing::warn!("dropping unparseable frame: {}", e);
                        continue;
                    }
                };

                route_frame(frame, &pending_clone, &push_clone);
            }
            // Socket gone: wake every waiter with Unavailable by dropping
            // their senders.
            if let Ok(mut pending) = pending_clone.lock() {
                pending.clear();
            }
        });

        Ok(Self {
            tx,
            pending,
            push_tx,
        })
    }

    /// Register for pushed leaderboard changes. The returned receiver gets
    /// a ranked snapshot whenever the backend reports a profile change.
    pub async fn subscribe_changes(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<Vec<LeaderboardEntry>>, SourceError> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut push) = self.push_tx.lock() {
            *push = Some(tx);
        }
        let request_id = Uuid::new_v4();
        self.request(request_id, ClientFrame::Subscribe { request_id })
            .await?;
        Ok(rx)
    }

    fn send(&self, frame: ClientFrame) -> Result<(), SourceError> {
        self.tx.send(frame).map_err(|_| SourceError::Unavailable)
    }

    async fn request(
        &self,
        request_id: Uuid,
        frame: ClientFrame,
    ) -> Result<ServerFrame, SourceError> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(request_id, tx);
        }
        self.send(frame)?;

        let response = match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(_)) => return Err(SourceError::Unavailable),
            Err(_) => {
                if let Ok(mut pending) = self.pending.lock() {
                    pending.remove(&request_id);
                }
                return Err(SourceError::Timeout);
            }
        };

        match response {
            ServerFrame::Error { code, message, .. } => {
                Err(SourceError::Rejected { code, message })
            }
            other => Ok(other),
        }
    }
}

fn route_frame(frame: ServerFrame, pending: &Pending, push: &PushSender) {
    let request_id = match &frame {
        ServerFrame::Questions { request_id, .. }
        | ServerFrame::TopUsers { request_id, .. }
        | ServerFrame::UserRank { request_id, .. }
        | ServerFrame::Ack { request_id } => Some(*request_id),
        ServerFrame::Error { request_id, .. } => *request_id,
        ServerFrame::LeaderboardChanged { entries } => {
            if let Ok(push) = push.lock() {
                if let Some(tx) = push.as_ref() {
                    let _ = tx.send(entries.clone());
                }
            }
            None
        }
    };

    if let Some(id) = request_id {
        let waiter = pending.lock().ok().and_then(|mut p| p.remove(&id));
        match waiter {
            Some(tx) => {
                let _ = tx.send(frame);
            }
            None => tracing::debug!("response for unknown request {}", id),
        }
    }
}

#[async_trait]
impl QuestionSource for RemoteSource {
    async fn fetch_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, SourceError> {
        let request_id = Uuid::new_v4();
        let frame = ClientFrame::FetchQuestions {
            request_id,
            category: filter.category.clone(),
            difficulty: filter.difficulty.map(|d| d.label().to_string()),
            limit: filter.limit,
        };
        match self.request(request_id, frame).await? {
            ServerFrame::Questions { questions, .. } => Ok(questions),
            other => Err(SourceError::Transport(format!(
                "unexpected frame: {:?}",
                other
            ))),
        }
    }
}

#[async_trait]
impl RankingSource for RemoteSource {
    async fn top_users(
        &self,
        limit: usize,
        category: Option<&str>,
    ) -> Result<Vec<LeaderboardEntry>, SourceError> {
        let request_id = Uuid::new_v4();
        let frame = ClientFrame::FetchTopUsers {
            request_id,
            limit,
            category: category.map(|c| c.to_string()),
        };
        match self.request(request_id, frame).await? {
            ServerFrame::TopUsers { entries, .. } => Ok(entries),
            other => Err(SourceError::Transport(format!(
                "unexpected frame: {:?}",
                other
            ))),
        }
    }

    async fn user_rank(
        &self,
        user_id: Uuid,
        category: Option<&str>,
    ) -> Result<Option<RankContext>, SourceError> {
        let request_id = Uuid::new_v4();
        let frame = ClientFrame::FetchUserRank {
            request_id,
            user_id,
            category: category.map(|c| c.to_string()),
        };
        match self.request(request_id, frame).await? {
            ServerFrame::UserRank { context, .. } => Ok(context),
            other => Err(SourceError::Transport(format!(
                "unexpected frame: {:?}",
                other
            ))),
        }
    }
}

#[async_trait]
impl ProgressSink for RemoteSource {
    async fn session_started(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        category: &str,
        question_count: usize,
    ) -> Result<(), SourceError> {
        self.send(ClientFrame::SessionStarted {
            session_id,
            user_id,
            category: category.to_string(),
            question_count,
        })
    }

    async fn answer_recorded(
        &self,
        session_id: Uuid,
        record: &AnswerRecord,
    ) -> Result<(), SourceError> {
        self.send(ClientFrame::AnswerRecorded {
            session_id,
            record: record.clone(),
        })
    }

    async fn session_finished(
        &self,
        session_id: Uuid,
        stats: &UserStats,
        summary: &ResultSummary,
    ) -> Result<(), SourceError> {
        self.send(ClientFrame::SessionFinished {
            session_id,
            stats: stats.clone(),
            summary: summary.clone(),
        })
    }
}
