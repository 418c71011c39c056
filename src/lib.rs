//! # trivia-deck
//!
//! A terminal trivia game: timed quiz sessions with streak and speed
//! scoring, a ranked leaderboard, and an optional WebSocket backend for
//! shared questions and rankings. Without a backend everything runs from
//! the built-in question bank and an in-memory leaderboard.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use trivia_deck::app::App;
//! use trivia_deck::leaderboard::LeaderboardCache;
//! use trivia_deck::models::UserStats;
//! use trivia_deck::session::SessionManager;
//! use trivia_deck::source::MemorySource;
//! use trivia_deck::storage::LocalStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), trivia_deck::QuizError> {
//!     let stats = UserStats::new("player");
//!     let source = Arc::new(MemorySource::builtin());
//!     let manager = SessionManager::new(source, None, stats.user_id);
//!     let store = LocalStore::open("state.json".into());
//!     let app = App::new(stats, manager, LeaderboardCache::new(None), store, false);
//!     trivia_deck::run(app).await
//! }
//! ```

pub mod app;
pub mod config;
pub mod leaderboard;
pub mod models;
pub mod notify;
pub mod protocol;
pub mod scoring;
pub mod session;
pub mod source;
pub mod storage;
pub mod terminal;
mod ui;
pub mod util;

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};

use crate::app::App;
use crate::source::{LoadError, SourceError};

/// How long one event-loop pass waits for input before redrawing.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Top-level error for running the game.
#[derive(Debug)]
pub enum QuizError {
    /// Terminal or filesystem IO failed.
    Io(io::Error),
    /// The question file could not be loaded.
    Load(LoadError),
    /// The backend connection could not be established.
    Source(SourceError),
}

impl std::fmt::Display for QuizError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizError::Io(e) => write!(f, "IO error: {}", e),
            QuizError::Load(e) => write!(f, "failed to load questions: {}", e),
            QuizError::Source(e) => write!(f, "backend connection failed: {}", e),
        }
    }
}

impl std::error::Error for QuizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QuizError::Io(e) => Some(e),
            QuizError::Load(e) => Some(e),
            QuizError::Source(e) => Some(e),
        }
    }
}

impl From<io::Error> for QuizError {
    fn from(err: io::Error) -> Self {
        QuizError::Io(err)
    }
}

impl From<LoadError> for QuizError {
    fn from(err: LoadError) -> Self {
        QuizError::Load(err)
    }
}

impl From<SourceError> for QuizError {
    fn from(err: SourceError) -> Self {
        QuizError::Source(err)
    }
}

/// Take over the terminal and run the game until the user quits.
pub async fn run(mut app: App) -> Result<(), QuizError> {
    let (mut term, _guard) = terminal::init()?;
    run_event_loop(&mut term, &mut app).await
}

async fn run_event_loop(
    terminal: &mut terminal::AppTerminal,
    app: &mut App,
) -> Result<(), QuizError> {
    loop {
        app.on_loop();
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key.code).await {
                    break;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
