use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use trivia_deck::app::App;
use trivia_deck::leaderboard::LeaderboardCache;
use trivia_deck::models::UserStats;
use trivia_deck::session::SessionManager;
use trivia_deck::source::{MemorySource, RemoteSource};
use trivia_deck::storage::LocalStore;
use trivia_deck::{QuizError, util};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file to load questions from; defaults to the built-in bank
    #[arg(short, long)]
    questions: Option<PathBuf>,

    /// WebSocket backend URL, e.g. ws://localhost:9090
    #[arg(short, long)]
    remote: Option<String>,

    /// Display name shown on the leaderboard
    #[arg(short, long, default_value = "player")]
    name: String,

    /// Animate the offline leaderboard with synthetic score changes
    #[arg(long)]
    demo: bool,

    /// Directory for local state and logs
    #[arg(long, default_value = ".trivia-deck")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(msg) = util::validate_username(&args.name) {
        eprintln!("invalid --name: {}", msg);
        std::process::exit(2);
    }

    // The guard flushes buffered log lines on drop.
    let _guard = init_tracing(&args.data_dir);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to a daily-rolling file; the terminal belongs to the UI.
fn init_tracing(data_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(data_dir.join("logs"), "trivia-deck.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

async fn run(args: Args) -> Result<(), QuizError> {
    let store = LocalStore::open(args.data_dir.join("state.json"));

    let mut stats = UserStats::new(args.name.trim());
    // Replay local history so the dashboard shows lifetime numbers.
    for row in store.history().iter().rev() {
        stats.record_quiz(row.total_points, row.finished_at);
    }

    let mut push_rx = None;
    let (manager, leaderboard) = match &args.remote {
        Some(url) => {
            tracing::info!("connecting to backend at {}", url);
            let remote = Arc::new(RemoteSource::connect(url).await?);

            match remote.subscribe_changes().await {
                Ok(rx) => push_rx = Some(rx),
                Err(e) => tracing::warn!("leaderboard subscription failed: {}", e),
            }

            (
                SessionManager::new(
                    Arc::clone(&remote) as _,
                    Some(Arc::clone(&remote) as _),
                    stats.user_id,
                ),
                LeaderboardCache::new(Some(remote as _)),
            )
        }
        None => {
            let source = match &args.questions {
                Some(path) => Arc::new(MemorySource::from_json(path)?),
                None => Arc::new(MemorySource::builtin()),
            };
            tracing::info!("running offline with {} questions", source.question_count());
            (
                SessionManager::new(
                    Arc::clone(&source) as _,
                    Some(Arc::clone(&source) as _),
                    stats.user_id,
                ),
                LeaderboardCache::new(None),
            )
        }
    };

    let mut app = App::new(stats, manager, leaderboard, store, args.demo);
    if let Some(rx) = push_rx {
        app.set_push_channel(rx);
    }

    trivia_deck::run(app).await
}
