//! Static quiz configuration: categories, point tables, and timing constants.

use std::time::Duration;

/// Categories offered in the setup screen. "all" disables the filter.
pub const CATEGORIES: &[&str] = &[
    "all",
    "Science",
    "History",
    "Geography",
    "Sports",
    "Entertainment",
];

/// Base points awarded for a correct easy answer.
pub const EASY_POINTS: i64 = 10;
/// Base points awarded for a correct medium answer.
pub const MEDIUM_POINTS: i64 = 20;
/// Base points awarded for a correct hard answer.
pub const HARD_POINTS: i64 = 30;

/// Streak multiplier applied once the streak bonus kicks in.
pub const STREAK_MULTIPLIER: f64 = 1.5;
/// Prior consecutive correct answers required for the streak bonus.
pub const STREAK_THRESHOLD: u32 = 2;

/// Fraction of base points the speed bonus scales up to, as an exact
/// numerator/denominator pair (30%).
pub const SPEED_BONUS_RATIO: (i64, i64) = (3, 10);
/// Extra fraction of base points for answering a hard question correctly.
pub const HARD_MASTERY_FACTOR: f64 = 0.2;
/// Fraction of base points for the caller-flagged perfect-accuracy bonus.
pub const PERFECT_ANSWER_FACTOR: f64 = 0.5;

/// Fraction of base points deducted for an incorrect answer.
pub const PENALTY_FACTOR: f64 = 0.1;
/// Seconds after which an incorrect answer also takes the slow penalty.
pub const SLOW_ANSWER_SECS: u64 = 60;

/// Seconds budgeted per question when a session starts.
pub const SECS_PER_QUESTION: u64 = 30;

/// How long a leaderboard snapshot stays fresh per (category, limit) key.
pub const LEADERBOARD_TTL: Duration = Duration::from_secs(120);
/// Entries fetched for the leaderboard screen.
pub const LEADERBOARD_LIMIT: usize = 10;
/// Neighbor rows shown on each side of the viewer's rank.
pub const RANK_WINDOW: usize = 2;

/// How long a toast stays on screen before it expires.
pub const TOAST_LIFETIME: Duration = Duration::from_secs(4);

/// Quiet period after typing before a form field validates itself.
pub const VALIDATION_DEBOUNCE: Duration = Duration::from_millis(500);

/// Interval between synthetic score deltas when the demo poller is on.
pub const DEMO_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Backoff schedule for retried reads: 1s, 2s, 4s.
pub const RETRY_DELAYS: &[Duration] = &[
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];
