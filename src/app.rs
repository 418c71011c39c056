//! Application state: screen stack, input handling, and the per-second
//! tick that drives the countdown, toast expiry, and leaderboard pushes.
//!
//! All mutation happens here, on the event loop. The `ui` module only
//! reads this state.

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tokio::sync::mpsc;

use crate::config;
use crate::leaderboard::LeaderboardCache;
use crate::models::{Difficulty, LeaderboardEntry, QuizResult, RankContext, ResultSummary, UserStats};
use crate::notify::Notifications;
use crate::session::{SessionError, SessionManager, TickOutcome};
use crate::storage::LocalStore;
use crate::util;

/// Difficulty choices on the setup screen; `None` means any.
pub const DIFFICULTY_CHOICES: [Option<Difficulty>; 4] = [
    None,
    Some(Difficulty::Easy),
    Some(Difficulty::Medium),
    Some(Difficulty::Hard),
];

/// Question-count choices on the setup screen.
pub const COUNT_CHOICES: [usize; 4] = [5, 10, 15, 20];

/// Quiz setup form state.
pub struct SetupForm {
    pub category_idx: usize,
    pub difficulty_idx: usize,
    pub count_idx: usize,
    /// 0 = category, 1 = difficulty, 2 = count.
    pub row: usize,
}

impl Default for SetupForm {
    fn default() -> Self {
        Self {
            category_idx: 0,
            difficulty_idx: 0,
            count_idx: 1,
            row: 0,
        }
    }
}

impl SetupForm {
    pub fn category(&self) -> &'static str {
        config::CATEGORIES[self.category_idx]
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        DIFFICULTY_CHOICES[self.difficulty_idx]
    }

    pub fn count(&self) -> usize {
        COUNT_CHOICES[self.count_idx]
    }

    fn cycle(&mut self, forward: bool) {
        let (idx, len) = match self.row {
            0 => (&mut self.category_idx, config::CATEGORIES.len()),
            1 => (&mut self.difficulty_idx, DIFFICULTY_CHOICES.len()),
            _ => (&mut self.count_idx, COUNT_CHOICES.len()),
        };
        *idx = if forward {
            (*idx + 1) % len
        } else {
            (*idx + len - 1) % len
        };
    }
}

/// Profile form state: display-name edit plus settings toggles.
pub struct ProfileForm {
    pub name_input: String,
    pub name_error: Option<String>,
    /// 0 = name, 1 = notifications, 2 = sound, 3 = theme.
    pub row: usize,
    /// Re-validates the name once typing goes quiet.
    validation: util::Debouncer,
}

impl ProfileForm {
    fn new(current_name: &str) -> Self {
        Self {
            name_input: current_name.to_string(),
            name_error: None,
            row: 0,
            validation: util::Debouncer::new(config::VALIDATION_DEBOUNCE),
        }
    }
}

/// Shown after each answer before moving on.
pub struct Reveal {
    pub is_correct: bool,
    pub points: i64,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub finished: bool,
}

/// Which screen the user is on.
pub enum Screen {
    Dashboard,
    Setup(SetupForm),
    Quiz,
    Results(QuizResult),
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
        viewer: Option<RankContext>,
    },
    Profile(ProfileForm),
}

/// Top-level application state.
pub struct App {
    pub stats: UserStats,
    pub manager: SessionManager,
    pub leaderboard: LeaderboardCache,
    pub store: LocalStore,
    pub toasts: Notifications,
    pub screen: Screen,
    /// Highlighted option on the quiz screen.
    pub selected_option: usize,
    pub reveal: Option<Reveal>,
    pub should_quit: bool,
    demo: bool,
    demo_throttle: util::Throttle,
    push_rx: Option<mpsc::UnboundedReceiver<Vec<LeaderboardEntry>>>,
    last_tick: Instant,
}

impl App {
    pub fn new(
        stats: UserStats,
        manager: SessionManager,
        mut leaderboard: LeaderboardCache,
        store: LocalStore,
        demo: bool,
    ) -> Self {
        leaderboard.ensure_user(stats.user_id, &stats.username);
        let mut toasts = Notifications::new();
        toasts.set_enabled(store.settings().notifications);

        Self {
            stats,
            manager,
            leaderboard,
            store,
            toasts,
            screen: Screen::Dashboard,
            selected_option: 0,
            reveal: None,
            should_quit: false,
            demo,
            demo_throttle: util::Throttle::new(config::DEMO_POLL_INTERVAL),
            push_rx: None,
            last_tick: Instant::now(),
        }
    }

    /// Attach the channel that receives pushed leaderboard snapshots.
    pub fn set_push_channel(&mut self, rx: mpsc::UnboundedReceiver<Vec<LeaderboardEntry>>) {
        self.push_rx = Some(rx);
    }

    /// Called every pass of the event loop; runs the one-second work as
    /// often as wall-clock time says it is due.
    pub fn on_loop(&mut self) {
        while self.last_tick.elapsed() >= Duration::from_secs(1) {
            self.last_tick += Duration::from_secs(1);
            self.tick_once();
        }
        self.drain_pushes();

        // Live field validation once typing goes quiet.
        if let Screen::Profile(form) = &mut self.screen {
            if form.validation.ready() {
                form.name_error = util::validate_username(&form.name_input)
                    .err()
                    .map(|m| m.to_string());
            }
        }
    }

    fn tick_once(&mut self) {
        if self.manager.tick() == TickOutcome::TimedOut {
            self.toasts.warning("Time's up", "The quiz ended automatically");
            self.finalize_session();
        }
        self.toasts.sweep();

        if self.demo && self.demo_throttle.allow() {
            self.leaderboard.demo_tick(&mut rand::thread_rng());
        }
    }

    fn drain_pushes(&mut self) {
        let mut latest = None;
        if let Some(rx) = self.push_rx.as_mut() {
            while let Ok(entries) = rx.try_recv() {
                latest = Some(entries);
            }
        }
        if let Some(entries) = latest {
            self.leaderboard.apply_remote_snapshot(entries.clone());
            if let Screen::Leaderboard {
                entries: shown, ..
            } = &mut self.screen
            {
                *shown = entries;
            }
        }
    }

    /// Route a key press. Returns true when the app should exit.
    pub async fn handle_key(&mut self, key: KeyCode) -> bool {
        // Toast dismissal works everywhere.
        if key == KeyCode::Char('x') && !self.toasts.is_empty() {
            self.toasts.dismiss();
            return false;
        }

        match &mut self.screen {
            Screen::Dashboard => match key {
                KeyCode::Char('n') => self.screen = Screen::Setup(SetupForm::default()),
                KeyCode::Char('l') => self.open_leaderboard().await,
                KeyCode::Char('p') => {
                    self.screen = Screen::Profile(ProfileForm::new(&self.stats.username));
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                    return true;
                }
                _ => {}
            },
            Screen::Setup(form) => match key {
                KeyCode::Up | KeyCode::Char('k') => form.row = form.row.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => form.row = (form.row + 1).min(2),
                KeyCode::Left | KeyCode::Char('h') => form.cycle(false),
                KeyCode::Right | KeyCode::Char('l') => form.cycle(true),
                KeyCode::Enter => {
                    let (category, difficulty, count) =
                        (form.category(), form.difficulty(), form.count());
                    self.start_quiz(category, difficulty, count).await;
                }
                KeyCode::Esc => self.screen = Screen::Dashboard,
                _ => {}
            },
            Screen::Quiz => return self.handle_quiz_key(key),
            Screen::Results(_) => match key {
                KeyCode::Enter | KeyCode::Esc => self.screen = Screen::Dashboard,
                KeyCode::Char('r') => self.screen = Screen::Setup(SetupForm::default()),
                KeyCode::Char('l') => self.open_leaderboard().await,
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return true;
                }
                _ => {}
            },
            Screen::Leaderboard { .. } => match key {
                KeyCode::Enter | KeyCode::Esc => self.screen = Screen::Dashboard,
                KeyCode::Char('r') => self.open_leaderboard().await,
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return true;
                }
                _ => {}
            },
            Screen::Profile(_) => self.handle_profile_key(key),
        }
        false
    }

    fn handle_quiz_key(&mut self, key: KeyCode) -> bool {
        if self.reveal.is_some() {
            if matches!(key, KeyCode::Enter | KeyCode::Char(' ')) {
                let finished = self.reveal.as_ref().is_some_and(|r| r.finished);
                self.reveal = None;
                self.selected_option = 0;
                if finished {
                    self.finalize_session();
                }
            }
            return false;
        }

        let option_count = self
            .manager
            .session()
            .and_then(|s| s.current_question())
            .map(|q| q.options.len())
            .unwrap_or(0);

        match key {
            KeyCode::Up | KeyCode::Char('k') if option_count > 0 => {
                self.selected_option = (self.selected_option + option_count - 1) % option_count;
            }
            KeyCode::Down | KeyCode::Char('j') if option_count > 0 => {
                self.selected_option = (self.selected_option + 1) % option_count;
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.submit_selected(),
            KeyCode::Esc => {
                // Abandon: whatever was answered still counts.
                if self.manager.end().is_ok() {
                    self.toasts.info("Quiz abandoned", "Scoring what you answered");
                    self.finalize_session();
                }
            }
            _ => {}
        }
        false
    }

    fn handle_profile_key(&mut self, key: KeyCode) {
        let Screen::Profile(form) = &mut self.screen else {
            return;
        };

        match key {
            KeyCode::Up => form.row = form.row.saturating_sub(1),
            KeyCode::Down => form.row = (form.row + 1).min(3),
            KeyCode::Char(c) if form.row == 0 => {
                form.name_error = None;
                if form.name_input.len() < util::USERNAME_MAX_LENGTH {
                    form.name_input.push(c);
                }
                form.validation.fire();
            }
            KeyCode::Backspace if form.row == 0 => {
                form.name_error = None;
                form.name_input.pop();
                form.validation.fire();
            }
            KeyCode::Enter => match form.row {
                0 => {
                    let name = form.name_input.trim().to_string();
                    match util::validate_username(&name) {
                        Ok(()) => {
                            self.stats.username = name.clone();
                            self.leaderboard.ensure_user(self.stats.user_id, &name);
                            self.toasts.success("Profile saved", "Display name updated");
                        }
                        Err(msg) => form.name_error = Some(msg.to_string()),
                    }
                }
                1 => {
                    let on = !self.store.settings().notifications;
                    self.store.set_notifications(on);
                    self.toasts.set_enabled(on);
                    if on {
                        self.toasts.success("Notifications on", "");
                    }
                }
                2 => {
                    let on = !self.store.settings().sound;
                    self.store.set_sound(on);
                }
                3 => {
                    let theme = self.store.settings().theme.toggled();
                    self.store.set_theme(theme);
                }
                _ => {}
            },
            KeyCode::Esc => self.screen = Screen::Dashboard,
            _ => {}
        }
    }

    async fn start_quiz(&mut self, category: &str, difficulty: Option<Difficulty>, count: usize) {
        match self.manager.start(category, difficulty, count).await {
            Ok(report) => {
                self.selected_option = 0;
                self.reveal = None;
                self.last_tick = Instant::now();
                self.screen = Screen::Quiz;
                if report.used_local_fallback {
                    self.toasts
                        .warning("Offline questions", "Playing from the built-in bank");
                }
            }
            Err(SessionError::NoQuestions) => {
                self.toasts
                    .error("Cannot start", "No questions match that selection");
            }
            Err(SessionError::Source(e)) => {
                self.toasts.error("Cannot start", e.user_message());
            }
            Err(e) => {
                tracing::error!("start rejected: {}", e);
                self.toasts.error("Cannot start", "A quiz is already running");
            }
        }
    }

    fn submit_selected(&mut self) {
        let Some(selected) = self
            .manager
            .session()
            .and_then(|s| s.current_question())
            .and_then(|q| q.options.get(self.selected_option))
            .cloned()
        else {
            return;
        };

        match self.manager.submit_answer(&selected) {
            Ok(outcome) => {
                self.reveal = Some(Reveal {
                    is_correct: outcome.is_correct,
                    points: outcome.points,
                    correct_answer: outcome.correct_answer,
                    explanation: outcome.explanation,
                    finished: outcome.finished,
                });
            }
            Err(e) => tracing::warn!("answer rejected: {}", e),
        }
    }

    /// The session ended (last answer, timeout, or abandonment): compute
    /// the result, dual-write it, feed the leaderboard, show the screen.
    fn finalize_session(&mut self) {
        let Some(result) = self.manager.finalize(&mut self.stats) else {
            return;
        };

        self.store.record_result(ResultSummary::from(&result));
        self.leaderboard.update_user_score(
            self.stats.user_id,
            &self.stats.username,
            result.total_points,
        );
        self.toasts.success(
            "Quiz complete",
            format!("{} points, grade {}", result.total_points, result.grade.letter),
        );
        self.reveal = None;
        self.screen = Screen::Results(result);
    }

    async fn open_leaderboard(&mut self) {
        let entries = self
            .leaderboard
            .top_users(config::LEADERBOARD_LIMIT, None)
            .await;
        let viewer = self.leaderboard.user_rank(self.stats.user_id, None).await;
        self.screen = Screen::Leaderboard { entries, viewer };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use std::sync::Arc;
    use uuid::Uuid;

    fn temp_store() -> LocalStore {
        LocalStore::open(
            std::env::temp_dir()
                .join(format!("trivia-app-{}", Uuid::new_v4()))
                .join("state.json"),
        )
    }

    fn test_app() -> App {
        let stats = UserStats::new("tester");
        let source = Arc::new(MemorySource::builtin());
        let manager = SessionManager::new(source, None, stats.user_id);
        App::new(
            stats,
            manager,
            LeaderboardCache::new(None),
            temp_store(),
            false,
        )
    }

    #[tokio::test]
    async fn full_quiz_flow_lands_on_results() {
        let mut app = test_app();
        app.screen = Screen::Setup(SetupForm::default());
        app.handle_key(KeyCode::Enter).await;
        assert!(matches!(app.screen, Screen::Quiz));
        assert!(app.manager.is_active());

        let total = app.manager.session().unwrap().question_count();
        for _ in 0..total {
            app.handle_key(KeyCode::Enter).await; // submit highlighted option
            assert!(app.reveal.is_some());
            app.handle_key(KeyCode::Enter).await; // continue
        }

        assert!(matches!(app.screen, Screen::Results(_)));
        assert_eq!(app.stats.quizzes_completed, 1);
        assert_eq!(app.store.history_len(), 1);
    }

    #[tokio::test]
    async fn abandoning_scores_partial_answers() {
        let mut app = test_app();
        app.screen = Screen::Setup(SetupForm::default());
        app.handle_key(KeyCode::Enter).await;

        app.handle_key(KeyCode::Enter).await;
        app.handle_key(KeyCode::Enter).await;
        app.handle_key(KeyCode::Esc).await;

        let Screen::Results(result) = &app.screen else {
            panic!("expected results screen");
        };
        assert_eq!(result.answered_count, 1);
    }

    #[tokio::test]
    async fn viewer_appears_on_the_fallback_leaderboard() {
        let mut app = test_app();
        let id = app.stats.user_id;
        assert!(
            app.leaderboard
                .fallback_entries()
                .iter()
                .any(|e| e.user_id == id)
        );
    }

    #[tokio::test]
    async fn profile_rejects_short_names() {
        let mut app = test_app();
        app.screen = Screen::Profile(ProfileForm::new("tester"));
        let Screen::Profile(form) = &mut app.screen else {
            unreachable!()
        };
        form.name_input = "ab".to_string();

        app.handle_key(KeyCode::Enter).await;
        let Screen::Profile(form) = &app.screen else {
            panic!("left profile screen");
        };
        assert!(form.name_error.is_some());
        assert_eq!(app.stats.username, "tester");
    }

    #[tokio::test]
    async fn name_field_validates_after_a_typing_pause() {
        let mut app = test_app();
        let mut form = ProfileForm::new("tester");
        form.validation = util::Debouncer::new(Duration::ZERO);
        form.name_input = "abc".to_string();
        app.screen = Screen::Profile(form);

        // Deleting down to two characters flags the field without Enter.
        app.handle_key(KeyCode::Backspace).await;
        app.on_loop();

        let Screen::Profile(form) = &app.screen else {
            panic!("left profile screen");
        };
        assert_eq!(form.name_input, "ab");
        assert!(form.name_error.is_some());
    }

    #[tokio::test]
    async fn results_screen_returns_to_dashboard() {
        let mut app = test_app();
        app.screen = Screen::Setup(SetupForm::default());
        app.handle_key(KeyCode::Enter).await;
        app.handle_key(KeyCode::Esc).await; // abandon straight away
        assert!(matches!(app.screen, Screen::Results(_)));

        app.handle_key(KeyCode::Enter).await;
        assert!(matches!(app.screen, Screen::Dashboard));
    }
}
