//! Best-effort local persistence: theme, settings, and quiz history as a
//! single JSON document. Never authoritative; read and write failures are
//! logged and the defaults take over.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::ResultSummary;

/// Color scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

fn default_true() -> bool {
    true
}

/// User-facing toggles persisted across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            notifications: true,
            sound: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredState {
    #[serde(default)]
    settings: Settings,
    /// Appended in play order; read back most-recent-first.
    #[serde(default)]
    history: Vec<ResultSummary>,
}

/// Single-writer JSON store. Last write wins; no locking.
pub struct LocalStore {
    path: PathBuf,
    state: StoredState,
}

impl LocalStore {
    /// Open the store, falling back to defaults when the file is missing
    /// or unreadable.
    pub fn open(path: PathBuf) -> Self {
        let state = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!("corrupt state file {}, starting fresh: {}", path.display(), e);
                    StoredState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredState::default(),
            Err(e) => {
                tracing::warn!("cannot read {}: {}", path.display(), e);
                StoredState::default()
            }
        };
        Self { path, state }
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.state.settings.theme = theme;
        self.save();
    }

    pub fn set_notifications(&mut self, on: bool) {
        self.state.settings.notifications = on;
        self.save();
    }

    pub fn set_sound(&mut self, on: bool) {
        self.state.settings.sound = on;
        self.save();
    }

    /// Append a finished quiz to the history and persist.
    pub fn record_result(&mut self, summary: ResultSummary) {
        self.state.history.push(summary);
        self.save();
    }

    /// History rows, most recent first.
    pub fn history(&self) -> Vec<&ResultSummary> {
        self.state.history.iter().rev().collect()
    }

    pub fn history_len(&self) -> usize {
        self.state.history.len()
    }

    fn save(&self) {
        let json = match serde_json::to_string_pretty(&self.state) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("cannot encode local state: {}", e);
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!("cannot create {}: {}", parent.display(), e);
                return;
            }
        }
        if let Err(e) = fs::write(&self.path, json) {
            tracing::warn!("cannot write {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("trivia-store-{}", Uuid::new_v4()))
            .join("state.json")
    }

    fn summary(points: i64) -> ResultSummary {
        ResultSummary {
            category: "Science".to_string(),
            total_points: points,
            correct_count: 3,
            answered_count: 5,
            accuracy: 60.0,
            grade: "C".to_string(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn round_trips_settings_and_history() {
        let path = temp_path();

        let mut store = LocalStore::open(path.clone());
        store.set_theme(Theme::Light);
        store.record_result(summary(40));
        store.record_result(summary(90));

        let reopened = LocalStore::open(path.clone());
        assert_eq!(reopened.settings().theme, Theme::Light);
        assert!(reopened.settings().notifications);

        // Most recent first on read.
        let history = reopened.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].total_points, 90);
        assert_eq!(history[1].total_points, 40);

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn missing_file_yields_defaults() {
        let store = LocalStore::open(temp_path());
        assert_eq!(store.settings().theme, Theme::Dark);
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let store = LocalStore::open(path.clone());
        assert_eq!(store.history_len(), 0);
        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
