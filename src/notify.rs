//! Toast notifications: typed, auto-expiring, dismissible.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub message: String,
    created: Instant,
}

impl Toast {
    fn age(&self) -> Duration {
        self.created.elapsed()
    }
}

/// FIFO toast queue. `sweep` drops expired entries; the UI renders
/// whatever `active` returns.
pub struct Notifications {
    toasts: VecDeque<Toast>,
    lifetime: Duration,
    /// Master switch from user settings; pushes are dropped when off.
    enabled: bool,
}

impl Notifications {
    pub fn new() -> Self {
        Self::with_lifetime(config::TOAST_LIFETIME)
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            lifetime,
            enabled: true,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.toasts.clear();
        }
    }

    pub fn push(&mut self, kind: ToastKind, title: impl Into<String>, message: impl Into<String>) {
        if !self.enabled {
            return;
        }
        self.toasts.push_back(Toast {
            kind,
            title: title.into(),
            message: message.into(),
            created: Instant::now(),
        });
    }

    pub fn success(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(ToastKind::Success, title, message);
    }

    pub fn error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(ToastKind::Error, title, message);
    }

    pub fn warning(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(ToastKind::Warning, title, message);
    }

    pub fn info(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(ToastKind::Info, title, message);
    }

    /// Drop everything past its lifetime.
    pub fn sweep(&mut self) {
        let lifetime = self.lifetime;
        self.toasts.retain(|t| t.age() < lifetime);
    }

    /// Dismiss the oldest toast (user keypress).
    pub fn dismiss(&mut self) {
        self.toasts.pop_front();
    }

    pub fn active(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_on_sweep() {
        let mut n = Notifications::with_lifetime(Duration::from_millis(0));
        n.error("Oops", "something broke");
        assert!(!n.is_empty());
        n.sweep();
        assert!(n.is_empty());
    }

    #[test]
    fn fresh_toasts_survive_sweep() {
        let mut n = Notifications::with_lifetime(Duration::from_secs(60));
        n.info("Hi", "welcome back");
        n.sweep();
        assert_eq!(n.active().count(), 1);
    }

    #[test]
    fn dismiss_removes_oldest_first() {
        let mut n = Notifications::with_lifetime(Duration::from_secs(60));
        n.info("first", "");
        n.warning("second", "");
        n.dismiss();
        let remaining: Vec<_> = n.active().collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "second");
    }

    #[test]
    fn disabled_queue_drops_pushes() {
        let mut n = Notifications::with_lifetime(Duration::from_secs(60));
        n.set_enabled(false);
        n.success("hidden", "");
        assert!(n.is_empty());
    }
}
