//! Formatting, timing, and input-validation helpers.

use std::time::{Duration, Instant};

/// Format a point total with thousands separators: `1234567` -> `1,234,567`.
pub fn format_points(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// Format seconds as `m:ss` for the countdown display.
pub fn format_clock(total_secs: u64) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Format a percentage with one decimal place.
pub fn format_accuracy(pct: f64) -> String {
    format!("{:.1}%", pct)
}

/// Suppresses repeat triggers until a quiet period has elapsed.
///
/// `fire` records an attempt; `ready` reports whether the quiet period has
/// passed since the last attempt, which is when debounced work should run.
pub struct Debouncer {
    delay: Duration,
    last_fire: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_fire: None,
        }
    }

    pub fn fire(&mut self) {
        self.last_fire = Some(Instant::now());
    }

    /// True once the quiet period has elapsed; clears the pending state.
    pub fn ready(&mut self) -> bool {
        match self.last_fire {
            Some(at) if at.elapsed() >= self.delay => {
                self.last_fire = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.last_fire.is_some()
    }
}

/// Lets an action through at most once per interval.
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True when enough time has passed since the last accepted call.
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(at) if now.duration_since(at) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Display-name rules shared by the profile form and the CLI.
pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 16;

/// Validates a display name. Returns the trimmed-length violation as a
/// field-level message.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let trimmed = username.trim();

    if trimmed.len() < USERNAME_MIN_LENGTH {
        return Err("Username must be at least 3 characters");
    }

    if trimmed.len() > USERNAME_MAX_LENGTH {
        return Err("Username must be at most 16 characters");
    }

    Ok(())
}

/// Shallow email shape check: one `@`, a dot somewhere after it, no spaces.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    if email.contains(' ') {
        return Err("Email must not contain spaces");
    }
    let Some(at) = email.find('@') else {
        return Err("Email must contain @");
    };
    if at == 0 {
        return Err("Email is missing the part before @");
    }
    let domain = &email[at + 1..];
    if email[at + 1..].contains('@') {
        return Err("Email must contain exactly one @");
    }
    match domain.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < domain.len() => Ok(()),
        _ => Err("Email domain looks incomplete"),
    }
}

/// Password rules: at least 8 characters with a letter and a digit.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("Password must contain a letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a digit");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_are_grouped() {
        assert_eq!(format_points(0), "0");
        assert_eq!(format_points(999), "999");
        assert_eq!(format_points(1000), "1,000");
        assert_eq!(format_points(1234567), "1,234,567");
        assert_eq!(format_points(-4500), "-4,500");
    }

    #[test]
    fn clock_pads_seconds() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(600), "10:00");
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("abcdefghijklmnop").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abcdefghijklmnopq").is_err());
        assert!(validate_username("  ab  ").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("user.name@example.org").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.org").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@b.").is_err());
        assert!(validate_email("a b@c.org").is_err());
        assert!(validate_email("a@@c.org").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("abcd1234").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("lettersonly").is_err());
        assert!(validate_password("12345678").is_err());
    }

    #[test]
    fn throttle_limits_rate() {
        let mut t = Throttle::new(Duration::from_secs(60));
        assert!(t.allow());
        assert!(!t.allow());
    }

    #[test]
    fn debouncer_waits_for_quiet() {
        let mut d = Debouncer::new(Duration::from_secs(60));
        assert!(!d.ready());
        d.fire();
        assert!(d.is_pending());
        assert!(!d.ready());

        let mut instant = Debouncer::new(Duration::from_millis(0));
        instant.fire();
        assert!(instant.ready());
        assert!(!instant.is_pending());
    }
}
