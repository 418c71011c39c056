mod dashboard;
mod leaderboard;
mod profile;
mod quiz;
mod results;
mod setup;
mod toast;

use ratatui::{prelude::*, widgets::Block};

use crate::app::{App, Screen};
use crate::storage::Theme;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    match &app.screen {
        Screen::Dashboard => dashboard::render(frame, area, app),
        Screen::Setup(form) => setup::render(frame, area, app, form),
        Screen::Quiz => quiz::render(frame, area, app),
        Screen::Results(result) => results::render(frame, area, result),
        Screen::Leaderboard { entries, viewer } => {
            leaderboard::render(frame, area, app, entries, viewer.as_ref())
        }
        Screen::Profile(form) => profile::render(frame, area, app, form),
    }

    toast::render(frame, area, app);
}

/// Accent color for headings, following the theme setting.
fn accent(app: &App) -> Color {
    match app.store.settings().theme {
        Theme::Dark => Color::Cyan,
        Theme::Light => Color::Blue,
    }
}

/// Grade colors come out of scoring as names; map them for the terminal.
fn grade_color(name: &str) -> Color {
    match name {
        "green" => Color::Green,
        "cyan" => Color::Cyan,
        "yellow" => Color::Yellow,
        _ => Color::Red,
    }
}
