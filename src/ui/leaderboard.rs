use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::app::App;
use crate::models::{LeaderboardEntry, RankContext};
use crate::util;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    entries: &[LeaderboardEntry],
    viewer: Option<&RankContext>,
) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(4),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        "LEADERBOARD",
        Style::default().fg(super::accent(app)).bold(),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(title, chunks[0]);

    render_rows(frame, chunks[1], app, entries);
    render_viewer(frame, chunks[2], viewer);
    render_controls(frame, chunks[3]);
}

fn render_rows(frame: &mut Frame, area: Rect, app: &App, entries: &[LeaderboardEntry]) {
    let mut lines = vec![Line::from(Span::styled(
        format!(
            "{:>4}  {:<18}{:>9}{:>9}{:>9}",
            "#", "player", "points", "quizzes", "avg"
        ),
        Style::default().fg(Color::DarkGray),
    ))];

    for entry in entries {
        lines.push(row(entry, entry.user_id == app.stats.user_id));
    }
    if entries.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from("no rankings yet".fg(Color::DarkGray)));
    }

    let widget = Paragraph::new(lines).block(Block::default().padding(Padding::new(2, 2, 1, 0)));
    frame.render_widget(widget, area);
}

fn row(entry: &LeaderboardEntry, is_viewer: bool) -> Line<'static> {
    let style = if is_viewer {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(Span::styled(
        format!(
            "{:>4}  {:<18}{:>9}{:>9}{:>9.1}",
            entry.rank,
            entry.username,
            util::format_points(entry.total_points),
            entry.quizzes_completed,
            entry.average_score,
        ),
        style,
    ))
}

fn render_viewer(frame: &mut Frame, area: Rect, viewer: Option<&RankContext>) {
    let lines = match viewer {
        Some(context) => vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("your rank  ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("#{}", context.rank),
                    Style::default().fg(Color::White).bold(),
                ),
                Span::styled(
                    format!(
                        "  ·  {} points",
                        util::format_points(context.entry.total_points)
                    ),
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
        ],
        None => vec![
            Line::from(""),
            Line::from("finish a quiz to get ranked".fg(Color::DarkGray)),
        ],
    };

    let widget = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("r refresh  ·  enter back")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
