use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::app::App;
use crate::util;

const HISTORY_ROWS: usize = 5;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(6),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    render_header(frame, chunks[0], app);
    render_stats(frame, chunks[1], app);
    render_history(frame, chunks[2], app);
    render_controls(frame, chunks[3]);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "TRIVIA DECK",
            Style::default().fg(super::accent(app)).bold(),
        )),
        Line::from(
            format!("welcome back, {}", app.stats.username).fg(Color::DarkGray),
        ),
    ];
    let widget = Paragraph::new(content).alignment(Alignment::Center);
    frame.render_widget(widget, area);
}

fn render_stats(frame: &mut Frame, area: Rect, app: &App) {
    let stats = &app.stats;
    let content = vec![
        stat_line("total points", util::format_points(stats.total_points)),
        stat_line("quizzes", stats.quizzes_completed.to_string()),
        stat_line("best quiz", util::format_points(stats.best_score)),
        stat_line("average", format!("{:.1}", stats.average_score)),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn stat_line(label: &str, value: String) -> Line<'_> {
    Line::from(vec![
        Span::styled(format!("{:>14}  ", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(Color::White).bold()),
    ])
}

fn render_history(frame: &mut Frame, area: Rect, app: &App) {
    let history = app.store.history();
    let mut lines = vec![Line::from(Span::styled(
        "recent quizzes",
        Style::default().fg(Color::DarkGray),
    ))];

    if history.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from("nothing played yet".fg(Color::DarkGray)));
    }

    for row in history.iter().take(HISTORY_ROWS) {
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<14}", row.category), Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:>7} pts  ", util::format_points(row.total_points)),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("{}/{}  ", row.correct_count, row.answered_count),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(row.grade.clone(), Style::default().fg(Color::Cyan)),
        ]));
    }

    let widget = Paragraph::new(lines).block(Block::default().padding(Padding::new(2, 2, 1, 0)));
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("n new quiz  ·  l leaderboard  ·  p profile  ·  q quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
