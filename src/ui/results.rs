use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::models::QuizResult;
use crate::util;

pub fn render(frame: &mut Frame, area: Rect, result: &QuizResult) {
    let chunks = Layout::vertical([
        Constraint::Length(7),
        Constraint::Fill(1),
        Constraint::Length(2),
    ])
    .margin(1)
    .split(area);

    render_summary(frame, chunks[0], result);
    render_breakdown(frame, chunks[1], result);
    render_controls(frame, chunks[2]);
}

fn render_summary(frame: &mut Frame, area: Rect, result: &QuizResult) {
    let color = super::grade_color(result.grade.color);
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{}  ·  {}", result.grade.letter, result.grade.description),
            Style::default().fg(color).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} points", util::format_points(result.total_points)),
            Style::default().fg(Color::White).bold(),
        )),
        Line::from(
            format!(
                "{}/{} correct  ·  {}  ·  {}",
                result.correct_count,
                result.answered_count,
                util::format_accuracy(result.accuracy),
                util::format_clock(result.elapsed_secs),
            )
            .fg(Color::DarkGray),
        ),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_breakdown(frame: &mut Frame, area: Rect, result: &QuizResult) {
    let b = result.breakdown;
    let mut lines = vec![
        points_line("base", b.base, Color::White),
        points_line("bonuses", b.bonus, Color::Green),
        points_line("penalties", -b.penalty, Color::Red),
        points_line("completion", b.completion, Color::Green),
        Line::from(""),
    ];

    for bonus in &result.completion_bonuses {
        lines.push(Line::from(vec![
            Span::styled(
                format!(" +{:<4}", bonus.points),
                Style::default().fg(Color::Green),
            ),
            Span::styled(bonus.description.as_str(), Style::default().fg(Color::Gray)),
        ]));
    }

    let widget = Paragraph::new(lines).block(Block::default().padding(Padding::new(4, 4, 1, 0)));
    frame.render_widget(widget, area);
}

fn points_line(label: &str, points: i64, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{:>11}  ", label),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("{:+}", points), Style::default().fg(color)),
    ])
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("r play again  ·  l leaderboard  ·  enter dashboard")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
