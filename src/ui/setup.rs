use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, SetupForm};

pub fn render(frame: &mut Frame, area: Rect, app: &App, form: &SetupForm) {
    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(11),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    let difficulty = form
        .difficulty()
        .map(|d| d.label())
        .unwrap_or("any");

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "NEW QUIZ",
            Style::default().fg(super::accent(app)).bold(),
        )),
        Line::from(""),
        row("category", form.category(), form.row == 0),
        Line::from(""),
        row("difficulty", difficulty, form.row == 1),
        Line::from(""),
        row("questions", &form.count().to_string(), form.row == 2),
        Line::from(""),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, chunks[1]);

    let controls = Paragraph::new("j/k field  ·  h/l change  ·  enter start  ·  esc back")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(controls, chunks[3]);
}

fn row(label: &str, value: &str, selected: bool) -> Line<'static> {
    let style = if selected {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::Gray)
    };
    let marker = if selected { ">" } else { " " };
    Line::from(Span::styled(
        format!("{} {:<11} < {} >", marker, label, value),
        style,
    ))
}
