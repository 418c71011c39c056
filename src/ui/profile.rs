use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, ProfileForm};

pub fn render(frame: &mut Frame, area: Rect, app: &App, form: &ProfileForm) {
    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(13),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    let settings = app.store.settings();
    let name_value = if form.row == 0 {
        format!("{}_", form.name_input)
    } else {
        form.name_input.clone()
    };

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "PROFILE",
            Style::default().fg(super::accent(app)).bold(),
        )),
        Line::from(""),
        row("name", &name_value, form.row == 0),
    ];
    content.push(match &form.name_error {
        Some(error) => Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(""),
    });
    content.extend([
        row("notifications", on_off(settings.notifications), form.row == 1),
        Line::from(""),
        row("sound", on_off(settings.sound), form.row == 2),
        Line::from(""),
        row("theme", settings.theme.label(), form.row == 3),
        Line::from(""),
    ]);

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, chunks[1]);

    let controls = Paragraph::new("up/down field  ·  enter apply  ·  esc back")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(controls, chunks[3]);
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

fn row(label: &str, value: &str, selected: bool) -> Line<'static> {
    let style = if selected {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::Gray)
    };
    let marker = if selected { ">" } else { " " };
    Line::from(Span::styled(
        format!("{} {:<14} {}", marker, label, value),
        style,
    ))
}
