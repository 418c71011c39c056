use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use crate::app::{App, Reveal};
use crate::session::QuizSession;
use crate::util;

const LOW_TIME_SECS: u64 = 10;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(session) = app.manager.session() else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .margin(2)
    .split(area);

    render_status(frame, chunks[0], session);

    if let Some(reveal) = &app.reveal {
        render_reveal(frame, chunks[1].union(chunks[2]), reveal);
        render_reveal_controls(frame, chunks[3], reveal);
        return;
    }

    if let Some(question) = session.current_question() {
        render_question_text(frame, chunks[1], &question.text);
        render_options(frame, chunks[2], &question.options, app.selected_option);
    }
    render_controls(frame, chunks[3]);
}

fn render_status(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let halves = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).split(area);

    let remaining = session.time_remaining_secs();
    let clock_color = if remaining <= LOW_TIME_SECS {
        Color::Red
    } else {
        Color::DarkGray
    };
    let clock = Paragraph::new(format!("{} left", util::format_clock(remaining)))
        .alignment(Alignment::Left)
        .fg(clock_color);
    frame.render_widget(clock, halves[0]);

    let progress = format!(
        "{}  ·  {}/{}",
        session.category(),
        session.current_index() + 1,
        session.question_count()
    );
    let widget = Paragraph::new(progress)
        .alignment(Alignment::Right)
        .fg(Color::DarkGray);
    frame.render_widget(widget, halves[1]);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn render_options(frame: &mut Frame, area: Rect, options: &[String], selected: usize) {
    let mut lines: Vec<Line> = Vec::with_capacity(options.len() * 2);

    for (index, option) in options.iter().enumerate() {
        let is_selected = index == selected;
        let style = if is_selected {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if is_selected { ">" } else { " " };
        let label = (b'A' + index as u8) as char;

        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", marker), style),
            Span::styled(format!("{}. ", label), style),
            Span::styled(option.as_str(), style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_reveal(frame: &mut Frame, area: Rect, reveal: &Reveal) {
    let (verdict, color) = if reveal.is_correct {
        ("CORRECT", Color::Green)
    } else {
        ("INCORRECT", Color::Red)
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(verdict, Style::default().fg(color).bold())),
        Line::from(""),
        Line::from(Span::styled(
            format!("{:+} points", reveal.points),
            Style::default().fg(color),
        )),
        Line::from(""),
    ];
    if !reveal.is_correct {
        lines.push(Line::from(vec![
            Span::styled("answer: ", Style::default().fg(Color::DarkGray)),
            Span::styled(reveal.correct_answer.as_str(), Style::default().fg(Color::White)),
        ]));
        lines.push(Line::from(""));
    }
    if let Some(explanation) = &reveal.explanation {
        lines.push(Line::from(Span::styled(
            explanation.as_str(),
            Style::default().fg(Color::Gray),
        )));
    }

    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Color::DarkGray)
                .padding(Padding::horizontal(2)),
        );
    frame.render_widget(widget, area);
}

fn render_reveal_controls(frame: &mut Frame, area: Rect, reveal: &Reveal) {
    let hint = if reveal.finished {
        "enter see results"
    } else {
        "enter next question"
    };
    let widget = Paragraph::new(hint)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("j/k navigate  ·  enter answer  ·  esc abandon")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
