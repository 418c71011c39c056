use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Padding, Paragraph},
};

use crate::app::App;
use crate::notify::ToastKind;

const TOAST_WIDTH: u16 = 34;
const TOAST_HEIGHT: u16 = 4;
const MAX_VISIBLE: usize = 3;

/// Overlay in the top-right corner, newest at the top.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let toasts: Vec<_> = app.toasts.active().collect();

    for (slot, toast) in toasts.iter().rev().take(MAX_VISIBLE).enumerate() {
        let width = TOAST_WIDTH.min(area.width);
        let y = area.y + 1 + slot as u16 * TOAST_HEIGHT;
        if y + TOAST_HEIGHT > area.bottom() {
            break;
        }
        let rect = Rect::new(area.right().saturating_sub(width + 1), y, width, TOAST_HEIGHT);

        let color = match toast.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
            ToastKind::Warning => Color::Yellow,
            ToastKind::Info => Color::Cyan,
        };

        let content = vec![
            Line::from(Span::styled(
                toast.title.as_str(),
                Style::default().fg(color).bold(),
            )),
            Line::from(toast.message.as_str().fg(Color::Gray)),
        ];

        let widget = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(color)
                .padding(Padding::horizontal(1)),
        );
        frame.render_widget(Clear, rect);
        frame.render_widget(widget, rect);
    }
}
