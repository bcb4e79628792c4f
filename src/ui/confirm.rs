use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::utils::centered_rect;
use crate::app::App;

pub struct ConfirmDialog<'a> {
    pub lines: &'a [String],
}

impl Widget for &ConfirmDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title("确认")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![Line::from("")];
        lines.extend(self.lines.iter().map(|l| Line::from(l.as_str())));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Enter/y 确认    n/Esc 取消  ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

pub fn render_confirm(f: &mut Frame, app: &App) {
    let area = f.area();
    let height = app.confirm.lines.len() as u16 + 6;
    let dialog_area = centered_rect(area.width.saturating_sub(10).min(90), height, area);

    let dialog = ConfirmDialog {
        lines: &app.confirm.lines,
    };
    f.render_widget(&dialog, dialog_area);
}
