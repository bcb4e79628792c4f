use ratatui::{prelude::*, style::Color, widgets::Paragraph};

use crate::processor::BatchState;

fn state_label(state: &BatchState) -> &'static str {
    match state {
        BatchState::Idle => "空闲",
        BatchState::Running => "处理中",
        BatchState::Completed => "完成",
        BatchState::Stopped => "已停止",
        BatchState::Failed(_) => "失败",
    }
}

fn state_color(state: &BatchState) -> Color {
    match state {
        BatchState::Idle => Color::Gray,
        BatchState::Running => Color::Yellow,
        BatchState::Completed => Color::Green,
        BatchState::Stopped => Color::Magenta,
        BatchState::Failed(_) => Color::Red,
    }
}

/// 状态栏：批处理状态 + 最近的状态消息
pub struct StatusLineWidget<'a> {
    pub state: &'a BatchState,
    pub message: &'a str,
    pub logging: bool,
}

impl Widget for StatusLineWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(vec![
            Span::styled(
                format!("[{}] ", state_label(self.state)),
                Style::default().fg(state_color(self.state)),
            ),
            Span::raw(self.message.to_string()),
            Span::styled(
                if self.logging { "  日志: 开" } else { "  日志: 关" },
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        Paragraph::new(line).render(area, buf);
    }
}
