use ratatui::prelude::*;
use ratatui::widgets::*;

use super::utils::render_help_info;
use crate::app::App;

pub fn render_presets(f: &mut Frame, app: &App) {
    let area = f.area();

    let title = Paragraph::new("预设")
        .style(Style::default().fg(Color::Magenta))
        .alignment(Alignment::Center);

    let title_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 2,
    };
    f.render_widget(title, title_area);

    let input_height = if app.presets.naming { 3 } else { 0 };
    let list_area = Rect {
        x: area.x + 2,
        y: area.y + 2,
        width: area.width.saturating_sub(4),
        height: area.height.saturating_sub(3 + input_height),
    };

    if app.presets.names.is_empty() {
        let empty = Paragraph::new("没有保存的预设，按 n 新建")
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("已保存"));
        f.render_widget(empty, list_area);
    } else {
        let items: Vec<ListItem> = app
            .presets
            .names
            .iter()
            .map(|name| ListItem::new(name.as_str()).style(Style::default().fg(Color::White)))
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("已保存"))
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol(">> ");

        let mut state = ListState::default();
        state.select(app.presets.selected_index);
        f.render_stateful_widget(list, list_area, &mut state);
    }

    if app.presets.naming {
        let input = Paragraph::new(format!("{}▏", app.presets.input))
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("预设名称"));
        let input_area = Rect {
            x: list_area.x,
            y: list_area.y + list_area.height,
            width: list_area.width,
            height: input_height,
        };
        f.render_widget(input, input_area);
        render_help_info(f, "输入名称  Enter: 保存  Esc: 取消", area);
    } else {
        render_help_info(f, "↑/↓: 选择  Enter: 加载  n: 保存当前设置  d: 删除  Esc: 返回", area);
    }
}
