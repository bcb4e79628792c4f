use ratatui::prelude::*;
use ratatui::widgets::*;
use unicode_width::UnicodeWidthStr;

use super::status::StatusLineWidget;
use super::utils::{render_help_info, truncate_start};
use crate::app::App;
use crate::state::{AppState, Focus, SettingsField};

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
}

pub fn render_main(f: &mut Frame, app: &App) {
    let area = f.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Paragraph::new(app.settings.window_title())
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(layout[1]);

    render_settings_panel(f, app, body[0]);
    render_file_list(f, app, body[1]);
    render_progress(f, app, layout[2]);
    render_log_pane(f, app, layout[3]);

    let status = StatusLineWidget {
        state: &app.status.state,
        message: &app.status_message,
        logging: app.settings.logging_enabled(),
    };
    f.render_widget(status, layout[4]);

    let help_text = "Tab 切换  Enter 编辑  Space/a 勾选  f 搜索  p/P 处理  x 停止  c 清空  r 结果  o 预设  s 保存  D 默认  l 日志  q 退出";
    render_help_info(f, help_text, area);
}

fn render_settings_panel(f: &mut Frame, app: &App, area: Rect) {
    let label_width = SettingsField::ALL
        .iter()
        .map(|field| field.label().width())
        .max()
        .unwrap_or(0);
    let value_width = (area.width as usize).saturating_sub(label_width + 6);

    let items: Vec<ListItem> = SettingsField::ALL
        .iter()
        .map(|field| {
            let editing = app.state == AppState::EditField && app.edit.field == Some(*field);
            let value = if editing {
                format!("{}▏", app.edit.input)
            } else {
                app.field_value(*field)
            };
            let label = format!(
                "{}{}",
                field.label(),
                " ".repeat(label_width - field.label().width())
            );
            let value_style = if editing {
                Style::default().fg(Color::Yellow)
            } else if value.is_empty() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            let shown = if value.is_empty() && !editing {
                "(未设置)".to_string()
            } else {
                truncate_start(&value, value_width)
            };
            ListItem::new(Line::from(vec![
                Span::styled(label, Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::styled(shown, value_style),
            ]))
        })
        .collect();

    let focused = app.focus == Focus::Settings;
    let list = List::new(items)
        .block(panel_block("设置", focused))
        .highlight_style(if focused {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        })
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    state.select(app.selected_field_index);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_file_list(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Files;
    let title = format!(
        "文件 ({} 个，已选 {})",
        app.files.len(),
        app.checked_files.len()
    );

    if app.files.is_empty() {
        let empty = Paragraph::new("没有文件，设置输入目录后按 f 搜索")
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
            .block(panel_block(&title, focused));
        f.render_widget(empty, area);
        return;
    }

    let input_dir = app.settings.input_dir();
    let width = (area.width as usize).saturating_sub(10);
    let items: Vec<ListItem> = app
        .files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let mark = if app.checked_files.contains(&index) {
                "[x] "
            } else {
                "[ ] "
            };
            let relative = input_dir
                .and_then(|dir| file.path.strip_prefix(dir).ok())
                .unwrap_or(file.path.as_path());
            let text = truncate_start(&relative.display().to_string(), width);
            ListItem::new(format!("{}{}", mark, text)).style(Style::default().fg(Color::White))
        })
        .collect();

    let list = List::new(items)
        .block(panel_block(&title, focused))
        .highlight_style(if focused {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        })
        .highlight_symbol("");

    let mut state = ListState::default();
    state.select(app.selected_file_index);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_progress(f: &mut Frame, app: &App, area: Rect) {
    let status = &app.status;
    let mut label = format!("{}/{}", status.completed, status.total);
    if status.failed > 0 {
        label.push_str(&format!("  失败 {}", status.failed));
    }
    if let Some(current) = &status.current_file {
        let name = current
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match status.file_progress {
            Some(p) => label.push_str(&format!("  {} ({:.0}%)", name, p)),
            None => label.push_str(&format!("  {}", name)),
        }
    }

    let color = if status.state.is_running() {
        Color::Yellow
    } else {
        Color::Green
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("进度"))
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(status.overall_percent() / 100.0)
        .label(label);
    f.render_widget(gauge, area);
}

fn render_log_pane(f: &mut Frame, app: &App, area: Rect) {
    let height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .logger
        .recent(height)
        .into_iter()
        .map(|line| {
            let color = if line.contains(" - ERROR - ") {
                Color::Red
            } else if line.contains(" - WARNING - ") {
                Color::Yellow
            } else {
                Color::Gray
            };
            Line::styled(line, Style::default().fg(color))
        })
        .collect();

    let log = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("日志"));
    f.render_widget(log, area);
}
