use ratatui::prelude::*;
use ratatui::widgets::*;

use super::utils::{render_help_info, truncate_start};
use crate::app::App;

pub fn render_results(f: &mut Frame, app: &App) {
    let area = f.area();

    let title = Paragraph::new(format!(
        "处理结果（成功 {}，失败 {}，新文件 {}）",
        app.results.iter().filter(|r| r.success).count(),
        app.results.iter().filter(|r| !r.success).count(),
        app.new_outputs.len()
    ))
    .style(Style::default().fg(Color::Cyan))
    .alignment(Alignment::Center);

    let title_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 2,
    };
    f.render_widget(title, title_area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(Rect {
            x: area.x + 1,
            y: area.y + 2,
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(4),
        });

    if app.results.is_empty() {
        let empty = Paragraph::new("还没有处理结果")
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("结果"));
        f.render_widget(empty, layout[0]);
    } else {
        let items: Vec<ListItem> = app
            .results
            .iter()
            .map(|r| {
                let color = if r.success { Color::Green } else { Color::Red };
                ListItem::new(r.summary()).style(Style::default().fg(color))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("结果"))
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol(">> ");

        let mut state = ListState::default();
        state.select(app.selected_result_index);
        f.render_stateful_widget(list, layout[0], &mut state);
    }

    render_result_detail(f, app, layout[1]);

    render_help_info(f, "↑/↓: 选择  C: 清空结果  Esc/r: 返回", area);
}

fn render_result_detail(f: &mut Frame, app: &App, area: Rect) {
    let Some(result) = app
        .selected_result_index
        .and_then(|i| app.results.get(i))
    else {
        let outputs: Vec<Line> = app
            .new_outputs
            .iter()
            .map(|p| Line::from(truncate_start(&p.display().to_string(), area.width as usize)))
            .collect();
        let list = Paragraph::new(outputs)
            .block(Block::default().borders(Borders::ALL).title("新生成的文件"));
        f.render_widget(list, area);
        return;
    };

    let width = area.width.saturating_sub(14) as usize;
    let mut lines = vec![
        Line::from(format!("输入:   {}", truncate_start(&result.input_path.display().to_string(), width))),
        Line::from(format!("输出:   {}", truncate_start(&result.output_path.display().to_string(), width))),
        Line::from(format!("命令:   {}", truncate_start(&result.command, width))),
        Line::from(format!(
            "退出码: {}",
            result
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".into())
        )),
    ];
    if let Some(error) = &result.error {
        lines.push(Line::styled(
            format!("错误:   {}", error),
            Style::default().fg(Color::Red),
        ));
    }
    if !result.stderr.is_empty() {
        lines.push(Line::from("stderr:"));
        lines.extend(
            result
                .stderr
                .lines()
                .map(|l| Line::styled(l.to_string(), Style::default().fg(Color::Yellow))),
        );
    }
    if !result.stdout.is_empty() {
        lines.push(Line::from("stdout:"));
        lines.extend(result.stdout.lines().map(|l| Line::from(l.to_string())));
    }

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("详情"));
    f.render_widget(detail, area);
}
