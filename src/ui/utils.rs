use ratatui::prelude::*;
use ratatui::style::Modifier;
use ratatui::widgets::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn render_help_info(f: &mut Frame, help_text: &str, area: Rect) {
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);

    let help_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    f.render_widget(help, help_area);
}

pub fn render_error_message(f: &mut Frame, error_msg: &str, area: Rect) {
    let error = Paragraph::new(format!("⚠ {}", error_msg))
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);

    let error_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(2),
        width: area.width,
        height: 1,
    };

    f.render_widget(Clear, error_area);
    f.render_widget(error, error_area);
}

/// 按显示宽度截断，保留末尾部分（路径的文件名更重要）
pub fn truncate_start(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut width = 0;
    let mut tail: Vec<char> = Vec::new();
    for c in text.chars().rev() {
        let w = c.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        tail.push(c);
    }
    let mut result = String::from("…");
    result.extend(tail.into_iter().rev());
    result
}

/// 在 `area` 中居中取一块矩形
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_start_keeps_tail() {
        assert_eq!(truncate_start("/short", 10), "/short");
        assert_eq!(truncate_start("/very/long/path/file.txt", 9), "…file.txt");
        assert_eq!(truncate_start("abc", 0), "");
    }

    #[test]
    fn test_truncate_start_wide_chars() {
        // 每个汉字占两列
        assert_eq!(truncate_start("目录/文件.txt", 8), "…件.txt");
        assert!(truncate_start("目录/文件.txt", 8).width() <= 8);
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(50, 50, area), area);
    }
}
