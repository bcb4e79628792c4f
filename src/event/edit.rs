use crate::app::App;
use crossterm::event::KeyCode;

/// 处理设置字段编辑模式的键盘事件
pub(super) fn handle_edit_key(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Enter => app.commit_edit(),
        KeyCode::Backspace => {
            app.edit.input.pop();
        }
        KeyCode::Char(c) => app.edit.input.push(c),
        _ => {}
    }
}
