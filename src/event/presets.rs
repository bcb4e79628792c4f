use crate::app::App;
use crossterm::event::KeyCode;

use super::navigate_list;

/// 处理预设列表的键盘事件
///
/// 输入预设名时：字符输入、`Backspace` 删除、`Enter` 保存。
/// 否则：`Up`/`Down` 选择，`Enter` 加载，`n` 新建，`d` 删除。
pub(super) fn handle_presets_key(app: &mut App, key: KeyCode) {
    if app.presets.naming {
        match key {
            KeyCode::Enter => {
                let name = std::mem::take(&mut app.presets.input);
                app.presets.naming = false;
                app.save_preset(&name);
            }
            KeyCode::Backspace => {
                app.presets.input.pop();
            }
            KeyCode::Char(c) => app.presets.input.push(c),
            _ => {}
        }
        return;
    }

    match key {
        KeyCode::Up | KeyCode::Char('k') => {
            app.presets.selected_index =
                navigate_list(app.presets.selected_index, app.presets.names.len(), true);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.presets.selected_index =
                navigate_list(app.presets.selected_index, app.presets.names.len(), false);
        }
        KeyCode::Enter => app.load_selected_preset(),
        KeyCode::Char('n') => {
            app.presets.naming = true;
            app.presets.input.clear();
        }
        KeyCode::Char('d') => app.request_delete_preset(),
        _ => {}
    }
}
