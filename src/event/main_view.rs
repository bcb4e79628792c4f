use crate::app::App;
use crate::state::{AppState, Focus, SettingsField};
use crossterm::event::KeyCode;

use super::navigate_list;

fn move_cursor(app: &mut App, move_up: bool) {
    match app.focus {
        Focus::Settings => {
            app.selected_field_index =
                navigate_list(app.selected_field_index, SettingsField::ALL.len(), move_up);
        }
        Focus::Files => {
            app.selected_file_index =
                navigate_list(app.selected_file_index, app.files.len(), move_up);
        }
    }
}

/// 处理主界面的键盘事件
///
/// # Behavior
///
/// - `Tab`: 切换设置面板/文件列表
/// - `Up`/`k`, `Down`/`j`: 在当前面板中移动
/// - `Enter`: 编辑或切换设置；在文件列表中勾选
/// - `Space`/`a`: 勾选当前文件/全选
/// - `f`: 搜索文件，`c`: 清空文件列表
/// - `p`/`P`: 处理勾选的文件/全部文件，`x`: 停止
/// - `r`: 结果列表，`o`: 预设
/// - `s`: 保存设置，`D`: 恢复默认，`l`: 开关日志
pub(super) fn handle_main_key(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Tab => app.focus = app.focus.toggle(),
        KeyCode::Up | KeyCode::Char('k') => move_cursor(app, true),
        KeyCode::Down | KeyCode::Char('j') => move_cursor(app, false),
        KeyCode::Enter => match app.focus {
            Focus::Settings => app.activate_selected_field(),
            Focus::Files => app.toggle_file_checked(),
        },
        KeyCode::Char(' ') => app.toggle_file_checked(),
        KeyCode::Char('a') => app.toggle_all_checked(),
        KeyCode::Char('f') => app.find_files(),
        KeyCode::Char('c') => {
            app.clear_files();
            app.set_status("文件列表已清空");
        }
        KeyCode::Char('p') => app.process_selected(),
        KeyCode::Char('P') => app.process_all(),
        KeyCode::Char('x') => app.stop_processing(),
        KeyCode::Char('r') => {
            app.selected_result_index = if app.results.is_empty() { None } else { Some(0) };
            app.state = AppState::Results;
        }
        KeyCode::Char('o') => app.open_presets(),
        KeyCode::Char('s') => {
            app.save_settings();
        }
        KeyCode::Char('D') => app.load_defaults(),
        KeyCode::Char('l') => app.toggle_logging(),
        _ => {}
    }
}
