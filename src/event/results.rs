use crate::app::App;
use crate::state::AppState;
use crossterm::event::KeyCode;

use super::navigate_list;

/// 处理结果列表的键盘事件
///
/// - `Up`/`k`, `Down`/`j`: 选择
/// - `C`: 清空结果
/// - `r`: 返回主界面
pub(super) fn handle_results_key(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Up | KeyCode::Char('k') => {
            app.selected_result_index =
                navigate_list(app.selected_result_index, app.results.len(), true);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.selected_result_index =
                navigate_list(app.selected_result_index, app.results.len(), false);
        }
        KeyCode::Char('C') => app.clear_results(),
        KeyCode::Char('r') => app.state = AppState::Main,
        _ => {}
    }
}
