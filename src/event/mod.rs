use crate::app::App;
use crate::state::AppState;
use crossterm::event::{KeyCode, MouseEvent, MouseEventKind};

mod confirm;
mod edit;
mod main_view;
mod presets;
mod results;

fn is_text_input_mode(app: &App) -> bool {
    match app.state {
        AppState::EditField => true,
        AppState::Presets => app.presets.naming,
        _ => false,
    }
}

fn handle_back(app: &mut App) {
    match app.state {
        AppState::Main => {}
        AppState::EditField => app.cancel_edit(),
        AppState::Results => app.state = AppState::Main,
        AppState::Presets => {
            if app.presets.naming {
                app.presets.naming = false;
                app.presets.input.clear();
            } else {
                app.state = AppState::Main;
            }
        }
        AppState::Confirm => {
            app.dismiss_confirm();
            app.set_status("已取消");
        }
    }
}

/// 退出：停止批处理并等当前文件处理完，然后保存设置
fn quit(app: &mut App) {
    app.finish_processing_before_exit();
    app.save_on_exit();
    app.should_quit = true;
}

/// 通用列表导航函数
///
/// 根据移动方向计算新的选中索引，支持循环导航。
///
/// # Arguments
///
/// * `current` - 当前选中索引
/// * `len` - 列表长度
/// * `move_up` - 是否向上移动（`true` 为向上，`false` 为向下）
///
/// # Returns
///
/// 新的选中索引。如果列表为空则返回 `None`。
pub(super) fn navigate_list(current: Option<usize>, len: usize, move_up: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let new_idx = if move_up {
        current
            .map(|idx| if idx == 0 { len - 1 } else { idx - 1 })
            .unwrap_or(len - 1)
    } else {
        current.map(|idx| (idx + 1) % len).unwrap_or(0)
    };

    Some(new_idx)
}

/// 处理键盘事件
///
/// 根据当前界面将键盘事件分发到对应的处理函数。
///
/// # Arguments
///
/// * `app` - 应用实例的可变引用
/// * `key` - 按下的键位代码
pub fn handle_key(app: &mut App, key: KeyCode) {
    app.error_message = None;

    if matches!(key, KeyCode::Esc) {
        handle_back(app);
        return;
    }

    if matches!(key, KeyCode::Char('q')) && !is_text_input_mode(app) {
        quit(app);
        return;
    }

    match app.state {
        AppState::Main => main_view::handle_main_key(app, key),
        AppState::EditField => edit::handle_edit_key(app, key),
        AppState::Results => results::handle_results_key(app, key),
        AppState::Presets => presets::handle_presets_key(app, key),
        AppState::Confirm => confirm::handle_confirm_key(app, key),
    }
}

/// 处理鼠标事件
///
/// 将鼠标滚动事件转换为上下方向键。
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let key = match mouse.kind {
        MouseEventKind::ScrollUp => KeyCode::Up,
        MouseEventKind::ScrollDown => KeyCode::Down,
        _ => return,
    };
    match app.state {
        AppState::Main => main_view::handle_main_key(app, key),
        AppState::Results => results::handle_results_key(app, key),
        AppState::Presets if !app.presets.naming => presets::handle_presets_key(app, key),
        _ => {}
    }
}
