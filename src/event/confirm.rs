use crate::app::App;
use crate::state::PendingAction;
use crossterm::event::KeyCode;

/// 处理确认对话框：`Enter`/`y` 执行，`n` 取消（`Esc` 在上层处理）
pub(super) fn handle_confirm_key(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Enter | KeyCode::Char('y') => match app.dismiss_confirm() {
            Some(PendingAction::Process(paths)) => app.start_processing(paths),
            Some(PendingAction::DeletePreset(name)) => app.delete_preset(&name),
            None => {}
        },
        KeyCode::Char('n') => {
            app.dismiss_confirm();
            app.set_status("已取消");
        }
        _ => {}
    }
}
