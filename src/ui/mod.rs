pub mod confirm;
pub mod main_view;
pub mod presets;
pub mod results;
pub mod status;
pub mod utils;

use ratatui::prelude::*;

use crate::app::App;
use crate::state::AppState;

pub fn render(f: &mut Frame, app: &App) {
    match app.state {
        AppState::Main | AppState::EditField => main_view::render_main(f, app),
        AppState::Results => results::render_results(f, app),
        AppState::Presets => presets::render_presets(f, app),
        AppState::Confirm => {
            match app.confirm.return_state {
                AppState::Presets => presets::render_presets(f, app),
                _ => main_view::render_main(f, app),
            }
            confirm::render_confirm(f, app);
        }
    }

    if let Some(ref error_msg) = app.error_message {
        utils::render_error_message(f, error_msg, f.area());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::create_test_app;
    use crate::processor::ProcessingResult;
    use crate::state::PendingAction;
    use ratatui::backend::TestBackend;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_render_every_view() {
        let dir = tempdir().unwrap();
        let mut app = create_test_app(&dir);
        app.set_error("出错了");
        assert!(draw(&app).contains("Infini Converter"));

        app.state = AppState::Results;
        app.results.push(ProcessingResult {
            input_path: PathBuf::from("/in/a.txt"),
            success: true,
            ..Default::default()
        });
        app.selected_result_index = Some(0);
        draw(&app);

        app.state = AppState::Presets;
        app.presets.naming = true;
        draw(&app);

        app.ask_confirm(PendingAction::DeletePreset("x".into()), vec!["删除预设 x？".into()]);
        draw(&app);
    }

    #[test]
    fn test_render_tiny_terminal_does_not_panic() {
        let dir = tempdir().unwrap();
        let app = create_test_app(&dir);
        let mut terminal = Terminal::new(TestBackend::new(10, 4)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
    }
}
