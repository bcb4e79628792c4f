use std::path::{Path, PathBuf};

use crate::model::Settings;
use crate::processor::{validate_program, validate_template};
use crate::state::{AppState, PendingAction, SettingsField};

use super::App;

fn optional_path(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

fn path_text(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

fn on_off(value: bool) -> String {
    let text = if value { "开" } else { "关" };
    text.to_string()
}

impl App {
    fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(Settings::app_dir)
    }

    /// 设置条目当前值的显示文本
    pub fn field_value(&self, field: SettingsField) -> String {
        let s = &self.settings;
        match field {
            SettingsField::InputDir => path_text(s.input_dir()),
            SettingsField::OutputDir => path_text(s.output_dir()),
            SettingsField::SameAsInput => on_off(s.output_beside_input()),
            SettingsField::Program => path_text(s.program_path()),
            SettingsField::EnvVars => s.env_vars().to_string(),
            SettingsField::CommandTemplate => s.command_template().to_string(),
            SettingsField::Extensions => s.extensions().join(", "),
            SettingsField::Recursive => on_off(s.recursive()),
            SettingsField::SkipProblematic => on_off(s.skip_problematic()),
            SettingsField::ConfirmBeforeRun => on_off(s.confirm_before_run()),
            SettingsField::DeleteSource => on_off(s.delete_source_on_success()),
            SettingsField::Logging => on_off(s.logging_enabled()),
        }
    }

    /// 对光标所在条目按 Enter：开关直接切换，文本字段进入编辑
    pub fn activate_selected_field(&mut self) {
        let Some(field) = self.selected_field() else {
            return;
        };
        if field.is_toggle() {
            self.toggle_field(field);
            return;
        }
        self.edit.input = self.field_value(field);
        self.edit.field = Some(field);
        self.state = AppState::EditField;
    }

    pub fn cancel_edit(&mut self) {
        self.edit.clear();
        self.state = AppState::Main;
    }

    /// 写回正在编辑的字段
    ///
    /// 命令模板非法时保持编辑状态并显示错误。
    pub fn commit_edit(&mut self) {
        let Some(field) = self.edit.field else {
            self.cancel_edit();
            return;
        };
        let input = self.edit.input.trim().to_string();

        match field {
            SettingsField::InputDir => self.settings.set_input_dir(optional_path(&input)),
            SettingsField::OutputDir => self.settings.set_output_dir(optional_path(&input)),
            SettingsField::Program => {
                let program = optional_path(&input);
                if let Some(path) = &program
                    && let Err(e) = validate_program(path)
                {
                    self.logger.warning(format!("Program check failed: {}", e));
                    self.set_error(e.to_string());
                }
                self.settings.set_program_path(program);
            }
            SettingsField::EnvVars => self.settings.set_env_vars(input.as_str()),
            SettingsField::CommandTemplate => {
                if let Err(e) = validate_template(&input) {
                    self.set_error(e.to_string());
                    return;
                }
                self.settings.set_command_template(input.as_str());
            }
            SettingsField::Extensions => {
                self.settings
                    .set_extensions(input.split(|c: char| c == ',' || c.is_whitespace()));
                if self.settings.extensions().is_empty() {
                    self.set_error("扩展名列表为空，搜索不会找到任何文件");
                }
            }
            _ => {}
        }

        self.logger.info(format!(
            "{} set to: {}",
            field.label(),
            self.field_value(field)
        ));
        self.cancel_edit();
    }

    pub fn toggle_field(&mut self, field: SettingsField) {
        let s = &mut self.settings;
        match field {
            SettingsField::SameAsInput => s.set_output_beside_input(!s.output_beside_input()),
            SettingsField::Recursive => s.set_recursive(!s.recursive()),
            SettingsField::SkipProblematic => s.set_skip_problematic(!s.skip_problematic()),
            SettingsField::ConfirmBeforeRun => s.set_confirm_before_run(!s.confirm_before_run()),
            SettingsField::DeleteSource => {
                s.set_delete_source_on_success(!s.delete_source_on_success())
            }
            SettingsField::Logging => {
                self.toggle_logging();
                return;
            }
            _ => return,
        }
        self.set_status(format!("{}：{}", field.label(), self.field_value(field)));
    }

    /// 切换日志开关并立即保存
    pub fn toggle_logging(&mut self) {
        let enabled = !self.settings.logging_enabled();
        if !enabled {
            self.logger.info("Logging disabled");
        }
        self.settings.set_logging_enabled(enabled);
        self.logger.set_enabled(enabled);
        if enabled {
            self.logger.info("Logging enabled");
        }
        if self.save_settings() {
            self.set_status(if enabled { "日志已开启" } else { "日志已关闭" });
        }
    }

    /// 保存设置到主配置文件，失败时显示错误
    pub fn save_settings(&mut self) -> bool {
        match self.settings.save(&self.config_path) {
            Ok(()) => {
                self.logger.info(format!(
                    "Settings saved to {}",
                    self.config_path.display()
                ));
                self.set_status("设置已保存");
                true
            }
            Err(e) => {
                self.logger.error(format!("Failed to save settings: {}", e));
                self.set_error(format!("保存设置失败: {}", e));
                false
            }
        }
    }

    /// 退出前保存设置，包括当前终端尺寸
    pub fn save_on_exit(&mut self) {
        if self.terminal_size.width > 0 && self.terminal_size.height > 0 {
            self.settings
                .set_window_size(self.terminal_size.width, self.terminal_size.height);
        }
        self.save_settings();
        self.logger.info("Application closed");
    }

    /// 恢复默认设置（保留输入目录）
    pub fn load_defaults(&mut self) {
        self.settings.load_defaults();
        self.apply_logging_settings();
        self.logger.info("Default settings restored");
        self.set_status("已恢复默认设置");
    }

    fn apply_logging_settings(&mut self) {
        self.logger
            .set_log_file(self.settings.resolved_log_file(&self.config_dir()));
        self.logger.set_enabled(self.settings.logging_enabled());
    }

    /// 打开预设列表
    pub fn open_presets(&mut self) {
        self.refresh_presets();
        self.presets.naming = false;
        self.presets.input.clear();
        self.state = AppState::Presets;
    }

    fn refresh_presets(&mut self) {
        self.presets.names = Settings::list_presets(&self.config_path);
        self.presets.selected_index = match self.presets.selected_index {
            _ if self.presets.names.is_empty() => None,
            Some(i) => Some(i.min(self.presets.names.len() - 1)),
            None => Some(0),
        };
    }

    pub fn selected_preset(&self) -> Option<&str> {
        self.presets
            .selected_index
            .and_then(|i| self.presets.names.get(i))
            .map(String::as_str)
    }

    /// 以输入的名称保存当前设置为预设
    pub fn save_preset(&mut self, name: &str) {
        match self.settings.save_preset(&self.config_path, name) {
            Ok(path) => {
                self.logger
                    .info(format!("Preset saved to {}", path.display()));
                self.set_status(format!("预设已保存: {}", name.trim()));
                self.refresh_presets();
            }
            Err(e) => {
                self.logger.error(format!("Failed to save preset: {}", e));
                self.set_error(format!("保存预设失败: {}", e));
            }
        }
    }

    pub fn load_selected_preset(&mut self) {
        let Some(name) = self.selected_preset().map(str::to_string) else {
            return;
        };
        match Settings::load_preset(&self.config_path, &name) {
            Ok(settings) => {
                self.settings = settings;
                self.apply_logging_settings();
                self.logger.info(format!("Preset loaded: {}", name));
                self.set_status(format!("已加载预设: {}", name));
                self.state = AppState::Main;
            }
            Err(e) => {
                self.logger.error(format!("Failed to load preset: {}", e));
                self.set_error(format!("加载预设失败: {}", e));
            }
        }
    }

    /// 删除前先确认
    pub fn request_delete_preset(&mut self) {
        let Some(name) = self.selected_preset().map(str::to_string) else {
            return;
        };
        self.ask_confirm(
            PendingAction::DeletePreset(name.clone()),
            vec![format!("删除预设 {}？", name)],
        );
    }

    pub fn delete_preset(&mut self, name: &str) {
        match Settings::delete_preset(&self.config_path, name) {
            Ok(()) => {
                self.logger.info(format!("Preset deleted: {}", name));
                self.set_status(format!("已删除预设: {}", name));
            }
            Err(e) => self.set_error(format!("删除预设失败: {}", e)),
        }
        self.refresh_presets();
    }
}

#[cfg(test)]
mod tests {
    use crate::app::tests::create_test_app;
    use crate::logger::Logger;
    use crate::model::Settings;
    use crate::state::{AppState, PendingAction, SettingsField};
    use ratatui::layout::Rect;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn select(app: &mut crate::app::App, field: SettingsField) {
        let index = SettingsField::ALL.iter().position(|f| *f == field).unwrap();
        app.selected_field_index = Some(index);
    }

    #[test]
    fn test_edit_text_field_and_commit() {
        let dir = tempdir().unwrap();
        let mut app = create_test_app(&dir);
        select(&mut app, SettingsField::OutputDir);

        app.activate_selected_field();
        assert_eq!(app.state, AppState::EditField);
        assert!(app.edit.input.is_empty());

        app.edit.input.push_str("  /tmp/out  ");
        app.commit_edit();

        assert_eq!(app.state, AppState::Main);
        assert_eq!(app.settings.output_dir(), Some(PathBuf::from("/tmp/out").as_path()));

        select(&mut app, SettingsField::OutputDir);
        app.activate_selected_field();
        assert_eq!(app.edit.input, "/tmp/out");
        app.edit.input.clear();
        app.commit_edit();
        assert!(app.settings.output_dir().is_none());
    }

    #[test]
    fn test_commit_extensions_normalizes() {
        let dir = tempdir().unwrap();
        let mut app = create_test_app(&dir);
        select(&mut app, SettingsField::Extensions);

        app.activate_selected_field();
        app.edit.input = "mp4, .mkv  avi,mp4".into();
        app.commit_edit();

        assert_eq!(app.settings.extensions(), [".mp4", ".mkv", ".avi"]);
    }

    #[test]
    fn test_invalid_template_keeps_editing() {
        let dir = tempdir().unwrap();
        let mut app = create_test_app(&dir);
        select(&mut app, SettingsField::CommandTemplate);

        app.activate_selected_field();
        app.edit.input = "{program} {output_dir}".into();
        app.commit_edit();

        assert_eq!(app.state, AppState::EditField);
        assert!(app.error_message.is_some());
        assert_eq!(app.settings.command_template(), "");
    }

    #[test]
    fn test_toggle_fields() {
        let dir = tempdir().unwrap();
        let mut app = create_test_app(&dir);
        select(&mut app, SettingsField::Recursive);

        app.activate_selected_field();
        assert!(!app.settings.recursive());
        assert_eq!(app.state, AppState::Main);

        app.toggle_field(SettingsField::SameAsInput);
        assert!(app.settings.output_beside_input());
        assert_eq!(app.status_message, "输出到输入目录：开");
    }

    #[test]
    fn test_toggle_logging_updates_logger_and_persists() {
        let dir = tempdir().unwrap();
        let log_file = dir.path().join("app.log");
        let mut app = create_test_app(&dir);
        app.logger = Logger::new(&log_file, true);

        app.toggle_logging();
        assert!(!app.logger.is_enabled());
        let saved = Settings::load(&app.config_path);
        assert!(!saved.logging_enabled());

        let size_when_off = std::fs::metadata(&log_file).unwrap().len();
        app.logger.info("should not appear");
        assert_eq!(std::fs::metadata(&log_file).unwrap().len(), size_when_off);

        app.toggle_logging();
        assert!(app.logger.is_enabled());
        assert!(Settings::load(&app.config_path).logging_enabled());
    }

    #[test]
    fn test_save_on_exit_records_terminal_size() {
        let dir = tempdir().unwrap();
        let mut app = create_test_app(&dir);
        app.terminal_size = Rect::new(0, 0, 120, 40);

        app.save_on_exit();

        assert_eq!(Settings::load(&app.config_path).window_size(), (120, 40));
    }

    #[test]
    fn test_load_defaults_keeps_input_dir() {
        let dir = tempdir().unwrap();
        let mut app = create_test_app(&dir);
        app.settings.set_input_dir(Some(PathBuf::from("/data")));
        app.settings.set_extensions([".mov"]);

        app.load_defaults();

        assert_eq!(app.settings.input_dir(), Some(PathBuf::from("/data").as_path()));
        assert_eq!(app.settings.extensions().len(), 5);
    }

    #[test]
    fn test_preset_save_load_delete() {
        let dir = tempdir().unwrap();
        let mut app = create_test_app(&dir);
        app.settings.set_extensions([".wav"]);
        app.save_preset("audio jobs");

        app.open_presets();
        assert_eq!(app.state, AppState::Presets);
        assert_eq!(app.presets.names, vec!["audio_jobs".to_string()]);
        assert_eq!(app.selected_preset(), Some("audio_jobs"));

        app.settings.set_extensions([".txt"]);
        app.load_selected_preset();
        assert_eq!(app.settings.extensions(), [".wav"]);
        assert_eq!(app.state, AppState::Main);

        app.open_presets();
        app.request_delete_preset();
        assert_eq!(
            app.confirm.action,
            Some(PendingAction::DeletePreset("audio_jobs".into()))
        );
        app.dismiss_confirm();
        app.delete_preset("audio_jobs");
        assert!(app.presets.names.is_empty());
        assert!(app.selected_preset().is_none());
    }

    #[test]
    fn test_save_preset_rejects_invalid_name() {
        let dir = tempdir().unwrap();
        let mut app = create_test_app(&dir);

        app.save_preset("!!!");

        assert!(app.error_message.unwrap().starts_with("保存预设失败"));
    }
}
