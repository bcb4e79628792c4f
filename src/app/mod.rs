use anyhow::{Context, Result};
use ratatui::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use crate::discovery::DiscoveredFile;
use crate::logger::Logger;
use crate::model::Settings;
use crate::processor::{BatchHandle, ProcessingResult, ProcessingStatus};
use crate::state::{AppState, Focus, PendingAction, SettingsField};

mod discovery_ops;
mod processing_ops;
mod settings_ops;

/// 设置字段编辑状态
#[derive(Default)]
pub struct EditState {
    /// 正在编辑的字段
    pub field: Option<SettingsField>,
    /// 输入框内容
    pub input: String,
}

impl EditState {
    pub fn clear(&mut self) {
        self.field = None;
        self.input.clear();
    }
}

/// 预设列表状态
#[derive(Default)]
pub struct PresetsState {
    pub names: Vec<String>,
    pub selected_index: Option<usize>,
    /// 是否正在输入新预设名
    pub naming: bool,
    pub input: String,
}

/// 确认对话框状态
#[derive(Default)]
pub struct ConfirmState {
    pub action: Option<PendingAction>,
    /// 对话框正文
    pub lines: Vec<String>,
    /// 关闭对话框后回到的界面
    pub return_state: AppState,
}

/// 一次批处理开始时记录的上下文，用于结束后统计新生成的文件
pub struct BatchContext {
    /// 固定输出目录及其开始前的文件快照；输出到输入目录时为 `None`
    pub output_snapshot: Option<(PathBuf, BTreeSet<PathBuf>)>,
    /// 本批次第一个结果在 `results` 中的位置
    pub first_result: usize,
}

pub struct App {
    /// 当前界面
    pub state: AppState,
    /// 主界面焦点面板
    pub focus: Focus,
    pub settings: Settings,
    /// 主配置文件路径（预设保存在同一目录）
    pub config_path: PathBuf,
    pub logger: Logger,

    /// 最近一次搜索到的文件
    pub files: Vec<DiscoveredFile>,
    /// 文件列表光标
    pub selected_file_index: Option<usize>,
    /// 勾选的文件索引
    pub checked_files: HashSet<usize>,
    /// 设置面板光标
    pub selected_field_index: Option<usize>,

    /// 批处理进度（仅在界面线程修改）
    pub status: ProcessingStatus,
    /// 状态栏文字
    pub status_message: String,
    /// 累计的处理结果，用户手动清空
    pub results: Vec<ProcessingResult>,
    pub selected_result_index: Option<usize>,
    /// 正在运行的后台批处理
    pub batch: Option<BatchHandle>,
    pub batch_context: Option<BatchContext>,
    /// 最近一次批处理新生成的输出文件
    pub new_outputs: Vec<PathBuf>,

    pub edit: EditState,
    pub presets: PresetsState,
    pub confirm: ConfirmState,

    /// 错误消息（用于在状态栏显示错误提示）
    pub error_message: Option<String>,
    /// 退出标志位
    pub should_quit: bool,
    /// 终端尺寸缓存
    pub terminal_size: Rect,
}

impl App {
    /// 初始化应用程序
    ///
    /// 读取 `~/.infini_converter/config.json`，文件损坏时使用默认设置并记录警告。
    pub fn new() -> Result<Self> {
        let app_dir = Settings::app_dir();
        std::fs::create_dir_all(&app_dir)
            .with_context(|| format!("failed to create {}", app_dir.display()))?;

        let config_path = Settings::default_path();
        let (settings, load_error) = match Settings::try_load(&config_path) {
            Ok(Some(settings)) => (settings, None),
            Ok(None) => (Settings::default(), None),
            Err(e) => (Settings::default(), Some(e)),
        };

        let logger = Logger::new(
            settings.resolved_log_file(&app_dir),
            settings.logging_enabled(),
        );
        logger.set_console(false);
        if let Some(e) = load_error {
            logger.warning(format!("Failed to load settings, using defaults: {}", e));
        }
        logger.info(format!("{} started", settings.window_title()));

        Ok(Self::with_settings(settings, config_path, logger))
    }

    pub fn with_settings(settings: Settings, config_path: PathBuf, logger: Logger) -> Self {
        App {
            state: AppState::Main,
            focus: Focus::Settings,
            settings,
            config_path,
            logger,
            files: Vec::new(),
            selected_file_index: None,
            checked_files: HashSet::new(),
            selected_field_index: Some(0),
            status: ProcessingStatus::default(),
            status_message: "就绪".to_string(),
            results: Vec::new(),
            selected_result_index: None,
            batch: None,
            batch_context: None,
            new_outputs: Vec::new(),
            edit: EditState::default(),
            presets: PresetsState::default(),
            confirm: ConfirmState::default(),
            error_message: None,
            should_quit: false,
            terminal_size: Rect::default(),
        }
    }

    /// 设置错误消息
    ///
    /// 错误消息将在下一帧渲染时显示给用户。
    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error_message = Some(msg.into());
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// 当前光标所在的设置条目
    pub fn selected_field(&self) -> Option<SettingsField> {
        self.selected_field_index
            .and_then(|i| SettingsField::ALL.get(i).copied())
    }

    pub fn is_processing(&self) -> bool {
        self.batch.is_some()
    }

    /// 打开确认对话框
    pub fn ask_confirm(&mut self, action: PendingAction, lines: Vec<String>) {
        self.confirm = ConfirmState {
            action: Some(action),
            lines,
            return_state: self.state,
        };
        self.state = AppState::Confirm;
    }

    /// 关闭确认对话框，返回对话框打开前的界面
    pub fn dismiss_confirm(&mut self) -> Option<PendingAction> {
        self.state = self.confirm.return_state;
        self.confirm.lines.clear();
        self.confirm.action.take()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// 测试用应用：配置文件位于临时目录，日志关闭
    pub(crate) fn create_test_app(dir: &TempDir) -> App {
        App::with_settings(
            Settings::default(),
            dir.path().join("config").join("config.json"),
            Logger::disabled(),
        )
    }

    #[test]
    fn test_with_settings_starts_idle_on_main() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_test_app(&dir);

        assert_eq!(app.state, AppState::Main);
        assert_eq!(app.focus, Focus::Settings);
        assert_eq!(app.selected_field(), Some(SettingsField::InputDir));
        assert!(!app.is_processing());
        assert!(app.results.is_empty());
    }

    #[test]
    fn test_confirm_returns_to_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = create_test_app(&dir);
        app.state = AppState::Presets;

        app.ask_confirm(
            PendingAction::DeletePreset("video".into()),
            vec!["删除预设 video？".into()],
        );
        assert_eq!(app.state, AppState::Confirm);

        let action = app.dismiss_confirm();
        assert_eq!(action, Some(PendingAction::DeletePreset("video".into())));
        assert_eq!(app.state, AppState::Presets);
        assert!(app.confirm.lines.is_empty());
    }

    #[test]
    fn test_edit_state_clear() {
        let mut edit = EditState {
            field: Some(SettingsField::Program),
            input: "/bin/true".into(),
        };
        edit.clear();
        assert!(edit.field.is_none());
        assert!(edit.input.is_empty());
    }
}
