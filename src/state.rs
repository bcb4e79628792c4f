#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AppState {
    /// 主界面：设置面板 + 文件列表
    #[default]
    Main,
    /// 正在编辑设置面板中的文本字段
    EditField,
    /// 处理结果列表
    Results,
    /// 预设列表
    Presets,
    /// 运行前的命令确认对话框
    Confirm,
}

/// 主界面中获得焦点的面板
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Focus {
    #[default]
    Settings,
    Files,
}

impl Focus {
    pub fn toggle(self) -> Self {
        match self {
            Focus::Settings => Focus::Files,
            Focus::Files => Focus::Settings,
        }
    }
}

/// 设置面板的条目，顺序即显示顺序
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SettingsField {
    InputDir,
    OutputDir,
    SameAsInput,
    Program,
    EnvVars,
    CommandTemplate,
    Extensions,
    Recursive,
    SkipProblematic,
    ConfirmBeforeRun,
    DeleteSource,
    Logging,
}

impl SettingsField {
    pub const ALL: [SettingsField; 12] = [
        SettingsField::InputDir,
        SettingsField::OutputDir,
        SettingsField::SameAsInput,
        SettingsField::Program,
        SettingsField::EnvVars,
        SettingsField::CommandTemplate,
        SettingsField::Extensions,
        SettingsField::Recursive,
        SettingsField::SkipProblematic,
        SettingsField::ConfirmBeforeRun,
        SettingsField::DeleteSource,
        SettingsField::Logging,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::InputDir => "输入目录",
            SettingsField::OutputDir => "输出目录",
            SettingsField::SameAsInput => "输出到输入目录",
            SettingsField::Program => "处理程序",
            SettingsField::EnvVars => "环境变量",
            SettingsField::CommandTemplate => "命令模板",
            SettingsField::Extensions => "扩展名",
            SettingsField::Recursive => "递归搜索",
            SettingsField::SkipProblematic => "跳过问题文件",
            SettingsField::ConfirmBeforeRun => "运行前确认",
            SettingsField::DeleteSource => "成功后删除源文件",
            SettingsField::Logging => "日志",
        }
    }

    /// 开关类条目按 Enter 直接切换，其余进入编辑模式
    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            SettingsField::SameAsInput
                | SettingsField::Recursive
                | SettingsField::SkipProblematic
                | SettingsField::ConfirmBeforeRun
                | SettingsField::DeleteSource
                | SettingsField::Logging
        )
    }
}

/// 确认对话框要执行的操作
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingAction {
    /// 开始处理这些文件
    Process(Vec<std::path::PathBuf>),
    /// 删除指定预设
    DeletePreset(String),
}
