/// 应用程序配置常量
pub struct AppConfig {
    /// 应用目录名称（位于用户主目录下）
    pub dir_name: &'static str,
    /// 主配置文件名
    pub settings_filename: &'static str,
    /// 默认搜索的文件扩展名
    pub default_extensions: &'static [&'static str],
    /// 默认日志文件名
    pub default_log_file: &'static str,
    /// 默认窗口标题
    pub default_window_title: &'static str,
    /// 默认窗口尺寸
    pub default_window_size: [u16; 2],
    /// 输出文件名后缀（`<stem><suffix><ext>`）
    pub output_suffix: &'static str,
    /// 可能是临时文件或未完成文件的文件名片段
    pub problematic_patterns: &'static [&'static str],
    /// 小于该字节数的文件被视为未完成
    pub min_file_size: u64,
    /// 日志面板保留的最大行数
    pub log_tail_capacity: usize,
    /// 主循环刷新间隔（毫秒）
    pub tick_rate_ms: u64,
    /// 等待子进程输出时的轮询间隔（毫秒）
    pub child_poll_ms: u64,
    /// 超时杀掉子进程后，等待输出管道关闭的最长时间（毫秒）
    pub kill_grace_ms: u64,
}

impl AppConfig {
    /// 创建默认配置
    pub const fn default() -> Self {
        Self {
            dir_name: ".infini_converter",
            settings_filename: "config.json",
            default_extensions: &[".txt", ".csv", ".json", ".xml", ".log"],
            default_log_file: "infini_converter.log",
            default_window_title: "Infini Converter",
            default_window_size: [800, 600],
            output_suffix: "_processed",
            problematic_patterns: &[".part", ".tmp", ".temp", ".bak", ".swp", ".DS_Store"],
            min_file_size: 50,
            log_tail_capacity: 200,
            tick_rate_ms: 100,
            child_poll_ms: 50,
            kill_grace_ms: 500,
        }
    }
}

/// 全局配置实例
pub const CONFIG: AppConfig = AppConfig::default();
