use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::CONFIG;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

struct LoggerInner {
    enabled: bool,
    console: bool,
    log_file: Option<PathBuf>,
    tail: VecDeque<String>,
}

/// 可注入的日志句柄
///
/// 每条日志带时间戳和级别，启用时追加写入日志文件（可选同时打印到控制台），
/// 并保留最近若干行供界面日志面板显示。克隆后的句柄共享同一状态，
/// 因此后台处理线程可以持有自己的副本。
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Mutex<LoggerInner>>,
}

impl Logger {
    pub fn new(log_file: impl Into<PathBuf>, enabled: bool) -> Self {
        Self::build(Some(log_file.into()), enabled)
    }

    /// 不写文件也不记录的空日志器
    pub fn disabled() -> Self {
        Self::build(None, false)
    }

    fn build(log_file: Option<PathBuf>, enabled: bool) -> Self {
        Logger {
            inner: Arc::new(Mutex::new(LoggerInner {
                enabled,
                console: true,
                log_file,
                tail: VecDeque::with_capacity(CONFIG.log_tail_capacity),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoggerInner> {
        // 写日志的线程 panic 不应让其他线程的日志失效
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// 是否同时打印到标准输出。终端界面运行时必须关闭。
    pub fn set_console(&self, console: bool) {
        self.lock().console = console;
    }

    pub fn set_log_file(&self, log_file: impl Into<PathBuf>) {
        self.lock().log_file = Some(log_file.into());
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.lock().log_file.clone()
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::Info, message.as_ref());
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.log(Level::Warning, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::Error, message.as_ref());
    }

    /// 最近的 `n` 行日志（旧的在前）
    pub fn recent(&self, n: usize) -> Vec<String> {
        let inner = self.lock();
        let skip = inner.tail.len().saturating_sub(n);
        inner.tail.iter().skip(skip).cloned().collect()
    }

    fn log(&self, level: Level, message: &str) {
        let mut inner = self.lock();
        if !inner.enabled {
            return;
        }

        let line = format_line(level, message);

        if let Some(path) = &inner.log_file
            && let Err(e) = append_line(path, &line)
            && inner.console
        {
            eprintln!("Failed to write log file {}: {}", path.display(), e);
        }

        if inner.console {
            println!("{}", line);
        }

        if inner.tail.len() == CONFIG.log_tail_capacity {
            inner.tail.pop_front();
        }
        inner.tail.push_back(line);
    }
}

fn format_line(level: Level, message: &str) -> String {
    format!(
        "{} - {} - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        level.as_str(),
        message
    )
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn quiet_logger(path: &Path) -> Logger {
        let logger = Logger::new(path, true);
        logger.set_console(false);
        logger
    }

    #[test]
    fn test_log_line_has_timestamp_and_level() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let logger = quiet_logger(&path);

        logger.warning("disk almost full");

        let content = std::fs::read_to_string(&path).unwrap();
        let line = content.lines().next().unwrap();
        assert!(line.ends_with(" - WARNING - disk almost full"));
        // "YYYY-MM-DD HH:MM:SS"
        assert_eq!(line.find(" - "), Some(19));
    }

    #[test]
    fn test_disabled_logger_suppresses_file_writes_until_reenabled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let logger = quiet_logger(&path);

        logger.info("first");
        let before = std::fs::read_to_string(&path).unwrap();

        logger.set_enabled(false);
        logger.info("hidden");
        logger.error("hidden too");
        let during = std::fs::read_to_string(&path).unwrap();
        assert_eq!(before, during);

        logger.set_enabled(true);
        logger.info("second");
        let after = std::fs::read_to_string(&path).unwrap();
        assert_eq!(after.lines().count(), 2);
        assert!(after.contains("first"));
        assert!(after.contains("second"));
        assert!(!after.contains("hidden"));
    }

    #[test]
    fn test_logger_appends_and_creates_parent_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("nested.log");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "existing line\n").unwrap();
        let logger = quiet_logger(&path);

        logger.info("appended");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("existing line\n"));
        assert!(content.contains("INFO - appended"));
    }

    #[test]
    fn test_clones_share_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let logger = quiet_logger(&path);
        let worker_logger = logger.clone();

        logger.set_enabled(false);
        worker_logger.info("from worker");

        assert!(!path.exists());
        assert!(!worker_logger.is_enabled());
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let logger = Logger::disabled();
        logger.set_console(false);
        logger.set_enabled(true);

        logger.info("a");
        logger.info("b");
        logger.info("c");

        let recent = logger.recent(2);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].ends_with("INFO - b"));
        assert!(recent[1].ends_with("INFO - c"));
    }

    #[test]
    fn test_disabled_constructor_writes_nothing() {
        let logger = Logger::disabled();
        logger.info("nothing");
        assert!(logger.recent(10).is_empty());
        assert!(logger.log_file().is_none());
    }
}
