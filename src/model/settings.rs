use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::config::CONFIG;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid preset name: {0:?}")]
    InvalidPresetName(String),
    #[error("preset not found: {0}")]
    PresetNotFound(String),
}

/// 界面相关设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiSettings {
    pub window_size: [u16; 2],
    pub window_title: String,
}

impl Default for GuiSettings {
    fn default() -> Self {
        Self {
            window_size: CONFIG.default_window_size,
            window_title: CONFIG.default_window_title.to_string(),
        }
    }
}

/// 持久化的用户设置
///
/// 以单个 JSON 对象保存。加载时忽略未知字段、缺失字段取默认值；
/// 保存时只写出已知字段。字段只能通过 setter 修改，
/// 扩展名列表始终保持以 `.` 开头、非空且不重复。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "file_extensions")]
    extensions: Vec<String>,
    #[serde(rename = "input_directory", deserialize_with = "empty_as_none")]
    input_dir: Option<PathBuf>,
    #[serde(rename = "output_directory", deserialize_with = "empty_as_none")]
    output_dir: Option<PathBuf>,
    #[serde(rename = "processing_program", deserialize_with = "empty_as_none")]
    program_path: Option<PathBuf>,
    recursive: bool,
    command_template: String,
    env_vars: String,
    output_beside_input: bool,
    skip_problematic: bool,
    #[serde(rename = "show_command_confirm")]
    confirm_before_run: bool,
    delete_source_on_success: bool,
    process_timeout_secs: Option<u64>,
    logging_enabled: bool,
    log_file: String,
    gui: GuiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions: CONFIG
                .default_extensions
                .iter()
                .map(|s| s.to_string())
                .collect(),
            input_dir: None,
            output_dir: None,
            program_path: None,
            recursive: true,
            command_template: String::new(),
            env_vars: String::new(),
            output_beside_input: false,
            skip_problematic: true,
            confirm_before_run: false,
            delete_source_on_success: false,
            process_timeout_secs: None,
            logging_enabled: true,
            log_file: CONFIG.default_log_file.to_string(),
            gui: GuiSettings::default(),
        }
    }
}

/// 空字符串和 `null` 都视为未设置
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from))
}

/// 规范化扩展名：去空白、补 `.` 前缀、丢弃空项、去重（保持顺序）
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result: Vec<String> = Vec::new();
    for ext in extensions {
        let ext = ext.as_ref().trim();
        if ext.is_empty() || ext == "." {
            continue;
        }
        let ext = if ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{}", ext)
        };
        if !result.contains(&ext) {
            result.push(ext);
        }
    }
    result
}

/// 把预设名清理成安全的文件名；清理后为空返回 `None`
pub fn sanitize_preset_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .collect();
    let cleaned = cleaned.trim().replace(' ', "_");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

impl Settings {
    /// 应用数据目录 `~/.infini_converter`
    pub fn app_dir() -> PathBuf {
        let mut path = home::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(CONFIG.dir_name);
        path
    }

    /// 主配置文件路径
    pub fn default_path() -> PathBuf {
        Self::app_dir().join(CONFIG.settings_filename)
    }

    /// 读取设置文件
    ///
    /// # Returns
    ///
    /// 文件不存在时返回 `Ok(None)`。
    ///
    /// # Errors
    ///
    /// 文件无法读取或 JSON 格式错误时返回 [`ConfigError`]。
    pub fn try_load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Settings =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.extensions = normalize_extensions(&settings.extensions);
        Ok(Some(settings))
    }

    /// 读取设置，文件缺失或损坏时使用默认值
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(settings)) => settings,
            Ok(None) | Err(_) => Self::default(),
        }
    }

    /// 持久化保存设置
    /// # 错误
    /// 返回目录创建、序列化或写入错误
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    /// 恢复默认设置，但保留当前输入目录
    pub fn load_defaults(&mut self) {
        let input_dir = self.input_dir.take();
        *self = Self::default();
        self.input_dir = input_dir;
    }

    fn preset_path(config_path: &Path, name: &str) -> Result<PathBuf, ConfigError> {
        let safe = sanitize_preset_name(name)
            .ok_or_else(|| ConfigError::InvalidPresetName(name.to_string()))?;
        let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let path = dir.join(format!("{}.json", safe));
        // 主配置文件不作为预设读写或删除
        if path == config_path {
            return Err(ConfigError::InvalidPresetName(name.to_string()));
        }
        Ok(path)
    }

    /// 以指定名称另存一份预设（与主配置文件同目录）
    pub fn save_preset(&self, config_path: &Path, name: &str) -> Result<PathBuf, ConfigError> {
        let path = Self::preset_path(config_path, name)?;
        self.save(&path)?;
        Ok(path)
    }

    pub fn load_preset(config_path: &Path, name: &str) -> Result<Self, ConfigError> {
        let path = Self::preset_path(config_path, name)?;
        Self::try_load(&path)?.ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))
    }

    pub fn delete_preset(config_path: &Path, name: &str) -> Result<(), ConfigError> {
        let path = Self::preset_path(config_path, name)?;
        if !path.exists() {
            return Err(ConfigError::PresetNotFound(name.to_string()));
        }
        std::fs::remove_file(&path).map_err(|source| ConfigError::Io { path, source })
    }

    /// 列出已保存的预设名（不含主配置文件），按名称排序
    pub fn list_presets(config_path: &Path) -> Vec<String> {
        let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.as_path() != config_path)
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.to_string())
            })
            .collect();
        names.sort();
        names
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn set_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = normalize_extensions(extensions);
    }

    pub fn add_extension(&mut self, extension: &str) {
        let mut all = self.extensions.clone();
        all.push(extension.to_string());
        self.extensions = normalize_extensions(all);
    }

    pub fn remove_extension(&mut self, extension: &str) {
        if let Some(target) = normalize_extensions([extension]).pop() {
            self.extensions.retain(|e| *e != target);
        }
    }

    pub fn input_dir(&self) -> Option<&Path> {
        self.input_dir.as_deref()
    }

    pub fn set_input_dir(&mut self, dir: Option<PathBuf>) {
        self.input_dir = dir.filter(|p| !p.as_os_str().is_empty());
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn set_output_dir(&mut self, dir: Option<PathBuf>) {
        self.output_dir = dir.filter(|p| !p.as_os_str().is_empty());
    }

    pub fn program_path(&self) -> Option<&Path> {
        self.program_path.as_deref()
    }

    pub fn set_program_path(&mut self, path: Option<PathBuf>) {
        self.program_path = path.filter(|p| !p.as_os_str().is_empty());
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn set_recursive(&mut self, recursive: bool) {
        self.recursive = recursive;
    }

    pub fn command_template(&self) -> &str {
        &self.command_template
    }

    pub fn set_command_template(&mut self, template: impl Into<String>) {
        self.command_template = template.into().trim().to_string();
    }

    pub fn env_vars(&self) -> &str {
        &self.env_vars
    }

    pub fn set_env_vars(&mut self, env_vars: impl Into<String>) {
        self.env_vars = env_vars.into().trim().to_string();
    }

    /// 解析 `KEY=VALUE KEY2=VALUE2` 形式的环境变量，忽略不含 `=` 的片段
    pub fn parsed_env_vars(&self) -> Vec<(String, String)> {
        self.env_vars
            .split_whitespace()
            .filter_map(|pair| pair.split_once('='))
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    pub fn output_beside_input(&self) -> bool {
        self.output_beside_input
    }

    pub fn set_output_beside_input(&mut self, enabled: bool) {
        self.output_beside_input = enabled;
    }

    pub fn skip_problematic(&self) -> bool {
        self.skip_problematic
    }

    pub fn set_skip_problematic(&mut self, enabled: bool) {
        self.skip_problematic = enabled;
    }

    pub fn confirm_before_run(&self) -> bool {
        self.confirm_before_run
    }

    pub fn set_confirm_before_run(&mut self, enabled: bool) {
        self.confirm_before_run = enabled;
    }

    pub fn delete_source_on_success(&self) -> bool {
        self.delete_source_on_success
    }

    pub fn set_delete_source_on_success(&mut self, enabled: bool) {
        self.delete_source_on_success = enabled;
    }

    pub fn process_timeout(&self) -> Option<Duration> {
        self.process_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn set_process_timeout_secs(&mut self, secs: Option<u64>) {
        self.process_timeout_secs = secs.filter(|s| *s > 0);
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    pub fn set_logging_enabled(&mut self, enabled: bool) {
        self.logging_enabled = enabled;
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    pub fn set_log_file(&mut self, log_file: impl Into<String>) {
        self.log_file = log_file.into();
    }

    /// 日志文件的实际路径；相对路径以 `base_dir` 为基准
    pub fn resolved_log_file(&self, base_dir: &Path) -> PathBuf {
        let path = PathBuf::from(&self.log_file);
        if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        }
    }

    pub fn window_size(&self) -> (u16, u16) {
        (self.gui.window_size[0], self.gui.window_size[1])
    }

    pub fn set_window_size(&mut self, width: u16, height: u16) {
        self.gui.window_size = [width, height];
    }

    pub fn window_title(&self) -> &str {
        &self.gui.window_title
    }

    pub fn set_window_title(&mut self, title: impl Into<String>) {
        self.gui.window_title = title.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fully_populated() -> Settings {
        let mut settings = Settings::default();
        settings.set_extensions(["mp4", ".mkv"]);
        settings.set_input_dir(Some(PathBuf::from("/media/in")));
        settings.set_output_dir(Some(PathBuf::from("/media/out")));
        settings.set_program_path(Some(PathBuf::from("/usr/bin/ffmpeg")));
        settings.set_recursive(false);
        settings.set_command_template("{program} -i {input} {output_file}");
        settings.set_env_vars("LANG=C THREADS=4");
        settings.set_output_beside_input(true);
        settings.set_skip_problematic(false);
        settings.set_confirm_before_run(true);
        settings.set_delete_source_on_success(true);
        settings.set_process_timeout_secs(Some(30));
        settings.set_logging_enabled(false);
        settings.set_log_file("/var/log/ic.log");
        settings.set_window_size(120, 40);
        settings.set_window_title("Converter");
        settings
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(
            settings.extensions(),
            &[".txt", ".csv", ".json", ".xml", ".log"]
        );
        assert!(settings.output_dir().is_none());
        assert!(settings.program_path().is_none());
        assert!(settings.logging_enabled());
        assert_eq!(settings.log_file(), "infini_converter.log");
        assert_eq!(settings.window_size(), (800, 600));
        assert_eq!(settings.window_title(), "Infini Converter");
        assert!(settings.process_timeout().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips_every_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = fully_populated();

        settings.save(&path).unwrap();
        let loaded = Settings::try_load(&path).unwrap().unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_round_trip_empty_extensions_and_absent_output_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut settings = Settings::default();
        settings.set_extensions(Vec::<String>::new());
        settings.set_output_dir(None);

        settings.save(&path).unwrap();
        let loaded = Settings::load(&path);

        assert!(loaded.extensions().is_empty());
        assert!(loaded.output_dir().is_none());
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        assert!(Settings::try_load(&path).unwrap().is_none());
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_load_malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Settings::try_load(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_load_ignores_unknown_fields_and_accepts_legacy_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "file_extensions": ["txt", ".csv", ".csv"],
                "output_directory": "",
                "processing_program": null,
                "logging_enabled": false,
                "some_future_key": 42,
                "gui": { "window_size": [1024, 768] }
            }"#,
        )
        .unwrap();

        let settings = Settings::load(&path);

        assert_eq!(settings.extensions(), &[".txt", ".csv"]);
        assert!(settings.output_dir().is_none());
        assert!(settings.program_path().is_none());
        assert!(!settings.logging_enabled());
        assert_eq!(settings.window_size(), (1024, 768));
        assert_eq!(settings.window_title(), "Infini Converter");

        settings.save(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("some_future_key"));
    }

    #[test]
    fn test_normalize_extensions() {
        assert_eq!(
            normalize_extensions([" txt ", ".csv", "", ".", "txt", ".CSV"]),
            vec![".txt", ".csv", ".CSV"]
        );
    }

    #[test]
    fn test_add_and_remove_extension() {
        let mut settings = Settings::default();
        settings.set_extensions([".txt"]);

        settings.add_extension("md");
        settings.add_extension(".txt");
        assert_eq!(settings.extensions(), &[".txt", ".md"]);

        settings.remove_extension("txt");
        assert_eq!(settings.extensions(), &[".md"]);
    }

    #[test]
    fn test_load_defaults_preserves_input_dir() {
        let mut settings = fully_populated();

        settings.load_defaults();

        assert_eq!(settings.input_dir(), Some(Path::new("/media/in")));
        assert!(settings.output_dir().is_none());
        assert_eq!(settings.extensions(), Settings::default().extensions());
    }

    #[test]
    fn test_parsed_env_vars_skips_invalid_pairs() {
        let mut settings = Settings::default();
        settings.set_env_vars("A=1 broken =nokey B=x=y");

        assert_eq!(
            settings.parsed_env_vars(),
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "x=y".to_string())
            ]
        );
    }

    #[test]
    fn test_resolved_log_file() {
        let mut settings = Settings::default();
        let base = Path::new("/home/user/.infini_converter");
        assert_eq!(
            settings.resolved_log_file(base),
            base.join("infini_converter.log")
        );

        settings.set_log_file("/tmp/abs.log");
        assert_eq!(settings.resolved_log_file(base), PathBuf::from("/tmp/abs.log"));
    }

    #[test]
    fn test_sanitize_preset_name() {
        assert_eq!(sanitize_preset_name("My Preset!"), Some("My_Preset".into()));
        assert_eq!(sanitize_preset_name("  ../../x  "), Some("x".into()));
        assert_eq!(sanitize_preset_name("?!*"), None);
    }

    #[test]
    fn test_presets_save_list_load_delete() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        Settings::default().save(&config_path).unwrap();
        let settings = fully_populated();

        let saved = settings.save_preset(&config_path, "video job").unwrap();
        assert_eq!(saved, dir.path().join("video_job.json"));
        Settings::default().save_preset(&config_path, "basic").unwrap();

        assert_eq!(Settings::list_presets(&config_path), vec!["basic", "video_job"]);

        let loaded = Settings::load_preset(&config_path, "video job").unwrap();
        assert_eq!(loaded, settings);

        Settings::delete_preset(&config_path, "basic").unwrap();
        assert_eq!(Settings::list_presets(&config_path), vec!["video_job"]);
        assert!(matches!(
            Settings::load_preset(&config_path, "basic"),
            Err(ConfigError::PresetNotFound(_))
        ));
    }

    #[test]
    fn test_save_preset_rejects_invalid_and_main_config_names() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let settings = Settings::default();

        assert!(matches!(
            settings.save_preset(&config_path, "***"),
            Err(ConfigError::InvalidPresetName(_))
        ));
        assert!(matches!(
            settings.save_preset(&config_path, "config"),
            Err(ConfigError::InvalidPresetName(_))
        ));
    }

    #[test]
    fn test_main_config_cannot_be_loaded_or_deleted_as_preset() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        Settings::default().save(&config_path).unwrap();

        assert!(matches!(
            Settings::load_preset(&config_path, "config"),
            Err(ConfigError::InvalidPresetName(_))
        ));
        assert!(matches!(
            Settings::delete_preset(&config_path, "config"),
            Err(ConfigError::InvalidPresetName(_))
        ));
        assert!(config_path.exists());
    }
}
