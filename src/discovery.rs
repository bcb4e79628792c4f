use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::CONFIG;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("directory does not exist: {0}")]
    NotFound(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// 扫描时的文件快照，文件系统随后变化不会使其失效
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl DiscoveredFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// 文件名是否以任一扩展名结尾（区分大小写）
fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
        return false;
    };
    extensions.iter().any(|ext| !ext.is_empty() && name.ends_with(ext.as_str()))
}

/// 在目录中查找指定扩展名的文件
///
/// # Arguments
///
/// * `root` - 要扫描的目录
/// * `extensions` - 扩展名列表，如 `[".txt", ".csv"]`
/// * `recursive` - 是否递归扫描子目录；否则只列出顶层目录
///
/// # Returns
///
/// 按路径排序的文件列表。
///
/// # Errors
///
/// `root` 不存在或不是目录时返回 [`DiscoveryError`]。
pub fn find_files(
    root: &Path,
    extensions: &[String],
    recursive: bool,
) -> Result<Vec<DiscoveredFile>, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root).min_depth(1);
    let walker = if recursive {
        walker
    } else {
        walker.max_depth(1)
    };

    let mut files: Vec<DiscoveredFile> = walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| matches_extension(entry.path(), extensions))
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            Some(DiscoveredFile {
                path: entry.into_path(),
                size: meta.len(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            })
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// 文件名是否像临时文件、备份文件或下载中的文件
pub fn is_problematic_name(name: &str) -> bool {
    CONFIG
        .problematic_patterns
        .iter()
        .any(|pattern| name.contains(pattern))
}

/// 过滤掉可能导致处理失败的文件：临时/备份文件和过小（可能未写完）的文件
pub fn filter_problematic(files: Vec<DiscoveredFile>) -> Vec<DiscoveredFile> {
    files
        .into_iter()
        .filter(|f| !is_problematic_name(&f.file_name()) && f.size >= CONFIG.min_file_size)
        .collect()
}

/// 按文件大小过滤（闭区间），`max` 为 `None` 表示不限上限
pub fn filter_by_size(files: Vec<DiscoveredFile>, min: u64, max: Option<u64>) -> Vec<DiscoveredFile> {
    files
        .into_iter()
        .filter(|f| f.size >= min && max.is_none_or(|max| f.size <= max))
        .collect()
}

/// 按修改时间过滤（闭区间）
pub fn filter_by_modified(
    files: Vec<DiscoveredFile>,
    after: Option<SystemTime>,
    before: Option<SystemTime>,
) -> Vec<DiscoveredFile> {
    files
        .into_iter()
        .filter(|f| after.is_none_or(|t| f.modified >= t))
        .filter(|f| before.is_none_or(|t| f.modified <= t))
        .collect()
}

/// 目录下（不递归）的普通文件集合；目录不存在时为空
pub fn snapshot_dir(dir: &Path) -> BTreeSet<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return BTreeSet::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect()
}
