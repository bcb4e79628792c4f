use std::path::{Path, PathBuf};

use crate::discovery::{filter_problematic, find_files};

use super::App;

impl App {
    /// 按当前设置搜索输入目录
    ///
    /// 搜索失败时清空文件列表并显示错误。
    pub fn find_files(&mut self) {
        let Some(input_dir) = self.settings.input_dir().map(Path::to_path_buf) else {
            self.set_error("请先设置输入目录");
            return;
        };
        if self.settings.extensions().is_empty() {
            self.set_error("请至少设置一个扩展名");
            return;
        }

        self.logger.info(format!(
            "Searching {} for {} (recursive: {})",
            input_dir.display(),
            self.settings.extensions().join(", "),
            self.settings.recursive()
        ));

        let found = match find_files(
            &input_dir,
            self.settings.extensions(),
            self.settings.recursive(),
        ) {
            Ok(found) => found,
            Err(e) => {
                self.logger.error(format!("File search failed: {}", e));
                self.clear_files();
                self.set_error(format!("搜索失败: {}", e));
                return;
            }
        };

        let total = found.len();
        let files = if self.settings.skip_problematic() {
            filter_problematic(found)
        } else {
            found
        };
        let skipped = total - files.len();

        self.logger.info(format!(
            "Found {} files ({} skipped as problematic)",
            files.len(),
            skipped
        ));
        self.files = files;
        self.checked_files.clear();
        self.selected_file_index = if self.files.is_empty() { None } else { Some(0) };

        let mut message = format!("找到 {} 个文件", self.files.len());
        if skipped > 0 {
            message.push_str(&format!("，跳过 {} 个问题文件", skipped));
        }
        self.set_status(message);
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
        self.checked_files.clear();
        self.selected_file_index = None;
    }

    /// 切换光标所在文件的勾选状态
    pub fn toggle_file_checked(&mut self) {
        let Some(index) = self.selected_file_index.filter(|i| *i < self.files.len()) else {
            return;
        };
        if !self.checked_files.remove(&index) {
            self.checked_files.insert(index);
        }
    }

    /// 全部勾选；已全部勾选时取消全部
    pub fn toggle_all_checked(&mut self) {
        if !self.files.is_empty() && self.checked_files.len() == self.files.len() {
            self.checked_files.clear();
        } else {
            self.checked_files = (0..self.files.len()).collect();
        }
    }

    /// 勾选的文件路径，按列表顺序
    pub fn checked_paths(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .enumerate()
            .filter(|(i, _)| self.checked_files.contains(i))
            .map(|(_, f)| f.path.clone())
            .collect()
    }

    pub fn all_paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}
