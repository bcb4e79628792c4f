use std::path::PathBuf;
use std::sync::mpsc::TryRecvError;

use crate::discovery::snapshot_dir;
use crate::logger::Logger;
use crate::processor::{
    BatchState, FileProcessor, OutputTarget, ProcessMessage, ProcessingStatus, ProcessorConfig,
};
use crate::state::PendingAction;

use super::{App, BatchContext};

impl App {
    /// 处理勾选的文件
    pub fn process_selected(&mut self) {
        let paths = self.checked_paths();
        if paths.is_empty() {
            self.set_error("未选择文件（Space 勾选，a 全选）");
            return;
        }
        self.request_processing(paths);
    }

    /// 处理列表中的全部文件
    pub fn process_all(&mut self) {
        let paths = self.all_paths();
        if paths.is_empty() {
            self.set_error("文件列表为空，请先按 f 搜索");
            return;
        }
        self.request_processing(paths);
    }

    fn processor_config(&mut self) -> Option<ProcessorConfig> {
        match ProcessorConfig::from_settings(&self.settings) {
            Ok(config) => Some(config),
            Err(e) => {
                self.logger.error(format!("Cannot start processing: {}", e));
                self.set_error(format!("无法开始处理: {}", e));
                None
            }
        }
    }

    fn reject_if_busy(&mut self) -> bool {
        if self.is_processing() {
            self.logger
                .warning("Processing request rejected: a batch is already running");
            self.set_error("正在处理中，请等待完成或按 x 停止");
            return true;
        }
        false
    }

    /// 校验设置，需要时先弹出确认对话框，然后开始处理
    pub fn request_processing(&mut self, paths: Vec<PathBuf>) {
        if self.reject_if_busy() {
            return;
        }
        let Some(config) = self.processor_config() else {
            return;
        };

        if self.settings.confirm_before_run() {
            let processor = FileProcessor::new(config, Logger::disabled());
            let mut lines = vec![format!("将处理 {} 个文件", paths.len())];
            if let Some(first) = paths.first()
                && let Ok(command) = processor.preview_command(first)
            {
                lines.push(format!("命令: {}", command));
            }
            self.ask_confirm(PendingAction::Process(paths), lines);
            return;
        }

        self.start_processing(paths);
    }

    /// 在后台线程启动批处理
    pub fn start_processing(&mut self, paths: Vec<PathBuf>) {
        if self.reject_if_busy() {
            return;
        }
        let Some(config) = self.processor_config() else {
            return;
        };

        let output_snapshot = match &config.output {
            OutputTarget::Directory(dir) => Some((dir.clone(), snapshot_dir(dir))),
            OutputTarget::BesideInput => None,
        };
        self.batch_context = Some(BatchContext {
            output_snapshot,
            first_result: self.results.len(),
        });
        self.new_outputs.clear();

        let total = paths.len();
        self.status = ProcessingStatus::default();
        self.status.apply(&ProcessMessage::Started { total });

        let processor = FileProcessor::new(config, self.logger.clone());
        self.batch = Some(processor.process_files_async(paths));
        self.set_status(format!("开始处理 {} 个文件", total));
    }

    /// 请求停止；当前文件处理完后生效
    pub fn stop_processing(&mut self) {
        match &self.batch {
            Some(batch) => {
                batch.stop();
                self.logger.info("Stop processing requested");
                self.set_status("正在停止，当前文件完成后结束");
            }
            None => self.set_status("没有正在运行的处理"),
        }
    }

    /// 轮询后台处理消息（主循环中调用）
    pub fn poll_processing(&mut self) {
        let Some(batch) = &self.batch else { return };

        let mut messages = Vec::new();
        let mut disconnected = false;
        loop {
            match batch.try_recv() {
                Ok(msg) => {
                    let done = matches!(msg, ProcessMessage::Finished(_));
                    messages.push(msg);
                    if done {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        for msg in messages {
            self.handle_process_message(msg);
        }

        if disconnected && self.batch.is_some() {
            self.worker_disconnected();
        }
    }

    /// 退出前停止批处理并阻塞等待当前文件完成
    ///
    /// 让正在运行的外部程序正常结束（或按超时被杀掉），保留该文件的结果和批次汇总日志。
    pub fn finish_processing_before_exit(&mut self) {
        let Some(batch) = &self.batch else { return };
        batch.stop();
        self.logger
            .info("Exit requested, waiting for the current file to finish");

        while let Some(batch) = &self.batch {
            match batch.recv() {
                Some(msg) => self.handle_process_message(msg),
                None => self.worker_disconnected(),
            }
        }
    }

    // 线程在发送 Finished 之前退出
    fn worker_disconnected(&mut self) {
        self.logger
            .error("Processing thread exited before finishing the batch");
        self.handle_process_message(ProcessMessage::Finished(BatchState::Failed(
            "处理线程意外退出".into(),
        )));
    }

    fn handle_process_message(&mut self, msg: ProcessMessage) {
        self.status.apply(&msg);
        match msg {
            ProcessMessage::FileStarted { index, path } => {
                let name = path
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.set_status(format!(
                    "正在处理 ({}/{}): {}",
                    index + 1,
                    self.status.total,
                    name
                ));
            }
            ProcessMessage::FileFinished { result, .. } => {
                self.results.push(result);
            }
            ProcessMessage::Finished(state) => self.finish_batch(state),
            ProcessMessage::Started { .. } | ProcessMessage::FileProgress { .. } => {}
        }
    }

    fn finish_batch(&mut self, mut state: BatchState) {
        if let Some(batch) = self.batch.take()
            && !batch.join()
            && !matches!(state, BatchState::Failed(_))
        {
            state = BatchState::Failed("处理线程崩溃".into());
            self.status.state = state.clone();
        }

        let context = self.batch_context.take();
        let first_result = context
            .as_ref()
            .map(|c| c.first_result)
            .unwrap_or(0)
            .min(self.results.len());

        self.new_outputs = match context.and_then(|c| c.output_snapshot) {
            Some((dir, before)) => snapshot_dir(&dir).difference(&before).cloned().collect(),
            None => self.results[first_result..]
                .iter()
                .filter(|r| r.success && r.output_exists)
                .map(|r| r.output_path.clone())
                .collect(),
        };

        let deleted = if self.settings.delete_source_on_success() {
            self.delete_processed_sources(first_result)
        } else {
            0
        };

        self.logger.info(format!(
            "Batch finished ({:?}): {} succeeded, {} failed, {} new output files",
            state,
            self.status.succeeded(),
            self.status.failed,
            self.new_outputs.len()
        ));

        if deleted > 0 && self.settings.input_dir().is_some() {
            self.find_files();
        }

        match state {
            BatchState::Completed => self.set_status(format!(
                "处理完成：成功 {}，失败 {}，新文件 {}",
                self.status.succeeded(),
                self.status.failed,
                self.new_outputs.len()
            )),
            BatchState::Stopped => self.set_status(format!(
                "已停止：完成 {}/{}",
                self.status.completed, self.status.total
            )),
            BatchState::Failed(reason) => {
                self.set_status("处理失败");
                self.set_error(format!("处理失败: {}", reason));
            }
            BatchState::Idle | BatchState::Running => {}
        }
    }

    /// 删除本批次成功处理的源文件，返回删除数量
    fn delete_processed_sources(&mut self, first_result: usize) -> usize {
        let targets: Vec<PathBuf> = self.results[first_result..]
            .iter()
            .filter(|r| r.success && r.output_path != r.input_path)
            .map(|r| r.input_path.clone())
            .collect();

        let mut deleted = 0;
        for path in targets {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    deleted += 1;
                    self.logger
                        .info(format!("Deleted source file {}", path.display()));
                }
                Err(e) => self.logger.warning(format!(
                    "Failed to delete source file {}: {}",
                    path.display(),
                    e
                )),
            }
        }
        deleted
    }

    /// 清空结果列表
    pub fn clear_results(&mut self) {
        self.results.clear();
        self.selected_result_index = None;
        self.new_outputs.clear();
        if let Some(context) = self.batch_context.as_mut() {
            context.first_result = 0;
        }
        self.set_status("结果已清空");
    }
}
