use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread::JoinHandle;

use super::ProcessingResult;

/// 一次批处理的状态机：Idle → Running → (Completed | Stopped | Failed)
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    /// 所有文件都已处理（其中可以有失败的文件）
    Completed,
    /// 用户请求停止，剩余文件未开始
    Stopped,
    /// 后台线程意外终止
    Failed(String),
}

impl BatchState {
    pub fn is_running(&self) -> bool {
        matches!(self, BatchState::Running)
    }
}

/// 后台处理线程发往界面线程的消息
#[derive(Debug, Clone)]
pub enum ProcessMessage {
    Started { total: usize },
    FileStarted { index: usize, path: PathBuf },
    /// 从外部程序输出中解析到的单文件进度
    FileProgress { index: usize, percent: f32 },
    FileFinished { index: usize, result: ProcessingResult },
    Finished(BatchState),
}

/// 批处理进度。只由界面线程通过 [`ProcessingStatus::apply`] 修改。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingStatus {
    pub total: usize,
    /// 已结束的文件数（成功和失败都计入）
    pub completed: usize,
    pub failed: usize,
    pub current_file: Option<PathBuf>,
    pub file_progress: Option<f32>,
    pub state: BatchState,
}

impl ProcessingStatus {
    pub fn apply(&mut self, msg: &ProcessMessage) {
        match msg {
            ProcessMessage::Started { total } => {
                *self = ProcessingStatus {
                    total: *total,
                    state: BatchState::Running,
                    ..Default::default()
                };
            }
            ProcessMessage::FileStarted { path, .. } => {
                self.current_file = Some(path.clone());
                self.file_progress = None;
            }
            ProcessMessage::FileProgress { percent, .. } => {
                self.file_progress = Some(*percent);
            }
            ProcessMessage::FileFinished { result, .. } => {
                self.completed += 1;
                if !result.success {
                    self.failed += 1;
                }
                self.current_file = None;
                self.file_progress = None;
            }
            ProcessMessage::Finished(state) => {
                self.state = state.clone();
                self.current_file = None;
                self.file_progress = None;
            }
        }
    }

    pub fn succeeded(&self) -> usize {
        self.completed - self.failed
    }

    /// 总体进度（0–100），包含当前文件的部分进度
    pub fn overall_percent(&self) -> f64 {
        if self.total == 0 {
            return match self.state {
                BatchState::Completed => 100.0,
                _ => 0.0,
            };
        }
        let partial = self.file_progress.map(|p| p as f64 / 100.0).unwrap_or(0.0);
        ((self.completed as f64 + partial) / self.total as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// 协作式取消标志，在每个文件开始前检查
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 一次后台批处理：消息接收端、取消标志和线程句柄
pub struct BatchHandle {
    rx: Receiver<ProcessMessage>,
    stop: StopHandle,
    thread: Option<JoinHandle<()>>,
}

impl BatchHandle {
    pub fn new(
        rx: Receiver<ProcessMessage>,
        stop: StopHandle,
        thread: Option<JoinHandle<()>>,
    ) -> Self {
        Self { rx, stop, thread }
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// 非阻塞地取出下一条消息
    ///
    /// 线程结束且消息取尽后返回 `Err(TryRecvError::Disconnected)`。
    pub fn try_recv(&self) -> Result<ProcessMessage, TryRecvError> {
        self.rx.try_recv()
    }

    /// 阻塞等待下一条消息，线程结束后返回 `None`
    pub fn recv(&self) -> Option<ProcessMessage> {
        self.rx.recv().ok()
    }

    /// 等待后台线程退出；线程 panic 时返回 `false`
    pub fn join(mut self) -> bool {
        match self.thread.take() {
            Some(thread) => thread.join().is_ok(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(success: bool) -> ProcessingResult {
        ProcessingResult {
            input_path: PathBuf::from("in.txt"),
            output_path: PathBuf::from("out/in_processed.txt"),
            exit_code: Some(if success { 0 } else { 1 }),
            success,
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_tracks_counts_and_state() {
        let mut status = ProcessingStatus::default();
        let messages = vec![
            ProcessMessage::Started { total: 3 },
            ProcessMessage::FileStarted {
                index: 0,
                path: PathBuf::from("a"),
            },
            ProcessMessage::FileProgress {
                index: 0,
                percent: 50.0,
            },
        ];
        for msg in &messages {
            status.apply(msg);
        }
        assert_eq!(status.state, BatchState::Running);
        assert_eq!(status.current_file, Some(PathBuf::from("a")));
        assert!((status.overall_percent() - 50.0 / 3.0).abs() < 1e-6);

        status.apply(&ProcessMessage::FileFinished {
            index: 0,
            result: result(true),
        });
        status.apply(&ProcessMessage::FileFinished {
            index: 1,
            result: result(false),
        });
        status.apply(&ProcessMessage::Finished(BatchState::Stopped));

        assert_eq!(status.completed, 2);
        assert_eq!(status.failed, 1);
        assert_eq!(status.succeeded(), 1);
        assert_eq!(status.state, BatchState::Stopped);
        assert!(status.current_file.is_none());
    }

    #[test]
    fn test_started_resets_previous_batch() {
        let mut status = ProcessingStatus {
            total: 5,
            completed: 5,
            failed: 2,
            state: BatchState::Completed,
            ..Default::default()
        };

        status.apply(&ProcessMessage::Started { total: 2 });

        assert_eq!(status.total, 2);
        assert_eq!(status.completed, 0);
        assert_eq!(status.failed, 0);
        assert!(status.state.is_running());
    }

    #[test]
    fn test_overall_percent_empty_batch() {
        let mut status = ProcessingStatus::default();
        assert_eq!(status.overall_percent(), 0.0);
        status.apply(&ProcessMessage::Started { total: 0 });
        status.apply(&ProcessMessage::Finished(BatchState::Completed));
        assert_eq!(status.overall_percent(), 100.0);
    }

    #[test]
    fn test_stop_handle_is_shared() {
        let handle = StopHandle::default();
        let clone = handle.clone();
        assert!(!handle.is_stopped());
        clone.stop();
        assert!(handle.is_stopped());
    }
}
