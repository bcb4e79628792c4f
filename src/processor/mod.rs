use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::CONFIG;
use crate::logger::Logger;
use crate::model::Settings;

mod batch;
mod command;
mod progress;

pub use batch::{BatchHandle, BatchState, ProcessMessage, ProcessingStatus, StopHandle};
pub use command::{build_invocation, validate_template};
pub use progress::parse_progress;

/// 批处理开始前的校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("no processing program configured")]
    ProgramNotSet,
    #[error("processing program not found: {0}")]
    ProgramNotFound(PathBuf),
    #[error("processing program is not a file: {0}")]
    ProgramNotAFile(PathBuf),
    #[error("processing program is not executable: {0}")]
    ProgramNotExecutable(PathBuf),
    #[error("no output directory configured")]
    OutputDirNotSet,
    #[error("invalid command template: {0}")]
    InvalidTemplate(String),
}

/// 单个文件的处理结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// 被信号终止或未能启动时为 `None`
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    /// 启动失败、超时等非退出码错误
    pub error: Option<String>,
    pub command: String,
    pub output_exists: bool,
}

impl ProcessingResult {
    fn failed(input: &Path, output: &Path, command: String, error: impl Into<String>) -> Self {
        Self {
            input_path: input.to_path_buf(),
            output_path: output.to_path_buf(),
            error: Some(error.into()),
            command,
            output_exists: output.exists(),
            ..Default::default()
        }
    }

    /// 一行摘要，供结果列表显示
    pub fn summary(&self) -> String {
        let name = self
            .input_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match (&self.error, self.exit_code) {
            _ if self.success => format!("OK   {}", name),
            (Some(err), _) => format!("FAIL {} ({})", name, err),
            (None, Some(code)) => format!("FAIL {} (exit code {})", name, code),
            (None, None) => format!("FAIL {} (terminated)", name),
        }
    }
}

/// 输出目录：固定目录，或与每个输入文件同目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Directory(PathBuf),
    BesideInput,
}

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub program: PathBuf,
    pub output: OutputTarget,
    pub command_template: Option<String>,
    pub env_vars: Vec<(String, String)>,
    /// `None` 表示不限时，外部程序挂起会一直阻塞当前批次
    pub timeout: Option<Duration>,
}

impl ProcessorConfig {
    pub fn new(program: impl Into<PathBuf>, output: OutputTarget) -> Self {
        Self {
            program: program.into(),
            output,
            command_template: None,
            env_vars: Vec::new(),
            timeout: None,
        }
    }

    /// 从设置构造并校验处理配置
    ///
    /// # Errors
    ///
    /// 程序缺失或不可执行、未设置输出目录、模板非法时返回 [`ProcessError`]。
    pub fn from_settings(settings: &Settings) -> Result<Self, ProcessError> {
        let program = settings.program_path().ok_or(ProcessError::ProgramNotSet)?;
        validate_program(program)?;
        validate_template(settings.command_template())?;

        let output = if settings.output_beside_input() {
            OutputTarget::BesideInput
        } else {
            let dir = settings.output_dir().ok_or(ProcessError::OutputDirNotSet)?;
            OutputTarget::Directory(dir.to_path_buf())
        };

        let template = settings.command_template();
        Ok(Self {
            program: program.to_path_buf(),
            output,
            command_template: (!template.is_empty()).then(|| template.to_string()),
            env_vars: settings.parsed_env_vars(),
            timeout: settings.process_timeout(),
        })
    }
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(windows)]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    true
}

/// 检查处理程序存在、是普通文件且可执行
pub fn validate_program(path: &Path) -> Result<(), ProcessError> {
    if path.as_os_str().is_empty() {
        return Err(ProcessError::ProgramNotSet);
    }
    let meta = std::fs::metadata(path).map_err(|_| ProcessError::ProgramNotFound(path.to_path_buf()))?;
    if !meta.is_file() {
        return Err(ProcessError::ProgramNotAFile(path.to_path_buf()));
    }
    #[cfg(windows)]
    {
        let runnable = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| ["exe", "bat", "cmd", "com"].contains(&e.to_ascii_lowercase().as_str()));
        if !runnable {
            return Err(ProcessError::ProgramNotExecutable(path.to_path_buf()));
        }
    }
    if !is_executable(&meta) {
        return Err(ProcessError::ProgramNotExecutable(path.to_path_buf()));
    }
    Ok(())
}

/// `<dir>/<stem>_processed<.ext>`
pub fn output_file_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    output_dir.join(format!("{}{}{}", stem, CONFIG.output_suffix, ext))
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// 逐行读取子进程输出并转发到通道，非 UTF-8 字节按有损方式转换
fn spawn_reader<R: Read + Send + 'static>(
    source: R,
    stream: Stream,
    tx: mpsc::Sender<(Stream, String)>,
) {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send((stream, line)).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

/// 对文件逐个调用外部程序
pub struct FileProcessor {
    config: ProcessorConfig,
    logger: Logger,
    stop: StopHandle,
}

impl FileProcessor {
    pub fn new(config: ProcessorConfig, logger: Logger) -> Self {
        Self {
            config,
            logger,
            stop: StopHandle::default(),
        }
    }

    /// 请求在下一个文件开始前停止，正在运行的外部程序不会被终止
    pub fn stop(&self) {
        self.logger.info("Stop processing requested");
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn output_dir_for(&self, input: &Path) -> PathBuf {
        match &self.config.output {
            OutputTarget::Directory(dir) => dir.clone(),
            OutputTarget::BesideInput => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// 该文件将执行的命令行（用于确认对话框）
    pub fn preview_command(&self, input: &Path) -> Result<String, ProcessError> {
        let output_dir = self.output_dir_for(input);
        let output_file = output_file_for(input, &output_dir);
        build_invocation(
            &self.config.program,
            self.config.command_template.as_deref(),
            input,
            &output_dir,
            &output_file,
        )
        .map(|inv| inv.display())
    }

    pub fn process_file(&self, input: &Path) -> ProcessingResult {
        self.process_file_with_progress(input, &mut |_| {})
    }

    /// 处理单个文件
    ///
    /// 外部程序以退出码 0 结束视为成功。程序没有生成输出文件但有标准输出时，
    /// 标准输出会写入输出文件；失败时删除本次新生成的输出文件。
    /// 任何错误都只记录在返回的结果中。
    pub fn process_file_with_progress(
        &self,
        input: &Path,
        on_progress: &mut dyn FnMut(f32),
    ) -> ProcessingResult {
        let output_dir = self.output_dir_for(input);
        let output_file = output_file_for(input, &output_dir);

        if !input.is_file() {
            self.logger
                .error(format!("Input file not found: {}", input.display()));
            return ProcessingResult::failed(
                input,
                &output_file,
                String::new(),
                format!("input file not found: {}", input.display()),
            );
        }

        if let Err(e) = std::fs::create_dir_all(&output_dir) {
            self.logger.error(format!(
                "Cannot create output directory {}: {}",
                output_dir.display(),
                e
            ));
            return ProcessingResult::failed(
                input,
                &output_file,
                String::new(),
                format!("cannot create output directory: {}", e),
            );
        }

        let invocation = match build_invocation(
            &self.config.program,
            self.config.command_template.as_deref(),
            input,
            &output_dir,
            &output_file,
        ) {
            Ok(inv) => inv,
            Err(e) => return ProcessingResult::failed(input, &output_file, String::new(), e.to_string()),
        };
        let command_line = invocation.display();
        let existed_before = output_file.exists();

        self.logger.info(format!("Executing command: {}", command_line));

        let mut child = match Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(self.config.env_vars.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                self.logger
                    .error(format!("Failed to start {}: {}", command_line, e));
                return ProcessingResult::failed(input, &output_file, command_line, e.to_string());
            }
        };

        let (tx, rx) = mpsc::channel();
        if let Some(out) = child.stdout.take() {
            spawn_reader(out, Stream::Stdout, tx.clone());
        }
        if let Some(err) = child.stderr.take() {
            spawn_reader(err, Stream::Stderr, tx.clone());
        }
        drop(tx);

        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        let poll = Duration::from_millis(CONFIG.child_poll_ms);
        let mut stdout_lines = Vec::new();
        let mut stderr_lines = Vec::new();
        let mut killed_at: Option<Instant> = None;
        let grace = Duration::from_millis(CONFIG.kill_grace_ms);

        loop {
            let received = match deadline {
                Some(_) => rx.recv_timeout(poll),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((stream, line)) => {
                    if let Some(percent) = parse_progress(&line) {
                        on_progress(percent);
                    }
                    match stream {
                        Stream::Stdout => stdout_lines.push(line),
                        Stream::Stderr => stderr_lines.push(line),
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            match killed_at {
                // 孙进程可能继承了输出管道，宽限期过后不再等待管道关闭
                Some(at) if at.elapsed() >= grace => break,
                Some(_) => {}
                None => {
                    if let Some(deadline) = deadline
                        && Instant::now() >= deadline
                    {
                        self.logger
                            .error(format!("Command timed out: {}", command_line));
                        let _ = child.kill();
                        killed_at = Some(Instant::now());
                    }
                }
            }
        }
        let timed_out = killed_at.is_some();

        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => {
                return ProcessingResult::failed(input, &output_file, command_line, e.to_string());
            }
        };

        let stdout = stdout_lines.join("\n");
        let stderr = stderr_lines.join("\n");
        let success = status.success() && !timed_out;

        if success && !output_file.exists() && !stdout.trim().is_empty() {
            match std::fs::write(&output_file, &stdout) {
                Ok(()) => self.logger.info(format!(
                    "Saved program output to {}",
                    output_file.display()
                )),
                Err(e) => self.logger.warning(format!(
                    "Failed to save program output to {}: {}",
                    output_file.display(),
                    e
                )),
            }
        }

        if !success
            && !existed_before
            && output_file.exists()
            && output_file != input
            && let Err(e) = std::fs::remove_file(&output_file)
        {
            self.logger.warning(format!(
                "Failed to remove output file {}: {}",
                output_file.display(),
                e
            ));
        }

        let error = timed_out.then(|| "processing timed out".to_string());
        if success {
            self.logger
                .info(format!("Processed {} -> {}", input.display(), output_file.display()));
        } else {
            self.logger.error(format!(
                "Processing failed for {} (exit code {:?})",
                input.display(),
                status.code()
            ));
        }

        ProcessingResult {
            input_path: input.to_path_buf(),
            output_exists: output_file.exists(),
            output_path: output_file,
            exit_code: status.code(),
            stdout,
            stderr,
            success,
            error,
            command: command_line,
        }
    }

    /// 顺序处理一批文件，并通过回调报告每一步
    ///
    /// 每个文件开始前检查取消标志；单个文件失败不会中止批次。
    pub fn run_batch(
        &self,
        paths: &[PathBuf],
        on_message: &mut dyn FnMut(ProcessMessage),
    ) -> BatchState {
        let total = paths.len();
        self.logger
            .info(format!("Starting processing of {} files", total));
        on_message(ProcessMessage::Started { total });

        let mut state = BatchState::Completed;
        let mut failed = 0;
        for (index, path) in paths.iter().enumerate() {
            if self.stop.is_stopped() {
                self.logger.info("Processing stopped by user");
                state = BatchState::Stopped;
                break;
            }

            on_message(ProcessMessage::FileStarted {
                index,
                path: path.clone(),
            });
            let result = self.process_file_with_progress(path, &mut |percent| {
                on_message(ProcessMessage::FileProgress { index, percent })
            });
            if !result.success {
                failed += 1;
            }
            on_message(ProcessMessage::FileFinished { index, result });
        }

        self.logger.info(format!(
            "Processing finished ({:?}). Failed: {}",
            state, failed
        ));
        on_message(ProcessMessage::Finished(state.clone()));
        state
    }

    /// 阻塞处理一批文件，返回全部结果
    pub fn process_files_batch(&self, paths: &[PathBuf]) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(paths.len());
        self.run_batch(paths, &mut |msg| {
            if let ProcessMessage::FileFinished { result, .. } = msg {
                results.push(result);
            }
        });
        results
    }

    /// 在后台线程处理一批文件
    ///
    /// 进度通过返回的 [`BatchHandle`] 中的通道发送，由界面线程在主循环中取出。
    pub fn process_files_async(self, paths: Vec<PathBuf>) -> BatchHandle {
        let (tx, rx) = mpsc::channel();
        let stop = self.stop_handle();

        let thread = std::thread::spawn(move || {
            self.run_batch(&paths, &mut |msg| {
                tx.send(msg).ok();
            });
        });

        BatchHandle::new(rx, stop, Some(thread))
    }
}
