use crate::config::EncoderSettings;
use crate::tools::{CpuMonitor, FfmpegCommand};
use anyhow::{Result, bail};
use log::{error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// 一份清單對應的片段編碼任務
#[derive(Debug)]
pub struct EncodingTask {
    pub manifest_path: PathBuf,
    pub segment_path: PathBuf,
    pub status: TaskStatus,
    pub error_message: Option<String>,
}

impl EncodingTask {
    #[must_use]
    pub fn new(manifest_path: &Path) -> Self {
        let ffmpeg_cmd = FfmpegCommand::segment(manifest_path);
        Self {
            manifest_path: manifest_path.to_path_buf(),
            segment_path: ffmpeg_cmd.destination_path().to_path_buf(),
            status: TaskStatus::Pending,
            error_message: None,
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

struct RunningProcess {
    child: Child,
    task_index: usize,
    stderr: Arc<Mutex<Vec<String>>>,
    stderr_reader: Option<JoinHandle<()>>,
}

/// 平行執行每份清單的片段編碼，並等待全部結束
pub struct TaskScheduler {
    tasks: Vec<EncodingTask>,
    running_processes: HashMap<u32, RunningProcess>,
    cpu_monitor: CpuMonitor,
    settings: EncoderSettings,
    shutdown_signal: Arc<AtomicBool>,
}

impl TaskScheduler {
    #[must_use]
    pub fn new(
        manifest_paths: &[PathBuf],
        settings: EncoderSettings,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        let tasks = manifest_paths
            .iter()
            .map(|path| EncodingTask::new(path))
            .collect();

        Self {
            tasks,
            running_processes: HashMap::new(),
            cpu_monitor: CpuMonitor::new(settings.cpu_usage_threshold),
            settings,
            shutdown_signal,
        }
    }

    /// 單一任務失敗只會標記為 Failed，只有收到中斷信號才回傳錯誤
    pub fn run(&mut self) -> Result<()> {
        info!("開始片段編碼，共 {} 份清單", self.tasks.len());

        while !self.is_all_completed() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                self.handle_shutdown();
                bail!("片段編碼已中斷");
            }

            self.check_completed_processes();
            self.spawn_new_tasks_if_possible();

            if !self.running_processes.is_empty() {
                thread::sleep(POLL_INTERVAL);
            }
        }

        info!("所有片段編碼已結束");
        Ok(())
    }

    fn is_all_completed(&self) -> bool {
        self.tasks
            .iter()
            .all(|t| matches!(t.status, TaskStatus::Completed | TaskStatus::Failed))
            && self.running_processes.is_empty()
    }

    fn spawn_new_tasks_if_possible(&mut self) {
        while let Some(task_index) = self.find_next_pending_task() {
            if !self
                .cpu_monitor
                .can_spawn_new_task(self.running_processes.len())
            {
                break;
            }
            self.spawn_task(task_index);
        }
    }

    fn find_next_pending_task(&self) -> Option<usize> {
        self.tasks
            .iter()
            .position(|t| t.status == TaskStatus::Pending)
    }

    /// 持續讀取 stderr，避免管線塞滿造成子程序阻塞
    fn spawn_stderr_reader(
        stderr: Option<ChildStderr>,
        lines: Arc<Mutex<Vec<String>>>,
    ) -> Option<JoinHandle<()>> {
        let stderr = stderr?;
        Some(thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                if let Ok(mut guard) = lines.lock() {
                    guard.push(line);
                }
            }
        }))
    }

    fn spawn_task(&mut self, task_index: usize) {
        let task = &mut self.tasks[task_index];
        let ffmpeg_cmd = FfmpegCommand::segment(&task.manifest_path);

        let mut command = ffmpeg_cmd.build_segment_command(&self.settings);
        command.stdin(Stdio::null());
        command.stdout(Stdio::null());
        command.stderr(Stdio::piped());

        match command.spawn() {
            Ok(mut child) => {
                let pid = child.id();
                task.status = TaskStatus::Running;

                info!(
                    "啟動片段編碼 [{}]: {} -> {}",
                    pid,
                    task.manifest_path.display(),
                    task.segment_path.display()
                );

                let stderr = Arc::new(Mutex::new(Vec::new()));
                let stderr_reader =
                    Self::spawn_stderr_reader(child.stderr.take(), Arc::clone(&stderr));

                self.running_processes.insert(
                    pid,
                    RunningProcess {
                        child,
                        task_index,
                        stderr,
                        stderr_reader,
                    },
                );
            }
            Err(e) => {
                task.status = TaskStatus::Failed;
                task.error_message = Some(format!("無法啟動 {}: {e}", self.settings.program));
                error!(
                    "無法啟動片段編碼 {}: {e}",
                    task.manifest_path.display()
                );
            }
        }
    }

    fn check_completed_processes(&mut self) {
        let mut completed_pids = Vec::new();

        for (pid, process) in &mut self.running_processes {
            match process.child.try_wait() {
                Ok(Some(status)) => {
                    completed_pids.push((*pid, status.success()));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("無法檢查程序狀態 [{pid}]: {e}");
                    completed_pids.push((*pid, false));
                }
            }
        }

        for (pid, success) in completed_pids {
            let Some(mut process) = self.running_processes.remove(&pid) else {
                continue;
            };
            if let Some(reader) = process.stderr_reader.take() {
                let _ = reader.join();
            }
            let task = &mut self.tasks[process.task_index];

            if success {
                task.status = TaskStatus::Completed;
                info!("片段編碼完成 [{}]: {}", pid, task.segment_path.display());
            } else {
                let error_msg = process
                    .stderr
                    .lock()
                    .map(|lines| lines.join("\n"))
                    .ok()
                    .filter(|msg| !msg.is_empty())
                    .unwrap_or_else(|| "未知錯誤".to_string());

                task.status = TaskStatus::Failed;
                task.error_message = Some(error_msg.clone());
                error!(
                    "片段編碼失敗 [{pid}] {}: {error_msg}",
                    task.manifest_path.display()
                );

                Self::remove_partial_segment(&task.segment_path);
            }
        }
    }

    fn remove_partial_segment(segment_path: &Path) {
        if !segment_path.exists() {
            return;
        }
        match fs::remove_file(segment_path) {
            Ok(()) => info!("已刪除未完成的片段: {}", segment_path.display()),
            Err(e) => error!("無法刪除未完成的片段 {}: {e}", segment_path.display()),
        }
    }

    fn handle_shutdown(&mut self) {
        warn!("收到中斷信號，正在停止所有片段編碼...");

        for (pid, mut process) in self.running_processes.drain() {
            warn!("終止程序 [{pid}]");
            let _ = process.child.kill();
            let _ = process.child.wait();

            let task = &mut self.tasks[process.task_index];
            task.status = TaskStatus::Failed;
            task.error_message = Some("已中斷".to_string());
            Self::remove_partial_segment(&task.segment_path);
        }
    }

    #[must_use]
    pub fn tasks(&self) -> &[EncodingTask] {
        &self.tasks
    }

    #[must_use]
    pub fn into_tasks(self) -> Vec<EncodingTask> {
        self.tasks
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings_with(program: &str) -> EncoderSettings {
        EncoderSettings {
            program: program.to_string(),
            ..EncoderSettings::default()
        }
    }

    fn manifests(temp_dir: &TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| temp_dir.path().join(format!("batch_{i}.txt")))
            .collect()
    }

    #[test]
    fn test_all_tasks_complete() {
        let temp_dir = TempDir::new().unwrap();
        let paths = manifests(&temp_dir, 3);
        let mut scheduler =
            TaskScheduler::new(&paths, settings_with("true"), Arc::new(AtomicBool::new(false)));

        scheduler.run().unwrap();

        assert_eq!(scheduler.tasks().len(), 3);
        assert!(scheduler.tasks().iter().all(EncodingTask::succeeded));
        assert_eq!(
            scheduler.tasks()[1].segment_path,
            temp_dir.path().join("batch_1.mp4")
        );
    }

    #[test]
    fn test_non_zero_exit_is_failed_and_partial_removed() {
        let temp_dir = TempDir::new().unwrap();
        let paths = manifests(&temp_dir, 2);
        let partial = temp_dir.path().join("batch_0.mp4");
        fs::write(&partial, b"partial").unwrap();

        let mut scheduler =
            TaskScheduler::new(&paths, settings_with("false"), Arc::new(AtomicBool::new(false)));
        scheduler.run().unwrap();

        assert!(scheduler
            .tasks()
            .iter()
            .all(|t| t.status == TaskStatus::Failed));
        assert!(!partial.exists());
    }

    #[test]
    fn test_spawn_failure_is_failed() {
        let temp_dir = TempDir::new().unwrap();
        let paths = manifests(&temp_dir, 1);
        let mut scheduler = TaskScheduler::new(
            &paths,
            settings_with("/nonexistent/encoder-binary"),
            Arc::new(AtomicBool::new(false)),
        );
        scheduler.run().unwrap();

        let task = &scheduler.tasks()[0];
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error_message.is_some());
    }

    #[test]
    fn test_shutdown_signal_stops_run() {
        let temp_dir = TempDir::new().unwrap();
        let paths = manifests(&temp_dir, 1);
        let mut scheduler =
            TaskScheduler::new(&paths, settings_with("true"), Arc::new(AtomicBool::new(true)));
        assert!(scheduler.run().is_err());
    }

    #[test]
    fn test_empty_manifest_list() {
        let mut scheduler = TaskScheduler::new(
            &[],
            settings_with("true"),
            Arc::new(AtomicBool::new(false)),
        );
        scheduler.run().unwrap();
        assert!(scheduler.into_tasks().is_empty());
    }
}
