//! Managed node process

use crate::runtime::command::NodeCommand;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Process status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Not started yet
    Pending,
    /// Running
    Running,
    /// Exited with code (None when killed by a signal)
    Stopped(Option<i32>),
    /// Could not be spawned
    Failed,
}

impl ProcessStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ProcessStatus::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, ProcessStatus::Stopped(_) | ProcessStatus::Failed)
    }
}

/// Event emitted by a managed process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Started { pid: u32 },
    Output { line: String, is_stderr: bool },
    Exited { code: Option<i32> },
}

pub type EventSender = mpsc::UnboundedSender<(String, ProcessEvent)>;

/// A node child process
pub struct ManagedProcess {
    pub command: NodeCommand,
    pub status: ProcessStatus,
    pub pid: Option<u32>,
    child: Option<Child>,
    event_tx: EventSender,
}

impl ManagedProcess {
    pub fn new(command: NodeCommand, event_tx: EventSender) -> Self {
        Self {
            command,
            status: ProcessStatus::Pending,
            pid: None,
            child: None,
            event_tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.command.name
    }

    fn emit(&self, event: ProcessEvent) {
        let _ = self.event_tx.send((self.command.name.clone(), event));
    }

    /// Spawn the node
    pub fn start(&mut self) -> Result<(), ProcessError> {
        if self.status.is_running() {
            return Err(ProcessError::AlreadyRunning(self.command.name.clone()));
        }

        log::info!(
            "[{}] Starting: {} {}",
            self.command.name,
            self.command.program.display(),
            self.command.args.join(" ")
        );

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                self.status = ProcessStatus::Failed;
                ProcessError::SpawnFailed {
                    name: self.command.name.clone(),
                    source: e,
                }
            })?;

        let pid = child.id().unwrap_or(0);
        self.pid = Some(pid);
        self.status = ProcessStatus::Running;
        self.emit(ProcessEvent::Started { pid });

        if let Some(stdout) = child.stdout.take() {
            forward_lines(self.command.name.clone(), stdout, false, self.event_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(self.command.name.clone(), stderr, true, self.event_tx.clone());
        }

        self.child = Some(child);
        Ok(())
    }

    /// Stop the node (SIGTERM, then SIGKILL after `timeout`)
    pub async fn stop(&mut self, timeout: Duration) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        log::info!("[{}] Stopping process...", self.command.name);

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.pid {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
        }

        #[cfg(not(unix))]
        {
            let _ = child.start_kill();
        }

        let code = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => status.code(),
            Ok(Err(e)) => {
                log::error!("[{}] Error waiting for process: {}", self.command.name, e);
                None
            }
            Err(_) => {
                log::warn!(
                    "[{}] Process did not exit gracefully, forcing kill",
                    self.command.name
                );
                let _ = child.kill().await;
                None
            }
        };

        self.status = ProcessStatus::Stopped(code);
        self.pid = None;
        self.emit(ProcessEvent::Exited { code });
    }

    /// Poll the child for exit
    pub fn check_status(&mut self) -> ProcessStatus {
        if let Some(child) = &mut self.child {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let code = status.code();
                    self.status = ProcessStatus::Stopped(code);
                    self.pid = None;
                    self.child = None;
                    self.emit(ProcessEvent::Exited { code });
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!(
                        "[{}] Error checking process status: {}",
                        self.command.name,
                        e
                    );
                }
            }
        }

        self.status
    }
}

/// Read a child stream line by line into the event channel
fn forward_lines<R>(name: String, stream: R, is_stderr: bool, tx: EventSender)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx
                .send((name.clone(), ProcessEvent::Output { line, is_stderr }))
                .is_err()
            {
                break;
            }
        }
    });
}

/// Errors that can occur with managed processes
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Process '{0}' is already running")]
    AlreadyRunning(String),

    #[error("Failed to spawn process '{name}': {source}")]
    SpawnFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::plan::OutputMode;
    use std::path::PathBuf;

    fn command(program: &str, args: &[&str]) -> NodeCommand {
        NodeCommand {
            name: "test_node".to_string(),
            program: PathBuf::from(program),
            args: args.iter().map(|a| a.to_string()).collect(),
            output: OutputMode::Screen,
            params_file: None,
        }
    }

    #[tokio::test]
    async fn test_output_and_exit_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut process = ManagedProcess::new(command("/bin/sh", &["-c", "echo hello"]), tx);
        process.start().unwrap();

        let (name, event) = rx.recv().await.unwrap();
        assert_eq!(name, "test_node");
        assert!(matches!(event, ProcessEvent::Started { .. }));

        let (_, event) = rx.recv().await.unwrap();
        assert_eq!(
            event,
            ProcessEvent::Output {
                line: "hello".to_string(),
                is_stderr: false
            }
        );

        for _ in 0..50 {
            if process.check_status().is_stopped() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(process.status, ProcessStatus::Stopped(Some(0)));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut process = ManagedProcess::new(command("/nonexistent/robot_state_publisher", &[]), tx);

        let result = process.start();
        assert!(matches!(result, Err(ProcessError::SpawnFailed { .. })));
        assert_eq!(process.status, ProcessStatus::Failed);
    }

    #[tokio::test]
    async fn test_stop_terminates_long_running_process() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut process = ManagedProcess::new(command("/bin/sleep", &["30"]), tx);
        process.start().unwrap();
        assert!(process.status.is_running());

        process.stop(Duration::from_secs(2)).await;
        assert!(process.status.is_stopped());
        assert!(process.pid.is_none());
    }
}
