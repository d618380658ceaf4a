//! Supervisor - starts the nodes of a launch plan and tears them down

use crate::ament::PackageIndex;
use crate::plan::{LaunchPlan, ProcessSpec};
use crate::runtime::command::{CommandError, NodeCommand};
use crate::runtime::process::{ManagedProcess, ProcessError, ProcessEvent, ProcessStatus};
use crate::runtime::router::{default_log_dir, OutputRouter};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// How long to keep reading output once the nodes are gone
const OUTPUT_GRACE: Duration = Duration::from_millis(200);

/// Supervisor configuration
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Directory for per-node log files
    pub log_dir: PathBuf,
    /// Directory for generated parameter files
    pub params_dir: PathBuf,
    /// Grace period between SIGTERM and SIGKILL
    pub shutdown_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            params_dir: std::env::temp_dir()
                .join(format!("pendulum_launch_params_{}", std::process::id())),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Runs the nodes of a launch plan
pub struct Supervisor {
    config: SupervisorConfig,
    processes: IndexMap<String, ManagedProcess>,
    router: OutputRouter,
    event_rx: mpsc::UnboundedReceiver<(String, ProcessEvent)>,
}

impl Supervisor {
    /// Resolve every node of the plan; nothing is spawned yet
    pub fn new(
        plan: &LaunchPlan,
        index: &dyn PackageIndex,
        config: SupervisorConfig,
    ) -> Result<Self, SupervisorError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut router = OutputRouter::new(&config.log_dir);
        let mut processes: IndexMap<String, ManagedProcess> = IndexMap::new();

        for spec in plan.iter() {
            let command = match Self::prepare(spec, index, &config, &mut router, &processes) {
                Ok(command) => command,
                Err(e) => {
                    // Drop the parameter files of the nodes prepared so far
                    remove_params_dir(&config.params_dir);
                    return Err(e);
                }
            };

            processes.insert(
                spec.name.clone(),
                ManagedProcess::new(command, event_tx.clone()),
            );
        }

        Ok(Self {
            config,
            processes,
            router,
            event_rx,
        })
    }

    fn prepare(
        spec: &ProcessSpec,
        index: &dyn PackageIndex,
        config: &SupervisorConfig,
        router: &mut OutputRouter,
        processes: &IndexMap<String, ManagedProcess>,
    ) -> Result<NodeCommand, SupervisorError> {
        if processes.contains_key(&spec.name) {
            return Err(SupervisorError::DuplicateNode(spec.name.clone()));
        }

        let command = NodeCommand::from_spec(spec, index, &config.params_dir).map_err(|e| {
            SupervisorError::Command {
                node: spec.name.clone(),
                source: e,
            }
        })?;

        router
            .register(&spec.name, spec.output)
            .map_err(|e| SupervisorError::LogFile {
                node: spec.name.clone(),
                source: e,
            })?;

        Ok(command)
    }

    /// Start all nodes in plan order, stopping at the first failure
    pub fn launch(&mut self, shutdown_rx: &watch::Receiver<()>) -> Result<(), SupervisorError> {
        log::info!("Launching {} nodes...", self.processes.len());
        log::info!("Node logs in {}", self.router.log_dir().display());

        for (name, process) in self.processes.iter_mut() {
            if shutdown_rx.has_changed().unwrap_or(false) {
                log::info!("Shutdown requested, aborting launch");
                break;
            }

            process.start().map_err(|e| SupervisorError::ProcessFailed {
                node: name.clone(),
                source: e,
            })?;
        }

        log::info!("All nodes launched");
        Ok(())
    }

    /// Route output until a shutdown signal arrives or every node has stopped
    pub async fn wait(&mut self, mut shutdown_rx: watch::Receiver<()>) {
        let mut poll = tokio::time::interval(Duration::from_millis(500));

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    log::info!("Shutdown signal received");
                    break;
                }

                event = self.event_rx.recv() => {
                    if let Some((name, event)) = event {
                        self.handle_event(&name, event);
                    }
                }

                _ = poll.tick() => {
                    let mut all_stopped = true;
                    for process in self.processes.values_mut() {
                        if process.check_status().is_running() {
                            all_stopped = false;
                        }
                    }
                    if all_stopped {
                        log::info!("All processes have stopped");
                        break;
                    }
                }
            }
        }

        // Running nodes keep producing output, only flush once they are gone
        if self.processes.values().all(|p| !p.status.is_running()) {
            self.flush_output().await;
        }
    }

    /// Route lines still in flight from the output readers
    async fn flush_output(&mut self) {
        while let Ok(Some((name, event))) =
            tokio::time::timeout(OUTPUT_GRACE, self.event_rx.recv()).await
        {
            self.handle_event(&name, event);
        }
    }

    fn handle_event(&mut self, name: &str, event: ProcessEvent) {
        match event {
            ProcessEvent::Output { line, is_stderr } => {
                self.router.route(name, &line, is_stderr);
            }
            ProcessEvent::Started { pid } => {
                log::info!("[{}] Process started with PID: {}", name, pid);
                self.router.note(name, &format!("started with PID {}", pid));
            }
            ProcessEvent::Exited { code } => {
                match code {
                    Some(0) => log::info!("[{}] Process exited cleanly", name),
                    Some(code) => log::error!("[{}] Process exited with code: {}", name, code),
                    None => log::warn!("[{}] Process terminated by signal", name),
                }
                self.router.note(name, &format!("exited with code {:?}", code));
            }
        }
    }

    /// Stop running nodes in reverse order and remove parameter files
    pub async fn shutdown(&mut self) {
        log::info!("Shutting down all processes...");

        for process in self.processes.values_mut().rev() {
            if process.status.is_running() {
                process.stop(self.config.shutdown_timeout).await;
            }
        }
        self.flush_output().await;

        remove_params_dir(&self.config.params_dir);

        log::info!("All processes shut down");
    }

    /// Status of every node, in launch order
    pub fn status(&self) -> Vec<(&str, ProcessStatus)> {
        self.processes
            .iter()
            .map(|(name, process)| (name.as_str(), process.status))
            .collect()
    }
}

fn remove_params_dir(dir: &Path) {
    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(dir) {
            log::warn!("Failed to remove parameter directory {}: {}", dir.display(), e);
        }
    }
}

/// Errors that can occur in the supervisor
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Node '{0}' appears more than once in the launch plan")]
    DuplicateNode(String),

    #[error("Cannot prepare node '{node}': {source}")]
    Command {
        node: String,
        #[source]
        source: CommandError,
    },

    #[error("Cannot open log file for node '{node}': {source}")]
    LogFile {
        node: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process failed for node '{node}': {source}")]
    ProcessFailed {
        node: String,
        #[source]
        source: ProcessError,
    },
}
