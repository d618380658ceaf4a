//! Routing of node output to the terminal and per-node log files

use crate::plan::OutputMode;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default ROS log directory: `$ROS_LOG_DIR`, else `$ROS_HOME/log`, else `~/.ros/log`
pub fn default_log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("ROS_LOG_DIR").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(home) = std::env::var_os("ROS_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join("log");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ros")
        .join("log")
}

struct Route {
    mode: OutputMode,
    log_file: Option<File>,
}

/// Sends each node's lines where its output mode asks
pub struct OutputRouter {
    log_dir: PathBuf,
    routes: HashMap<String, Route>,
}

impl OutputRouter {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            routes: HashMap::new(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Log file used for a node
    pub fn log_path(&self, name: &str) -> PathBuf {
        self.log_dir.join(format!("{}.log", name))
    }

    /// Register a node, opening its log file when the mode needs one
    pub fn register(&mut self, name: &str, mode: OutputMode) -> std::io::Result<()> {
        let log_file = if mode.writes_to_log() {
            std::fs::create_dir_all(&self.log_dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.log_path(name))?;
            Some(file)
        } else {
            None
        };

        self.routes.insert(name.to_string(), Route { mode, log_file });
        Ok(())
    }

    /// Route one line of output
    pub fn route(&mut self, name: &str, line: &str, is_stderr: bool) {
        let Some(route) = self.routes.get_mut(name) else {
            log::warn!("[{}] {}", name, line);
            return;
        };

        if route.mode.prints_to_screen() {
            if is_stderr {
                eprintln!("[{}] {}", name, line);
            } else {
                println!("[{}] {}", name, line);
            }
        }

        route.write_log(name, line);
    }

    /// Route a lifecycle message (start, exit) the same way as output
    pub fn note(&mut self, name: &str, message: &str) {
        let Some(route) = self.routes.get_mut(name) else {
            return;
        };
        route.write_log(name, &format!("[pendulum_launch] {}", message));
    }
}

impl Route {
    /// Append a line to the log file, giving up on the file after a failed write
    fn write_log(&mut self, name: &str, line: &str) {
        if let Some(file) = &mut self.log_file {
            if let Err(e) = writeln!(file, "{}", line) {
                log::error!("[{}] Failed to write log file: {}", name, e);
                self.log_file = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_mode_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = OutputRouter::new(dir.path());
        router.register("static_transform_publisher", OutputMode::Log).unwrap();

        router.route("static_transform_publisher", "spinning until killed", false);
        router.route("static_transform_publisher", "warning line", true);
        drop(router);

        let content =
            std::fs::read_to_string(dir.path().join("static_transform_publisher.log")).unwrap();
        assert_eq!(content, "spinning until killed\nwarning line\n");
    }

    #[test]
    fn test_screen_mode_has_no_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = OutputRouter::new(dir.path().join("log"));
        router.register("joint_state_publisher", OutputMode::Screen).unwrap();
        router.route("joint_state_publisher", "hello", false);

        assert!(!dir.path().join("log/joint_state_publisher.log").exists());
    }

    #[test]
    fn test_both_mode_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("robot_state_publisher.log");
        std::fs::write(&path, "previous run\n").unwrap();

        let mut router = OutputRouter::new(dir.path());
        router.register("robot_state_publisher", OutputMode::Both).unwrap();
        router.route("robot_state_publisher", "got segment pendulum", false);
        drop(router);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "previous run\ngot segment pendulum\n");
    }

    #[test]
    fn test_note_goes_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = OutputRouter::new(dir.path());
        router.register("robot_state_publisher", OutputMode::Both).unwrap();
        router.register("joint_state_publisher", OutputMode::Screen).unwrap();

        router.note("robot_state_publisher", "started with PID 42");
        router.note("joint_state_publisher", "started with PID 43");
        router.note("unknown_node", "ignored");
        drop(router);

        let content =
            std::fs::read_to_string(dir.path().join("robot_state_publisher.log")).unwrap();
        assert_eq!(content, "[pendulum_launch] started with PID 42\n");
        assert!(!dir.path().join("joint_state_publisher.log").exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_write_disables_log_file() {
        if !Path::new("/dev/full").exists() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        // Every write to /dev/full fails with ENOSPC
        std::os::unix::fs::symlink("/dev/full", dir.path().join("rviz2.log")).unwrap();

        let mut router = OutputRouter::new(dir.path());
        router.register("rviz2", OutputMode::Log).unwrap();
        assert!(router.routes["rviz2"].log_file.is_some());

        router.note("rviz2", "started with PID 7");
        assert!(router.routes["rviz2"].log_file.is_none());

        // Later lines skip the file instead of failing again
        router.route("rviz2", "after the failure", false);
        assert!(router.routes["rviz2"].log_file.is_none());
    }
}
