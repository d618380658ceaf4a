//! Helpers for building a throwaway ament install prefix

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PENDULUM_URDF: &str = r#"<?xml version="1.0"?>
<robot name="pendulum">
  <link name="base_link"/>
  <link name="pole"/>
  <joint name="hinge" type="continuous">
    <parent link="base_link"/>
    <child link="pole"/>
    <axis xyz="0 1 0"/>
  </joint>
</robot>
"#;

/// An install prefix laid out like a colcon `install/` directory
pub struct FakeInstall {
    dir: TempDir,
}

impl FakeInstall {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp prefix"),
        }
    }

    pub fn prefix(&self) -> &Path {
        self.dir.path()
    }

    /// Register a package in the resource index and create its share directory
    pub fn add_package(&self, package: &str) -> PathBuf {
        let marker_dir = self
            .prefix()
            .join("share/ament_index/resource_index/packages");
        fs::create_dir_all(&marker_dir).unwrap();
        fs::write(marker_dir.join(package), "").unwrap();

        let share = self.prefix().join("share").join(package);
        fs::create_dir_all(&share).unwrap();
        share
    }

    /// Install the pendulum description with the given URDF text
    pub fn add_description(&self, text: &str) -> PathBuf {
        let share = self.add_package("inverted_pendulum_description");
        let urdf = share.join("urdf/pendulum.urdf");
        fs::create_dir_all(urdf.parent().unwrap()).unwrap();
        fs::write(&urdf, text).unwrap();
        urdf
    }

    /// Install a shell script as a package executable
    #[cfg(unix)]
    pub fn add_executable(&self, package: &str, executable: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        self.add_package(package);
        let lib_dir = self.prefix().join("lib").join(package);
        fs::create_dir_all(&lib_dir).unwrap();
        let path = lib_dir.join(executable);
        fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
