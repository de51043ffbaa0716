//! Common test utilities

#![allow(dead_code)]

use assetflow::config::{parse_config, Config};
use assetflow::runner::{Mode, TaskContext, Verbosity};
use assetflow::tasks::build_registry;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a temporary directory with an assetflow.yml file
pub fn create_test_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("assetflow.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}

/// Create a test config in a subdirectory
pub fn create_test_config_in_subdir(content: &str) -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("assetflow.yml");
    let sub_dir = temp_dir.path().join("subdir");

    fs::write(&config_path, content).unwrap();
    fs::create_dir(&sub_dir).unwrap();

    (temp_dir, config_path, sub_dir)
}

/// Write a project file, creating parent directories
pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Silent context for running built-in tasks against a project directory
pub fn project_context(root: &Path, yaml: &str, task: &str, mode: Option<Mode>) -> TaskContext {
    let config: Config = parse_config(yaml).unwrap();
    let registry = build_registry(&config).unwrap();
    TaskContext::new(Arc::new(config), Arc::new(registry))
        .with_working_dir(root.to_path_buf())
        .with_verbosity(Verbosity::Silent)
        .for_task(task, mode)
}

/// Files directly inside a directory, sorted
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
