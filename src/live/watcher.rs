//! Debounced filesystem watching for manifest patterns
//!
//! Watch roots are the static prefixes of the patterns, collapsed so that no
//! root is watched twice. Matching a changed path against the patterns is
//! left to the caller; the watcher only reports which files changed.

use crate::assets::glob_base;
use crate::error::{ExecutionError, ExecutionResult};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

/// Quiet period before a burst of events is reported
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Directories to watch for a set of patterns under `root`
///
/// Roots that do not exist yet are replaced by their closest existing
/// ancestor inside `root`, so files created later are still seen.
pub fn watch_roots(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut roots = BTreeSet::new();

    for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
        let mut dir = root.join(glob_base(pattern));
        while !dir.is_dir() && dir != root {
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            }
        }
        roots.insert(dir);
    }

    collapse_watch_paths(roots)
}

/// Drop every path that lies inside another one
pub fn collapse_watch_paths(paths: BTreeSet<PathBuf>) -> Vec<PathBuf> {
    let mut filtered: Vec<PathBuf> = Vec::new();
    for path in paths {
        if let Some(last) = filtered.last() {
            if path.starts_with(last) {
                continue;
            }
        }
        filtered.push(path);
    }
    filtered
}

/// Recursive, debounced watcher reporting project-relative paths
pub struct FileWatcher {
    root: PathBuf,
    canonical_root: PathBuf,
    rx: Receiver<DebounceEventResult>,
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl FileWatcher {
    /// Start watching the roots of `patterns` under `root`
    pub fn new(root: &Path, patterns: &[String]) -> ExecutionResult<Self> {
        let (tx, rx) = mpsc::channel();
        let mut debouncer = new_debouncer(DEBOUNCE, None, tx)
            .map_err(|e| ExecutionError::Watch(e.to_string()))?;

        for dir in watch_roots(root, patterns) {
            debouncer
                .watch(&dir, RecursiveMode::Recursive)
                .map_err(|e| ExecutionError::Watch(format!("{}: {}", dir.display(), e)))?;
        }

        Ok(FileWatcher {
            root: root.to_path_buf(),
            canonical_root: root.canonicalize().unwrap_or_else(|_| root.to_path_buf()),
            rx,
            _debouncer: debouncer,
        })
    }

    /// Block until the next batch of changes
    pub fn next_batch(&self) -> ExecutionResult<Vec<PathBuf>> {
        loop {
            let result = self
                .rx
                .recv()
                .map_err(|_| ExecutionError::Watch("watcher stopped".to_string()))?;
            let batch = self.relative_paths(result)?;
            if !batch.is_empty() {
                return Ok(batch);
            }
        }
    }

    /// Wait up to `timeout` for a batch; `None` when nothing changed
    pub fn next_batch_timeout(&self, timeout: Duration) -> ExecutionResult<Option<Vec<PathBuf>>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => {
                let batch = self.relative_paths(result)?;
                Ok(if batch.is_empty() { None } else { Some(batch) })
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(ExecutionError::Watch("watcher stopped".to_string()))
            }
        }
    }

    fn relative_paths(&self, result: DebounceEventResult) -> ExecutionResult<Vec<PathBuf>> {
        let events = result.map_err(|errors| {
            ExecutionError::Watch(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        let mut paths = BTreeSet::new();
        for event in events.iter().filter(|e| !e.event.kind.is_access()) {
            for path in &event.event.paths {
                if let Some(relative) = self.relativize(path) {
                    paths.insert(relative);
                }
            }
        }
        Ok(paths.into_iter().collect())
    }

    fn relativize(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.canonical_root)
            .or_else(|_| path.strip_prefix(&self.root))
            .ok()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn set(paths: &[&str]) -> BTreeSet<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_collapse_watch_paths() {
        let collapsed = collapse_watch_paths(set(&["/a", "/a/b", "/a/b/c", "/b", "/c/d"]));
        assert_eq!(
            collapsed,
            vec![
                PathBuf::from("/a"),
                PathBuf::from("/b"),
                PathBuf::from("/c/d")
            ]
        );
    }

    #[test]
    fn test_watch_roots() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("modules/core/client")).unwrap();
        fs::write(root.join("server.js"), "").unwrap();

        let patterns = vec![
            "modules/*/client/*.js".to_string(),
            "modules/core/client/app/*.js".to_string(),
            "server.js".to_string(),
            "!modules/core/client/skip.js".to_string(),
        ];

        // `server.js` is watched through the project directory, which also
        // covers `modules`
        assert_eq!(watch_roots(root, &patterns), vec![root.to_path_buf()]);

        let patterns = vec![
            "modules/*/client/*.js".to_string(),
            "modules/core/client/app/*.js".to_string(),
        ];
        assert_eq!(watch_roots(root, &patterns), vec![root.join("modules")]);
    }

    #[test]
    fn test_watcher_reports_relative_paths() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("modules/core/client")).unwrap();

        let watcher = FileWatcher::new(root, &["modules/**/*.js".to_string()]).unwrap();
        fs::write(root.join("modules/core/client/app.js"), "var a;").unwrap();

        let mut seen = Vec::new();
        for _ in 0..20 {
            if let Some(batch) = watcher.next_batch_timeout(Duration::from_millis(250)).unwrap() {
                seen.extend(batch);
            }
            if seen.contains(&PathBuf::from("modules/core/client/app.js")) {
                break;
            }
        }
        assert!(seen.contains(&PathBuf::from("modules/core/client/app.js")));
    }
}
