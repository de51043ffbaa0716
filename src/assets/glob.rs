//! Glob expansion for manifest patterns
//!
//! Patterns are relative to the project directory. A pattern starting with
//! `!` removes matches of earlier patterns. Expansion happens every time a
//! task runs so that files added between runs are picked up.

use crate::error::{ExecutionError, ExecutionResult};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// A file selected by a manifest pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (or working-dir-joined) path on disk
    pub path: PathBuf,

    /// Path relative to the project directory
    pub relative: PathBuf,

    /// Static prefix of the pattern that selected this file
    pub base: PathBuf,
}

impl SourceFile {
    /// Path relative to the glob base, e.g. `core/client/views/home.html`
    /// for `modules/*/client/views/**/*.html`
    pub fn relative_to_base(&self) -> PathBuf {
        self.relative
            .strip_prefix(&self.base)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| self.relative.clone())
    }

    /// Relative path with forward slashes
    pub fn slash_path(&self) -> String {
        to_slash(&self.relative)
    }
}

/// Compiled include and exclude patterns, matched against relative paths
#[derive(Debug, Clone)]
pub struct PatternSet {
    includes: GlobSet,
    excludes: GlobSet,
}

impl PatternSet {
    pub fn new(patterns: &[String]) -> ExecutionResult<Self> {
        let mut includes = GlobSetBuilder::new();
        let mut excludes = GlobSetBuilder::new();

        for pattern in patterns {
            match pattern.strip_prefix('!') {
                Some(excluded) => {
                    excludes.add(compile(excluded)?);
                }
                None => {
                    includes.add(compile(pattern)?);
                }
            }
        }

        Ok(PatternSet {
            includes: build(includes, patterns)?,
            excludes: build(excludes, patterns)?,
        })
    }

    /// Whether a project-relative path is selected
    pub fn is_match(&self, relative: &Path) -> bool {
        self.includes.is_match(relative) && !self.excludes.is_match(relative)
    }

    /// Whether a project-relative path is excluded by a `!` pattern
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.excludes.is_match(relative)
    }
}

fn compile(pattern: &str) -> ExecutionResult<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| ExecutionError::Glob {
            pattern: pattern.to_string(),
            error: e.to_string(),
        })
}

fn build(builder: GlobSetBuilder, patterns: &[String]) -> ExecutionResult<GlobSet> {
    builder.build().map_err(|e| ExecutionError::Glob {
        pattern: patterns.join(", "),
        error: e.to_string(),
    })
}

/// Expand patterns under `root`, keeping pattern order and dropping duplicates
pub fn expand(root: &Path, patterns: &[String]) -> ExecutionResult<Vec<SourceFile>> {
    let set = PatternSet::new(patterns)?;
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
        let full = format!("{}/{}", escaped_root.trim_end_matches('/'), pattern);
        let entries = glob::glob(&full).map_err(|e| ExecutionError::Glob {
            pattern: pattern.clone(),
            error: e.to_string(),
        })?;
        let base = glob_base(pattern);

        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                ExecutionError::io(path, e.into_error())
            })?;

            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            if set.is_excluded(&relative) || !seen.insert(relative.clone()) {
                continue;
            }

            files.push(SourceFile {
                path,
                relative,
                base: base.clone(),
            });
        }
    }

    Ok(files)
}

/// Static directory prefix of a pattern
///
/// `modules/*/client/*.js` has base `modules`, a concrete file such as
/// `build/templates.js` has its parent directory as base.
pub fn glob_base(pattern: &str) -> PathBuf {
    let path = Path::new(pattern);
    let components: Vec<Component> = path.components().collect();

    let wildcard = components.iter().position(|c| {
        c.as_os_str()
            .to_string_lossy()
            .contains(['*', '?', '[', '{'])
    });

    match wildcard {
        Some(index) => components.iter().take(index).collect(),
        None => path.parent().map(|p| p.to_path_buf()).unwrap_or_default(),
    }
}

/// Render a path with `/` separators regardless of platform
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
