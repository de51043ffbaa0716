//! Filesystem helpers shared by tasks

use crate::error::{ExecutionError, ExecutionResult};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::Path;

/// Result of making sure a directory exists
#[derive(Debug)]
pub enum MkdirOutcome {
    Created,
    AlreadyPresent,
    Failed(io::Error),
}

/// Create a directory and its parents, reporting whether it was already there
pub fn make_dir(path: &Path) -> MkdirOutcome {
    if path.is_dir() {
        return MkdirOutcome::AlreadyPresent;
    }

    match fs::create_dir_all(path) {
        Ok(()) => MkdirOutcome::Created,
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => {
            MkdirOutcome::AlreadyPresent
        }
        Err(e) => MkdirOutcome::Failed(e),
    }
}

/// Result of a copy that never overwrites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    DestinationExists,
    SourceMissing,
}

/// Copy `src` to `dest` unless `dest` already exists
pub fn copy_if_absent(src: &Path, dest: &Path) -> ExecutionResult<CopyOutcome> {
    if dest.exists() {
        return Ok(CopyOutcome::DestinationExists);
    }
    if !src.is_file() {
        return Ok(CopyOutcome::SourceMissing);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| ExecutionError::io(parent, e))?;
    }

    let mut reader = fs::File::open(src).map_err(|e| ExecutionError::io(src, e))?;
    let mut writer = match OpenOptions::new().write(true).create_new(true).open(dest) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Ok(CopyOutcome::DestinationExists)
        }
        Err(e) => return Err(ExecutionError::io(dest, e)),
    };
    io::copy(&mut reader, &mut writer).map_err(|e| ExecutionError::io(dest, e))?;

    Ok(CopyOutcome::Copied)
}

/// Read a UTF-8 text file; undecodable content is a transformation error
pub fn read_text(path: &Path) -> ExecutionResult<String> {
    let bytes = fs::read(path).map_err(|e| ExecutionError::io(path, e))?;
    String::from_utf8(bytes).map_err(|_| ExecutionError::transform(path, "file is not valid UTF-8"))
}

/// Write a file, creating parent directories first
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> ExecutionResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ExecutionError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| ExecutionError::io(path, e))
}

/// Remove files in `dir` whose names start with `prefix` and end with `suffix`
pub fn remove_matching(dir: &Path, prefix: &str, suffix: &str) -> ExecutionResult<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(ExecutionError::io(dir, e)),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| ExecutionError::io(dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(prefix) && name.ends_with(suffix) && entry.path().is_file() {
            fs::remove_file(entry.path()).map_err(|e| ExecutionError::io(entry.path(), e))?;
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_make_dir_outcomes() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("img/profile/uploads");

        assert!(matches!(make_dir(&dir), MkdirOutcome::Created));
        assert!(matches!(make_dir(&dir), MkdirOutcome::AlreadyPresent));

        let file = temp.path().join("blocker");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            make_dir(&file.join("child")),
            MkdirOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_copy_if_absent_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("local.example.js");
        let dest = temp.path().join("local-development.js");
        fs::write(&src, "example").unwrap();

        assert_eq!(copy_if_absent(&src, &dest).unwrap(), CopyOutcome::Copied);
        fs::write(&dest, "edited").unwrap();
        assert_eq!(
            copy_if_absent(&src, &dest).unwrap(),
            CopyOutcome::DestinationExists
        );
        assert_eq!(fs::read_to_string(&dest).unwrap(), "edited");
    }

    #[test]
    fn test_copy_if_absent_missing_source() {
        let temp = TempDir::new().unwrap();
        let outcome = copy_if_absent(&temp.path().join("nope.js"), &temp.path().join("out.js"));
        assert_eq!(outcome.unwrap(), CopyOutcome::SourceMissing);
    }

    #[test]
    fn test_read_text_rejects_binary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.js");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            read_text(&path),
            Err(ExecutionError::Transform { .. })
        ));
    }

    #[test]
    fn test_remove_matching() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("application-abc.min.js"), "").unwrap();
        fs::write(temp.path().join("application-abc.min.css"), "").unwrap();
        fs::write(temp.path().join("other.js"), "").unwrap();

        let removed = remove_matching(temp.path(), "application", ".min.js").unwrap();
        assert_eq!(removed, 1);
        assert!(temp.path().join("application-abc.min.css").exists());
        assert!(temp.path().join("other.js").exists());
        assert_eq!(remove_matching(&temp.path().join("missing"), "a", "b").unwrap(), 0);
    }
}
