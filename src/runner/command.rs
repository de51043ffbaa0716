//! External tool execution
//!
//! Any built-in transformation can be replaced by a shell command declared
//! under `tools:` in the configuration. The command is interpolated and run
//! through the configured interpreter in the project directory.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::context::{TaskContext, Verbosity};
use crate::runner::interpolate;
use std::collections::HashMap;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

/// Run a tool command; returns whether it exited successfully
pub fn execute_tool(
    template: &str,
    vars: &HashMap<String, String>,
    ctx: &TaskContext,
) -> ExecutionResult<bool> {
    let exec_str = interpolate(template, vars).map_err(|e| ExecutionError::InvalidTool {
        name: format!("tools.{}", ctx.task),
        error: e.to_string(),
    })?;

    if ctx.verbosity >= Verbosity::Normal {
        ctx.print_info(&format!("$ {}", exec_str));
    }

    let interpreter = ctx.interpreter();
    let mut command = StdCommand::new(&interpreter[0]);
    if interpreter.len() > 1 {
        command.args(&interpreter[1..]);
    }
    command.arg(&exec_str);
    command.current_dir(&ctx.working_dir);

    if let Some(mode) = ctx.mode {
        command.env("NODE_ENV", mode.as_str());
    }

    command.stdin(Stdio::null());
    if ctx.verbosity == Verbosity::Silent {
        command.stdout(Stdio::null());
        command.stderr(Stdio::null());
    } else {
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());
    }

    let status = command
        .status()
        .map_err(|e| ExecutionError::io(&interpreter[0], e))?;

    Ok(status.success())
}

/// Run a tool command and treat a non-zero exit as a failure
pub fn execute_tool_checked(
    template: &str,
    vars: &HashMap<String, String>,
    ctx: &TaskContext,
) -> ExecutionResult<()> {
    if execute_tool(template, vars, ctx)? {
        Ok(())
    } else {
        Err(ExecutionError::CommandFailed(None))
    }
}

/// Quote a path for a POSIX shell
pub fn shell_quote(path: &Path) -> String {
    let s = path.to_string_lossy();
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:@".contains(c))
    {
        s.into_owned()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Space separated, quoted list of paths for `${files}`
pub fn files_var<'a>(paths: impl IntoIterator<Item = &'a Path>) -> String {
    paths
        .into_iter()
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}
