//! Application server supervision
//!
//! `nodemon` and `nodemon-nodebug` start the server script with
//! `NODE_ENV` set from the mode and restart it whenever a server view,
//! script or config file changes. `nodemon` passes the debug arguments and
//! lists the files behind each restart.

use crate::assets::PatternSet;
use crate::config::{AssetCategory, ServerSettings};
use crate::error::{ExecutionError, ExecutionResult};
use crate::live::FileWatcher;
use crate::runner::{Mode, Outcome, TaskContext, Verbosity};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Categories whose changes restart the server
pub const SERVER_SOURCES: &[AssetCategory] = &[
    AssetCategory::ServerViews,
    AssetCategory::ServerAllJs,
    AssetCategory::ServerConfig,
];

const POLL: Duration = Duration::from_millis(500);

pub fn nodemon(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    supervise(ctx, true)
}

pub fn nodemon_nodebug(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    supervise(ctx, false)
}

/// Whether a changed path should restart the server
pub fn triggers_restart(settings: &ServerSettings, set: &PatternSet, relative: &Path) -> bool {
    let extension_ok = relative
        .extension()
        .map(|ext| settings.ext.iter().any(|e| ext == e.as_str()))
        .unwrap_or(false);
    extension_ok && set.is_match(relative)
}

/// Command line of the server process
pub fn server_command(settings: &ServerSettings, debug: bool) -> Vec<String> {
    let mut argv = vec![settings.command.clone()];
    if debug {
        argv.extend(settings.debug_args.iter().cloned());
    }
    argv.push(settings.script.clone());
    argv
}

/// A running server child process, killed on drop
pub struct ServerProcess {
    argv: Vec<String>,
    working_dir: PathBuf,
    mode: Mode,
    quiet: bool,
    child: Option<Child>,
}

impl ServerProcess {
    pub fn new(ctx: &TaskContext, mode: Mode, debug: bool) -> Self {
        ServerProcess {
            argv: server_command(&ctx.config.server, debug),
            working_dir: ctx.working_dir.clone(),
            mode,
            quiet: ctx.verbosity == Verbosity::Silent,
            child: None,
        }
    }

    pub fn start(&mut self) -> ExecutionResult<()> {
        let mut command = Command::new(&self.argv[0]);
        command
            .args(&self.argv[1..])
            .current_dir(&self.working_dir)
            .env("NODE_ENV", self.mode.as_str())
            .stdin(Stdio::null());
        if self.quiet {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let child = command
            .spawn()
            .map_err(|e| ExecutionError::io(&self.argv[0], e))?;
        self.child = Some(child);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    pub fn restart(&mut self) -> ExecutionResult<()> {
        self.stop();
        self.start()
    }

    /// Exit status if the process ended on its own
    pub fn exited(&mut self) -> Option<Option<i32>> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => {
                self.child = None;
                Some(status.code())
            }
            _ => None,
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

fn supervise(ctx: &TaskContext, debug: bool) -> ExecutionResult<Outcome> {
    let mode = ctx.mode()?;
    let settings = &ctx.config.server;
    let patterns = ctx.config.assets.union(SERVER_SOURCES);
    let set = PatternSet::new(&patterns)?;

    let watcher = FileWatcher::new(&ctx.working_dir, &patterns)?;
    let mut server = ServerProcess::new(ctx, mode, debug);

    ctx.print_info(&format!(
        "starting `{}` (NODE_ENV={})",
        server.argv.join(" "),
        mode
    ));
    server.start()?;

    loop {
        if let Some(code) = server.exited() {
            ctx.print_warn(&format!(
                "app exited with code {:?}, waiting for file changes before starting",
                code
            ));
        }

        let Some(batch) = watcher.next_batch_timeout(POLL)? else {
            continue;
        };
        let changed: Vec<&PathBuf> = batch
            .iter()
            .filter(|p| triggers_restart(settings, &set, p))
            .collect();
        if changed.is_empty() {
            continue;
        }

        if debug {
            for path in &changed {
                ctx.print_info(&format!("changed: {}", path.display()));
            }
        }
        ctx.print_info("restarting due to changes...");
        server.restart()?;
    }
}
