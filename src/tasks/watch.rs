//! The `watch` task: rebuild on change and notify browsers
//!
//! Each binding ties a manifest category to the tasks re-run when one of its
//! files changes, and says whether connected browsers are told to reload.
//! Bound tasks are looked up once, when watching starts. A failing bound
//! task is reported and watching goes on.

use crate::assets::{to_slash, PatternSet};
use crate::config::{AssetCategory, AssetManifest};
use crate::error::ExecutionResult;
use crate::live::{FileWatcher, ReloadServer};
use crate::runner::{Action, Mode, Outcome, TaskContext};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A category, the tasks it triggers and whether browsers reload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBinding {
    pub category: AssetCategory,
    pub tasks: Vec<String>,
    pub notify: bool,
}

impl WatchBinding {
    fn new(category: AssetCategory, tasks: &[&str], notify: bool) -> Self {
        WatchBinding {
            category,
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
            notify,
        }
    }
}

/// Bindings in effect for a mode
pub fn bindings(mode: Mode) -> Vec<WatchBinding> {
    use AssetCategory::*;

    let mut bindings = vec![
        WatchBinding::new(ServerViews, &[], true),
        WatchBinding::new(ServerAllJs, &["eslint"], true),
        WatchBinding::new(ClientJs, &["eslint"], true),
        WatchBinding::new(ClientCss, &["csslint"], true),
        WatchBinding::new(ClientSass, &["sass", "csslint"], true),
        WatchBinding::new(ClientLess, &["less", "csslint"], true),
    ];

    match mode {
        Mode::Production => {
            bindings.push(WatchBinding::new(
                ServerGulpConfig,
                &["templatecache", "eslint"],
                false,
            ));
            bindings.push(WatchBinding::new(ClientViews, &["templatecache"], true));
        }
        Mode::Development => {
            bindings.push(WatchBinding::new(ServerGulpConfig, &["eslint"], false));
            bindings.push(WatchBinding::new(ClientViews, &[], true));
        }
    }

    bindings
}

/// Bindings compiled against the manifest
pub struct WatchRules {
    rules: Vec<(WatchBinding, PatternSet)>,
    patterns: Vec<String>,
}

impl WatchRules {
    pub fn new(manifest: &AssetManifest, mode: Mode) -> ExecutionResult<Self> {
        let mut rules = Vec::new();
        let mut categories = Vec::new();

        for binding in bindings(mode) {
            let set = PatternSet::new(manifest.patterns(binding.category))?;
            categories.push(binding.category);
            rules.push((binding, set));
        }

        Ok(WatchRules {
            rules,
            patterns: manifest.union(&categories),
        })
    }

    /// Bindings whose category matches a project-relative path
    pub fn matching(&self, relative: &Path) -> Vec<&WatchBinding> {
        self.rules
            .iter()
            .filter(|(_, set)| set.is_match(relative))
            .map(|(binding, _)| binding)
            .collect()
    }

    /// Task names bound to a path, in binding order without repeats
    pub fn tasks_for(&self, relative: &Path) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.matching(relative)
            .into_iter()
            .flat_map(|b| b.tasks.iter())
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect()
    }

    /// Whether a change to the path notifies browsers
    pub fn notifies(&self, relative: &Path) -> bool {
        self.matching(relative).iter().any(|b| b.notify)
    }

    /// Every pattern of every bound category
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn bindings(&self) -> impl Iterator<Item = &WatchBinding> {
        self.rules.iter().map(|(binding, _)| binding)
    }
}

/// Watch state shared by all change batches
pub struct WatchSession {
    ctx: TaskContext,
    mode: Mode,
    rules: WatchRules,
    actions: Vec<(String, Action)>,
}

impl WatchSession {
    /// Compile the rules and look up every bound task
    pub fn new(ctx: &TaskContext) -> ExecutionResult<Self> {
        let mode = ctx.mode()?;
        let rules = WatchRules::new(&ctx.config.assets, mode)?;

        let mut actions: Vec<(String, Action)> = Vec::new();
        for binding in rules.bindings() {
            for name in &binding.tasks {
                if !actions.iter().any(|(n, _)| n == name) {
                    actions.push((name.clone(), ctx.registry.action(name)?));
                }
            }
        }

        Ok(WatchSession {
            ctx: ctx.clone(),
            mode,
            rules,
            actions,
        })
    }

    pub fn rules(&self) -> &WatchRules {
        &self.rules
    }

    /// Run the tasks bound to a batch of changed paths
    ///
    /// Each task runs at most once per batch. Returns the changed paths
    /// browsers should be told about.
    pub fn handle(&self, changed: &[PathBuf]) -> Vec<String> {
        let mut tasks = Vec::new();
        let mut notify = Vec::new();

        for path in changed {
            let matching = self.rules.matching(path);
            if matching.is_empty() {
                continue;
            }
            self.ctx.print_debug(&format!("changed: {}", path.display()));

            for name in self.rules.tasks_for(path) {
                if !tasks.contains(&name) {
                    tasks.push(name);
                }
            }
            if matching.iter().any(|b| b.notify) {
                notify.push(to_slash(path));
            }
        }

        for name in &tasks {
            self.run_task(name);
        }

        notify
    }

    fn run_task(&self, name: &str) {
        let Some((_, action)) = self.actions.iter().find(|(n, _)| n == name) else {
            return;
        };

        let ctx = self.ctx.for_task(name, Some(self.mode));
        let started = std::time::Instant::now();
        ctx.print_task_start(name);
        match action(&ctx) {
            Ok(_) => ctx.print_task_complete(name, started.elapsed()),
            Err(e) => ctx.print_task_failed(name, &e),
        }
    }
}

pub fn watch(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let session = WatchSession::new(ctx)?;

    let settings = &ctx.config.livereload;
    let reload = ReloadServer::start(&settings.host, settings.port)?;
    ctx.print_info(&format!("live reload listening on {}", reload.local_addr()));

    let watcher = FileWatcher::new(&ctx.working_dir, session.rules().patterns())?;
    ctx.print_info(&format!("watching in {} mode", session.mode));

    loop {
        let batch = watcher.next_batch()?;
        for path in session.handle(&batch) {
            reload.changed(&path);
        }
    }
}
