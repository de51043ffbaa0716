//! Built-in tasks and default plans
//!
//! [`build_registry`] registers every built-in action, the default plans,
//! and then the plans from the configuration, which may replace defaults.

pub mod bootstrap;
pub mod env;
pub mod images;
pub mod lint;
pub mod minify;
pub mod server;
pub mod source;
pub mod styles;
pub mod templatecache;
pub mod watch;
pub mod wiredep;

use crate::config::{AssetCategory, Config};
use crate::error::ConfigResult;
use crate::runner::{par, seq, Step, TaskDef, TaskRegistry};

/// Name of the plan run when none is given
pub const DEFAULT_TASK: &str = "default";

/// Register the built-in actions
pub fn register_builtin(registry: &mut TaskRegistry) -> ConfigResult<()> {
    let tasks = [
        TaskDef::action("env:dev", env::set_development).usage("Switch to development mode"),
        TaskDef::action("env:prod", env::set_production).usage("Switch to production mode"),
        TaskDef::action("csslint", lint::csslint)
            .usage("Lint client stylesheets")
            .consumes(&[AssetCategory::ClientCss]),
        TaskDef::action("eslint", lint::eslint)
            .usage("Lint server and client scripts")
            .consumes(lint::ESLINT_SOURCES),
        TaskDef::action("uglify", minify::uglify)
            .usage("Bundle and minify client scripts")
            .consumes(minify::UGLIFY_SOURCES),
        TaskDef::action("cssmin", minify::cssmin)
            .usage("Bundle and minify client stylesheets")
            .consumes(minify::CSSMIN_SOURCES),
        TaskDef::action("imagemin", images::imagemin)
            .usage("Recompress client images")
            .consumes(images::IMAGEMIN_SOURCES),
        TaskDef::action("wiredep", wiredep::wiredep)
            .usage("Inject vendor files into the default asset file"),
        TaskDef::action("wiredep:prod", wiredep::wiredep_prod)
            .usage("Inject vendor files into the production asset file"),
        TaskDef::action("copyLocalEnvConfig", bootstrap::copy_local_env_config)
            .usage("Create the local development config from its example"),
        TaskDef::action("makeUploadsDir", bootstrap::make_uploads_dir)
            .usage("Create the upload directory"),
        TaskDef::action("templatecache", templatecache::templatecache)
            .usage("Build the client template cache")
            .consumes(templatecache::TEMPLATECACHE_SOURCES),
        TaskDef::action("sass", styles::sass)
            .usage("Compile Sass stylesheets")
            .consumes(styles::SASS_SOURCES),
        TaskDef::action("less", styles::less)
            .usage("Compile Less stylesheets")
            .consumes(styles::LESS_SOURCES),
        TaskDef::action("nodemon", server::nodemon)
            .usage("Run the server with debugging, restart on change")
            .consumes(server::SERVER_SOURCES),
        TaskDef::action("nodemon-nodebug", server::nodemon_nodebug)
            .usage("Run the server, restart on change")
            .consumes(server::SERVER_SOURCES),
        TaskDef::action("watch", watch::watch).usage("Rebuild on change and live reload"),
    ];

    for task in tasks {
        registry.insert(task)?;
    }
    Ok(())
}

/// Default composite plans
pub fn default_plans() -> Vec<(&'static str, &'static str, Vec<Step>)> {
    vec![
        ("lint", "Lint stylesheets and scripts", vec![par(&["csslint", "eslint"])]),
        (
            "build",
            "Lint and minify for production",
            vec![
                seq("env:dev"),
                seq("wiredep:prod"),
                seq("lint"),
                par(&["uglify", "cssmin"]),
            ],
        ),
        (
            "default",
            "Run in development mode",
            vec![
                seq("env:dev"),
                par(&["copyLocalEnvConfig", "makeUploadsDir"]),
                seq("lint"),
                par(&["nodemon", "watch"]),
            ],
        ),
        (
            "debug",
            "Run in debug mode",
            vec![
                seq("env:dev"),
                par(&["copyLocalEnvConfig", "makeUploadsDir"]),
                seq("lint"),
                par(&["nodemon-nodebug", "watch"]),
            ],
        ),
        (
            "prod",
            "Build and run in production mode",
            vec![
                par(&["copyLocalEnvConfig", "makeUploadsDir", "templatecache"]),
                seq("build"),
                seq("env:prod"),
                seq("lint"),
                par(&["nodemon-nodebug", "watch"]),
            ],
        ),
    ]
}

/// Registry with built-ins, default plans and the plans from `config`
pub fn build_registry(config: &Config) -> ConfigResult<TaskRegistry> {
    let mut registry = TaskRegistry::new();
    register_builtin(&mut registry)?;

    for (name, usage, steps) in default_plans() {
        registry.insert(TaskDef::plan(name, steps).usage(usage))?;
    }

    for (name, steps) in &config.plans {
        let steps = steps.iter().cloned().map(Step::from).collect();
        registry.define_plan(name, steps)?;
    }

    Ok(registry)
}
