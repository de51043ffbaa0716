//! Core configuration types
//!
//! This module defines the data structures that represent an assetflow.yml configuration file.

use crate::config::manifest::AssetManifest;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global interpreter to use for external tools (e.g., ["sh", "-c"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,

    /// Asset glob catalog
    #[serde(default)]
    pub assets: AssetManifest,

    /// Third-party files injected by the wiredep tasks
    #[serde(default)]
    pub vendor: VendorAssets,

    /// Plans defined or overridden by the user
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plans: BTreeMap<String, Vec<PlanStep>>,

    /// External commands replacing built-in transformations, keyed by task name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tools: HashMap<String, String>,

    /// Application server launched by the nodemon tasks
    #[serde(default)]
    pub server: ServerSettings,

    /// Live reload listener
    #[serde(default)]
    pub livereload: LiveReloadSettings,

    /// Output locations
    #[serde(default)]
    pub output: OutputSettings,

    /// Template cache module generation
    #[serde(default)]
    pub templatecache: TemplateCacheSettings,
}

/// One step of a plan as written in YAML
///
/// A bare name runs on its own, a list of names runs as a parallel group.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PlanStep {
    /// A single task or plan name
    Single(String),

    /// Names started together
    Group(Vec<String>),
}

impl PlanStep {
    /// All names referenced by this step
    pub fn names(&self) -> Vec<&str> {
        match self {
            PlanStep::Single(name) => vec![name.as_str()],
            PlanStep::Group(names) => names.iter().map(|n| n.as_str()).collect(),
        }
    }
}

/// Vendor files, as globs relative to the project directory
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VendorAssets {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

/// How the application server is started
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Entry script passed to the runtime
    pub script: String,

    /// Runtime executable
    pub command: String,

    /// Extra runtime arguments used by the debugging variant
    #[serde(rename = "debug-args")]
    pub debug_args: Vec<String>,

    /// File extensions that trigger a restart
    pub ext: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            script: "server.js".to_string(),
            command: "node".to_string(),
            debug_args: vec!["--debug".to_string()],
            ext: vec!["js".to_string(), "html".to_string()],
        }
    }
}

/// Live reload listener address
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LiveReloadSettings {
    pub host: String,
    pub port: u16,
}

impl Default for LiveReloadSettings {
    fn default() -> Self {
        LiveReloadSettings {
            host: "127.0.0.1".to_string(),
            port: 35729,
        }
    }
}

/// Where tasks write their results, relative to the project directory
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Minified bundles and images
    pub dist: String,

    /// Generated modules such as the template cache
    pub build: String,

    /// Asset reference files rewritten by wiredep
    pub assets: String,

    /// Environment configuration directory
    pub env: String,

    /// Upload directory that must exist before the server starts
    pub uploads: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            dist: "public/dist".to_string(),
            build: "build".to_string(),
            assets: "config/assets".to_string(),
            env: "config/env".to_string(),
            uploads: "modules/users/client/img/profile/uploads".to_string(),
        }
    }
}

/// Template cache module settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateCacheSettings {
    /// Module the templates are registered on
    pub module: String,

    /// Prefix prepended to every template url
    pub root: String,

    /// Declare a new module instead of extending an existing one
    pub standalone: bool,

    /// Output file name inside the build directory
    pub filename: String,
}

impl Default for TemplateCacheSettings {
    fn default() -> Self {
        TemplateCacheSettings {
            module: "core".to_string(),
            root: "modules/".to_string(),
            standalone: false,
            filename: "templates.js".to_string(),
        }
    }
}
