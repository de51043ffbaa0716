//! Vendor dependency injection
//!
//! Asset reference files carry marker blocks:
//!
//! ```text
//! css: [
//!     // bower:css
//!     'public/lib/bootstrap/dist/css/bootstrap.css',
//!     // endbower
//! ],
//! ```
//!
//! Everything between a `// bower:<type>` marker and the next `// endbower`
//! is replaced by one `'<path>',` line per vendor file of that type, using
//! the indent of the opening marker.
//!
//! Vendor files come from the `vendor` globs of the configuration. When none
//! are configured, the `main` files of the packages listed in `bower.json`
//! are used instead.

use crate::assets;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{Outcome, TaskContext};
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Reference file rewritten by `wiredep`
pub const DEFAULT_ASSETS_FILE: &str = "default.js";

/// Reference file rewritten by `wiredep:prod`
pub const PRODUCTION_ASSETS_FILE: &str = "production.js";

/// Vendor paths, relative to the project directory with `/` separators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorFiles {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

impl VendorFiles {
    fn of_type(&self, kind: &str) -> Option<&[String]> {
        match kind {
            "css" => Some(&self.css),
            "js" => Some(&self.js),
            _ => None,
        }
    }

    fn push(&mut self, path: String) {
        if path.ends_with(".css") {
            self.css.push(path);
        } else if path.ends_with(".js") {
            self.js.push(path);
        }
    }
}

pub fn wiredep(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let vendor = collect_vendor(ctx)?;
    rewrite_file(ctx, DEFAULT_ASSETS_FILE, &vendor, |path| path.to_string())
}

pub fn wiredep_prod(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let vendor = collect_vendor(ctx)?;
    let root = ctx.working_dir.clone();
    rewrite_file(ctx, PRODUCTION_ASSETS_FILE, &vendor, move |path| {
        prefer_minified(&root, path)
    })
}

fn rewrite_file<F>(
    ctx: &TaskContext,
    file_name: &str,
    vendor: &VendorFiles,
    rewrite: F,
) -> ExecutionResult<Outcome>
where
    F: Fn(&str) -> String,
{
    let target = ctx.path(&ctx.config.output.assets).join(file_name);
    if !target.is_file() {
        ctx.print_warn(&format!("{} not found, nothing to inject", target.display()));
        return Ok(Outcome::Done);
    }

    let original = assets::read_text(&target)?;
    let injected = inject(&original, vendor, rewrite);
    if injected != original {
        assets::write_file(&target, injected)?;
        ctx.print_info(&format!(
            "injected {} css and {} js paths into {}",
            vendor.css.len(),
            vendor.js.len(),
            file_name
        ));
    } else {
        ctx.print_debug("already up to date");
    }

    Ok(Outcome::Done)
}

/// `.css` → `.min.css` (or `.js` → `.min.js`) when the minified file exists
///
/// Only the first occurrence of the extension is swapped.
pub fn prefer_minified(root: &Path, path: &str) -> String {
    let minified = if path.contains(".css") {
        path.replacen(".css", ".min.css", 1)
    } else if path.contains(".js") {
        path.replacen(".js", ".min.js", 1)
    } else {
        return path.to_string();
    };

    if root.join(&minified).is_file() {
        minified
    } else {
        path.to_string()
    }
}

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([ \t]*)//\s*bower:(\S+)\s*$").expect("marker pattern is valid")
    })
}

fn end_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*//\s*endbower\b").expect("marker pattern is valid"))
}

/// Replace every marker block of `content`
///
/// Blocks of unknown types and blocks without a closing marker are left
/// untouched.
pub fn inject<F>(content: &str, vendor: &VendorFiles, rewrite: F) -> String
where
    F: Fn(&str) -> String,
{
    let lines: Vec<&str> = content.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        out.push(line.to_string());
        i += 1;

        let Some(caps) = marker_regex().captures(line) else {
            continue;
        };
        let Some(paths) = vendor.of_type(&caps[2]) else {
            continue;
        };
        let Some(end) = (i..lines.len()).find(|&j| end_regex().is_match(lines[j])) else {
            continue;
        };

        let indent = &caps[1];
        for path in paths {
            out.push(format!("{}'{}',", indent, rewrite(path)));
        }
        i = end;
    }

    let mut joined = out.join("\n");
    if content.ends_with('\n') {
        joined.push('\n');
    }
    joined
}

/// Vendor files from the configured globs, or from `bower.json`
pub fn collect_vendor(ctx: &TaskContext) -> ExecutionResult<VendorFiles> {
    let configured = &ctx.config.vendor;
    if configured.css.is_empty() && configured.js.is_empty() {
        return bower_files(&ctx.working_dir);
    }

    let mut vendor = VendorFiles::default();
    for file in assets::expand(&ctx.working_dir, &configured.css)? {
        vendor.css.push(file.slash_path());
    }
    for file in assets::expand(&ctx.working_dir, &configured.js)? {
        vendor.js.push(file.slash_path());
    }
    Ok(vendor)
}

fn read_json(path: &Path) -> ExecutionResult<Option<Value>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = assets::read_text(path)?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| ExecutionError::transform(path, e))
}

/// `main` files of the packages `bower.json` depends on
pub fn bower_files(root: &Path) -> ExecutionResult<VendorFiles> {
    let mut vendor = VendorFiles::default();
    let Some(manifest) = read_json(&root.join("bower.json"))? else {
        return Ok(vendor);
    };

    let directory = read_json(&root.join(".bowerrc"))?
        .and_then(|rc| rc.get("directory").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "bower_components".to_string());
    let directory = directory.trim_end_matches('/');

    let Some(dependencies) = manifest.get("dependencies").and_then(Value::as_object) else {
        return Ok(vendor);
    };

    for name in dependencies.keys() {
        let package_dir = root.join(directory).join(name);
        let package = match read_json(&package_dir.join(".bower.json"))? {
            Some(package) => Some(package),
            None => read_json(&package_dir.join("bower.json"))?,
        };
        let Some(package) = package else {
            continue;
        };

        let mains: Vec<&str> = match package.get("main") {
            Some(Value::String(main)) => vec![main.as_str()],
            Some(Value::Array(mains)) => mains.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };

        for main in mains {
            let main = main.trim_start_matches("./");
            vendor.push(format!("{}/{}/{}", directory, name, main));
        }
    }

    Ok(vendor)
}
