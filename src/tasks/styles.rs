//! Stylesheet preprocessors
//!
//! Sass sources are compiled in-process with `grass`. Less sources go
//! through an external compiler (`lessc` unless `tools.less` says
//! otherwise). Either way the output lands beside the source, with the
//! `scss`/`less` directory swapped for `css`.

use crate::assets::{self, SourceFile};
use crate::config::AssetCategory;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{execute_tool_checked, shell_quote, Outcome, TaskContext};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::iter;
use std::path::{Path, PathBuf};

pub const SASS_SOURCES: &[AssetCategory] = &[AssetCategory::ClientSass];
pub const LESS_SOURCES: &[AssetCategory] = &[AssetCategory::ClientLess];

const DEFAULT_LESS_TOOL: &str = "lessc ${input} ${output}";

/// Compiled stylesheet path for a preprocessor source
///
/// `modules/core/client/scss/core.scss` becomes
/// `modules/core/client/css/core.css`.
pub fn css_output_path(relative: &Path, source_dir: &str) -> PathBuf {
    let parent = relative.parent().unwrap_or_else(|| Path::new(""));
    let components: Vec<&OsStr> = parent.components().map(|c| c.as_os_str()).collect();

    let dir: PathBuf = match components.iter().rposition(|c| *c == source_dir) {
        Some(index) => components[..index]
            .iter()
            .copied()
            .chain(iter::once(OsStr::new("css")))
            .chain(components[index + 1..].iter().copied())
            .collect(),
        None => parent.to_path_buf(),
    };

    dir.join(relative.with_extension("css").file_name().unwrap_or_default())
}

/// Partials (`_name.scss`) are only compiled through imports
fn is_partial(file: &SourceFile) -> bool {
    file.relative
        .file_name()
        .map(|name| name.to_string_lossy().starts_with('_'))
        .unwrap_or(false)
}

pub fn sass(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let files = assets::expand(&ctx.working_dir, &ctx.patterns(AssetCategory::ClientSass))?;
    let mut compiled = 0;

    for file in files.iter().filter(|f| !is_partial(f)) {
        let target = ctx.path(css_output_path(&file.relative, "scss"));

        match ctx.tool() {
            Some(tool) => run_compiler(ctx, tool, file, &target)?,
            None => {
                let css = compile_sass(&file.path)?;
                assets::write_file(&target, css)?;
            }
        }

        ctx.print_debug(&format!("{} -> {}", file.slash_path(), target.display()));
        compiled += 1;
    }

    ctx.print_info(&format!("compiled {} stylesheets", compiled));
    Ok(Outcome::Done)
}

/// Compile one Sass file; imports resolve relative to it
pub fn compile_sass(path: &Path) -> ExecutionResult<String> {
    let mut options = grass::Options::default();
    if let Some(dir) = path.parent() {
        options = options.load_path(dir);
    }
    grass::from_path(path, &options).map_err(|e| ExecutionError::transform(path, e))
}

pub fn less(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let files = assets::expand(&ctx.working_dir, &ctx.patterns(AssetCategory::ClientLess))?;
    let tool = ctx.tool().unwrap_or(DEFAULT_LESS_TOOL);
    let mut compiled = 0;

    for file in files.iter().filter(|f| !is_partial(f)) {
        let target = ctx.path(css_output_path(&file.relative, "less"));
        run_compiler(ctx, tool, file, &target)?;
        compiled += 1;
    }

    ctx.print_info(&format!("compiled {} stylesheets", compiled));
    Ok(Outcome::Done)
}

fn run_compiler(
    ctx: &TaskContext,
    tool: &str,
    file: &SourceFile,
    target: &Path,
) -> ExecutionResult<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ExecutionError::io(parent, e))?;
    }

    let mut vars = HashMap::new();
    vars.insert("input".to_string(), shell_quote(&file.relative));
    vars.insert("output".to_string(), shell_quote(target));
    vars.insert("files".to_string(), shell_quote(&file.relative));

    execute_tool_checked(tool, &vars, ctx).map_err(|e| match e {
        ExecutionError::CommandFailed(_) => {
            ExecutionError::transform(&file.path, format!("'{}' failed", tool))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_css_output_path() {
        assert_eq!(
            css_output_path(Path::new("modules/core/client/scss/core.scss"), "scss"),
            PathBuf::from("modules/core/client/css/core.css")
        );
        assert_eq!(
            css_output_path(Path::new("modules/core/client/less/theme/dark.less"), "less"),
            PathBuf::from("modules/core/client/css/theme/dark.css")
        );
        assert_eq!(
            css_output_path(Path::new("styles/main.scss"), "scss"),
            PathBuf::from("styles/main.css")
        );
    }

    #[test]
    fn test_compile_sass_with_partial() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("_vars.scss"), "$accent: #336699;").unwrap();
        let main = temp.path().join("main.scss");
        fs::write(&main, "@import 'vars';\n.title { a { color: $accent; } }").unwrap();

        let css = compile_sass(&main).unwrap();
        assert!(css.contains(".title a"));
        assert!(css.contains("#336699") || css.contains("#369"));
    }

    #[test]
    fn test_compile_sass_error() {
        let temp = TempDir::new().unwrap();
        let main = temp.path().join("broken.scss");
        fs::write(&main, ".a { color: $missing; }").unwrap();

        assert!(matches!(
            compile_sass(&main),
            Err(ExecutionError::Transform { .. })
        ));
    }
}
