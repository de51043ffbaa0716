//! Script and stylesheet bundles
//!
//! `uglify` and `cssmin` concatenate their sources, strip comments and
//! redundant whitespace, and write `application-<hash>.min.<ext>` to the
//! dist directory. Each task only removes stale bundles with its own
//! extension, so both can run in the same parallel step.

use crate::assets::{self, SourceFile};
use crate::config::AssetCategory;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{execute_tool_checked, files_var, shell_quote, Outcome, TaskContext};
use crate::tasks::source::{scan, Dialect, SegmentKind};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub const UGLIFY_SOURCES: &[AssetCategory] =
    &[AssetCategory::ClientJs, AssetCategory::ClientTemplates];

pub const CSSMIN_SOURCES: &[AssetCategory] = &[AssetCategory::ClientCss];

const BUNDLE_PREFIX: &str = "application";

/// Length of the content hash in bundle names
const REV_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    Script,
    Style,
}

impl BundleKind {
    fn extension(self) -> &'static str {
        match self {
            BundleKind::Script => "js",
            BundleKind::Style => "css",
        }
    }

    fn minify(self, source: &str) -> String {
        match self {
            BundleKind::Script => minify_js(source),
            BundleKind::Style => minify_css(source),
        }
    }

    /// `.min.js` or `.min.css`
    pub fn suffix(self) -> String {
        format!(".min.{}", self.extension())
    }
}

pub fn uglify(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let files = assets::expand(&ctx.working_dir, &ctx.config.assets.union(UGLIFY_SOURCES))?;
    bundle(ctx, &files, BundleKind::Script)?;
    Ok(Outcome::Done)
}

pub fn cssmin(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let files = assets::expand(&ctx.working_dir, &ctx.config.assets.union(CSSMIN_SOURCES))?;
    bundle(ctx, &files, BundleKind::Style)?;
    Ok(Outcome::Done)
}

/// Build one bundle; returns the written path, or `None` when nothing matched
pub fn bundle(
    ctx: &TaskContext,
    files: &[SourceFile],
    kind: BundleKind,
) -> ExecutionResult<Option<PathBuf>> {
    if files.is_empty() {
        ctx.print_info("no sources, bundle not written");
        return Ok(None);
    }

    let dist = ctx.path(&ctx.config.output.dist);
    let contents = match ctx.tool() {
        Some(tool) => {
            let scratch = dist.join(format!("{}{}", BUNDLE_PREFIX, kind.suffix()));
            let mut vars = HashMap::new();
            vars.insert(
                "files".to_string(),
                files_var(files.iter().map(|f| f.relative.as_path())),
            );
            vars.insert("output".to_string(), shell_quote(&scratch));
            assets::write_file(&scratch, "")?;
            execute_tool_checked(tool, &vars, ctx)?;

            let bytes = fs::read(&scratch).map_err(|e| ExecutionError::io(&scratch, e))?;
            fs::remove_file(&scratch).map_err(|e| ExecutionError::io(&scratch, e))?;
            bytes
        }
        None => concat(files, kind)?.into_bytes(),
    };

    let name = revisioned_name(&contents, kind);
    let removed = assets::remove_matching(&dist, BUNDLE_PREFIX, &kind.suffix())?;
    if removed > 0 {
        ctx.print_debug(&format!("removed {} stale bundle(s)", removed));
    }

    let target = dist.join(&name);
    assets::write_file(&target, &contents)?;
    ctx.print_info(&format!(
        "{} files -> {}/{}",
        files.len(),
        ctx.config.output.dist,
        name
    ));

    Ok(Some(target))
}

fn concat(files: &[SourceFile], kind: BundleKind) -> ExecutionResult<String> {
    let mut out = String::new();
    for file in files {
        let source = assets::read_text(&file.path)?;
        let minified = kind.minify(&source);
        if minified.is_empty() {
            continue;
        }
        out.push_str(&minified);
        if kind == BundleKind::Script && !minified.ends_with(';') {
            out.push(';');
        }
        out.push('\n');
    }
    Ok(out)
}

/// `application-<hash>.min.<ext>`, hashed over the bundle contents
pub fn revisioned_name(contents: &[u8], kind: BundleKind) -> String {
    let hash = blake3::hash(contents).to_hex();
    format!(
        "{}-{}{}",
        BUNDLE_PREFIX,
        &hash.as_str()[..REV_LEN],
        kind.suffix()
    )
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Strip comments and squeeze whitespace in a script
///
/// Line breaks are kept where automatic semicolon insertion could depend
/// on them.
pub fn minify_js(source: &str) -> String {
    squeeze(source, Dialect::Js, |prev, next, newline| {
        if newline && !"{;,([=:?&|!".contains(prev) && !"})],;.:?=&|".contains(next) {
            Some('\n')
        } else if (is_word(prev) && is_word(next)) || (prev == next && "+-".contains(prev)) {
            Some(' ')
        } else {
            None
        }
    })
}

/// Strip comments and squeeze whitespace in a stylesheet
///
/// The last `;` of a declaration block is dropped.
pub fn minify_css(source: &str) -> String {
    const TIGHT: &str = "{};:,>";
    squeeze(source, Dialect::Css, |prev, next, _| {
        if TIGHT.contains(prev) || TIGHT.contains(next) || next == ')' || prev == '(' {
            None
        } else {
            Some(' ')
        }
    })
}

/// Walk code segments, dropping comments and replacing each whitespace run
/// with whatever `separator(prev, next, had_newline)` asks for
fn squeeze<F>(source: &str, dialect: Dialect, separator: F) -> String
where
    F: Fn(char, char, bool) -> Option<char>,
{
    let mut out = String::with_capacity(source.len());
    let mut pending: Option<bool> = None;

    let flush = |out: &mut String, pending: &mut Option<bool>, next: char| {
        if let (Some(newline), Some(prev)) = (pending.take(), out.chars().last()) {
            if let Some(sep) = separator(prev, next, newline) {
                out.push(sep);
            }
        }
    };

    for segment in scan(source, dialect) {
        match segment.kind {
            SegmentKind::Code => {
                for ch in segment.text.chars() {
                    if ch.is_whitespace() {
                        let newline = pending.unwrap_or(false) || ch == '\n';
                        pending = Some(newline);
                    } else {
                        flush(&mut out, &mut pending, ch);
                        if ch == '}' && dialect == Dialect::Css && out.ends_with(';') {
                            out.pop();
                        }
                        out.push(ch);
                    }
                }
            }
            SegmentKind::Comment => {
                let newline = pending.unwrap_or(false) || segment.text.contains('\n');
                pending = Some(newline);
            }
            SegmentKind::String | SegmentKind::Regex => {
                if let Some(quote) = segment.text.chars().next() {
                    flush(&mut out, &mut pending, quote);
                }
                out.push_str(segment.text);
            }
        }
    }

    out
}
