//! CSS and JavaScript linting
//!
//! Violations are collected and printed but never fail the plan. Only
//! files that cannot be read or decoded are errors.

use crate::assets::{self, SourceFile};
use crate::config::AssetCategory;
use crate::error::ExecutionResult;
use crate::runner::{execute_tool, files_var, Outcome, TaskContext, Verbosity};
use crate::tasks::source::{line_of, mask, Dialect};
use colored::Colorize;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Categories read by `eslint`
pub const ESLINT_SOURCES: &[AssetCategory] = &[
    AssetCategory::ServerGulpConfig,
    AssetCategory::ServerAllJs,
    AssetCategory::ClientJs,
];

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: usize,
    pub rule: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}  {}  {}",
            self.file.display(),
            self.line,
            self.message,
            self.rule.dimmed()
        )
    }
}

pub fn csslint(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let files = assets::expand(&ctx.working_dir, &ctx.patterns(AssetCategory::ClientCss))?;
    run_linter(ctx, &files, lint_css)
}

pub fn eslint(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let patterns = ctx.config.assets.union(ESLINT_SOURCES);
    let files = assets::expand(&ctx.working_dir, &patterns)?;
    run_linter(ctx, &files, lint_js)
}

fn run_linter(
    ctx: &TaskContext,
    files: &[SourceFile],
    lint: fn(&SourceFile, &str) -> Vec<Diagnostic>,
) -> ExecutionResult<Outcome> {
    if files.is_empty() {
        ctx.print_debug("no files matched");
        return Ok(Outcome::Done);
    }

    if let Some(tool) = ctx.tool() {
        let mut vars = HashMap::new();
        vars.insert(
            "files".to_string(),
            files_var(files.iter().map(|f| f.relative.as_path())),
        );
        if !execute_tool(tool, &vars, ctx)? {
            ctx.print_warn("linter reported problems");
        }
        return Ok(Outcome::Done);
    }

    let mut diagnostics = Vec::new();
    for file in files {
        let source = assets::read_text(&file.path)?;
        diagnostics.extend(lint(file, &source));
    }

    report(ctx, files.len(), &diagnostics);
    Ok(Outcome::Done)
}

/// Print each diagnostic, then a summary line
pub fn report(ctx: &TaskContext, checked: usize, diagnostics: &[Diagnostic]) {
    if ctx.verbosity >= Verbosity::Quiet {
        for diagnostic in diagnostics {
            eprintln!("  {}", diagnostic);
        }
    }

    if diagnostics.is_empty() {
        ctx.print_info(&format!("{} files lint free", checked));
    } else {
        ctx.print_warn(&format!(
            "{} problems in {} files checked",
            diagnostics.len(),
            checked
        ));
    }
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("lint pattern is valid"))
}

/// Lint a stylesheet
pub fn lint_css(file: &SourceFile, source: &str) -> Vec<Diagnostic> {
    static IMPORTANT: OnceLock<Regex> = OnceLock::new();
    static ZERO_UNITS: OnceLock<Regex> = OnceLock::new();
    static ID_SELECTOR: OnceLock<Regex> = OnceLock::new();

    let masked = mask(source, Dialect::Css);
    let mut out = Vec::new();
    let diag = |offset: usize, rule: &'static str, message: &str| Diagnostic {
        file: file.relative.clone(),
        line: line_of(source, offset),
        rule,
        message: message.to_string(),
    };

    for m in regex(&IMPORTANT, r"!\s*important").find_iter(&masked) {
        out.push(diag(m.start(), "important", "Use of !important"));
    }

    for m in regex(&ZERO_UNITS, r"(?:^|[\s:(,])0(?:px|em|rem|pt|ex|ch|vh|vw|cm|mm|in|pc)\b")
        .find_iter(&masked)
    {
        out.push(diag(m.start(), "zero-units", "Values of 0 shouldn't have units specified"));
    }

    // Walk declaration blocks
    let mut selector_start = 0;
    let mut depth = 0usize;
    let mut block: Option<(usize, HashSet<String>)> = None;
    for (offset, ch) in masked.char_indices() {
        match ch {
            '{' => {
                let selector = masked[selector_start..offset].trim();
                if !selector.starts_with('@')
                    && regex(&ID_SELECTOR, r"#[A-Za-z_-][\w-]*").is_match(selector)
                {
                    out.push(diag(offset, "ids", "Don't use IDs in selectors"));
                }
                depth += 1;
                block = Some((offset, HashSet::new()));
                selector_start = offset + 1;
            }
            '}' => {
                if let Some((open, _)) = block.take() {
                    if masked[open + 1..offset].trim().is_empty() {
                        out.push(diag(open, "empty-rules", "Rule is empty"));
                    }
                }
                depth = depth.saturating_sub(1);
                selector_start = offset + 1;
            }
            ';' => {
                if let Some((_, seen)) = block.as_mut() {
                    let declaration = &masked[selector_start..offset];
                    if let Some((property, _)) = declaration.split_once(':') {
                        let property = property.trim().to_ascii_lowercase();
                        if !property.is_empty() && !seen.insert(property.clone()) {
                            out.push(diag(
                                selector_start,
                                "duplicate-properties",
                                &format!("Duplicate property '{}'", property),
                            ));
                        }
                    }
                }
                selector_start = offset + 1;
            }
            _ => {}
        }
    }

    if depth > 0 {
        out.push(diag(source.len(), "errors", "Unclosed block"));
    }

    out.sort_by_key(|d| d.line);
    out
}

/// Lint a script
pub fn lint_js(file: &SourceFile, source: &str) -> Vec<Diagnostic> {
    static DEBUGGER: OnceLock<Regex> = OnceLock::new();
    static EQEQ: OnceLock<Regex> = OnceLock::new();

    let masked = mask(source, Dialect::Js);
    let mut out = Vec::new();
    let diag = |line: usize, rule: &'static str, message: &str| Diagnostic {
        file: file.relative.clone(),
        line,
        rule,
        message: message.to_string(),
    };

    for m in regex(&DEBUGGER, r"\bdebugger\b").find_iter(&masked) {
        out.push(diag(line_of(source, m.start()), "no-debugger", "Unexpected 'debugger' statement"));
    }

    for caps in regex(&EQEQ, r"[^=!<>]\s*(==|!=)[^=]").captures_iter(&masked) {
        let op = caps.get(1).map(|m| (m.start(), m.as_str()));
        if let Some((start, op)) = op {
            let expected = if op == "==" { "===" } else { "!==" };
            out.push(diag(
                line_of(source, start),
                "eqeqeq",
                &format!("Expected '{}' and instead saw '{}'", expected, op),
            ));
        }
    }

    for (index, line) in source.lines().enumerate() {
        if line.ends_with(' ') || line.ends_with('\t') {
            out.push(diag(index + 1, "no-trailing-spaces", "Trailing spaces not allowed"));
        }

        let indent: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
        if indent.contains(' ') && indent.contains('\t') {
            out.push(diag(
                index + 1,
                "no-mixed-spaces-and-tabs",
                "Mixed spaces and tabs",
            ));
        }
    }

    out.sort_by_key(|d| d.line);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(name),
            relative: PathBuf::from(name),
            base: PathBuf::new(),
        }
    }

    fn rules(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
        diagnostics.iter().map(|d| d.rule).collect()
    }

    #[test]
    fn test_css_rules() {
        let css = "#main .title { color: red !important; }\n.empty { }\np { margin: 0px; margin: 1em; }\n";
        let diagnostics = lint_css(&file("a.css"), css);
        assert_eq!(
            rules(&diagnostics),
            vec!["important", "ids", "empty-rules", "zero-units", "duplicate-properties"]
        );
        assert!(diagnostics.iter().any(|d| d.rule == "ids" && d.line == 1));
        assert!(diagnostics.iter().any(|d| d.rule == "important" && d.line == 1));
        assert!(diagnostics.iter().any(|d| d.rule == "empty-rules" && d.line == 2));
        assert!(diagnostics.iter().any(|d| d.rule == "zero-units" && d.line == 3));
        assert!(diagnostics
            .iter()
            .any(|d| d.rule == "duplicate-properties" && d.line == 3));
    }

    #[test]
    fn test_css_clean_file() {
        let css = "/* #not-an-id { } */\n.title { color: red; margin: 0; }\n@media (min-width: 10px) { .a { top: 1px; } }\n";
        assert!(lint_css(&file("a.css"), css).is_empty());
    }

    #[test]
    fn test_css_unclosed_block() {
        let diagnostics = lint_css(&file("a.css"), ".a { color: red;");
        assert_eq!(rules(&diagnostics), vec!["errors"]);
    }

    #[test]
    fn test_js_rules() {
        let js = "function a(x) {\n  if (x == 1) { debugger; }\n  return x !== 2; \n}\n";
        let diagnostics = lint_js(&file("a.js"), js);
        assert_eq!(
            rules(&diagnostics),
            vec!["no-debugger", "eqeqeq", "no-trailing-spaces"]
        );
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.iter().all(|d| d.line == 2 || d.line == 3));
        assert_eq!(
            diagnostics.iter().find(|d| d.rule == "eqeqeq").unwrap().message,
            "Expected '===' and instead saw '=='"
        );
    }

    #[test]
    fn test_js_ignores_strings_and_comments() {
        let js = "// debugger\nvar s = 'a == b';\nvar ok = a === b;\n";
        assert!(lint_js(&file("a.js"), js).is_empty());
    }

    #[test]
    fn test_js_mixed_indent() {
        let js = "\t  var a = 1;\n";
        assert_eq!(rules(&lint_js(&file("a.js"), js)), vec!["no-mixed-spaces-and-tabs"]);
    }
}
