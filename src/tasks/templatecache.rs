//! Template cache module generation
//!
//! Client view templates are inlined into a single script that registers
//! each of them with `$templateCache` under its url.

use crate::assets::{self, SourceFile};
use crate::config::{AssetCategory, TemplateCacheSettings};
use crate::error::ExecutionResult;
use crate::runner::{Outcome, TaskContext};

pub const TEMPLATECACHE_SOURCES: &[AssetCategory] = &[AssetCategory::ClientViews];

/// One cached template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    pub url: String,
    pub contents: String,
}

/// The generated module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateModule {
    pub module: String,
    pub standalone: bool,
    pub entries: Vec<TemplateEntry>,
}

impl TemplateModule {
    pub fn new(settings: &TemplateCacheSettings) -> Self {
        TemplateModule {
            module: settings.module.clone(),
            standalone: settings.standalone,
            entries: Vec::new(),
        }
    }

    /// Add a template read from `file`; its url is `root` followed by the path
    /// below the glob base
    pub fn add(&mut self, root: &str, file: &SourceFile, contents: String) {
        let url = format!("{}{}", root, assets::to_slash(&file.relative_to_base()));
        self.entries.push(TemplateEntry { url, contents });
    }

    pub fn render(&self) -> String {
        let standalone = if self.standalone { ", []" } else { "" };
        let mut out = String::new();

        out.push_str("(function () {\n");
        out.push_str("    'use strict';\n\n");
        out.push_str("    angular\n");
        out.push_str(&format!("        .module('{}'{})\n", self.module, standalone));
        out.push_str("        .run(templates);\n\n");
        out.push_str("   templates.$inject = ['$templateCache'];\n\n");
        out.push_str("  function templates($templateCache) {\n");
        for entry in &self.entries {
            out.push_str(&format!(
                "     $templateCache.put('{}', '{}');\n",
                escape(&entry.url),
                escape(&entry.contents)
            ));
        }
        out.push_str("   }\n");
        out.push_str("})();\n");

        out
    }
}

/// Escape text for a single-quoted script string
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn templatecache(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let settings = &ctx.config.templatecache;
    let files = assets::expand(&ctx.working_dir, &ctx.patterns(AssetCategory::ClientViews))?;

    let mut module = TemplateModule::new(settings);
    for file in &files {
        module.add(&settings.root, file, assets::read_text(&file.path)?);
    }

    let target = ctx.path(&ctx.config.output.build).join(&settings.filename);
    assets::write_file(&target, module.render())?;
    ctx.print_info(&format!(
        "{} templates -> {}/{}",
        module.entries.len(),
        ctx.config.output.build,
        settings.filename
    ));

    Ok(Outcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_render() {
        let file = SourceFile {
            path: PathBuf::from("/p/modules/core/client/views/home.client.view.html"),
            relative: PathBuf::from("modules/core/client/views/home.client.view.html"),
            base: PathBuf::from("modules"),
        };
        let mut module = TemplateModule::new(&TemplateCacheSettings::default());
        module.add("modules/", &file, "<p class='x'>\n  a\\b</p>".to_string());

        let expected = "(function () {\n    'use strict';\n\n    angular\n        .module('core')\n        .run(templates);\n\n   templates.$inject = ['$templateCache'];\n\n  function templates($templateCache) {\n     $templateCache.put('modules/core/client/views/home.client.view.html', '<p class=\\'x\\'>\\n  a\\\\b</p>');\n   }\n})();\n";
        assert_eq!(module.render(), expected);
    }

    #[test]
    fn test_render_standalone_without_templates() {
        let module = TemplateModule {
            module: "templates".to_string(),
            standalone: true,
            entries: Vec::new(),
        };
        let rendered = module.render();
        assert!(rendered.contains(".module('templates', [])"));
        assert!(!rendered.contains("$templateCache.put"));
    }
}
