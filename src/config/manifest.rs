//! Asset manifest
//!
//! The manifest is a static catalog of glob patterns grouped by category.
//! Defaults mirror the layout of a modular web application with
//! `modules/<name>/{client,server}` directories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named group of glob patterns in the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetCategory {
    ServerViews,
    ServerAllJs,
    ServerConfig,
    ServerGulpConfig,
    ClientJs,
    ClientCss,
    ClientSass,
    ClientLess,
    ClientViews,
    ClientImg,
    ClientTemplates,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 11] = [
        AssetCategory::ServerViews,
        AssetCategory::ServerAllJs,
        AssetCategory::ServerConfig,
        AssetCategory::ServerGulpConfig,
        AssetCategory::ClientJs,
        AssetCategory::ClientCss,
        AssetCategory::ClientSass,
        AssetCategory::ClientLess,
        AssetCategory::ClientViews,
        AssetCategory::ClientImg,
        AssetCategory::ClientTemplates,
    ];

    /// Dotted name as written in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::ServerViews => "server.views",
            AssetCategory::ServerAllJs => "server.allJS",
            AssetCategory::ServerConfig => "server.config",
            AssetCategory::ServerGulpConfig => "server.gulpConfig",
            AssetCategory::ClientJs => "client.js",
            AssetCategory::ClientCss => "client.css",
            AssetCategory::ClientSass => "client.sass",
            AssetCategory::ClientLess => "client.less",
            AssetCategory::ClientViews => "client.views",
            AssetCategory::ClientImg => "client.img",
            AssetCategory::ClientTemplates => "client.templates",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown asset category: {}", s))
    }
}

/// Top-level asset manifest
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetManifest {
    pub server: ServerAssets,
    pub client: ClientAssets,
}

/// Server-side asset globs
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerAssets {
    pub views: Vec<String>,

    #[serde(rename = "allJS")]
    pub all_js: Vec<String>,

    pub config: Vec<String>,

    #[serde(rename = "gulpConfig")]
    pub gulp_config: Vec<String>,
}

impl Default for ServerAssets {
    fn default() -> Self {
        ServerAssets {
            views: strings(&["modules/*/server/views/*.html"]),
            all_js: strings(&[
                "server.js",
                "config/**/*.js",
                "modules/*/server/**/*.js",
            ]),
            config: strings(&["modules/*/server/config/*.js"]),
            gulp_config: strings(&["assetflow.yml"]),
        }
    }
}

/// Client-side asset globs
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientAssets {
    pub js: Vec<String>,
    pub css: Vec<String>,
    pub sass: Vec<String>,
    pub less: Vec<String>,
    pub views: Vec<String>,
    pub img: Vec<String>,
    pub templates: Vec<String>,
}

impl Default for ClientAssets {
    fn default() -> Self {
        ClientAssets {
            js: strings(&[
                "modules/core/client/app/config.js",
                "modules/core/client/app/init.js",
                "modules/*/client/*.js",
                "modules/*/client/**/*.js",
            ]),
            css: strings(&["modules/*/client/css/*.css"]),
            sass: strings(&["modules/*/client/scss/*.scss"]),
            less: strings(&["modules/*/client/less/*.less"]),
            views: strings(&["modules/*/client/views/**/*.html"]),
            img: strings(&[
                "modules/**/*/img/**/*.jpg",
                "modules/**/*/img/**/*.png",
                "modules/**/*/img/**/*.gif",
                "modules/**/*/img/**/*.svg",
            ]),
            templates: strings(&["build/templates.js"]),
        }
    }
}

impl AssetManifest {
    /// Patterns for a single category
    pub fn patterns(&self, category: AssetCategory) -> &[String] {
        match category {
            AssetCategory::ServerViews => &self.server.views,
            AssetCategory::ServerAllJs => &self.server.all_js,
            AssetCategory::ServerConfig => &self.server.config,
            AssetCategory::ServerGulpConfig => &self.server.gulp_config,
            AssetCategory::ClientJs => &self.client.js,
            AssetCategory::ClientCss => &self.client.css,
            AssetCategory::ClientSass => &self.client.sass,
            AssetCategory::ClientLess => &self.client.less,
            AssetCategory::ClientViews => &self.client.views,
            AssetCategory::ClientImg => &self.client.img,
            AssetCategory::ClientTemplates => &self.client.templates,
        }
    }

    /// Ordered union of several categories, without duplicates
    pub fn union(&self, categories: &[AssetCategory]) -> Vec<String> {
        let mut patterns: Vec<String> = Vec::new();
        for category in categories {
            for pattern in self.patterns(*category) {
                if !patterns.contains(pattern) {
                    patterns.push(pattern.clone());
                }
            }
        }
        patterns
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        for category in AssetCategory::ALL {
            assert_eq!(category.as_str().parse::<AssetCategory>(), Ok(category));
        }
        assert!("client.fonts".parse::<AssetCategory>().is_err());
    }

    #[test]
    fn test_union_keeps_order_and_drops_duplicates() {
        let mut manifest = AssetManifest::default();
        manifest.server.all_js = strings(&["server.js", "shared/*.js"]);
        manifest.client.js = strings(&["shared/*.js", "modules/*/client/*.js"]);

        let union = manifest.union(&[AssetCategory::ServerAllJs, AssetCategory::ClientJs]);
        assert_eq!(
            union,
            vec!["server.js", "shared/*.js", "modules/*/client/*.js"]
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
client:
  css:
    - styles/*.css
"#;
        let manifest: AssetManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.client.css, vec!["styles/*.css"]);
        assert_eq!(manifest.client.templates, vec!["build/templates.js"]);
        assert_eq!(manifest.server.all_js.len(), 3);
    }

    #[test]
    fn test_server_names_use_camel_case() {
        let yaml = r#"
server:
  allJS: [app.js]
  gulpConfig: [build.yml]
"#;
        let manifest: AssetManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.patterns(AssetCategory::ServerAllJs), ["app.js"]);
        assert_eq!(manifest.patterns(AssetCategory::ServerGulpConfig), ["build.yml"]);
    }
}
