//! Configuration file parsing and discovery

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult, FlowError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["assetflow.yml", "assetflow.yaml"];

/// Find the configuration file by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the configuration file starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a configuration file from a path
pub fn parse_config_file(path: &Path) -> Result<Config, FlowError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read file: {}", e)))?;

    parse_config(&contents)
}

/// Parse configuration from a string
///
/// An empty document yields the default configuration.
pub fn parse_config(yaml: &str) -> Result<Config, FlowError> {
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// The project directory is the one holding the config file
pub fn project_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_simple_config() {
        let yaml = r#"
plans:
  hello: [lint]
"#;
        let config = parse_config(yaml).unwrap();
        assert!(config.plans.contains_key("hello"));
    }

    #[test]
    fn test_parse_empty_document() {
        let config = parse_config("   \n").unwrap();
        assert!(config.plans.is_empty());
        assert_eq!(config.output.build, "build");
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_config("plans: [unclosed");
        assert!(matches!(result, Err(FlowError::Yaml(_))));
    }

    #[test]
    fn test_parse_ignores_unknown_top_level_keys() {
        let yaml = "name: my-app\nusage: assets\nplans:\n  hello: [lint]\n";
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.plans.len(), 1);
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("assetflow.yml");
        fs::write(&config_path, "plans: {}\n").unwrap();

        let found = find_config_file_from(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("assetflow.yaml");
        let sub_dir = temp_dir.path().join("modules").join("core");

        fs::create_dir_all(&sub_dir).unwrap();
        fs::write(&config_path, "plans: {}\n").unwrap();

        let found = find_config_file_from(sub_dir).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_config_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = find_config_file_from(temp_dir.path().to_path_buf());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_project_dir() {
        assert_eq!(project_dir(Path::new("assetflow.yml")), PathBuf::from("."));
        assert_eq!(
            project_dir(Path::new("/srv/app/assetflow.yml")),
            PathBuf::from("/srv/app")
        );
    }
}
