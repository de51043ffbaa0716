//! Configuration validation
//!
//! This module provides validation logic for configuration files. It runs
//! before any task so that malformed globs and plan cycles are reported up
//! front.

use crate::config::manifest::AssetCategory;
use crate::config::types::{Config, PlanStep};
use crate::error::{ConfigError, ConfigResult};
use std::collections::HashSet;

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    for category in AssetCategory::ALL {
        for pattern in config.assets.patterns(category) {
            validate_glob(pattern)?;
        }
    }

    for pattern in config.vendor.css.iter().chain(config.vendor.js.iter()) {
        validate_glob(pattern)?;
    }

    for (name, steps) in &config.plans {
        validate_plan(name, steps)?;
    }

    detect_circular_plans(config)?;

    if let Some(interpreter) = &config.interpreter {
        if interpreter.is_empty() {
            return Err(ConfigError::Invalid(
                "interpreter must name at least one program".to_string(),
            ));
        }
    }

    Ok(())
}

/// Check that a manifest pattern compiles; a leading `!` marks an exclusion
pub fn validate_glob(pattern: &str) -> ConfigResult<()> {
    let body = pattern.strip_prefix('!').unwrap_or(pattern);
    if body.is_empty() {
        return Err(ConfigError::InvalidGlob {
            pattern: pattern.to_string(),
            error: "empty pattern".to_string(),
        });
    }

    glob::Pattern::new(body).map_err(|e| ConfigError::InvalidGlob {
        pattern: pattern.to_string(),
        error: e.to_string(),
    })?;

    Ok(())
}

/// Validate the shape of a single plan
fn validate_plan(name: &str, steps: &[PlanStep]) -> ConfigResult<()> {
    for step in steps {
        match step {
            PlanStep::Single(task) if task.trim().is_empty() => {
                return Err(ConfigError::Invalid(format!(
                    "plan '{}' contains an empty task name",
                    name
                )));
            }
            PlanStep::Group(tasks) if tasks.is_empty() => {
                return Err(ConfigError::Invalid(format!(
                    "plan '{}' contains an empty parallel group",
                    name
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Detect plans that reference themselves through other plans
fn detect_circular_plans(config: &Config) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    for plan_name in config.plans.keys() {
        let mut stack = Vec::new();
        check_plan_cycle(config, plan_name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check for cycles between plans; task names are leaves
fn check_plan_cycle(
    config: &Config,
    plan_name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    if stack.iter().any(|s| s == plan_name) {
        stack.push(plan_name.to_string());
        return Err(ConfigError::CircularDependency(stack.join(" -> ")));
    }

    if visited.contains(plan_name) {
        return Ok(());
    }

    let steps = match config.plans.get(plan_name) {
        Some(steps) => steps,
        None => return Ok(()),
    };

    stack.push(plan_name.to_string());
    for step in steps {
        for name in step.names() {
            check_plan_cycle(config, name, visited, stack)?;
        }
    }
    stack.pop();
    visited.insert(plan_name.to_string());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(name: &str) -> PlanStep {
        PlanStep::Single(name.to_string())
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_malformed_glob() {
        let mut config = Config::default();
        config.assets.client.css = vec!["modules/[css/*.css".to_string()];

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::InvalidGlob { .. })));
    }

    #[test]
    fn test_validate_exclusion_glob() {
        assert!(validate_glob("!modules/**/*.spec.js").is_ok());
        assert!(validate_glob("!").is_err());
    }

    #[test]
    fn test_validate_empty_group() {
        let mut config = Config::default();
        config
            .plans
            .insert("broken".to_string(), vec![PlanStep::Group(vec![])]);

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_detect_circular_plans() {
        let mut config = Config::default();
        config
            .plans
            .insert("a".to_string(), vec![single("csslint"), single("b")]);
        config.plans.insert(
            "b".to_string(),
            vec![PlanStep::Group(vec!["eslint".to_string(), "a".to_string()])],
        );

        let result = validate_config(&config);
        match result {
            Err(ConfigError::CircularDependency(path)) => {
                assert!(path.contains("a -> b -> a") || path.contains("b -> a -> b"));
            }
            other => panic!("expected circular dependency, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_empty_interpreter() {
        let config = Config {
            interpreter: Some(vec![]),
            ..Config::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }
}
