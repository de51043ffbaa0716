//! Variable interpolation for tool commands
//!
//! Tool commands in the configuration use the `${var}` syntax, for example
//! `lessc ${input} ${output}`. Substitution is a single pass over the
//! template: substituted values are never expanded again.

use crate::error::{InterpolationError, InterpolationResult};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("variable pattern is valid"))
}

/// Replace every `${var}` in `template`
///
/// Names are looked up in `vars`, then in the process environment. The
/// first name found in neither is an error.
pub fn interpolate(template: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let mut missing: Option<String> = None;

    let result = variable_regex().replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        if let Some(value) = vars.get(name) {
            return value.clone();
        }
        if let Ok(value) = env::var(name) {
            return value;
        }
        if missing.is_none() {
            missing = Some(name.to_string());
        }
        String::new()
    });

    match missing {
        Some(name) => Err(InterpolationError::UndefinedVariable(name)),
        None => Ok(result.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_tool_command_interpolation() {
        let result = interpolate(
            "lessc ${input} ${output}",
            &vars(&[("input", "a.less"), ("output", "a.css")]),
        )
        .unwrap();
        assert_eq!(result, "lessc a.less a.css");
    }

    #[test]
    fn test_repeated_variable() {
        let result = interpolate(
            "cleancss ${files} > ${output} && gzip -k ${output}",
            &vars(&[("files", "a.css"), ("output", "out.css")]),
        )
        .unwrap();
        assert_eq!(result, "cleancss a.css > out.css && gzip -k out.css");
    }

    #[test]
    fn test_values_are_not_expanded_again() {
        let result = interpolate(
            "csslint ${files}",
            &vars(&[("files", "'weird/${HOME}.css'")]),
        )
        .unwrap();
        assert_eq!(result, "csslint 'weird/${HOME}.css'");
    }

    #[test]
    fn test_environment_variable() {
        env::set_var("ASSETFLOW_TEST_BIN", "node_modules/.bin");

        let result = interpolate("${ASSETFLOW_TEST_BIN}/eslint", &HashMap::new()).unwrap();
        assert_eq!(result, "node_modules/.bin/eslint");

        env::remove_var("ASSETFLOW_TEST_BIN");
    }

    #[test]
    fn test_undefined_variable() {
        let result = interpolate("eslint ${undefined_var_xyz}", &HashMap::new());
        assert!(matches!(
            result,
            Err(InterpolationError::UndefinedVariable(name)) if name == "undefined_var_xyz"
        ));
    }
}
