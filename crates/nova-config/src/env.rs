use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Expand `{{ env.VAR }}` placeholders in raw TOML text
///
/// A fallback can be given with `{{ env.VAR | default("value") }}`. Comment
/// lines are copied through untouched so commented-out secrets never have to
/// be present in the environment.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut output = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        if line.trim_start().starts_with('#') {
            output.push_str(line);
        } else {
            output.push_str(&expand_line(line)?);
        }
    }

    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 1: scoped key, 2: optional default
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
    })
}

fn expand_line(line: &str) -> Result<String, String> {
    let mut failure = None;

    let expanded = placeholder().replace_all(line, |caps: &Captures<'_>| {
        let key = &caps[1];
        let fallback = caps.get(2).map(|m| m.as_str());

        match resolve(key, fallback) {
            Ok(value) => value,
            Err(e) => {
                failure.get_or_insert(e);
                String::new()
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(expanded.into_owned()),
    }
}

fn resolve(key: &str, fallback: Option<&str>) -> Result<String, String> {
    let Some(var_name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    };

    match (std::env::var(var_name), fallback) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_owned()),
        (Err(_), None) => Err(format!("environment variable not found: `{var_name}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "language_code = \"en-US\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn expands_api_key() {
        temp_env::with_var("NOVA_TEST_GOOGLE_KEY", Some("abc123"), || {
            let result = expand_env("key = \"{{ env.NOVA_TEST_GOOGLE_KEY }}\"").unwrap();
            assert_eq!(result, "key = \"abc123\"");
        });
    }

    #[test]
    fn expands_several_vars_across_lines() {
        let vars = [("NOVA_TEST_PROJECT", Some("nova-crm-project")), ("NOVA_TEST_TABLE", Some("crm_records"))];
        temp_env::with_vars(vars, || {
            let result =
                expand_env("project_id = \"{{ env.NOVA_TEST_PROJECT }}\"\ntable = \"{{ env.NOVA_TEST_TABLE }}\"")
                    .unwrap();
            assert_eq!(result, "project_id = \"nova-crm-project\"\ntable = \"crm_records\"");
        });
    }

    #[test]
    fn missing_var_is_an_error() {
        temp_env::with_var_unset("NOVA_TEST_MISSING", || {
            let err = expand_env("token = \"{{ env.NOVA_TEST_MISSING }}\"").unwrap_err();
            assert!(err.contains("NOVA_TEST_MISSING"));
        });
    }

    #[test]
    fn unscoped_key_is_rejected() {
        let err = expand_env("token = \"{{ secrets.TOKEN }}\"").unwrap_err();
        assert!(err.contains("only variables scoped with 'env.'"));
    }

    #[test]
    fn comment_lines_are_not_expanded() {
        temp_env::with_var_unset("NOVA_TEST_MISSING", || {
            let input = "  # token = \"{{ env.NOVA_TEST_MISSING }}\"";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }

    #[test]
    fn default_applies_only_when_unset() {
        temp_env::with_var_unset("NOVA_TEST_LOCATION", || {
            let result = expand_env("location = \"{{ env.NOVA_TEST_LOCATION | default(\"US\") }}\"").unwrap();
            assert_eq!(result, "location = \"US\"");
        });

        temp_env::with_var("NOVA_TEST_LOCATION", Some("EU"), || {
            let result = expand_env("location = \"{{ env.NOVA_TEST_LOCATION | default(\"US\") }}\"").unwrap();
            assert_eq!(result, "location = \"EU\"");
        });
    }
}
