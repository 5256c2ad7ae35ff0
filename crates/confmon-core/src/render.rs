//! Query template rendering
//!
//! Alert queries are stored as templates with `{{ .key }}` placeholders.
//! Rendering substitutes values from the rule's merged config. Dotted paths
//! (`{{ .labels.team }}`) walk into nested objects.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::merge::ConfigMap;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*\}\}").unwrap()
});

/// Errors produced while rendering a query template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Placeholder refers to a key absent from the config
    #[error("Query template variable '{name}' is not defined in config")]
    MissingVariable { name: String },

    /// Template contains delimiters that do not form a valid placeholder
    #[error("Malformed query template near '{fragment}'")]
    Malformed { fragment: String },
}

/// Render `template`, replacing every placeholder with its config value.
///
/// Strings are inserted verbatim, numbers and booleans in their JSON text
/// form, arrays and objects as compact JSON. A `null` value counts as
/// missing.
pub fn render(template: &str, config: &ConfigMap) -> Result<String, RenderError> {
    let mut output = String::with_capacity(template.len());
    let mut last_end = 0;

    for captures in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        check_literal(&template[last_end..whole.start()])?;
        output.push_str(&template[last_end..whole.start()]);

        let path = &captures[1];
        let value = lookup(config, path).ok_or_else(|| RenderError::MissingVariable {
            name: path.to_string(),
        })?;
        output.push_str(&format_value(value));

        last_end = whole.end();
    }

    check_literal(&template[last_end..])?;
    output.push_str(&template[last_end..]);
    Ok(output)
}

/// Placeholder names referenced by `template`, in order of appearance.
pub fn variables(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}

fn check_literal(segment: &str) -> Result<(), RenderError> {
    let position = segment.find("{{").or_else(|| segment.find("}}"));
    match position {
        Some(pos) => {
            let fragment: String = segment[pos..].chars().take(24).collect();
            Err(RenderError::Malformed { fragment })
        }
        None => Ok(()),
    }
}

fn lookup<'a>(config: &'a ConfigMap, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = config.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn config(value: Value) -> ConfigMap {
        value.as_object().cloned().unwrap()
    }

    #[rstest]
    #[case("up == 0", json!({}), "up == 0")]
    #[case("cpu > {{ .threshold }}", json!({"threshold": 80}), "cpu > 80")]
    #[case("cpu > {{.threshold}}", json!({"threshold": 92.5}), "cpu > 92.5")]
    #[case(
        "node_filesystem_avail{mountpoint=\"{{ .mount }}\"} < {{ .min }}",
        json!({"mount": "/data", "min": 10}),
        "node_filesystem_avail{mountpoint=\"/data\"} < 10"
    )]
    #[case("team={{ .labels.team }}", json!({"labels": {"team": "db"}}), "team=db")]
    #[case("enabled={{ .flag }}", json!({"flag": true}), "enabled=true")]
    fn renders_placeholders(#[case] template: &str, #[case] cfg: Value, #[case] expected: &str) {
        assert_eq!(render(template, &config(cfg)).unwrap(), expected);
    }

    #[test]
    fn missing_key_is_render_error() {
        let err = render("cpu > {{ .threshold }}", &ConfigMap::new()).unwrap_err();
        assert_eq!(
            err,
            RenderError::MissingVariable {
                name: "threshold".into()
            }
        );
    }

    #[test]
    fn null_value_counts_as_missing() {
        let err = render("{{ .threshold }}", &config(json!({"threshold": null}))).unwrap_err();
        assert!(matches!(err, RenderError::MissingVariable { .. }));
    }

    #[rstest]
    #[case("cpu > {{ threshold }}")]
    #[case("cpu > {{ .threshold")]
    #[case("cpu > .threshold }}")]
    fn unbalanced_delimiters_are_malformed(#[case] template: &str) {
        let cfg = config(json!({"threshold": 80}));
        assert!(matches!(
            render(template, &cfg),
            Err(RenderError::Malformed { .. })
        ));
    }

    #[test]
    fn variables_lists_placeholders_in_order() {
        assert_eq!(
            variables("{{ .a }} and {{ .b.c }} and {{ .a }}"),
            vec!["a", "b.c", "a"]
        );
    }
}
