//! YAML syntax check. Syntax is binary: the result either carries a parsed
//! document or exactly one error issue.

use crate::models::{ValidationIssue, ValidationResult};
use serde_json::{Map, Number, Value as Json};
use serde_yaml::Value as Yaml;

pub const CHECK_NAME: &str = "yaml_syntax";

/// Parse `text` and normalize it into a plain map/list tree.
pub fn check_syntax(text: &str) -> ValidationResult {
    if text.trim().is_empty() {
        return ValidationResult::fatal(ValidationIssue::error(CHECK_NAME, "Empty YAML output"));
    }

    let parsed: Yaml = match serde_yaml::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            let line = e.location().map(|loc| loc.line());
            return ValidationResult::fatal(
                ValidationIssue::error(CHECK_NAME, e.to_string()).with_line(line),
            );
        }
    };

    let doc = yaml_to_json(parsed);
    if doc.is_null() {
        return ValidationResult::fatal(ValidationIssue::error(
            CHECK_NAME,
            "YAML parsed to empty/null value",
        ));
    }

    ValidationResult {
        valid: true,
        issues: Vec::new(),
        parsed_document: Some(doc),
    }
}

/// Convert a YAML node into the JSON value model the checks walk.
///
/// Tags such as `!secret` or `!input` are dropped in favor of their value,
/// and non-string mapping keys are stringified.
pub fn yaml_to_json(value: Yaml) -> Json {
    match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Json::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Json::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Json::Number)
                    .unwrap_or_else(|| Json::String(n.to_string()))
            }
        }
        Yaml::String(s) => Json::String(s),
        Yaml::Sequence(items) => Json::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(key_to_string(k), yaml_to_json(v));
            }
            Json::Object(out)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn key_to_string(key: Yaml) -> String {
    match key {
        Yaml::String(s) => s,
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Render a JSON tree back to YAML text.
pub fn dump_yaml(value: &Json) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_default()
}
