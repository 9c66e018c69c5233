//! Shared data models for validation, review, and fix outputs.
//!
//! - `registry`: collaborator snapshot of known entities and areas.
//! - `review`: review findings, categories, and aggregate review results.
//! - `fix`: fix classification and batch-apply accounting.

pub mod fix;
pub mod registry;
pub mod review;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Severity of a single validation issue.
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single validation issue produced by one check.
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub check_name: String,
    pub message: String,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn error(check_name: &str, message: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Error, check_name, message)
    }

    pub fn warning(check_name: &str, message: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Warning, check_name, message)
    }

    fn new(severity: IssueSeverity, check_name: &str, message: impl Into<String>) -> Self {
        ValidationIssue {
            severity,
            check_name: check_name.to_string(),
            message: message.into(),
            line: None,
            suggestion: None,
        }
    }

    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Aggregated result of one validation run.
///
/// `valid` starts true and only a fatal stage (syntax, dashboard schema)
/// flips it. Advisory checks append issues without touching it.
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    #[serde(default)]
    pub parsed_document: Option<Json>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        ValidationResult {
            valid: true,
            issues: Vec::new(),
            parsed_document: None,
        }
    }
}

impl ValidationResult {
    /// Build a failed result carrying exactly one error issue.
    pub fn fatal(issue: ValidationIssue) -> Self {
        ValidationResult {
            valid: false,
            issues: vec![issue],
            parsed_document: None,
        }
    }

    pub fn count(&self, severity: IssueSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_result_is_valid_and_empty() {
        let res = ValidationResult::default();
        assert!(res.valid);
        assert!(res.issues.is_empty());
        assert_eq!(res.count(IssueSeverity::Error), 0);
    }

    #[test]
    fn test_issue_json_shape() {
        let issue = ValidationIssue::warning("entity_refs", "Unknown entity_id 'light.x' at entity_id")
            .with_suggestion(Some("Did you mean: light.y?".into()));
        let out = serde_json::to_value(&issue).unwrap();
        assert_eq!(out["severity"], "warning");
        assert_eq!(out["check_name"], "entity_refs");
        assert!(out["line"].is_null());
        assert_eq!(out["suggestion"], "Did you mean: light.y?");
    }
}
