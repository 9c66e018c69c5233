//! Validation pipeline for generated automation and dashboard YAML.
//!
//! Automation: syntax -> entity refs -> service calls.
//! Dashboard: syntax -> schema -> card types -> entity refs.
//!
//! Syntax failure returns immediately in both pipelines, and any schema error
//! ends the dashboard pipeline with `valid = false`. The remaining checks
//! only append warnings.

use crate::checks::entity_refs::DEFAULT_FUZZY_CUTOFF;
use crate::checks::{
    check_card_types, check_dashboard_schema, check_entity_refs, check_service_calls,
    check_syntax,
};
use crate::models::registry::EntitySet;
use crate::models::{IssueSeverity, ValidationResult};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
/// Tunables for the advisory checks.
pub struct ValidateOptions {
    pub fuzzy_cutoff: f64,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        ValidateOptions {
            fuzzy_cutoff: DEFAULT_FUZZY_CUTOFF,
        }
    }
}

/// Validate a generated automation.
pub fn validate(text: &str, known: &EntitySet) -> ValidationResult {
    validate_with(text, known, &ValidateOptions::default())
}

pub fn validate_with(text: &str, known: &EntitySet, opts: &ValidateOptions) -> ValidationResult {
    let mut result = check_syntax(text);
    let Some(doc) = result.parsed_document.as_ref().filter(|_| result.valid) else {
        return result;
    };

    let entity_issues = check_entity_refs(doc, known, opts.fuzzy_cutoff);
    let service_issues = check_service_calls(doc);
    debug!(
        entity_refs = entity_issues.len(),
        service_calls = service_issues.len(),
        "automation checks finished"
    );
    result.issues.extend(entity_issues);
    result.issues.extend(service_issues);
    result
}

/// Validate a generated dashboard.
pub fn validate_dashboard(text: &str, known: &EntitySet) -> ValidationResult {
    validate_dashboard_with(text, known, &ValidateOptions::default())
}

pub fn validate_dashboard_with(
    text: &str,
    known: &EntitySet,
    opts: &ValidateOptions,
) -> ValidationResult {
    let mut result = check_syntax(text);
    let Some(doc) = result.parsed_document.clone().filter(|_| result.valid) else {
        return result;
    };

    let schema_issues = check_dashboard_schema(&doc);
    let schema_failed = schema_issues
        .iter()
        .any(|i| i.severity == IssueSeverity::Error);
    result.issues.extend(schema_issues);
    if schema_failed {
        debug!("dashboard schema failed; skipping card and entity checks");
        result.valid = false;
        return result;
    }

    let card_issues = check_card_types(&doc);
    let entity_issues = check_entity_refs(&doc, known, opts.fuzzy_cutoff);
    debug!(
        card_types = card_issues.len(),
        entity_refs = entity_issues.len(),
        "dashboard checks finished"
    );
    result.issues.extend(card_issues);
    result.issues.extend(entity_issues);
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Which pipeline a document goes through.
pub enum DocumentKind {
    Automation,
    Dashboard,
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automation" => Ok(DocumentKind::Automation),
            "dashboard" => Ok(DocumentKind::Dashboard),
            other => Err(format!(
                "unknown document kind '{}' (expected automation|dashboard)",
                other
            )),
        }
    }
}

impl DocumentKind {
    /// Guess the kind from content: a top-level map with `views` is a
    /// dashboard, anything else is treated as an automation.
    pub fn detect(text: &str) -> DocumentKind {
        match serde_yaml::from_str::<serde_yaml::Value>(text) {
            Ok(serde_yaml::Value::Mapping(map)) if map.contains_key("views") => {
                DocumentKind::Dashboard
            }
            _ => DocumentKind::Automation,
        }
    }

    pub fn validate(&self, text: &str, known: &EntitySet, opts: &ValidateOptions) -> ValidationResult {
        match self {
            DocumentKind::Automation => validate_with(text, known, opts),
            DocumentKind::Dashboard => validate_dashboard_with(text, known, opts),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
/// Validation outcome for one file.
pub struct FileValidation {
    pub file: String,
    pub kind: DocumentKind,
    pub result: ValidationResult,
}

#[derive(Debug, Clone, Default, Serialize)]
/// Aggregated counts across all validated files.
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub files: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Serialize)]
/// Results for a set of files plus a summary.
pub struct ValidationReport {
    pub files: Vec<FileValidation>,
    pub summary: Summary,
}

/// Validate several files in parallel. `kind = None` detects per file.
///
/// Unreadable files are reported as a failed syntax result rather than
/// aborting the run. Output is ordered by file path.
pub fn validate_files(
    paths: &[PathBuf],
    kind: Option<DocumentKind>,
    known: &EntitySet,
    opts: &ValidateOptions,
) -> ValidationReport {
    let mut files: Vec<FileValidation> = paths
        .par_iter()
        .map(|path| validate_file(path, kind, known, opts))
        .collect();
    files.sort_by(|a, b| a.file.cmp(&b.file));

    let mut summary = Summary {
        files: files.len(),
        ..Summary::default()
    };
    for fv in &files {
        summary.errors += fv.result.count(IssueSeverity::Error);
        summary.warnings += fv.result.count(IssueSeverity::Warning);
        summary.infos += fv.result.count(IssueSeverity::Info);
        if !fv.result.valid {
            summary.invalid += 1;
        }
    }
    ValidationReport { files, summary }
}

fn validate_file(
    path: &Path,
    kind: Option<DocumentKind>,
    known: &EntitySet,
    opts: &ValidateOptions,
) -> FileValidation {
    let file = path.to_string_lossy().to_string();
    let text = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            return FileValidation {
                file,
                kind: kind.unwrap_or(DocumentKind::Automation),
                result: ValidationResult::fatal(crate::models::ValidationIssue::error(
                    crate::checks::syntax::CHECK_NAME,
                    format!("Failed to read file: {}", e),
                )),
            }
        }
    };
    let kind = kind.unwrap_or_else(|| DocumentKind::detect(&text));
    FileValidation {
        file,
        kind,
        result: kind.validate(&text, known, opts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn known(ids: &[&str]) -> EntitySet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_syntax_failure_short_circuits() {
        let res = validate("", &known(&[]));
        assert!(!res.valid);
        assert_eq!(res.issues.len(), 1);
        assert_eq!(res.issues[0].check_name, "yaml_syntax");
        assert_eq!(res.issues[0].message, "Empty YAML output");
    }

    #[test]
    fn test_automation_pipeline_appends_warnings_in_order() {
        let text = r#"
alias: Porch
trigger:
  - platform: state
    entity_id: binary_sensor.porch_motoin
action:
  - service: lite.turn_on
    target:
      entity_id: light.porch
"#;
        let res = validate(text, &known(&["binary_sensor.porch_motion", "light.porch"]));
        assert!(res.valid);
        assert_eq!(res.issues.len(), 2);
        assert_eq!(res.issues[0].check_name, "entity_refs");
        assert_eq!(
            res.issues[0].suggestion.as_deref(),
            Some("Did you mean: binary_sensor.porch_motion?")
        );
        assert_eq!(res.issues[1].check_name, "service_calls");
        assert!(res.parsed_document.is_some());
    }

    #[test]
    fn test_dashboard_empty_views_continues() {
        let res = validate_dashboard("views: []\n", &known(&[]));
        assert!(res.valid);
        assert_eq!(res.issues.len(), 1);
        assert_eq!(res.issues[0].severity, IssueSeverity::Warning);
    }

    #[test]
    fn test_dashboard_schema_error_aborts() {
        let text = "views:\n  - just a string\n  - cards:\n      - type: bogus\n";
        let res = validate_dashboard(text, &known(&[]));
        assert!(!res.valid);
        // only schema issues; card checks never ran
        assert!(res.issues.iter().all(|i| i.check_name == "dashboard_schema"));
    }

    #[test]
    fn test_dashboard_missing_required_field_is_warning() {
        let text = "views:\n  - title: Home\n    cards:\n      - type: gauge\n";
        let res = validate_dashboard(text, &known(&[]));
        assert!(res.valid);
        assert_eq!(res.issues.len(), 1);
        assert_eq!(res.issues[0].check_name, "card_type");
        assert!(res.issues[0].message.contains("'entity'"));
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(DocumentKind::detect("views: []"), DocumentKind::Dashboard);
        assert_eq!(DocumentKind::detect("alias: x"), DocumentKind::Automation);
        assert_eq!(DocumentKind::detect(":::"), DocumentKind::Automation);
        assert_eq!("dashboard".parse::<DocumentKind>(), Ok(DocumentKind::Dashboard));
        assert!("card".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn test_validate_files_summary_and_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.yaml");
        let b = dir.path().join("b.yaml");
        fs::write(&a, "views:\n  - cards:\n      - type: tile\n").unwrap();
        fs::write(&b, "").unwrap();
        let missing = dir.path().join("c.yaml");
        let report = validate_files(
            &[b.clone(), missing, a.clone()],
            None,
            &known(&[]),
            &ValidateOptions::default(),
        );
        assert_eq!(report.summary.files, 3);
        assert_eq!(report.summary.invalid, 2);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.errors, 2);
        assert!(report.files[0].file.ends_with("a.yaml"));
        assert_eq!(report.files[0].kind, DocumentKind::Dashboard);
    }
}
