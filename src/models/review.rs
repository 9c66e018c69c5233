//! Review finding schema shared by the rule engines, the LLM parser, and the
//! quick-fix classifier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of title characters that participate in the dedup key.
pub const DEDUP_TITLE_PREFIX: usize = 30;

/// Namespace for content-derived finding ids.
const FINDING_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_3c52_8e0d_4b7a_9c3e_51d2_0f84_a7b6);

/// Finding id derived from what the finding says, so re-reviewing the same
/// config yields the same id. `occurrence` separates identical findings.
pub fn content_finding_id(
    automation_id: &str,
    category: FindingCategory,
    title: &str,
    occurrence: usize,
) -> String {
    let name = format!("{}\n{}\n{}\n{}", automation_id, category, title, occurrence);
    Uuid::new_v5(&FINDING_ID_NAMESPACE, name.as_bytes()).to_string()
}

/// Re-derive every id in `findings`, numbering repeats of the same
/// `(automation_id, category, title)` in order.
pub fn assign_finding_ids(findings: &mut [ReviewFinding]) {
    let mut seen: HashMap<(String, FindingCategory, String), usize> = HashMap::new();
    for f in findings.iter_mut() {
        let n = seen
            .entry((f.automation_id.clone(), f.category, f.title.clone()))
            .or_insert(0);
        f.finding_id = content_finding_id(&f.automation_id, f.category, &f.title, *n);
        *n += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Review severity, ordered from most to least urgent.
pub enum FindingSeverity {
    Critical,
    Warning,
    Suggestion,
    Info,
}

impl FindingSeverity {
    pub const ALL: [FindingSeverity; 4] = [
        FindingSeverity::Critical,
        FindingSeverity::Warning,
        FindingSeverity::Suggestion,
        FindingSeverity::Info,
    ];

    /// Sort rank: Critical=0 .. Info=3.
    pub fn rank(&self) -> u8 {
        match self {
            FindingSeverity::Critical => 0,
            FindingSeverity::Warning => 1,
            FindingSeverity::Suggestion => 2,
            FindingSeverity::Info => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingSeverity::Critical => "critical",
            FindingSeverity::Warning => "warning",
            FindingSeverity::Suggestion => "suggestion",
            FindingSeverity::Info => "info",
        }
    }
}

impl FromStr for FindingSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FindingSeverity::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| format!("unknown severity '{}'", s))
    }
}

impl fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Closed set of review categories. Automation categories first, then
/// dashboard categories.
pub enum FindingCategory {
    TriggerEfficiency,
    MissingGuards,
    DeprecatedPatterns,
    Redundancy,
    Security,
    ErrorResilience,
    UnusedEntities,
    InconsistentCards,
    MissingAreaCoverage,
    CardTypeRecommendation,
    LayoutOptimization,
}

impl FindingCategory {
    pub const ALL: [FindingCategory; 11] = [
        FindingCategory::TriggerEfficiency,
        FindingCategory::MissingGuards,
        FindingCategory::DeprecatedPatterns,
        FindingCategory::Redundancy,
        FindingCategory::Security,
        FindingCategory::ErrorResilience,
        FindingCategory::UnusedEntities,
        FindingCategory::InconsistentCards,
        FindingCategory::MissingAreaCoverage,
        FindingCategory::CardTypeRecommendation,
        FindingCategory::LayoutOptimization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCategory::TriggerEfficiency => "trigger_efficiency",
            FindingCategory::MissingGuards => "missing_guards",
            FindingCategory::DeprecatedPatterns => "deprecated_patterns",
            FindingCategory::Redundancy => "redundancy",
            FindingCategory::Security => "security",
            FindingCategory::ErrorResilience => "error_resilience",
            FindingCategory::UnusedEntities => "unused_entities",
            FindingCategory::InconsistentCards => "inconsistent_cards",
            FindingCategory::MissingAreaCoverage => "missing_area_coverage",
            FindingCategory::CardTypeRecommendation => "card_type_recommendation",
            FindingCategory::LayoutOptimization => "layout_optimization",
        }
    }
}

impl FromStr for FindingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FindingCategory::ALL
            .into_iter()
            .find(|cat| cat.as_str() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single review finding from a deterministic rule or the LLM.
pub struct ReviewFinding {
    pub severity: FindingSeverity,
    pub category: FindingCategory,
    #[serde(default)]
    pub automation_id: String,
    #[serde(default)]
    pub automation_alias: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub current_yaml: Option<String>,
    #[serde(default)]
    pub suggested_yaml: Option<String>,
    pub finding_id: String,
}

impl ReviewFinding {
    pub fn new(
        severity: FindingSeverity,
        category: FindingCategory,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let title = title.into();
        ReviewFinding {
            finding_id: content_finding_id("", category, &title, 0),
            severity,
            category,
            automation_id: String::new(),
            automation_alias: String::new(),
            title,
            description: description.into(),
            current_yaml: None,
            suggested_yaml: None,
        }
    }

    pub fn for_automation(mut self, id: impl Into<String>, alias: impl Into<String>) -> Self {
        self.automation_id = id.into();
        self.automation_alias = alias.into();
        self.finding_id = content_finding_id(&self.automation_id, self.category, &self.title, 0);
        self
    }

    pub fn with_yaml(mut self, current: Option<String>, suggested: Option<String>) -> Self {
        self.current_yaml = current;
        self.suggested_yaml = suggested;
        self
    }

    /// `(automation_id, category, title prefix)` identity used when merging
    /// rule findings with LLM findings.
    pub fn dedup_key(&self) -> (String, FindingCategory, String) {
        let prefix: String = self.title.chars().take(DEDUP_TITLE_PREFIX).collect();
        (self.automation_id.clone(), self.category, prefix)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Complete result of one review invocation.
pub struct ReviewResult {
    pub findings: Vec<ReviewFinding>,
    pub summary: String,
    pub automations_reviewed: usize,
    pub dashboards_reviewed: usize,
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl ReviewResult {
    pub fn count(&self, severity: FindingSeverity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }
}
