//! Fix classification and batch-apply records.

use crate::models::review::ReviewFinding;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// How a finding gets resolved.
pub enum FixType {
    /// A concrete YAML patch exists and can be applied mechanically.
    Quick,
    /// A human has to decide what to change.
    Guided,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A review finding extended with its fix classification.
pub struct EnrichedFinding {
    pub finding: ReviewFinding,
    pub fix_type: FixType,
    #[serde(default)]
    pub fix_yaml: Option<String>,
    pub requires_confirmation: bool,
    #[serde(default)]
    pub fix_description: String,
}

impl EnrichedFinding {
    pub fn is_appliable(&self) -> bool {
        self.fix_type == FixType::Quick && self.fix_yaml.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Outcome of applying one quick fix.
pub struct FixApplicationResult {
    pub finding_id: String,
    pub finding_title: String,
    pub automation_id: String,
    pub success: bool,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Per-item accounting for one batch-apply run.
pub struct BatchResult {
    pub total: usize,
    pub applied: usize,
    pub failed: usize,
    pub results: Vec<FixApplicationResult>,
}
