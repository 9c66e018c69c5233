//! Quick/guided classification of review findings.

use crate::models::fix::{EnrichedFinding, FixType};
use crate::models::review::{FindingCategory, ReviewFinding};
use crate::rules::automation::{action_domains, actions};
use crate::rules::{is_sensitive_domain, SENSITIVE_DOMAINS};
use serde_json::Value as Json;
use std::collections::HashMap;

pub const SUGGESTED_FIX_DESCRIPTION: &str = "Apply suggested fix from review analysis";

/// Whether a finding touches a sensitive domain through its text, the
/// automation's actions, or its YAML snippets.
pub fn involves_sensitive_domain(finding: &ReviewFinding, automation: Option<&Json>) -> bool {
    let text = format!("{} {}", finding.title, finding.description);
    if SENSITIVE_DOMAINS.iter().any(|d| text.contains(d)) {
        return true;
    }

    if let Some(automation) = automation {
        let touches = actions(automation)
            .into_iter()
            .any(|a| action_domains(a).iter().any(|d| is_sensitive_domain(d)));
        if touches {
            return true;
        }
    }

    [&finding.current_yaml, &finding.suggested_yaml]
        .into_iter()
        .flatten()
        .any(|yaml| {
            SENSITIVE_DOMAINS
                .iter()
                .any(|d| yaml.contains(&format!("{}.", d)))
        })
}

fn decide(category: FindingCategory, sensitive: bool) -> FixType {
    use FindingCategory::*;
    match category {
        Security | Redundancy | ErrorResilience | LayoutOptimization | MissingAreaCoverage
        | UnusedEntities => FixType::Guided,
        MissingGuards if sensitive => FixType::Guided,
        DeprecatedPatterns | CardTypeRecommendation | InconsistentCards => FixType::Quick,
        MissingGuards => FixType::Quick,
        // Needs the intended behavior; not mechanically fixable.
        TriggerEfficiency => FixType::Guided,
    }
}

/// Classify one finding. A quick candidate without `suggested_yaml` is
/// downgraded to guided.
pub fn classify(finding: &ReviewFinding, automation: Option<&Json>) -> EnrichedFinding {
    let sensitive = involves_sensitive_domain(finding, automation);
    let fix_yaml = match decide(finding.category, sensitive) {
        FixType::Quick => finding.suggested_yaml.clone().filter(|y| !y.is_empty()),
        FixType::Guided => None,
    };
    let (fix_type, fix_description) = match fix_yaml {
        Some(_) => (FixType::Quick, SUGGESTED_FIX_DESCRIPTION.to_string()),
        None => (FixType::Guided, String::new()),
    };
    EnrichedFinding {
        finding: finding.clone(),
        fix_type,
        fix_yaml,
        requires_confirmation: sensitive,
        fix_description,
    }
}

/// Classify each finding against the automation with the same id, if any.
pub fn classify_findings(
    findings: &[ReviewFinding],
    automations: Option<&[Json]>,
) -> Vec<EnrichedFinding> {
    let by_id: HashMap<String, &Json> = automations
        .unwrap_or_default()
        .iter()
        .filter_map(|a| {
            let id = a.get("id").and_then(Json::as_str)?;
            (!id.is_empty()).then(|| (id.to_string(), a))
        })
        .collect();
    findings
        .iter()
        .map(|f| classify(f, by_id.get(&f.automation_id).copied()))
        .collect()
}
