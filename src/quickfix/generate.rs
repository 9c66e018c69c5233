//! Deterministic fix generation for quick fixes.

use super::classify::{classify_findings, SUGGESTED_FIX_DESCRIPTION};
use crate::checks::syntax::dump_yaml;
use crate::models::fix::{EnrichedFinding, FixType};
use crate::models::review::{FindingCategory, ReviewFinding};
use crate::rules::automation::rewrite_deprecated_services;
use serde_json::Value as Json;
use std::collections::HashMap;

pub const DEPRECATED_FIX_DESCRIPTION: &str =
    "Replaced generic homeassistant.turn_on/off with domain-specific calls";

pub const NO_TARGET_FIX_DESCRIPTION: &str =
    "No automation to deploy to; apply the suggested YAML by hand";

/// Rewrite generic turn_on/off calls in `automation`; returns the whole
/// automation as YAML, or `None` when no action could be resolved.
pub fn fix_deprecated_service(
    _finding: &ReviewFinding,
    automation: &Json,
) -> Option<(String, String)> {
    let fixed = rewrite_deprecated_services(automation)?;
    Some((dump_yaml(&fixed), DEPRECATED_FIX_DESCRIPTION.to_string()))
}

/// Generated patch for a finding, falling back to the review's suggestion.
pub fn generate_fix(finding: &ReviewFinding, automation: Option<&Json>) -> Option<(String, String)> {
    if finding.category == FindingCategory::DeprecatedPatterns {
        if let Some(automation) = automation {
            return fix_deprecated_service(finding, automation);
        }
    }
    finding
        .suggested_yaml
        .as_ref()
        .filter(|y| !y.is_empty())
        .map(|y| (y.clone(), SUGGESTED_FIX_DESCRIPTION.to_string()))
}

/// Fill in `fix_yaml` for a quick fix that has none yet.
pub fn enrich_with_generated_fix(
    mut enriched: EnrichedFinding,
    automation: Option<&Json>,
) -> EnrichedFinding {
    if enriched.fix_type != FixType::Quick || enriched.fix_yaml.is_some() {
        return enriched;
    }
    if let Some((yaml, description)) = generate_fix(&enriched.finding, automation) {
        enriched.fix_yaml = Some(yaml);
        enriched.fix_description = description;
    }
    enriched
}

/// Classify `findings` against `automations` and attach generated patches.
/// A quick fix with no automation id has nowhere to be deployed, so it is
/// handed back as guided.
pub fn prepare_fixes(findings: &[ReviewFinding], automations: &[Json]) -> Vec<EnrichedFinding> {
    let by_id: HashMap<&str, &Json> = automations
        .iter()
        .filter_map(|a| Some((a.get("id")?.as_str()?, a)))
        .collect();
    classify_findings(findings, Some(automations))
        .into_iter()
        .map(|ef| {
            let automation = by_id.get(ef.finding.automation_id.as_str()).copied();
            let mut ef = enrich_with_generated_fix(ef, automation);
            if ef.fix_type == FixType::Quick && ef.finding.automation_id.is_empty() {
                ef.fix_type = FixType::Guided;
                ef.fix_yaml = None;
                ef.fix_description = NO_TARGET_FIX_DESCRIPTION.to_string();
            }
            ef
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::review::FindingSeverity;
    use serde_json::json;

    fn deprecated() -> ReviewFinding {
        ReviewFinding::new(
            FindingSeverity::Suggestion,
            FindingCategory::DeprecatedPatterns,
            "Generic homeassistant.turn_off call",
            "",
        )
    }

    #[test]
    fn test_fix_deprecated_rewrites_all_resolvable_actions() {
        let automation = json!({
            "id": "night",
            "actions": [
                {"service": "homeassistant.turn_off", "data": {"entity_id": ["switch.fan", "light.a"]}},
                {"service": "homeassistant.turn_on"},
                {"service": "light.turn_on", "target": {"entity_id": "light.b"}}
            ]
        });
        let (yaml, desc) = fix_deprecated_service(&deprecated(), &automation).unwrap();
        assert_eq!(desc, DEPRECATED_FIX_DESCRIPTION);
        assert!(yaml.contains("switch.turn_off"));
        assert!(yaml.contains("homeassistant.turn_on"));
        assert!(yaml.starts_with("id: night"));
    }

    #[test]
    fn test_generate_fix_fallbacks() {
        assert!(generate_fix(&deprecated(), Some(&json!({"action": []}))).is_none());
        let f = deprecated().with_yaml(None, Some("alias: x".into()));
        let (yaml, desc) = generate_fix(&f, None).unwrap();
        assert_eq!(yaml, "alias: x");
        assert_eq!(desc, SUGGESTED_FIX_DESCRIPTION);
    }

    #[test]
    fn test_enrich_only_touches_quick_without_yaml() {
        let automation = json!({"action": {"service": "homeassistant.turn_on", "target": {"entity_id": "fan.den"}}});
        let quick = EnrichedFinding {
            finding: deprecated(),
            fix_type: FixType::Quick,
            fix_yaml: None,
            requires_confirmation: false,
            fix_description: String::new(),
        };
        let enriched = enrich_with_generated_fix(quick.clone(), Some(&automation));
        assert!(enriched.fix_yaml.as_deref().unwrap().contains("fan.turn_on"));

        let guided = EnrichedFinding {
            fix_type: FixType::Guided,
            ..quick
        };
        assert_eq!(enrich_with_generated_fix(guided.clone(), Some(&automation)), guided);
    }

    #[test]
    fn test_prepare_fixes_keeps_dashboard_suggestions_guided() {
        let automation = json!({
            "id": "den",
            "action": {"service": "homeassistant.turn_on", "target": {"entity_id": "fan.den"}}
        });
        let card = ReviewFinding::new(
            FindingSeverity::Info,
            FindingCategory::CardTypeRecommendation,
            "Consider 'tile' card for light entities",
            "",
        )
        .with_yaml(None, Some("type: tile\nentity: light.den".into()));
        let mut findings = crate::rules::run_all_rules(&automation);
        findings.push(card);

        let fixes = prepare_fixes(&findings, &[automation]);
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].fix_type, FixType::Quick);
        assert!(fixes[0].fix_yaml.as_deref().unwrap().contains("fan.turn_on"));
        assert_eq!(fixes[1].fix_type, FixType::Guided);
        assert!(fixes[1].fix_yaml.is_none());
        assert_eq!(fixes[1].fix_description, NO_TARGET_FIX_DESCRIPTION);
        assert!(fixes[1].finding.suggested_yaml.is_some());
    }
}
