//! Automation rules: trigger efficiency, missing guards, security, and
//! deprecated service calls.
//!
//! Each check takes one automation record. `trigger`/`condition`/`action`
//! may be singular or plural and a bare map or a list; `extract::field_list`
//! normalizes them.

use crate::checks::syntax::dump_yaml;
use crate::extract::{action_service, action_target_ids, domain_of, field_list};
use crate::models::review::{assign_finding_ids, FindingCategory, FindingSeverity, ReviewFinding};
use crate::rules::is_sensitive_domain;
use serde_json::Value as Json;
use std::collections::BTreeSet;

const DEPRECATED_SERVICES: [&str; 2] = ["homeassistant.turn_on", "homeassistant.turn_off"];

pub fn automation_id(automation: &Json) -> String {
    automation
        .get("id")
        .and_then(Json::as_str)
        .unwrap_or("unknown")
        .to_string()
}

pub fn automation_alias(automation: &Json) -> String {
    automation
        .get("alias")
        .and_then(Json::as_str)
        .unwrap_or("Unnamed automation")
        .to_string()
}

pub fn triggers(automation: &Json) -> Vec<&Json> {
    field_list(automation, "trigger", "triggers")
        .into_iter()
        .filter(|t| t.is_object())
        .collect()
}

pub fn conditions(automation: &Json) -> Vec<&Json> {
    field_list(automation, "condition", "conditions")
}

pub fn actions(automation: &Json) -> Vec<&Json> {
    field_list(automation, "action", "actions")
        .into_iter()
        .filter(|a| a.is_object())
        .collect()
}

fn finding(
    automation: &Json,
    severity: FindingSeverity,
    category: FindingCategory,
    title: impl Into<String>,
    description: impl Into<String>,
) -> ReviewFinding {
    ReviewFinding::new(severity, category, title, description)
        .for_automation(automation_id(automation), automation_alias(automation))
}

/// Flag `time_pattern` triggers that poll every few seconds or minutes.
pub fn check_trigger_efficiency(automation: &Json) -> Vec<ReviewFinding> {
    triggers(automation)
        .into_iter()
        .filter(|t| t.get("platform").and_then(Json::as_str) == Some("time_pattern"))
        .filter(|t| {
            let has_seconds = t.get("seconds").map(|v| !v.is_null()).unwrap_or(false);
            let minutes_divisor = t
                .get("minutes")
                .and_then(Json::as_str)
                .map(|m| m.starts_with('/'))
                .unwrap_or(false);
            has_seconds || minutes_divisor
        })
        .map(|_| {
            finding(
                automation,
                FindingSeverity::Warning,
                FindingCategory::TriggerEfficiency,
                "Frequent time_pattern trigger",
                "This automation uses a time_pattern trigger that fires frequently. \
                 Consider using a state-based trigger or increasing the interval.",
            )
        })
        .collect()
}

/// Flag automations that have triggers but no conditions.
pub fn check_missing_guards(automation: &Json) -> Vec<ReviewFinding> {
    if triggers(automation).is_empty() || !conditions(automation).is_empty() {
        return Vec::new();
    }
    vec![finding(
        automation,
        FindingSeverity::Suggestion,
        FindingCategory::MissingGuards,
        "No conditions defined",
        "This automation has triggers but no conditions. \
         Consider adding conditions to prevent unintended activations.",
    )]
}

/// Domains an action touches through its service and its target ids.
pub fn action_domains(action: &Json) -> BTreeSet<String> {
    let mut domains = BTreeSet::new();
    if let Some(d) = domain_of(action_service(action)) {
        domains.insert(d.to_string());
    }
    for id in action_target_ids(action) {
        if let Some(d) = domain_of(&id) {
            domains.insert(d.to_string());
        }
    }
    domains
}

/// Flag actions on sensitive domains. Critical when the automation has no
/// conditions at all.
pub fn check_security_concerns(automation: &Json) -> Vec<ReviewFinding> {
    let unguarded = conditions(automation).is_empty();
    let mut findings = Vec::new();
    for action in actions(automation) {
        let sensitive: Vec<String> = action_domains(action)
            .into_iter()
            .filter(|d| is_sensitive_domain(d))
            .collect();
        if sensitive.is_empty() {
            continue;
        }
        let joined = sensitive.join(", ");
        let (severity, tail) = if unguarded {
            (
                FindingSeverity::Critical,
                "It has NO conditions, meaning the action runs unconditionally.",
            )
        } else {
            (
                FindingSeverity::Warning,
                "Verify that conditions are sufficient to prevent unauthorized activation.",
            )
        };
        findings.push(finding(
            automation,
            severity,
            FindingCategory::Security,
            format!("Sensitive domain without adequate guards: {}", joined),
            format!(
                "This automation controls sensitive domain(s): {}. {}",
                joined, tail
            ),
        ));
    }
    findings
}

/// Domain-specific replacement for a generic `homeassistant.turn_on|off`
/// action, resolved from its first target id.
pub fn replacement_service(action: &Json) -> Option<String> {
    let service = action_service(action);
    if !DEPRECATED_SERVICES.contains(&service) {
        return None;
    }
    let verb = if service.ends_with("turn_on") {
        "turn_on"
    } else {
        "turn_off"
    };
    let ids = action_target_ids(action);
    let domain = domain_of(ids.first()?)?;
    Some(format!("{}.{}", domain, verb))
}

/// Copy of the automation with every resolvable generic turn_on/off call
/// replaced by its domain-specific service. `None` when nothing changed.
pub fn rewrite_deprecated_services(automation: &Json) -> Option<Json> {
    let mut fixed = automation.clone();
    let key = ["action", "actions"]
        .into_iter()
        .find(|k| fixed.get(*k).map(|v| !v.is_null()).unwrap_or(false))?;
    let mut changed = false;
    let mut rewrite = |action: &mut Json| {
        if let Some(svc) = replacement_service(action) {
            action["service"] = Json::String(svc);
            changed = true;
        }
    };
    match fixed.get_mut(key)? {
        Json::Array(items) => items.iter_mut().filter(|a| a.is_object()).for_each(&mut rewrite),
        single @ Json::Object(_) => rewrite(single),
        _ => {}
    }
    changed.then_some(fixed)
}

/// Flag generic `homeassistant.turn_on|off` calls.
///
/// When a replacement domain resolves, the finding carries the offending
/// action as `current_yaml` and the rewritten automation as `suggested_yaml`.
pub fn check_deprecated_patterns(automation: &Json) -> Vec<ReviewFinding> {
    let mut findings = Vec::new();
    for action in actions(automation) {
        let service = action_service(action);
        if !DEPRECATED_SERVICES.contains(&service) {
            continue;
        }
        let replacement = replacement_service(action);
        let hint = replacement
            .as_ref()
            .map(|r| format!(" Use `{}` instead.", r))
            .unwrap_or_default();
        let mut f = finding(
            automation,
            FindingSeverity::Suggestion,
            FindingCategory::DeprecatedPatterns,
            format!("Generic {} call", service),
            format!(
                "`{}` is a generic call. Domain-specific services are preferred for clarity and reliability.{}",
                service, hint
            ),
        );
        if replacement.is_some() {
            let suggested = rewrite_deprecated_services(automation).map(|fixed| dump_yaml(&fixed));
            f = f.with_yaml(Some(dump_yaml(action)), suggested);
        }
        findings.push(f);
    }
    findings
}

/// All automation rules, concatenated in fixed order.
pub fn run_all_rules(automation: &Json) -> Vec<ReviewFinding> {
    let mut findings = check_trigger_efficiency(automation);
    findings.extend(check_missing_guards(automation));
    findings.extend(check_security_concerns(automation));
    findings.extend(check_deprecated_patterns(automation));
    assign_finding_ids(&mut findings);
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trigger_efficiency_seconds_and_minute_divisor() {
        let auto = json!({
            "id": "poll",
            "trigger": [
                {"platform": "time_pattern", "seconds": "/10"},
                {"platform": "time_pattern", "minutes": "/5"},
                {"platform": "time_pattern", "minutes": 5},
                {"platform": "state", "seconds": 3}
            ]
        });
        let findings = check_trigger_efficiency(&auto);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.severity == FindingSeverity::Warning));
        assert_eq!(findings[0].automation_id, "poll");
        assert_eq!(findings[0].automation_alias, "Unnamed automation");
    }

    #[test]
    fn test_missing_guards_requires_triggers() {
        let unguarded = json!({"trigger": {"platform": "sun"}, "action": []});
        assert_eq!(check_missing_guards(&unguarded).len(), 1);
        let guarded = json!({"trigger": {"platform": "sun"}, "condition": [{"condition": "state"}]});
        assert!(check_missing_guards(&guarded).is_empty());
        let no_triggers = json!({"action": [{"service": "light.turn_on"}]});
        assert!(check_missing_guards(&no_triggers).is_empty());
    }

    #[test]
    fn test_security_severity_depends_on_conditions() {
        let action = json!({"service": "homeassistant.turn_on", "target": {"entity_id": "lock.front_door"}});
        let unguarded = json!({"id": "a", "trigger": [{"platform": "sun"}], "action": [action.clone()]});
        let f = check_security_concerns(&unguarded);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].severity, FindingSeverity::Critical);
        assert_eq!(f[0].title, "Sensitive domain without adequate guards: lock");
        assert!(f[0].description.contains("NO conditions"));

        let guarded = json!({
            "id": "a",
            "condition": [{"condition": "template", "value_template": "{{ is_state('person.me', 'home') }}"}],
            "action": action
        });
        let f = check_security_concerns(&guarded);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].severity, FindingSeverity::Warning);
    }

    #[test]
    fn test_security_collects_data_entity_ids_per_action() {
        let auto = json!({"actions": [
            {"service": "script.run", "data": {"entity_id": ["camera.porch", "siren.yard"]}},
            {"service": "light.turn_on", "target": {"entity_id": "light.a"}},
            {"service": "cover.open_cover"}
        ]});
        let f = check_security_concerns(&auto);
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].title, "Sensitive domain without adequate guards: camera, siren");
        assert_eq!(f[1].title, "Sensitive domain without adequate guards: cover");
    }

    #[test]
    fn test_deprecated_pattern_suggests_domain_service() {
        let auto = json!({
            "id": "kitchen",
            "alias": "Kitchen lights",
            "trigger": [{"platform": "sun"}],
            "action": [{"service": "homeassistant.turn_on", "target": {"entity_id": "light.kitchen"}}]
        });
        let f = check_deprecated_patterns(&auto);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].title, "Generic homeassistant.turn_on call");
        assert!(f[0].description.contains("`light.turn_on`"));
        let suggested = f[0].suggested_yaml.as_deref().unwrap();
        assert!(suggested.contains("light.turn_on"));
        assert!(!suggested.contains("homeassistant.turn_on"));
        assert!(f[0].current_yaml.as_deref().unwrap().contains("homeassistant.turn_on"));
    }

    #[test]
    fn test_deprecated_without_targets_has_no_yaml() {
        let auto = json!({"action": {"service": "homeassistant.turn_off"}});
        let f = check_deprecated_patterns(&auto);
        assert_eq!(f.len(), 1);
        assert!(f[0].suggested_yaml.is_none());
        assert!(rewrite_deprecated_services(&auto).is_none());
    }

    #[test]
    fn test_run_all_rules_order() {
        let auto = json!({
            "id": "x",
            "trigger": [{"platform": "time_pattern", "seconds": 30}],
            "action": [{"service": "homeassistant.turn_off", "target": {"entity_id": "siren.yard"}}]
        });
        let cats: Vec<FindingCategory> = run_all_rules(&auto).iter().map(|f| f.category).collect();
        assert_eq!(
            cats,
            vec![
                FindingCategory::TriggerEfficiency,
                FindingCategory::MissingGuards,
                FindingCategory::Security,
                FindingCategory::DeprecatedPatterns,
            ]
        );
    }

    #[test]
    fn test_finding_ids_are_stable_across_runs() {
        let auto = json!({
            "id": "poll",
            "trigger": [
                {"platform": "time_pattern", "seconds": 10},
                {"platform": "time_pattern", "minutes": "/5"}
            ],
            "action": [{"service": "homeassistant.turn_on", "target": {"entity_id": "lock.door"}}]
        });
        let first: Vec<String> = run_all_rules(&auto).into_iter().map(|f| f.finding_id).collect();
        let second: Vec<String> = run_all_rules(&auto).into_iter().map(|f| f.finding_id).collect();
        assert_eq!(first, second);
        let unique: BTreeSet<&String> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
    }
}
