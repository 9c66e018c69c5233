//! Dashboard rules: unused entities, inconsistent cards, area coverage,
//! card-type recommendations, and layout.

use crate::cards::{collect_card_entities, is_stack, view_cards, views};
use crate::extract::domain_of;
use crate::models::registry::EntitySet;
use crate::models::review::{assign_finding_ids, FindingCategory, FindingSeverity, ReviewFinding};
use serde_json::Value as Json;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Domains that normally deserve a place on a dashboard.
pub const DISPLAYABLE_DOMAINS: [&str; 14] = [
    "light",
    "switch",
    "sensor",
    "binary_sensor",
    "climate",
    "cover",
    "media_player",
    "fan",
    "lock",
    "camera",
    "weather",
    "vacuum",
    "humidifier",
    "water_heater",
];

/// Card type best suited to each domain.
pub fn recommended_card_type(domain: &str) -> Option<&'static str> {
    match domain {
        "sensor" => Some("gauge"),
        "climate" => Some("thermostat"),
        "media_player" => Some("media-control"),
        "weather" => Some("weather-forecast"),
        "camera" => Some("picture-entity"),
        _ => None,
    }
}

const UNUSED_EXAMPLES: usize = 3;
const RECOMMENDATION_EXAMPLES: usize = 5;
const LONG_VIEW_CARDS: usize = 8;

fn examples(ids: &[String], max: usize) -> String {
    let mut out = ids.iter().take(max).cloned().collect::<Vec<_>>().join(", ");
    if ids.len() > max {
        out.push_str(&format!(" (+{} more)", ids.len() - max));
    }
    out
}

/// One finding listing known displayable entities that no card shows.
pub fn check_unused_entities(dashboard: &Json, known: &EntitySet) -> Vec<ReviewFinding> {
    let on_cards: HashSet<String> = collect_card_entities(dashboard)
        .into_iter()
        .map(|(id, _)| id)
        .collect();

    let mut by_domain: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for id in known {
        let Some(domain) = domain_of(id) else {
            continue;
        };
        if DISPLAYABLE_DOMAINS.contains(&domain) && !on_cards.contains(id) {
            by_domain.entry(domain).or_default().push(id.clone());
        }
    }
    if by_domain.is_empty() {
        return Vec::new();
    }

    let total: usize = by_domain.values().map(Vec::len).sum();
    let mut lines = vec![format!(
        "{} entities across {} domain(s) are not on any dashboard card:",
        total,
        by_domain.len()
    )];
    for (domain, ids) in &by_domain {
        lines.push(format!(
            "  {} ({}): {}",
            domain,
            ids.len(),
            examples(ids, UNUSED_EXAMPLES)
        ));
    }
    lines.push(
        "Consider adding views or cards for the most important entities, \
         or filtering out entities you don't need on the dashboard."
            .to_string(),
    );

    vec![ReviewFinding::new(
        FindingSeverity::Suggestion,
        FindingCategory::UnusedEntities,
        format!("{} entities not on any dashboard card", total),
        lines.join("\n"),
    )]
}

/// One finding per domain whose entities are shown with more than one card type.
pub fn check_inconsistent_cards(dashboard: &Json) -> Vec<ReviewFinding> {
    let mut by_domain: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (id, ctype) in collect_card_entities(dashboard) {
        if let Some(domain) = domain_of(&id) {
            by_domain.entry(domain.to_string()).or_default().insert(ctype);
        }
    }
    by_domain
        .into_iter()
        .filter(|(_, types)| types.len() > 1)
        .map(|(domain, types)| {
            let joined = types.into_iter().collect::<Vec<_>>().join(", ");
            ReviewFinding::new(
                FindingSeverity::Suggestion,
                FindingCategory::InconsistentCards,
                format!("Inconsistent card types for '{}' domain", domain),
                format!(
                    "Entities in the '{}' domain use multiple card types: {}. \
                     Consider using a consistent card type for visual cohesion.",
                    domain, joined
                ),
            )
        })
        .collect()
}

/// One finding per area whose name no view title contains.
pub fn check_missing_area_coverage(dashboard: &Json, areas: &[String]) -> Vec<ReviewFinding> {
    let titles: Vec<String> = views(dashboard)
        .into_iter()
        .filter_map(|v| v.get("title").and_then(Json::as_str))
        .map(str::to_lowercase)
        .collect();
    areas
        .iter()
        .filter(|name| !name.is_empty())
        .filter(|name| {
            let needle = name.to_lowercase();
            !titles.iter().any(|t| t.contains(&needle))
        })
        .map(|name| {
            ReviewFinding::new(
                FindingSeverity::Suggestion,
                FindingCategory::MissingAreaCoverage,
                format!("No dashboard view for area: {}", name),
                format!(
                    "The area '{}' exists in Home Assistant but has no matching dashboard view. \
                     Consider adding a view for this area to provide full coverage.",
                    name
                ),
            )
        })
        .collect()
}

/// Info findings for entities shown on a card type other than the one
/// recommended for their domain, grouped by `(domain, current, recommended)`.
pub fn check_card_type_recommendations(dashboard: &Json) -> Vec<ReviewFinding> {
    let mut groups: Vec<((String, String, &'static str), Vec<String>)> = Vec::new();
    for (id, current) in collect_card_entities(dashboard) {
        let Some(domain) = domain_of(&id) else {
            continue;
        };
        let Some(recommended) = recommended_card_type(domain) else {
            continue;
        };
        if current.is_empty() || current == recommended {
            continue;
        }
        let key = (domain.to_string(), current, recommended);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, ids)) => ids.push(id),
            None => groups.push((key, vec![id])),
        }
    }
    groups
        .into_iter()
        .map(|((domain, current, recommended), ids)| {
            ReviewFinding::new(
                FindingSeverity::Info,
                FindingCategory::CardTypeRecommendation,
                format!("Consider '{}' card for {} entities", recommended, domain),
                format!(
                    "{} {} entity/entities use '{}' cards. The '{}' card type is designed for \
                     {} entities and may provide a better experience. Entities: {}",
                    ids.len(),
                    domain,
                    current,
                    recommended,
                    domain,
                    examples(&ids, RECOMMENDATION_EXAMPLES)
                ),
            )
        })
        .collect()
}

/// Flag views with many top-level cards and no stack grouping.
pub fn check_layout_optimization(dashboard: &Json) -> Vec<ReviewFinding> {
    views(dashboard)
        .into_iter()
        .filter_map(|view| {
            let cards = view_cards(view);
            if cards.len() <= LONG_VIEW_CARDS || cards.iter().any(is_stack) {
                return None;
            }
            let title = view.get("title").and_then(Json::as_str).unwrap_or("Unnamed");
            Some(ReviewFinding::new(
                FindingSeverity::Suggestion,
                FindingCategory::LayoutOptimization,
                format!("Long single-column layout in '{}'", title),
                format!(
                    "The '{}' view has {} top-level cards with no stack grouping. \
                     Consider using horizontal-stack or vertical-stack cards to organize \
                     related cards and reduce scrolling.",
                    title,
                    cards.len()
                ),
            ))
        })
        .collect()
}

/// All dashboard rules in fixed order. Checks that need registry data are
/// skipped when the caller has none.
pub fn run_all_dashboard_rules(
    dashboard: &Json,
    known: Option<&EntitySet>,
    areas: Option<&[String]>,
) -> Vec<ReviewFinding> {
    let mut findings = Vec::new();
    if let Some(known) = known {
        findings.extend(check_unused_entities(dashboard, known));
    }
    findings.extend(check_inconsistent_cards(dashboard));
    if let Some(areas) = areas {
        findings.extend(check_missing_area_coverage(dashboard, areas));
    }
    findings.extend(check_card_type_recommendations(dashboard));
    findings.extend(check_layout_optimization(dashboard));
    assign_finding_ids(&mut findings);
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(ids: &[&str]) -> EntitySet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unused_entities_grouped_by_domain() {
        let dash = json!({"views": [{"cards": [{"type": "light", "entity": "light.a"}]}]});
        let known = set(&[
            "light.a", "light.b", "sensor.s1", "sensor.s2", "sensor.s3", "sensor.s4",
            "automation.x", "person.me",
        ]);
        let f = check_unused_entities(&dash, &known);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].title, "5 entities not on any dashboard card");
        assert!(f[0].automation_id.is_empty());
        let desc = &f[0].description;
        assert!(desc.contains("across 2 domain(s)"));
        assert!(desc.contains("  light (1): light.b"));
        assert!(desc.contains("  sensor (4): sensor.s1, sensor.s2, sensor.s3 (+1 more)"));
        assert!(desc.find("light (1)").unwrap() < desc.find("sensor (4)").unwrap());
        assert!(!desc.contains("automation.x"));
    }

    #[test]
    fn test_unused_entities_none_when_all_shown() {
        let dash = json!({"views": [{"cards": [{"type": "entities", "entities": ["light.a"]}]}]});
        assert!(check_unused_entities(&dash, &set(&["light.a", "person.me"])).is_empty());
    }

    #[test]
    fn test_inconsistent_cards_per_domain() {
        let dash = json!({"views": [{"cards": [
            {"type": "light", "entity": "light.a"},
            {"type": "entities", "entities": ["light.b", "switch.c"]},
            {"type": "button", "entity": "switch.d"},
            {"type": "tile", "entity": "climate.e"}
        ]}]});
        let f = check_inconsistent_cards(&dash);
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].title, "Inconsistent card types for 'light' domain");
        assert!(f[0].description.contains("entities, light"));
        assert_eq!(f[1].title, "Inconsistent card types for 'switch' domain");
    }

    #[test]
    fn test_missing_area_coverage_uses_substring_match() {
        let dash = json!({"views": [{"title": "Living Room Lights"}, {"title": "Garage"}, {"cards": []}]});
        let areas = vec!["living room".to_string(), "Garage".to_string(), "Attic".to_string(), String::new()];
        let f = check_missing_area_coverage(&dash, &areas);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].title, "No dashboard view for area: Attic");
    }

    #[test]
    fn test_card_type_recommendations_grouped() {
        let cards: Vec<Json> = (0..7)
            .map(|i| json!({"type": "entity", "entity": format!("sensor.t{}", i)}))
            .chain([
                json!({"type": "gauge", "entity": "sensor.ok"}),
                json!({"type": "entities", "entities": ["climate.hall"]}),
                json!({"entity": "camera.no_type"}),
            ])
            .collect();
        let dash = json!({"views": [{"cards": cards}]});
        let f = check_card_type_recommendations(&dash);
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].severity, FindingSeverity::Info);
        assert_eq!(f[0].title, "Consider 'gauge' card for sensor entities");
        assert!(f[0].description.starts_with("7 sensor entity/entities use 'entity' cards."));
        assert!(f[0].description.ends_with("sensor.t4 (+2 more)"));
        assert_eq!(f[1].title, "Consider 'thermostat' card for climate entities");
    }

    #[test]
    fn test_layout_optimization() {
        let flat: Vec<Json> = (0..9).map(|_| json!({"type": "markdown"})).collect();
        let mut stacked = flat.clone();
        stacked.push(json!({"type": "grid", "cards": []}));
        let dash = json!({"views": [
            {"title": "Everything", "cards": flat},
            {"title": "Stacked", "cards": stacked},
            {"cards": (0..8).map(|_| json!({"type": "markdown"})).collect::<Vec<_>>()}
        ]});
        let f = check_layout_optimization(&dash);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].title, "Long single-column layout in 'Everything'");
        assert!(f[0].description.contains("9 top-level cards"));
    }

    #[test]
    fn test_run_all_skips_registry_checks_without_data() {
        let dash = json!({"views": [{"title": "Home", "cards": [{"type": "entity", "entity": "sensor.t"}]}]});
        let without = run_all_dashboard_rules(&dash, None, None);
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].category, FindingCategory::CardTypeRecommendation);

        let known = set(&["sensor.t", "light.x"]);
        let areas = vec!["Kitchen".to_string()];
        let with = run_all_dashboard_rules(&dash, Some(&known), Some(&areas));
        let cats: Vec<FindingCategory> = with.iter().map(|f| f.category).collect();
        assert_eq!(
            cats,
            vec![
                FindingCategory::UnusedEntities,
                FindingCategory::MissingAreaCoverage,
                FindingCategory::CardTypeRecommendation,
            ]
        );
    }
}
