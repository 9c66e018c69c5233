//! Entity reference extraction over deserialized configuration trees.
//!
//! Automations and dashboards arrive as `serde_json::Value` trees (YAML is
//! normalized into the same shape by the syntax check). Everything here walks
//! that tree with one recursive-descent visitor and picks out values under
//! recognized keys:
//! - `entity_id` / `entity`: a scalar id or a list of ids.
//! - `entities`: a list of ids or of maps carrying an `entity` key. The maps
//!   are reached by the ordinary recursion, so they report their own path.
//!
//! Recursion enters every nested value, not just the recognized keys, so ids
//! buried under unexpected keys in trigger/condition/action shapes still turn
//! up.

use regex::Regex;
use serde_json::Value as Json;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Keys whose value is an entity id or a list of entity ids.
const ENTITY_KEYS: [&str; 2] = ["entity_id", "entity"];
const ENTITIES_KEY: &str = "entities";

fn entity_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*\.[a-z0-9_]+$").expect("static regex"))
}

/// True for `domain.object_id` shaped strings.
pub fn is_entity_id(s: &str) -> bool {
    entity_id_re().is_match(s)
}

/// Domain part of an entity id or service name (`light.kitchen` -> `light`).
pub fn domain_of(s: &str) -> Option<&str> {
    s.split_once('.').map(|(d, _)| d).filter(|d| !d.is_empty())
}

/// Visit every mapping entry in the tree in document order.
///
/// `visit` receives the key, the value, and the dotted/bracketed location of
/// the entry (`action[0].target.entity_id`).
pub fn walk_entries<'a, F>(value: &'a Json, path: &str, visit: &mut F)
where
    F: FnMut(&str, &'a Json, &str),
{
    match value {
        Json::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                visit(key, child, &child_path);
                walk_entries(child, &child_path, visit);
            }
        }
        Json::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk_entries(item, &format!("{}[{}]", path, i), visit);
            }
        }
        _ => {}
    }
}

/// Collect every value accepted by `pick` with its location.
pub fn collect_matches<T, F>(value: &Json, mut pick: F) -> Vec<(T, String)>
where
    F: FnMut(&str, &Json) -> Vec<T>,
{
    let mut out = Vec::new();
    walk_entries(value, "", &mut |key, child, path| {
        for hit in pick(key, child) {
            out.push((hit, path.to_string()));
        }
    });
    out
}

fn entity_ids_under(key: &str, value: &Json) -> Vec<String> {
    let ids_in_list = |items: &Vec<Json>| -> Vec<String> {
        items
            .iter()
            .filter_map(Json::as_str)
            .filter(|s| is_entity_id(s))
            .map(str::to_string)
            .collect()
    };
    if ENTITY_KEYS.contains(&key) {
        match value {
            Json::String(s) if is_entity_id(s) => vec![s.clone()],
            Json::Array(items) => ids_in_list(items),
            _ => Vec::new(),
        }
    } else if key == ENTITIES_KEY {
        match value {
            Json::Array(items) => ids_in_list(items),
            _ => Vec::new(),
        }
    } else {
        Vec::new()
    }
}

/// Entity references with their locations, in document order.
pub fn extract_entity_refs(value: &Json) -> Vec<(String, String)> {
    collect_matches(value, entity_ids_under)
}

/// Deduplicated entity references for membership tests.
pub fn extract_entity_ids(value: &Json) -> BTreeSet<String> {
    extract_entity_refs(value)
        .into_iter()
        .map(|(id, _)| id)
        .collect()
}

/// Every string value stored under a `service` key.
pub fn extract_service_calls(value: &Json) -> Vec<String> {
    collect_matches(value, |key, child| match (key, child) {
        ("service", Json::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    })
    .into_iter()
    .map(|(s, _)| s)
    .collect()
}

/// Normalize a singular-or-plural field to a list: a bare map becomes a
/// one-element list, anything that is neither map nor list becomes empty.
pub fn as_list(value: Option<&Json>) -> Vec<&Json> {
    match value {
        Some(Json::Array(items)) => items.iter().collect(),
        Some(v @ Json::Object(_)) => vec![v],
        _ => Vec::new(),
    }
}

/// First non-empty of `singular` / `plural` on a map, normalized by
/// [`as_list`].
pub fn field_list<'a>(obj: &'a Json, singular: &str, plural: &str) -> Vec<&'a Json> {
    let pick = |k: &str| obj.get(k).filter(|v| is_truthy(v));
    as_list(pick(singular).or_else(|| pick(plural)))
}

fn is_truthy(v: &Json) -> bool {
    match v {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::String(s) => !s.is_empty(),
        Json::Array(a) => !a.is_empty(),
        Json::Object(o) => !o.is_empty(),
        Json::Number(_) => true,
    }
}

/// Entity ids an action targets via `target.entity_id` then `data.entity_id`.
/// Both accept a scalar or a list.
pub fn action_target_ids(action: &Json) -> Vec<String> {
    let mut ids = Vec::new();
    for section in ["target", "data"] {
        match action.get(section).and_then(|s| s.get("entity_id")) {
            Some(Json::String(s)) => ids.push(s.clone()),
            Some(Json::Array(items)) => {
                ids.extend(items.iter().filter_map(Json::as_str).map(str::to_string))
            }
            _ => {}
        }
    }
    ids
}

/// The `service` string of an action, empty when absent.
pub fn action_service(action: &Json) -> &str {
    action.get("service").and_then(Json::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_entity_id_shape() {
        assert!(is_entity_id("light.kitchen"));
        assert!(is_entity_id("binary_sensor.door_2"));
        assert!(!is_entity_id("Light.kitchen"));
        assert!(!is_entity_id("light"));
        assert!(!is_entity_id("light."));
        assert!(!is_entity_id("1light.kitchen"));
        assert!(!is_entity_id("light.kitchen.extra"));
    }

    #[test]
    fn test_extracts_with_paths_from_automation() {
        let doc = json!({
            "trigger": [{"platform": "state", "entity_id": "binary_sensor.motion"}],
            "action": [{
                "service": "light.turn_on",
                "target": {"entity_id": ["light.kitchen", "light.hall", "not an id"]}
            }]
        });
        let refs = extract_entity_refs(&doc);
        assert_eq!(
            refs,
            vec![
                ("binary_sensor.motion".to_string(), "trigger[0].entity_id".to_string()),
                ("light.kitchen".to_string(), "action[0].target.entity_id".to_string()),
                ("light.hall".to_string(), "action[0].target.entity_id".to_string()),
            ]
        );
    }

    #[test]
    fn test_entities_list_with_maps_and_deep_nesting() {
        let doc = json!({
            "views": [{
                "cards": [{
                    "type": "entities",
                    "entities": ["sensor.a", {"entity": "sensor.b", "name": "B"}]
                }, {
                    "type": "vertical-stack",
                    "cards": [{"type": "gauge", "entity": "sensor.c"}]
                }]
            }],
            "weird": {"deeper": {"entity_id": "switch.d"}}
        });
        let ids = extract_entity_ids(&doc);
        let expected: BTreeSet<String> = ["sensor.a", "sensor.b", "sensor.c", "switch.d"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(ids, expected);
        // map entries inside `entities` are reported once, at their own path
        let refs = extract_entity_refs(&doc);
        assert_eq!(refs.iter().filter(|(id, _)| id == "sensor.b").count(), 1);
        assert!(refs
            .iter()
            .any(|(id, p)| id == "sensor.b" && p == "views[0].cards[0].entities[1].entity"));
    }

    #[test]
    fn test_extract_nothing_from_scalars() {
        assert!(extract_entity_refs(&json!("light.kitchen")).is_empty());
        assert!(extract_entity_refs(&json!(null)).is_empty());
    }

    #[test]
    fn test_service_calls_and_targets() {
        let action = json!({
            "service": "homeassistant.turn_on",
            "target": {"entity_id": "light.a"},
            "data": {"entity_id": ["lock.b"]}
        });
        assert_eq!(extract_service_calls(&json!([action.clone()])), vec!["homeassistant.turn_on"]);
        assert_eq!(action_target_ids(&action), vec!["light.a", "lock.b"]);
        assert_eq!(action_service(&action), "homeassistant.turn_on");
        assert_eq!(domain_of("lock.front"), Some("lock"));
        assert_eq!(domain_of("nodot"), None);
    }

    #[test]
    fn test_field_list_normalizes_singular_and_plural() {
        let single = json!({"trigger": {"platform": "sun"}});
        assert_eq!(field_list(&single, "trigger", "triggers").len(), 1);
        let plural = json!({"triggers": [{"platform": "sun"}, {"platform": "state"}]});
        assert_eq!(field_list(&plural, "trigger", "triggers").len(), 2);
        let empty = json!({"condition": []});
        assert!(field_list(&empty, "condition", "conditions").is_empty());
        let scalar = json!({"trigger": "sun"});
        assert!(field_list(&scalar, "trigger", "triggers").is_empty());
    }
}
