//! Narrow a review to one area or one dashboard view.

use crate::cards::views;
use crate::extract::extract_entity_ids;
use serde_json::{json, Value as Json};
use std::collections::HashMap;

fn references_area(value: &Json, area_id: &str, entity_area_map: &HashMap<String, String>) -> bool {
    extract_entity_ids(value)
        .iter()
        .any(|id| entity_area_map.get(id).map(String::as_str) == Some(area_id))
}

/// Automations referencing at least one entity assigned to `area_id`.
pub fn filter_automations_by_area(
    automations: &[Json],
    area_id: &str,
    entity_area_map: &HashMap<String, String>,
) -> Vec<Json> {
    automations
        .iter()
        .filter(|a| references_area(a, area_id, entity_area_map))
        .cloned()
        .collect()
}

/// Views whose title contains the area's name, or whose cards reference an
/// entity in the area. Returns `{views: [...]}`.
pub fn filter_dashboard_views_by_area(
    dashboard: &Json,
    area_id: &str,
    entity_area_map: &HashMap<String, String>,
    area_names: &HashMap<String, String>,
) -> Json {
    let area_name = area_names
        .get(area_id)
        .map(|n| n.to_lowercase())
        .unwrap_or_default();
    let kept: Vec<Json> = views(dashboard)
        .into_iter()
        .filter(|view| {
            let title = view
                .get("title")
                .and_then(Json::as_str)
                .unwrap_or("")
                .to_lowercase();
            (!area_name.is_empty() && title.contains(&area_name))
                || references_area(view, area_id, entity_area_map)
        })
        .cloned()
        .collect();
    json!({ "views": kept })
}

/// Single view by `path`, falling back to the `view-N` index form.
pub fn filter_dashboard_view_by_path(dashboard: &Json, view_path: &str) -> Json {
    let all = views(dashboard);
    let by_path = all
        .iter()
        .find(|v| v.get("path").and_then(Json::as_str) == Some(view_path));
    let by_index = || {
        view_path
            .strip_prefix("view-")
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|i| all.get(i))
    };
    match by_path.or_else(by_index) {
        Some(view) => json!({ "views": [*view] }),
        None => json!({ "views": [] }),
    }
}
