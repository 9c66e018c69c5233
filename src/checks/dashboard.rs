//! Lovelace dashboard schema and card checks.
//!
//! The schema check is the structural gate: `must be a map`, `missing views`
//! and `views must be a list` return immediately with a single error, and a
//! non-map view is an error for that view only. Everything else here is a
//! warning.

use crate::cards::{card_type, view_cards, walk_cards};
use crate::models::ValidationIssue;
use serde_json::Value as Json;

pub const SCHEMA_CHECK: &str = "dashboard_schema";
pub const CARD_CHECK: &str = "card_type";

/// Card types the generator is allowed to emit.
pub const VALID_CARD_TYPES: [&str; 28] = [
    "entities",
    "gauge",
    "glance",
    "history-graph",
    "horizontal-stack",
    "vertical-stack",
    "media-control",
    "thermostat",
    "weather-forecast",
    "picture-entity",
    "button",
    "light",
    "markdown",
    "map",
    "conditional",
    "grid",
    "statistics-graph",
    "logbook",
    "calendar",
    "energy-date-selection",
    "energy-usage-graph",
    "alarm-panel",
    "humidifier",
    "sensor",
    "tile",
    "area",
    "heading",
    "sections",
];

/// Fields a card type needs beyond `type`.
pub fn required_fields(card_type: &str) -> &'static [&'static str] {
    match card_type {
        "gauge" | "thermostat" | "media-control" | "weather-forecast" | "picture-entity"
        | "button" | "light" | "humidifier" | "sensor" | "tile" | "alarm-panel" => &["entity"],
        _ => &[],
    }
}

const CARD_TYPES_HINT: &str =
    "Valid types include: entities, gauge, glance, history-graph, thermostat, media-control";

/// Validate the overall dashboard structure.
pub fn check_dashboard_schema(doc: &Json) -> Vec<ValidationIssue> {
    let Some(obj) = doc.as_object() else {
        return vec![ValidationIssue::error(
            SCHEMA_CHECK,
            "Dashboard config must be a map with a 'views' key.",
        )];
    };
    let Some(views) = obj.get("views") else {
        return vec![ValidationIssue::error(
            SCHEMA_CHECK,
            "Dashboard config is missing the required 'views' key.",
        )];
    };
    let Some(views) = views.as_array() else {
        return vec![ValidationIssue::error(SCHEMA_CHECK, "'views' must be a list.")];
    };

    let mut issues = Vec::new();
    if views.is_empty() {
        issues.push(ValidationIssue::warning(SCHEMA_CHECK, "Dashboard has no views."));
    }
    for (i, view) in views.iter().enumerate() {
        if !view.is_object() {
            issues.push(ValidationIssue::error(
                SCHEMA_CHECK,
                format!("View {} is not a map.", i),
            ));
            continue;
        }
        match view.get("cards") {
            None | Some(Json::Array(_)) => {}
            Some(_) => issues.push(ValidationIssue::warning(
                SCHEMA_CHECK,
                format!("View {} 'cards' should be a list.", i),
            )),
        }
    }
    issues
}

/// Validate card types and required fields, descending into stacks.
pub fn check_card_types(doc: &Json) -> Vec<ValidationIssue> {
    let Some(Json::Array(views)) = doc.get("views") else {
        return Vec::new();
    };
    let mut issues = Vec::new();
    for (vi, view) in views.iter().enumerate() {
        if !view.is_object() {
            continue;
        }
        walk_cards(view_cards(view), &format!("view {}", vi), &mut |card, loc| {
            issues.extend(check_card(card, loc));
        });
    }
    issues
}

fn check_card(card: &Json, loc: &str) -> Vec<ValidationIssue> {
    let ctype = card_type(card);
    if ctype.is_empty() {
        return vec![ValidationIssue::warning(
            CARD_CHECK,
            format!("{}: card is missing 'type' field.", loc),
        )];
    }
    let mut issues = Vec::new();
    if !VALID_CARD_TYPES.contains(&ctype) {
        issues.push(
            ValidationIssue::warning(CARD_CHECK, format!("{}: unknown card type '{}'.", loc, ctype))
                .with_suggestion(Some(CARD_TYPES_HINT.to_string())),
        );
    }
    for field in required_fields(ctype) {
        if card.get(*field).is_none() {
            issues.push(ValidationIssue::warning(
                CARD_CHECK,
                format!("{}: '{}' card is missing required field '{}'.", loc, ctype, field),
            ));
        }
    }
    issues
}
