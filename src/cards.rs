//! Dashboard structure helpers shared by the schema checks and the dashboard
//! rule engine.
//!
//! A dashboard is `{views: [{title?, path?, cards: [card, ...]}, ...]}`.
//! Container cards (`horizontal-stack`, `vertical-stack`, `grid`) hold a
//! nested `cards` list, and the walkers below flatten them so a card nested
//! several stacks deep is still reached.

use serde_json::Value as Json;

/// Card types whose `cards` list holds nested cards.
pub const STACK_CARD_TYPES: [&str; 3] = ["horizontal-stack", "vertical-stack", "grid"];

pub fn card_type(card: &Json) -> &str {
    card.get("type").and_then(Json::as_str).unwrap_or("")
}

pub fn is_stack(card: &Json) -> bool {
    STACK_CARD_TYPES.contains(&card_type(card))
}

/// View maps of a dashboard. Non-map views and a non-list `views` are skipped.
pub fn views(dashboard: &Json) -> Vec<&Json> {
    match dashboard.get("views") {
        Some(Json::Array(items)) => items.iter().filter(|v| v.is_object()).collect(),
        _ => Vec::new(),
    }
}

/// Top-level cards of a view; empty when `cards` is absent or not a list.
pub fn view_cards(view: &Json) -> &[Json] {
    match view.get("cards") {
        Some(Json::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

/// Visit every card map depth-first. Containers are visited before their
/// children; `location` reads like `view 0 card 2 card 1`.
pub fn walk_cards<'a, F>(cards: &'a [Json], location: &str, visit: &mut F)
where
    F: FnMut(&'a Json, &str),
{
    for (i, card) in cards.iter().enumerate() {
        if !card.is_object() {
            continue;
        }
        let card_loc = format!("{} card {}", location, i);
        visit(card, &card_loc);
        if is_stack(card) {
            if let Some(Json::Array(nested)) = card.get("cards") {
                walk_cards(nested, &card_loc, visit);
            }
        }
    }
}

/// Collect `(entity_id, card_type)` pairs across all views.
///
/// Containers contribute only through their nested cards. A card contributes
/// its `entity` plus every id or `{entity: ..}` item in `entities`.
pub fn collect_card_entities(dashboard: &Json) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (vi, view) in views(dashboard).into_iter().enumerate() {
        walk_cards(view_cards(view), &format!("view {}", vi), &mut |card, _| {
            if is_stack(card) {
                return;
            }
            let ctype = card_type(card).to_string();
            if let Some(entity) = card.get("entity").and_then(Json::as_str) {
                if !entity.is_empty() {
                    pairs.push((entity.to_string(), ctype.clone()));
                }
            }
            if let Some(Json::Array(items)) = card.get("entities") {
                for item in items {
                    let id = match item {
                        Json::String(s) => Some(s.as_str()),
                        Json::Object(_) => item.get("entity").and_then(Json::as_str),
                        _ => None,
                    };
                    if let Some(id) = id {
                        pairs.push((id.to_string(), ctype.clone()));
                    }
                }
            }
        });
    }
    pairs
}
