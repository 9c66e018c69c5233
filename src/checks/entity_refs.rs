//! Cross-check entity references against the live registry.

use crate::extract::extract_entity_refs;
use crate::models::registry::EntitySet;
use crate::models::ValidationIssue;
use serde_json::Value as Json;

pub const CHECK_NAME: &str = "entity_refs";

/// Default similarity cutoff for "Did you mean" suggestions.
pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.6;

/// Warn for every referenced entity id missing from `known`.
pub fn check_entity_refs(doc: &Json, known: &EntitySet, cutoff: f64) -> Vec<ValidationIssue> {
    extract_entity_refs(doc)
        .into_iter()
        .filter(|(id, _)| !known.contains(id))
        .map(|(id, path)| {
            let suggestion = closest_match(&id, known, cutoff).map(|m| format!("Did you mean: {}?", m));
            ValidationIssue::warning(CHECK_NAME, format!("Unknown entity_id '{}' at {}", id, path))
                .with_suggestion(suggestion)
        })
        .collect()
}

/// Best-scoring known id at or above `cutoff`. Ties keep the first id in
/// sorted order.
pub fn closest_match<'a>(target: &str, known: &'a EntitySet, cutoff: f64) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for candidate in known {
        let score = strsim::normalized_levenshtein(target, candidate);
        if score < cutoff {
            continue;
        }
        if best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((candidate.as_str(), score));
        }
    }
    best.map(|(id, _)| id)
}
