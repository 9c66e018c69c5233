//! Service call format and domain checks.

use crate::extract::extract_service_calls;
use crate::models::ValidationIssue;
use serde_json::Value as Json;

pub const CHECK_NAME: &str = "service_calls";

/// Service domains Home Assistant ships with that generated YAML commonly uses.
pub const KNOWN_SERVICE_DOMAINS: [&str; 32] = [
    "alarm_control_panel",
    "automation",
    "button",
    "camera",
    "climate",
    "counter",
    "cover",
    "fan",
    "homeassistant",
    "humidifier",
    "input_boolean",
    "input_button",
    "input_datetime",
    "input_number",
    "input_select",
    "input_text",
    "light",
    "lock",
    "media_player",
    "notify",
    "number",
    "remote",
    "scene",
    "script",
    "select",
    "siren",
    "switch",
    "timer",
    "tts",
    "vacuum",
    "water_heater",
    "zone",
];

const COMMON_DOMAINS_HINT: &str =
    "Common domains: light, switch, automation, climate, cover, media_player";

/// Warn for malformed `service` values and unknown service domains.
pub fn check_service_calls(doc: &Json) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for service in extract_service_calls(doc) {
        let Some((domain, _)) = service.split_once('.') else {
            issues.push(ValidationIssue::warning(
                CHECK_NAME,
                format!(
                    "Malformed service call '{}': expected 'domain.action' format",
                    service
                ),
            ));
            continue;
        };
        if !KNOWN_SERVICE_DOMAINS.contains(&domain) {
            issues.push(
                ValidationIssue::warning(
                    CHECK_NAME,
                    format!("Unknown service domain '{}' in '{}'", domain, service),
                )
                .with_suggestion(Some(COMMON_DOMAINS_HINT.to_string())),
            );
        }
    }
    issues
}
