//! Deterministic review rules. No LLM involved; these always run and their
//! findings win over LLM findings on merge.

pub mod automation;
pub mod dashboard;

pub use automation::run_all_rules;
pub use dashboard::run_all_dashboard_rules;

/// Domains where an unconfirmed automatic change has real-world
/// safety/security consequences.
pub const SENSITIVE_DOMAINS: [&str; 5] = ["lock", "alarm_control_panel", "cover", "camera", "siren"];

pub fn is_sensitive_domain(domain: &str) -> bool {
    SENSITIVE_DOMAINS.contains(&domain)
}
