//! LLM completion capability consumed by review orchestration.
//!
//! The backend wire protocol lives with the caller; the core only needs a
//! system+user prompt pair in and text plus token usage out.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Completion text and usage metadata from one LLM call.
pub struct LlmResponse {
    pub content: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<LlmResponse>;
}

/// Backend that answers every prompt with a recorded response.
///
/// Without a recording every call fails, which the review engine turns into
/// a rule-findings-only review.
#[derive(Debug, Clone, Default)]
pub struct ReplayBackend {
    content: Option<String>,
    model: String,
}

impl ReplayBackend {
    pub fn new(content: Option<String>) -> Self {
        ReplayBackend {
            content,
            model: "replay".to_string(),
        }
    }

    pub fn offline() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl LlmBackend for ReplayBackend {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<LlmResponse> {
        let content = self
            .content
            .clone()
            .ok_or_else(|| anyhow!("no recorded LLM response available"))?;
        Ok(LlmResponse {
            prompt_tokens: approx_tokens(system_prompt) + approx_tokens(user_prompt),
            completion_tokens: approx_tokens(&content),
            content,
            model: self.model.clone(),
        })
    }
}

/// Rough token estimate (4 chars per token) for backends that report none.
pub fn approx_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

pub mod prompts {
    //! Minimal prompt framing for the review calls.

    const FINDING_CONTRACT: &str = "Respond with a JSON array inside a ```json fenced code block. \
Each element must have: severity (critical|warning|suggestion|info), category, automation_id, \
automation_alias, title, description, and optionally current_yaml and suggested_yaml.";

    pub fn automation_review_system(extra: Option<&str>) -> String {
        with_extra(
            format!(
                "You review Home Assistant automations for reliability, efficiency, and safety. \
Categories: trigger_efficiency, missing_guards, deprecated_patterns, redundancy, security, \
error_resilience. {}",
                FINDING_CONTRACT
            ),
            extra,
        )
    }

    pub fn dashboard_review_system(extra: Option<&str>) -> String {
        with_extra(
            format!(
                "You review Home Assistant Lovelace dashboards for coverage and usability. \
Categories: unused_entities, inconsistent_cards, missing_area_coverage, \
card_type_recommendation, layout_optimization. Leave automation_id empty. {}",
                FINDING_CONTRACT
            ),
            extra,
        )
    }

    pub fn review_user(kind: &str, yaml: &str, entity_summary: Option<&str>) -> String {
        let mut out = format!("Review these {}:\n\n```yaml\n{}\n```\n", kind, yaml);
        if let Some(summary) = entity_summary.filter(|s| !s.trim().is_empty()) {
            out.push_str("\nAvailable entities:\n");
            out.push_str(summary);
            out.push('\n');
        }
        out
    }

    fn with_extra(base: String, extra: Option<&str>) -> String {
        match extra.filter(|e| !e.trim().is_empty()) {
            Some(e) => format!("{}\n\n{}", base, e),
            None => base,
        }
    }
}
