//! Review orchestration: deterministic rules first, then one LLM pass, then
//! merge, sort, and summarize.
//!
//! LLM failures never propagate. A failed call or unparseable reply becomes
//! [`LlmOutcome::Degraded`] and the review carries rule findings only.

use crate::cards::views;
use crate::checks::syntax::dump_yaml;
use crate::llm::{prompts, LlmBackend, LlmResponse};
use crate::models::registry::EntitySet;
use crate::models::review::{
    assign_finding_ids, FindingCategory, FindingSeverity, ReviewFinding, ReviewResult,
};
use crate::rules::{run_all_dashboard_rules, run_all_rules};
use regex::Regex;
use serde_json::Value as Json;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
/// Parsed result of the LLM half of a review.
pub enum LlmOutcome {
    Findings(Vec<ReviewFinding>),
    Degraded(String),
}

impl LlmOutcome {
    /// Collapse to the findings to merge, logging any degradation.
    pub fn into_findings(self, phase: &str) -> Vec<ReviewFinding> {
        match self {
            LlmOutcome::Findings(findings) => {
                info!(phase, count = findings.len(), "LLM review produced findings");
                findings
            }
            LlmOutcome::Degraded(reason) => {
                warn!(phase, %reason, "LLM review degraded; using rule findings only");
                Vec::new()
            }
        }
    }
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*\n(.*?)```").expect("valid fence regex"))
}

/// Parse findings out of the first fenced code block in `content`.
pub fn parse_llm_findings(content: &str) -> LlmOutcome {
    let Some(body) = fence_re().captures(content).and_then(|c| c.get(1)) else {
        return LlmOutcome::Degraded("no fenced code block in LLM response".to_string());
    };
    let raw: Json = match serde_json::from_str(body.as_str().trim()) {
        Ok(v) => v,
        Err(e) => return LlmOutcome::Degraded(format!("LLM findings are not valid JSON: {}", e)),
    };
    let items = match raw {
        Json::Array(items) => items,
        other => vec![other],
    };
    LlmOutcome::Findings(items.iter().filter_map(finding_from_item).collect())
}

fn finding_from_item(item: &Json) -> Option<ReviewFinding> {
    let obj = item.as_object()?;
    let text = |key: &str| obj.get(key).and_then(Json::as_str);

    let severity = match text("severity").unwrap_or("info").parse::<FindingSeverity>() {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "skipping invalid LLM finding");
            return None;
        }
    };
    let category = match text("category")
        .unwrap_or("error_resilience")
        .parse::<FindingCategory>()
    {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "skipping invalid LLM finding");
            return None;
        }
    };

    let finding = ReviewFinding::new(
        severity,
        category,
        text("title").unwrap_or("Untitled finding"),
        text("description").unwrap_or(""),
    )
    .for_automation(
        text("automation_id").unwrap_or(""),
        text("automation_alias").unwrap_or(""),
    )
    .with_yaml(
        text("current_yaml").map(str::to_string),
        text("suggested_yaml").map(str::to_string),
    );
    Some(finding)
}

/// Rule findings first, then LLM findings whose dedup key is unseen.
pub fn merge_findings(rule: Vec<ReviewFinding>, llm: Vec<ReviewFinding>) -> Vec<ReviewFinding> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(rule.len() + llm.len());
    for f in rule {
        seen.insert(f.dedup_key());
        merged.push(f);
    }
    for f in llm {
        if seen.insert(f.dedup_key()) {
            merged.push(f);
        }
    }
    merged
}

/// Stable sort, Critical first.
pub fn sort_findings(findings: &mut [ReviewFinding]) {
    findings.sort_by_key(|f| f.severity.rank());
}

/// "Reviewed {subject} ..." summary line, e.g. subject "3 automation(s)".
pub fn build_summary(findings: &[ReviewFinding], subject: &str) -> String {
    if findings.is_empty() {
        return format!("Reviewed {} — no issues found.", subject);
    }
    let labels: Vec<String> = FindingSeverity::ALL
        .iter()
        .filter_map(|sev| {
            let n = findings.iter().filter(|f| f.severity == *sev).count();
            (n > 0).then(|| format!("{} {}", n, sev))
        })
        .collect();
    format!(
        "Reviewed {}, found {} issue(s): {}.",
        subject,
        findings.len(),
        labels.join(", ")
    )
}

#[derive(Debug, Clone, Copy, Default)]
/// Collaborator data a dashboard review may use.
pub struct DashboardContext<'a> {
    pub known_entities: Option<&'a EntitySet>,
    pub areas: Option<&'a [String]>,
}

/// Runs reviews against one LLM backend.
pub struct ReviewEngine<B: LlmBackend> {
    llm: B,
    entity_summary: Option<String>,
    extra_instructions: Option<String>,
    payload_limit: Option<usize>,
}

impl<B: LlmBackend> ReviewEngine<B> {
    pub fn new(llm: B) -> Self {
        ReviewEngine {
            llm,
            entity_summary: None,
            extra_instructions: None,
            payload_limit: None,
        }
    }

    /// Entity listing appended to every user prompt.
    pub fn with_entity_summary(mut self, summary: impl Into<String>) -> Self {
        self.entity_summary = Some(summary.into());
        self
    }

    /// Text appended to every system prompt.
    pub fn with_instructions(mut self, extra: impl Into<String>) -> Self {
        self.extra_instructions = Some(extra.into());
        self
    }

    /// Cap on the YAML payload embedded in a prompt, in chars.
    pub fn with_payload_limit(mut self, limit: Option<usize>) -> Self {
        self.payload_limit = limit;
        self
    }

    fn payload(&self, value: &Json) -> String {
        let yaml = dump_yaml(value);
        match self.payload_limit {
            Some(limit) if yaml.chars().count() > limit => {
                warn!(limit, "review payload truncated");
                let mut cut: String = yaml.chars().take(limit).collect();
                cut.push_str("\n# ... truncated");
                cut
            }
            _ => yaml,
        }
    }

    async fn ask(&self, system: String, user: String) -> (LlmOutcome, Option<LlmResponse>) {
        match self.llm.generate(&system, &user).await {
            Ok(resp) => (parse_llm_findings(&resp.content), Some(resp)),
            Err(e) => (LlmOutcome::Degraded(format!("LLM call failed: {:#}", e)), None),
        }
    }

    pub async fn review_automations(&self, automations: &[Json]) -> ReviewResult {
        let rule_findings: Vec<ReviewFinding> =
            automations.iter().flat_map(run_all_rules).collect();
        info!(
            findings = rule_findings.len(),
            automations = automations.len(),
            "automation rules finished"
        );

        let yaml = self.payload(&Json::Array(automations.to_vec()));
        let (outcome, resp) = self
            .ask(
                prompts::automation_review_system(self.extra_instructions.as_deref()),
                prompts::review_user("automations", &yaml, self.entity_summary.as_deref()),
            )
            .await;

        let mut findings = merge_findings(rule_findings, outcome.into_findings("automations"));
        assign_finding_ids(&mut findings);
        sort_findings(&mut findings);
        let resp = resp.unwrap_or_default();
        ReviewResult {
            summary: build_summary(&findings, &format!("{} automation(s)", automations.len())),
            findings,
            automations_reviewed: automations.len(),
            dashboards_reviewed: 0,
            model: resp.model,
            prompt_tokens: resp.prompt_tokens,
            completion_tokens: resp.completion_tokens,
        }
    }

    pub async fn review_dashboard(&self, dashboard: &Json, ctx: DashboardContext<'_>) -> ReviewResult {
        let rule_findings = run_all_dashboard_rules(dashboard, ctx.known_entities, ctx.areas);
        info!(findings = rule_findings.len(), "dashboard rules finished");

        let (outcome, resp) = self
            .ask(
                prompts::dashboard_review_system(self.extra_instructions.as_deref()),
                prompts::review_user(
                    "dashboard views",
                    &self.payload(dashboard),
                    self.entity_summary.as_deref(),
                ),
            )
            .await;

        let mut findings = merge_findings(rule_findings, outcome.into_findings("dashboard"));
        assign_finding_ids(&mut findings);
        sort_findings(&mut findings);
        let resp = resp.unwrap_or_default();
        ReviewResult {
            summary: build_summary(
                &findings,
                &format!("dashboard with {} view(s)", views(dashboard).len()),
            ),
            findings,
            automations_reviewed: 0,
            dashboards_reviewed: 1,
            model: resp.model,
            prompt_tokens: resp.prompt_tokens,
            completion_tokens: resp.completion_tokens,
        }
    }

    /// Both reviews, one after the other, with findings re-sorted together.
    pub async fn review_full(
        &self,
        automations: &[Json],
        dashboard: &Json,
        ctx: DashboardContext<'_>,
    ) -> ReviewResult {
        let auto = self.review_automations(automations).await;
        let dash = self.review_dashboard(dashboard, ctx).await;

        let mut findings = auto.findings;
        findings.extend(dash.findings);
        sort_findings(&mut findings);

        ReviewResult {
            summary: format!(
                "Full review: {} automation(s), {} dashboard(s). Found {} total issue(s).",
                auto.automations_reviewed,
                dash.dashboards_reviewed,
                findings.len()
            ),
            findings,
            automations_reviewed: auto.automations_reviewed,
            dashboards_reviewed: dash.dashboards_reviewed,
            model: if auto.model.is_empty() { dash.model } else { auto.model },
            prompt_tokens: auto.prompt_tokens + dash.prompt_tokens,
            completion_tokens: auto.completion_tokens + dash.completion_tokens,
        }
    }
}
