//! Output rendering for validate, review, and fix commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form serializes
//! the result structs directly so the shape stays stable.

use crate::models::fix::{BatchResult, EnrichedFinding, FixType};
use crate::models::review::{FindingSeverity, ReviewResult};
use crate::models::IssueSeverity;
use crate::utils::use_colors;
use crate::validate::ValidationReport;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn print_json(value: &JsonVal) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{} {}", crate::utils::error_prefix(), e),
    }
}

fn issue_tag(sev: IssueSeverity, color: bool) -> (String, String) {
    let (tag, icon) = match sev {
        IssueSeverity::Error => ("⟦error⟧", "✖"),
        IssueSeverity::Warning => ("⟦warn⟧", "▲"),
        IssueSeverity::Info => ("⟦info⟧", "◆"),
    };
    if !color {
        return (tag.to_string(), icon.to_string());
    }
    match sev {
        IssueSeverity::Error => (tag.red().bold().to_string(), icon.red().to_string()),
        IssueSeverity::Warning => (tag.yellow().bold().to_string(), icon.yellow().to_string()),
        IssueSeverity::Info => (tag.blue().bold().to_string(), icon.blue().to_string()),
    }
}

fn finding_tag(sev: FindingSeverity, color: bool) -> String {
    let tag = format!("⟦{}⟧", sev);
    if !color {
        return tag;
    }
    match sev {
        FindingSeverity::Critical => tag.red().bold().to_string(),
        FindingSeverity::Warning => tag.yellow().bold().to_string(),
        FindingSeverity::Suggestion => tag.cyan().bold().to_string(),
        FindingSeverity::Info => tag.blue().bold().to_string(),
    }
}

fn bold(s: &str, color: bool) -> String {
    if color {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

/// Print validation results in the requested format.
pub fn print_validation(report: &ValidationReport, output: &str) {
    if output == "json" {
        print_json(&compose_validation_json(report));
        return;
    }
    let color = use_colors(output);
    for fv in &report.files {
        let status = match (fv.result.valid, color) {
            (true, true) => "valid".green().to_string(),
            (true, false) => "valid".to_string(),
            (false, true) => "invalid".red().bold().to_string(),
            (false, false) => "invalid".to_string(),
        };
        println!("{} ({:?}) {}", bold(&fv.file, color), fv.kind, status);
        for is in &fv.result.issues {
            let (sev, icon) = issue_tag(is.severity, color);
            let line = is.line.map(|l| format!(" line {}", l)).unwrap_or_default();
            println!("  {} {} ❲{}❳{} — {}", icon, sev, is.check_name, line, is.message);
            if let Some(s) = &is.suggestion {
                println!("      {}", s);
            }
        }
    }
    let s = &report.summary;
    let summary = format!(
        "— Summary — errors={} warnings={} infos={} files={} invalid={}",
        s.errors, s.warnings, s.infos, s.files, s.invalid
    );
    println!("{}", bold(&summary, color));
}

/// Print review findings, most severe first.
pub fn print_review(result: &ReviewResult, output: &str) {
    if output == "json" {
        print_json(&compose_review_json(result));
        return;
    }
    let color = use_colors(output);
    for f in &result.findings {
        let subject = match (f.automation_alias.is_empty(), f.automation_id.is_empty()) {
            (_, true) => String::new(),
            (true, false) => format!(" {}", f.automation_id),
            (false, false) => format!(" {} ({})", f.automation_alias, f.automation_id),
        };
        println!(
            "{}{} ❲{}❳ {}",
            finding_tag(f.severity, color),
            subject,
            f.category,
            bold(&f.title, color)
        );
        for line in f.description.lines() {
            println!("    {}", line);
        }
        if color {
            println!("    {}", format!("id: {}", f.finding_id).bright_black());
        } else {
            println!("    id: {}", f.finding_id);
        }
    }
    println!("{}", bold(&format!("— Summary — {}", result.summary), color));
    if !result.model.is_empty() {
        println!(
            "model={} prompt_tokens={} completion_tokens={}",
            result.model, result.prompt_tokens, result.completion_tokens
        );
    }
}

/// Print classification and the batch outcome of a fix run.
pub fn print_fix(enriched: &[EnrichedFinding], batch: &BatchResult, output: &str) {
    if output == "json" {
        print_json(&compose_fix_json(enriched, batch));
        return;
    }
    let color = use_colors(output);
    for ef in enriched.iter().filter(|e| e.fix_type == FixType::Guided) {
        let confirm = if ef.requires_confirmation { " (sensitive)" } else { "" };
        println!("guided: {}{}", ef.finding.title, confirm);
        if !ef.fix_description.is_empty() {
            println!("    {}", ef.fix_description);
        }
    }
    for r in &batch.results {
        match (r.success, color) {
            (true, true) => println!("{} {} — {}", "applied:".green().bold(), r.automation_id, r.finding_title),
            (true, false) => println!("applied: {} — {}", r.automation_id, r.finding_title),
            (false, true) => println!(
                "{} {} — {} ({}) [id: {}]",
                "failed:".red().bold(),
                r.automation_id,
                r.finding_title,
                r.error,
                r.finding_id
            ),
            (false, false) => println!(
                "failed: {} — {} ({}) [id: {}]",
                r.automation_id, r.finding_title, r.error, r.finding_id
            ),
        }
    }
    let summary = format!(
        "— Summary — total={} applied={} failed={}",
        batch.total, batch.applied, batch.failed
    );
    println!("{}", bold(&summary, color));
}

/// Compose validation JSON object (pure) for testing/snapshot purposes.
pub fn compose_validation_json(report: &ValidationReport) -> JsonVal {
    serde_json::to_value(report).unwrap_or(JsonVal::Null)
}

/// Compose review JSON object (pure) for testing/snapshot purposes.
pub fn compose_review_json(result: &ReviewResult) -> JsonVal {
    serde_json::to_value(result).unwrap_or(JsonVal::Null)
}

/// Compose fix JSON object (pure) for testing/snapshot purposes.
pub fn compose_fix_json(enriched: &[EnrichedFinding], batch: &BatchResult) -> JsonVal {
    json!({
        "findings": enriched,
        "batch": batch,
    })
}
