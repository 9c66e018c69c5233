//! Sequential application of quick fixes through an injected applier.

use crate::models::fix::{BatchResult, EnrichedFinding, FixApplicationResult};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const NOT_CONFIRMED: &str = "Sensitive domain fix not confirmed";

/// Deploys one fixed automation. Errors are recorded per item.
#[async_trait]
pub trait FixApplier: Send + Sync {
    async fn apply(&self, automation_id: &str, fix_yaml: &str) -> anyhow::Result<()>;
}

/// Writes each fixed automation to `<dir>/<automation_id>.yaml`.
#[derive(Debug, Clone)]
pub struct DirApplier {
    pub dir: PathBuf,
}

#[async_trait]
impl FixApplier for DirApplier {
    async fn apply(&self, automation_id: &str, fix_yaml: &str) -> anyhow::Result<()> {
        if automation_id.is_empty() || automation_id.contains(['/', '\\']) {
            anyhow::bail!("cannot derive a file name from automation id '{}'", automation_id);
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.yaml", automation_id));
        let mut body = fix_yaml.trim_end().to_string();
        body.push('\n');
        tokio::fs::write(&path, body).await?;
        debug!(path = %path.display(), "wrote fixed automation");
        Ok(())
    }
}

/// Apply every appliable fix in order. Sensitive fixes need their finding id
/// in `confirmed`. One failure never stops the rest.
pub async fn apply_batch<A: FixApplier + ?Sized>(
    enriched: &[EnrichedFinding],
    confirmed: &HashSet<String>,
    applier: &A,
) -> BatchResult {
    let mut results = Vec::new();
    for ef in enriched.iter().filter(|ef| ef.is_appliable()) {
        let f = &ef.finding;
        let mut record = FixApplicationResult {
            finding_id: f.finding_id.clone(),
            finding_title: f.title.clone(),
            automation_id: f.automation_id.clone(),
            success: false,
            error: String::new(),
        };

        if ef.requires_confirmation && !confirmed.contains(&f.finding_id) {
            debug!(finding = %f.finding_id, "skipping unconfirmed sensitive fix");
            record.error = NOT_CONFIRMED.to_string();
            results.push(record);
            continue;
        }

        let yaml = ef.fix_yaml.as_deref().unwrap_or_default();
        match applier.apply(&f.automation_id, yaml).await {
            Ok(()) => record.success = true,
            Err(e) => {
                warn!(automation = %f.automation_id, error = %e, "failed to apply fix");
                record.error = e.to_string();
            }
        }
        results.push(record);
    }

    let applied = results.iter().filter(|r| r.success).count();
    BatchResult {
        total: results.len(),
        applied,
        failed: results.len() - applied,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fix::FixType;
    use crate::models::review::{FindingCategory, FindingSeverity, ReviewFinding};
    use anyhow::bail;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FixApplier for Recorder {
        async fn apply(&self, automation_id: &str, _fix_yaml: &str) -> anyhow::Result<()> {
            if automation_id == "broken" {
                bail!("reload failed: 500");
            }
            self.calls.lock().unwrap().push(automation_id.to_string());
            Ok(())
        }
    }

    fn enriched(id: &str, fix_type: FixType, yaml: Option<&str>, confirm: bool) -> EnrichedFinding {
        EnrichedFinding {
            finding: ReviewFinding::new(
                FindingSeverity::Suggestion,
                FindingCategory::DeprecatedPatterns,
                format!("fix {}", id),
                "",
            )
            .for_automation(id, ""),
            fix_type,
            fix_yaml: yaml.map(str::to_string),
            requires_confirmation: confirm,
            fix_description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_unconfirmed_sensitive_fix_is_not_applied() {
        let locked = enriched("door", FixType::Quick, Some("a: 1"), true);
        let confirmed_one = enriched("gate", FixType::Quick, Some("a: 1"), true);
        let confirmed: HashSet<String> = [confirmed_one.finding.finding_id.clone()].into();
        let applier = Recorder::default();

        let res = apply_batch(&[locked, confirmed_one], &confirmed, &applier).await;
        assert_eq!((res.total, res.applied, res.failed), (2, 1, 1));
        assert_eq!(res.results[0].error, NOT_CONFIRMED);
        assert_eq!(*applier.calls.lock().unwrap(), vec!["gate".to_string()]);
    }

    #[tokio::test]
    async fn test_dir_applier_writes_one_file_per_automation() {
        let dir = tempfile::tempdir().unwrap();
        let applier = DirApplier {
            dir: dir.path().join("fixes"),
        };
        applier.apply("kitchen", "id: kitchen").await.unwrap();
        let written = std::fs::read_to_string(dir.path().join("fixes/kitchen.yaml")).unwrap();
        assert_eq!(written, "id: kitchen\n");
        assert!(applier.apply("../escape", "x: 1").await.is_err());
        assert!(applier.apply("", "x: 1").await.is_err());
    }

    #[tokio::test]
    async fn test_filters_and_records_failures_in_order() {
        let items = vec![
            enriched("guided", FixType::Guided, None, false),
            enriched("broken", FixType::Quick, Some("a: 1"), false),
            enriched("no_yaml", FixType::Quick, None, false),
            enriched("ok", FixType::Quick, Some("a: 1"), false),
        ];
        let res = apply_batch(&items, &HashSet::new(), &Recorder::default()).await;
        assert_eq!(res.total, 2);
        assert_eq!(res.total, res.results.len());
        assert_eq!(res.applied + res.failed, res.total);
        assert_eq!(res.results[0].automation_id, "broken");
        assert_eq!(res.results[0].error, "reload failed: 500");
        assert!(res.results[1].success);
    }
}
