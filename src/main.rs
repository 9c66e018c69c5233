//! ha-autogen CLI binary entry point.
//! Delegates to the library for validate/review/fix and prints results.

use anyhow::Context;
use clap::Parser;
use ha_autogen::cli::{Cli, Commands, ReviewArgs};
use ha_autogen::config::{self, CliOverrides, Effective};
use ha_autogen::error::Error;
use ha_autogen::llm::ReplayBackend;
use ha_autogen::models::registry::RegistrySnapshot;
use ha_autogen::models::review::{FindingSeverity, ReviewResult};
use ha_autogen::quickfix::{apply_batch, prepare_fixes, DirApplier};
use ha_autogen::review::{DashboardContext, ReviewEngine};
use ha_autogen::validate::{validate_files, DocumentKind, ValidateOptions};
use ha_autogen::{output, scope, utils};
use serde_json::Value as Json;
use std::collections::HashSet;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", utils::error_prefix(), e);
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Validate {
            files,
            kind,
            repo_root,
            registry,
            output,
        } => {
            let eff = config::resolve_effective(&CliOverrides {
                repo_root: repo_root.as_deref(),
                registry: registry.as_deref(),
                output: output.as_deref(),
                ..Default::default()
            })?;
            note_missing_config(&eff)?;
            let kind = kind
                .as_deref()
                .map(str::parse::<DocumentKind>)
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let known = match load_registry(&eff)? {
                Some(reg) => reg.known_entity_ids(),
                None => {
                    eprintln!(
                        "{} No registry snapshot given; every entity reference will be reported as unknown.",
                        utils::note_prefix()
                    );
                    Default::default()
                }
            };
            let paths = utils::expand_inputs(&files)?;
            let opts = ValidateOptions {
                fuzzy_cutoff: eff.fuzzy_cutoff,
            };
            let mut report = validate_files(&paths, kind, &known, &opts);
            for fv in report.files.iter_mut() {
                fv.file = utils::display_path(Path::new(&fv.file), &eff.repo_root);
            }
            output::print_validation(&report, &eff.output);
            Ok(if report.summary.invalid > 0 { 1 } else { 0 })
        }
        Commands::Review { args } => {
            let eff = config::resolve_effective(&CliOverrides {
                repo_root: args.repo_root.as_deref(),
                registry: args.registry.as_deref(),
                output: args.output.as_deref(),
                ..Default::default()
            })?;
            note_missing_config(&eff)?;
            let inputs = ReviewInputs::load(&args, &eff)?;
            let result = inputs.review(&args, &eff).await?;
            output::print_review(&result, &eff.output);
            let critical = result.count(FindingSeverity::Critical) > 0;
            Ok(if critical { 1 } else { 0 })
        }
        Commands::Fix {
            args,
            confirm,
            out_dir,
        } => {
            let eff = config::resolve_effective(&CliOverrides {
                repo_root: args.repo_root.as_deref(),
                registry: args.registry.as_deref(),
                output: args.output.as_deref(),
                out_dir: out_dir.as_deref(),
                confirm: &confirm,
            })?;
            note_missing_config(&eff)?;
            let inputs = ReviewInputs::load(&args, &eff)?;
            if inputs.automations.is_empty() {
                return Err(Error::MissingInput(
                    "fix needs at least one automation (pass --automations)".to_string(),
                )
                .into());
            }
            let result = inputs.review(&args, &eff).await?;
            let enriched = prepare_fixes(&result.findings, &inputs.automations);
            let confirmed: HashSet<String> = eff.confirmed.iter().cloned().collect();
            let applier = DirApplier {
                dir: eff.out_dir.clone(),
            };
            let batch = apply_batch(&enriched, &confirmed, &applier).await;
            output::print_fix(&enriched, &batch, &eff.output);
            Ok(if batch.failed > 0 { 1 } else { 0 })
        }
    }
}

fn note_missing_config(eff: &Effective) -> anyhow::Result<()> {
    if eff.output != "json" && config::load_config(&eff.repo_root)?.is_none() {
        eprintln!(
            "{} No ha-autogen.toml found; using defaults.",
            utils::note_prefix()
        );
    }
    Ok(())
}

fn load_registry(eff: &Effective) -> anyhow::Result<Option<RegistrySnapshot>> {
    eff.registry
        .as_deref()
        .map(RegistrySnapshot::load)
        .transpose()
        .map_err(Into::into)
}

/// Parsed review inputs after scoping.
struct ReviewInputs {
    automations: Vec<Json>,
    dashboard: Option<Json>,
    registry: Option<RegistrySnapshot>,
}

impl ReviewInputs {
    fn load(args: &ReviewArgs, eff: &Effective) -> anyhow::Result<Self> {
        if args.automations.is_empty() && args.dashboard.is_none() {
            return Err(Error::MissingInput(
                "nothing to review: pass --automations and/or --dashboard".to_string(),
            )
            .into());
        }
        let registry = load_registry(eff)?;
        let mut automations = utils::read_automations(&utils::expand_inputs(&args.automations)?)?;
        let mut dashboard = args
            .dashboard
            .as_deref()
            .map(|d| utils::read_yaml(Path::new(d)))
            .transpose()?;

        if let Some(area) = args.area.as_deref() {
            let reg = registry.as_ref().ok_or_else(|| {
                Error::MissingInput("--area needs a registry snapshot (--registry)".to_string())
            })?;
            let area_map = reg.entity_area_map();
            automations = scope::filter_automations_by_area(&automations, area, &area_map);
            dashboard = dashboard.map(|d| {
                scope::filter_dashboard_views_by_area(&d, area, &area_map, &reg.area_name_map())
            });
        }
        if let Some(view) = args.view.as_deref() {
            dashboard = dashboard.map(|d| scope::filter_dashboard_view_by_path(&d, view));
        }

        Ok(ReviewInputs {
            automations,
            dashboard,
            registry,
        })
    }

    async fn review(&self, args: &ReviewArgs, eff: &Effective) -> anyhow::Result<ReviewResult> {
        let reply = match args.llm_response.as_deref() {
            Some(path) => Some(
                tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("failed to read LLM response {}", path))?,
            ),
            None => None,
        };
        let mut engine =
            ReviewEngine::new(ReplayBackend::new(reply)).with_payload_limit(eff.max_llm_chars);
        if let Some(extra) = args.instructions.as_deref() {
            engine = engine.with_instructions(extra);
        }

        let known = self.registry.as_ref().map(|r| r.known_entity_ids());
        let areas = self.registry.as_ref().map(|r| r.area_names());
        if let Some(known) = known.as_ref() {
            let listing: Vec<&str> = known.iter().map(String::as_str).collect();
            engine = engine.with_entity_summary(listing.join("\n"));
        }
        let ctx = DashboardContext {
            known_entities: known.as_ref(),
            areas: areas.as_deref(),
        };

        Ok(match (&self.dashboard, args.automations.is_empty()) {
            (Some(dash), false) => engine.review_full(&self.automations, dash, ctx).await,
            (Some(dash), true) => engine.review_dashboard(dash, ctx).await,
            (None, _) => engine.review_automations(&self.automations).await,
        })
    }
}
