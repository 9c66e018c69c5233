//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ha-autogen",
    version,
    about = "Validate and review Home Assistant automations and dashboards",
    long_about = "ha-autogen — validate generated Home Assistant YAML, review automations and dashboards, and apply quick fixes.\n\nConfiguration precedence: CLI > ha-autogen.toml > defaults.",
    after_help = "Examples:\n  ha-autogen validate generated/*.yaml --registry registry.json\n  ha-autogen review --automations automations.yaml --dashboard lovelace.yaml\n  ha-autogen fix --automations automations.yaml --llm-response reply.md --confirm <finding-id>",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Debug, Clone, Default)]
/// Options shared by `review` and `fix`.
pub struct ReviewArgs {
    #[arg(long, help = "Repository root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, num_args = 1.., help = "Automation files or glob patterns (a file may hold one automation or a list)")]
    pub automations: Vec<String>,
    #[arg(long, help = "Lovelace dashboard file")]
    pub dashboard: Option<String>,
    #[arg(long, help = "Recorded LLM reply to merge; without it only rule findings are reported")]
    pub llm_response: Option<String>,
    #[arg(long, help = "Extra instructions appended to the review system prompt")]
    pub instructions: Option<String>,
    #[arg(long, help = "Limit the review to automations and views touching this area id")]
    pub area: Option<String>,
    #[arg(long, help = "Limit the dashboard review to one view (path or view-N)")]
    pub view: Option<String>,
    #[arg(long, help = "Registry snapshot (YAML or JSON) with entities and areas")]
    pub registry: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current ha-autogen version.")]
    Version,
    /// Validate generated YAML
    #[command(
        about = "Validate automation or dashboard YAML",
        long_about = "Run the syntax, entity, service, and dashboard schema checks. Any invalid file makes the exit code non-zero.",
        after_help = "Examples:\n  ha-autogen validate out/automation.yaml\n  ha-autogen validate 'out/*.yaml' --kind dashboard --output json"
    )]
    Validate {
        #[arg(required = true, help = "Files or glob patterns to validate")]
        files: Vec<String>,
        #[arg(long, help = "Document kind: automation|dashboard (default: detect)")]
        kind: Option<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Registry snapshot (YAML or JSON) with entities and areas")]
        registry: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Review automations and dashboards
    #[command(
        about = "Review automations and dashboards",
        long_about = "Run the deterministic review rules, merge an LLM reply when given, and print findings sorted by severity.",
        after_help = "Examples:\n  ha-autogen review --automations automations.yaml\n  ha-autogen review --dashboard lovelace.yaml --area kitchen --output json"
    )]
    Review {
        #[command(flatten)]
        args: ReviewArgs,
    },
    /// Review, classify, and apply quick fixes
    #[command(
        about = "Apply quick fixes",
        long_about = "Review automations, classify findings as quick or guided, and write the fixed automations to the output directory. Fixes touching sensitive domains are skipped unless confirmed.",
        after_help = "Examples:\n  ha-autogen fix --automations automations.yaml --out-dir fixes\n  ha-autogen fix --automations automations.yaml --confirm 3f2c..."
    )]
    Fix {
        #[command(flatten)]
        args: ReviewArgs,
        #[arg(long, help = "Finding id confirmed for a sensitive-domain fix (repeatable)")]
        confirm: Vec<String>,
        #[arg(long, help = "Directory for fixed automations (default: fixes)")]
        out_dir: Option<String>,
    },
}
