//! Configuration discovery and effective settings resolution.
//!
//! ha-autogen reads `ha-autogen.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config.
//! Defaults:
//! - `registry`: none (entity checks run against an empty set)
//! - `output`: `human`
//! - `validate.fuzzy_cutoff`: 0.6
//! - `fix.out_dir`: `fixes`
//! - `fix.confirm`: empty
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::checks::entity_refs::DEFAULT_FUZZY_CUTOFF;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_NAMES: [&str; 3] = ["ha-autogen.toml", "ha-autogen.yaml", "ha-autogen.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// `[validate]` section.
pub struct ValidateCfg {
    pub fuzzy_cutoff: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// `[review]` section.
pub struct ReviewCfg {
    /// Upper bound on the YAML payload embedded in a review prompt.
    pub max_llm_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// `[fix]` section.
pub struct FixCfg {
    pub out_dir: Option<String>,
    #[serde(default)]
    pub confirm: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `ha-autogen.toml|yaml`.
pub struct HaConfig {
    pub registry: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub validate: Option<ValidateCfg>,
    #[serde(default)]
    pub review: Option<ReviewCfg>,
    #[serde(default)]
    pub fix: Option<FixCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub registry: Option<PathBuf>,
    pub output: String,
    pub fuzzy_cutoff: f64,
    pub max_llm_chars: Option<usize>,
    pub out_dir: PathBuf,
    pub confirmed: Vec<String>,
}

#[derive(Debug, Default, Clone)]
/// Command-line values that take precedence over the config file.
pub struct CliOverrides<'a> {
    pub repo_root: Option<&'a str>,
    pub registry: Option<&'a str>,
    pub output: Option<&'a str>,
    pub out_dir: Option<&'a str>,
    pub confirm: &'a [String],
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when an `ha-autogen.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `HaConfig` from the first config file present under `root`.
///
/// `Ok(None)` when there is no config file; a file that fails to parse is an
/// error rather than silently ignored.
pub fn load_config(root: &Path) -> Result<Option<HaConfig>> {
    let Some(path) = CONFIG_NAMES.iter().map(|n| root.join(n)).find(|p| p.exists()) else {
        return Ok(None);
    };
    let text = fs::read_to_string(&path).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;
    let cfg = if path.extension().is_some_and(|e| e == "toml") {
        toml::from_str(&text).map_err(|source| Error::Toml {
            path: path.clone(),
            source,
        })?
    } else {
        serde_yaml::from_str(&text).map_err(|source| Error::Yaml {
            path: path.clone(),
            source,
        })?
    };
    debug!(path = %path.display(), "loaded config");
    Ok(Some(cfg))
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &CliOverrides<'_>) -> Result<Effective> {
    let start = PathBuf::from(cli.repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root)?.unwrap_or_default();

    // Paths from the config file are relative to the repo root; CLI paths to
    // the working directory.
    let registry = cli
        .registry
        .map(PathBuf::from)
        .or_else(|| cfg.registry.as_ref().map(|r| repo_root.join(r)));

    let output = cli
        .output
        .map(str::to_string)
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let fuzzy_cutoff = cfg
        .validate
        .as_ref()
        .and_then(|v| v.fuzzy_cutoff)
        .unwrap_or(DEFAULT_FUZZY_CUTOFF);
    let max_llm_chars = cfg.review.as_ref().and_then(|r| r.max_llm_chars);

    let fix = cfg.fix.unwrap_or_default();
    let out_dir = cli
        .out_dir
        .map(PathBuf::from)
        .or_else(|| fix.out_dir.as_ref().map(|d| repo_root.join(d)))
        .unwrap_or_else(|| repo_root.join("fixes"));

    let mut confirmed = fix.confirm;
    for id in cli.confirm {
        if !confirmed.contains(id) {
            confirmed.push(id.clone());
        }
    }

    Ok(Effective {
        repo_root,
        registry,
        output,
        fuzzy_cutoff,
        max_llm_chars,
        out_dir,
        confirmed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("ha-autogen.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
registry = "registry.yaml"
output = "json"
[validate]
fuzzy_cutoff = 0.8
[fix]
out_dir = "out"
confirm = ["abc"]
    "#
        )
        .unwrap();
        fs::create_dir_all(root.join("automations/nested")).unwrap();

        let nested = root.join("automations/nested");
        assert_eq!(detect_repo_root(&nested), root.to_path_buf());

        let eff = resolve_effective(&CliOverrides {
            repo_root: root.to_str(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(eff.registry, Some(root.join("registry.yaml")));
        assert_eq!(eff.output, "json");
        assert_eq!(eff.fuzzy_cutoff, 0.8);
        assert_eq!(eff.out_dir, root.join("out"));
        assert_eq!(eff.confirmed, vec!["abc".to_string()]);
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("ha-autogen.yaml"), "review:\n  max_llm_chars: 4000\n").unwrap();

        let eff = resolve_effective(&CliOverrides {
            repo_root: root.to_str(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(eff.output, "human");
        assert_eq!(eff.registry, None);
        assert_eq!(eff.fuzzy_cutoff, DEFAULT_FUZZY_CUTOFF);
        assert_eq!(eff.max_llm_chars, Some(4000));
        assert_eq!(eff.out_dir, root.join("fixes"));
    }

    #[test]
    fn test_cli_precedence_and_confirm_union() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("ha-autogen.toml"),
            "output = \"json\"\n[fix]\nconfirm = [\"a\"]\n",
        )
        .unwrap();

        let confirm = vec!["a".to_string(), "b".to_string()];
        let eff = resolve_effective(&CliOverrides {
            repo_root: root.to_str(),
            output: Some("human"),
            registry: Some("/tmp/reg.json"),
            out_dir: Some("elsewhere"),
            confirm: &confirm,
        })
        .unwrap();
        assert_eq!(eff.output, "human");
        assert_eq!(eff.registry, Some(PathBuf::from("/tmp/reg.json")));
        assert_eq!(eff.out_dir, PathBuf::from("elsewhere"));
        assert_eq!(eff.confirmed, confirm);
    }

    #[test]
    fn test_broken_config_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ha-autogen.toml"), "output = [").unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Toml { .. }));
    }
}
