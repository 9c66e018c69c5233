//! Supporting helpers for terminal output and input discovery.

use crate::checks::syntax::yaml_to_json;
use crate::error::{Error, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

pub fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn prefix(label: &str, paint: fn(&str) -> String) -> String {
    if use_colors("human") {
        paint(label)
    } else {
        label.to_string()
    }
}

pub fn error_prefix() -> String {
    prefix("error:", |s| s.red().bold().to_string())
}

pub fn note_prefix() -> String {
    prefix("note:", |s| s.cyan().bold().to_string())
}

/// Path shown to the user: relative to `root` when possible.
pub fn display_path(path: &Path, root: &Path) -> String {
    let abs_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let abs = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    pathdiff::diff_paths(&abs, &abs_root)
        .filter(|rel| !rel.starts_with(".."))
        .unwrap_or(abs)
        .to_string_lossy()
        .to_string()
}

/// Expand each input as a glob pattern. A pattern that matches nothing is
/// kept as a literal path so the caller reports it as unreadable.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        let paths = glob::glob(input).map_err(|source| Error::Glob {
            pattern: input.clone(),
            source,
        })?;
        let before = out.len();
        out.extend(paths.filter_map(|p| p.ok()).filter(|p| p.is_file()));
        if out.len() == before {
            out.push(PathBuf::from(input));
        }
    }
    out.sort();
    out.dedup();
    Ok(out)
}

/// Read a YAML (or JSON) document into a JSON tree.
pub fn read_yaml(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(yaml_to_json(value))
}

/// Automation records from files holding one automation or a list of them.
pub fn read_automations(paths: &[PathBuf]) -> Result<Vec<serde_json::Value>> {
    let mut out = Vec::new();
    for path in paths {
        match read_yaml(path)? {
            serde_json::Value::Array(items) => out.extend(items.into_iter().filter(|a| a.is_object())),
            doc @ serde_json::Value::Object(_) => out.push(doc),
            _ => {}
        }
    }
    Ok(out)
}
