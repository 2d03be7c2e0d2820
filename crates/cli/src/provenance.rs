//! Provenance sidecars: `<artifact>.provenance.json` next to every output.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What produced an artifact: run mode, parameters, optional tag and code revision.
pub struct Payload {
    pub mode: &'static str,
    pub params: Value,
    pub tag: Option<String>,
    pub code_rev: String,
}

impl Payload {
    pub fn new(mode: &'static str, params: Value) -> Self {
        Self {
            mode,
            params,
            tag: None,
            code_rev: code_rev(),
        }
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    fn to_json(&self, artifact: &Path, callsite: &Location<'_>) -> Value {
        json!({
            "code_rev": self.code_rev,
            "kobon_version": kobon::VERSION,
            "callsite": { "file": callsite.file(), "line": callsite.line() },
            "mode": self.mode,
            "tag": self.tag,
            "params": self.params,
            "outputs": [artifact.to_string_lossy()],
        })
    }
}

/// Write the sidecar of `artifact` and return its path.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let path = sidecar_path(artifact);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let doc = payload.to_json(artifact, Location::caller());
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::debug!(path = %path.display(), mode = payload.mode, "provenance written");
    Ok(path)
}

/// `runs/n10.json` → `runs/n10.provenance.json`.
fn sidecar_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("provenance.json")
}

/// `GIT_COMMIT` (build time, then run time), else `git rev-parse HEAD`, else `"unknown"`.
pub fn code_rev() -> String {
    option_env!("GIT_COMMIT")
        .map(str::to_owned)
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("GIT_COMMIT").ok().filter(|s| !s.is_empty()))
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".to_owned())
}

fn git_head() -> Option<String> {
    let out = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8(out.stdout).ok()?;
    Some(rev.trim().to_owned())
}
