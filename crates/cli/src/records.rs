//! Versioned JSON record files: one record per retained arrangement.
//!
//! ```json
//! { "schema": 1, "n_lines": 10,
//!   "records": [ { "id": 0, "lines": [[a, b, c], ...], "score": 25,
//!                  "fingerprint": "25-…", "family": 3 } ] }
//! ```

use anyhow::{bail, Context, Result};
use kobon::api::{Arrangement, GeomCfg};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const SCHEMA: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: usize,
    pub lines: Vec<[f64; 3]>,
    pub score: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<usize>,
}

impl Record {
    pub fn new(id: usize, arr: &Arrangement, score: usize) -> Self {
        Self {
            id,
            lines: arr.to_rows(),
            score,
            fingerprint: None,
            family: None,
        }
    }

    /// Lines re-normalized into an arrangement.
    pub fn arrangement(&self, cfg: &GeomCfg) -> Result<Arrangement> {
        Arrangement::from_rows(&self.lines, cfg)
            .with_context(|| format!("record {}: invalid line parameters", self.id))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordFile {
    pub schema: u32,
    pub n_lines: usize,
    pub records: Vec<Record>,
}

impl RecordFile {
    pub fn new(records: Vec<Record>) -> Self {
        let n_lines = records.first().map_or(0, |r| r.lines.len());
        Self {
            schema: SCHEMA,
            n_lines,
            records,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let file: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", path.display()))?;
        if file.schema != SCHEMA {
            bail!(
                "{}: unsupported record schema {} (expected {SCHEMA})",
                path.display(),
                file.schema
            );
        }
        Ok(file)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Highest score; ties go to the lowest id.
    pub fn best(&self) -> Option<&Record> {
        self.records
            .iter()
            .max_by(|x, y| x.score.cmp(&y.score).then(y.id.cmp(&x.id)))
    }

    pub fn get(&self, id: usize) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records sorted by score (descending), ties by id.
    pub fn ranked(&self) -> Vec<&Record> {
        let mut v: Vec<&Record> = self.records.iter().collect();
        v.sort_by(|x, y| y.score.cmp(&x.score).then(x.id.cmp(&y.id)));
        v
    }
}
