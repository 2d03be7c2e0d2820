//! CSV tables: breather curves and family summaries.

use anyhow::{Context, Result};
use kobon::api::{BreatherCurve, Classification};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

pub fn curve_frame(curve: &BreatherCurve) -> PolarsResult<DataFrame> {
    let k: Vec<f64> = curve.points.iter().map(|p| p.0).collect();
    let score: Vec<u64> = curve.points.iter().map(|p| p.1 as u64).collect();
    df!("k" => k, "score" => score)
}

pub fn family_frame(c: &Classification) -> PolarsResult<DataFrame> {
    let fams = &c.families;
    df!(
        "family" => fams.iter().map(|f| f.id as u64).collect::<Vec<_>>(),
        "fingerprint" => fams.iter().map(|f| f.fingerprint.to_string()).collect::<Vec<_>>(),
        "variant" => fams.iter().map(|f| f.variant as u64).collect::<Vec<_>>(),
        "score" => fams.iter().map(|f| f.score as u64).collect::<Vec<_>>(),
        "size" => fams.iter().map(|f| f.size() as u64).collect::<Vec<_>>()
    )
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(rows = df.height(), path = %path.display(), "csv written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kobon::api::{classify_arrangements, Arrangement, ClassifyCfg, GeomCfg};
    use tempfile::tempdir;

    #[test]
    fn curve_csv_has_header_and_rows() {
        let curve = BreatherCurve {
            inner: vec![0],
            outer: vec![1, 2],
            step: 0.01,
            points: vec![(0.99, 1), (1.0, 2), (1.01, 0)],
            base_score: 2,
        };
        let mut df = curve_frame(&curve).unwrap();
        assert_eq!(df.shape(), (3, 2));
        let dir = tempdir().unwrap();
        let path = dir.path().join("curve.csv");
        write_csv(&mut df, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("k,score"));
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn family_frame_one_row_per_family() {
        let cfg = GeomCfg::default();
        let a = Arrangement::from_rows(
            &[
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, -1.0],
                [1.0, 2.0, -10.0],
            ],
            &cfg,
        )
        .unwrap();
        let batch = [a.clone(), a.permuted(&[1, 0, 3, 2])];
        let c = classify_arrangements(&batch, &ClassifyCfg::default());
        let df = family_frame(&c).unwrap();
        assert_eq!(df.shape(), (1, 5));
        assert_eq!(df.get_column_names().len(), 5);
    }
}
