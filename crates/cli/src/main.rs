use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kobon::api::{
    build_graph, classify, discover, multistart, multistart_from, rank_symmetries, refine_many,
    score, symmetrize, valid_triangles, AnnealCfg, Arrangement, BasinCfg, BreatherCfg,
    Classification, ClassifyCfg, EnergyFunction, Entry, GeomCfg, MirroredObjective, Objective,
    PipelineCfg, Retain, RunResult, RunToken, SymmetryPenalty, WlCfg,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;
mod records;
mod tables;

use provenance::{write_sidecar, Payload};
use records::{Record, RecordFile};

#[derive(Parser)]
#[command(name = "kobon")]
#[command(about = "Search, refine and classify Kobon triangle arrangements")]
struct Cmd {
    /// Optional free-form tag; propagated to logs and provenance sidecars
    #[arg(long, global = true)]
    tag: Option<String>,

    #[command(subcommand)]
    action: Action,
}

/// Annealing flags shared by the search modes.
#[derive(clap::Args, Clone, Debug)]
struct AnnealArgs {
    /// Independent annealing runs
    #[arg(long, default_value_t = 20)]
    runs: u64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Iteration budget per run (α is derived so T reaches tf at the end)
    #[arg(long, default_value_t = 100_000)]
    iters: u64,
    #[arg(long, default_value_t = 1.0)]
    t0: f64,
    #[arg(long, default_value_t = 1e-3)]
    tf: f64,
    /// Perturbation scale (noise is σ·T)
    #[arg(long, default_value_t = 0.1)]
    sigma: f64,
    /// Wall-clock limit per run, seconds
    #[arg(long)]
    deadline_secs: Option<f64>,
}

impl AnnealArgs {
    fn cfg(&self) -> AnnealCfg {
        AnnealCfg {
            sigma: self.sigma,
            deadline: self.deadline_secs.map(Duration::from_secs_f64),
            ..AnnealCfg::geometric(self.t0, self.tf, self.iters)
        }
    }

    fn params(&self) -> serde_json::Value {
        json!({
            "runs": self.runs,
            "seed": self.seed,
            "iters": self.iters,
            "t0": self.t0,
            "tf": self.tf,
            "sigma": self.sigma,
            "deadline_secs": self.deadline_secs,
        })
    }
}

/// Basin-hopping flags.
#[derive(clap::Args, Clone, Debug)]
struct BasinArgs {
    #[arg(long, default_value_t = 50)]
    kicks: u64,
    #[arg(long, default_value_t = 5_000)]
    relax_iters: u64,
    #[arg(long, default_value_t = 1e-4)]
    relax_tf: f64,
    /// Distance in parameter space that makes an accepted arrangement a new variant
    #[arg(long, default_value_t = 0.1)]
    distinct: f64,
}

impl BasinArgs {
    fn cfg(&self) -> BasinCfg {
        BasinCfg {
            kicks: self.kicks,
            relax_iters: self.relax_iters,
            relax_tf: self.relax_tf,
            distinct_threshold: self.distinct,
            ..BasinCfg::default()
        }
    }

    fn params(&self) -> serde_json::Value {
        json!({
            "kicks": self.kicks,
            "relax_iters": self.relax_iters,
            "relax_tf": self.relax_tf,
            "distinct": self.distinct,
        })
    }
}

/// Optional stored starting arrangement.
#[derive(clap::Args, Clone, Debug)]
struct StartArgs {
    /// Record file to start from instead of random arrangements
    #[arg(long)]
    input: Option<PathBuf>,
    /// Record id within --input (default: best score)
    #[arg(long, requires = "input")]
    id: Option<usize>,
}

impl StartArgs {
    /// The selected record, or `None` for random starts.
    fn load(&self, geom: &GeomCfg) -> Result<Option<(usize, Arrangement)>> {
        let Some(input) = &self.input else {
            return Ok(None);
        };
        let file = RecordFile::load(input)?;
        let rec = select_record(&file, input, self.id)?;
        tracing::info!(input = %input.display(), id = rec.id, score = rec.score, "start record");
        Ok(Some((rec.id, rec.arrangement(geom)?)))
    }

    fn params(&self) -> serde_json::Value {
        json!({
            "input": self.input.as_ref().map(|p| p.to_string_lossy().into_owned()),
            "id": self.id,
        })
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RetainArg {
    Top,
    All,
}

impl From<RetainArg> for Retain {
    fn from(r: RetainArg) -> Self {
        match r {
            RetainArg::Top => Retain::TopScore,
            RetainArg::All => Retain::AllAccepted,
        }
    }
}

#[derive(Subcommand)]
enum Action {
    /// Multi-start simulated annealing from random arrangements or a stored one
    Search {
        /// Line count for random starts (ignored with --input)
        #[arg(long, default_value_t = 10)]
        lines: usize,
        #[command(flatten)]
        anneal: AnnealArgs,
        #[command(flatten)]
        start: StartArgs,
        /// Soft mirror-symmetry weight λ; pairs are detected on the --input
        /// arrangement, else (0,1), (2,3), …
        #[arg(long)]
        symmetry_weight: Option<f64>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Basin hopping from the best records of a record file
    Refine {
        #[arg(long)]
        input: PathBuf,
        /// Number of top-scoring records to refine
        #[arg(long, default_value_t = 5)]
        top: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[command(flatten)]
        basin: BasinArgs,
        #[arg(long, value_enum, default_value_t = RetainArg::Top)]
        retain: RetainArg,
        #[arg(long)]
        out: PathBuf,
    },
    /// Search over mirrored arrangements (M master lines, 2M lines scored)
    Symmetric {
        /// Master line count for random starts (ignored with --input)
        #[arg(long, default_value_t = 5)]
        masters: usize,
        #[command(flatten)]
        anneal: AnnealArgs,
        /// Start from the masters extracted from a stored arrangement
        #[command(flatten)]
        start: StartArgs,
        #[arg(long)]
        out: PathBuf,
    },
    /// Fingerprint and group records into families
    Classify {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 3)]
        rounds: usize,
        /// Split fingerprint classes by exact isomorphism
        #[arg(long)]
        exact: bool,
        #[arg(long)]
        out: PathBuf,
        /// Optional CSV with one row per family
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Score-vs-k sweep of the inner-core scaling of one record
    Breather {
        #[arg(long)]
        input: PathBuf,
        /// Record id (default: best score)
        #[arg(long)]
        id: Option<usize>,
        #[arg(long, default_value_t = 0.8)]
        k_min: f64,
        #[arg(long, default_value_t = 1.2)]
        k_max: f64,
        #[arg(long, default_value_t = 0.0005)]
        step: f64,
        /// Inner core size (default: half the lines)
        #[arg(long)]
        inner: Option<usize>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Search, refine and classify in one go
    Discover {
        #[arg(long, default_value_t = 10)]
        lines: usize,
        #[command(flatten)]
        anneal: AnnealArgs,
        #[command(flatten)]
        basin: BasinArgs,
        #[arg(long, default_value_t = 5)]
        top: usize,
        #[arg(long, value_enum, default_value_t = RetainArg::Top)]
        retain: RetainArg,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Print a JSON summary of a record file
    Report {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    let tag = cmd.tag;
    match cmd.action {
        Action::Search {
            lines,
            anneal,
            start,
            symmetry_weight,
            out,
        } => search(lines, &anneal, &start, symmetry_weight, &out, tag),
        Action::Refine {
            input,
            top,
            seed,
            basin,
            retain,
            out,
        } => refine(&input, top, seed, &basin, retain.into(), &out, tag),
        Action::Symmetric {
            masters,
            anneal,
            start,
            out,
        } => symmetric(masters, &anneal, &start, &out, tag),
        Action::Classify {
            input,
            rounds,
            exact,
            out,
            summary,
        } => classify_cmd(&input, rounds, exact, &out, summary.as_deref(), tag),
        Action::Breather {
            input,
            id,
            k_min,
            k_max,
            step,
            inner,
            out,
        } => {
            let cfg = BreatherCfg {
                k_min,
                k_max,
                step,
                inner,
                ..BreatherCfg::default()
            };
            breather(&input, id, &cfg, &out, tag)
        }
        Action::Discover {
            lines,
            anneal,
            basin,
            top,
            retain,
            out,
            summary,
        } => {
            let cfg = PipelineCfg {
                n_lines: lines,
                runs: anneal.runs,
                seed: anneal.seed,
                anneal: anneal.cfg(),
                basin: basin.cfg(),
                refine_top: top,
                retain: retain.into(),
                ..PipelineCfg::default()
            };
            let params = json!({
                "lines": lines,
                "anneal": anneal.params(),
                "basin": basin.params(),
                "top": top,
                "retain": format!("{retain:?}"),
            });
            discover_cmd(&cfg, params, &out, summary.as_deref(), tag)
        }
        Action::Report { input } => report(&input),
    }
}

/// Records for the best arrangement of each run, expanded through `objective`.
fn run_records<O: Objective + ?Sized>(runs: &[RunResult], objective: &O) -> Vec<Record> {
    runs.iter()
        .map(|r| {
            let arr = objective.expand(&r.outcome.best);
            Record::new(r.index as usize, &arr, r.outcome.best_score)
        })
        .collect()
}

fn save_with_sidecar(file: &RecordFile, out: &Path, payload: Payload) -> Result<()> {
    file.save(out)?;
    write_sidecar(out, payload)?;
    tracing::info!(records = file.records.len(), out = %out.display(), "records written");
    Ok(())
}

fn search(
    lines: usize,
    anneal: &AnnealArgs,
    start: &StartArgs,
    symmetry_weight: Option<f64>,
    out: &Path,
    tag: Option<String>,
) -> Result<()> {
    tracing::info!(lines, runs = anneal.runs, seed = anneal.seed, tag = ?tag, "search");
    let geom = GeomCfg::default();
    let initial = start.load(&geom)?;
    let mut objective = EnergyFunction::new(geom);
    if let Some(weight) = symmetry_weight {
        let penalty = match &initial {
            Some((_, arr)) => SymmetryPenalty::detect(arr, weight),
            None => {
                let pairs = (0..lines.div_ceil(2))
                    .map(|i| (2 * i, (2 * i + 1).min(lines - 1)))
                    .collect();
                SymmetryPenalty::new(pairs, weight)
            }
        };
        tracing::info!(pairs = ?penalty.pairs, weight, "soft symmetry");
        objective = objective.with_symmetry(penalty);
    }
    let cfg = anneal.cfg();
    let runs = match &initial {
        Some((_, arr)) => multistart_from(arr, anneal.runs, anneal.seed, &cfg, &objective, None),
        None => multistart(lines, anneal.runs, anneal.seed, &cfg, &objective, None),
    }
    .context("annealing search")?;
    let file = RecordFile::new(run_records(&runs, &objective));
    let params = json!({
        "lines": initial.as_ref().map_or(lines, |(_, a)| a.len()),
        "anneal": anneal.params(),
        "start": start.params(),
        "symmetry_weight": symmetry_weight,
        "pairs": objective.symmetry.as_ref().map(|p| p.pairs.clone()),
    });
    save_with_sidecar(&file, out, Payload::new("search", params).with_tag(tag))
}

fn refine(
    input: &Path,
    top: usize,
    seed: u64,
    basin: &BasinArgs,
    retain: Retain,
    out: &Path,
    tag: Option<String>,
) -> Result<()> {
    tracing::info!(input = %input.display(), top, seed, tag = ?tag, "refine");
    let geom = GeomCfg::default();
    let file = RecordFile::load(input)?;
    let seeds = file
        .ranked()
        .into_iter()
        .take(top)
        .map(|r| Ok((r.arrangement(&geom)?, RunToken::new(seed, r.id as u64))))
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        bail!("{}: no records to refine", input.display());
    }
    let objective = EnergyFunction::new(geom);
    let outcomes = refine_many(&seeds, &basin.cfg(), &objective, None).context("basin hopping")?;
    let best = outcomes
        .iter()
        .flat_map(|o| o.accepted.iter().map(|s| s.score))
        .max()
        .unwrap_or(0);
    let records: Vec<Record> = outcomes
        .iter()
        .flat_map(|o| o.accepted.iter())
        .filter(|s| retain == Retain::AllAccepted || s.score == best)
        .enumerate()
        .map(|(id, s)| Record::new(id, &s.arrangement, s.score))
        .collect();
    let params = json!({
        "input": input.to_string_lossy(),
        "top": top,
        "seed": seed,
        "basin": basin.params(),
        "retain": format!("{retain:?}"),
    });
    save_with_sidecar(
        &RecordFile::new(records),
        out,
        Payload::new("refine", params).with_tag(tag),
    )
}

fn symmetric(
    masters: usize,
    anneal: &AnnealArgs,
    start: &StartArgs,
    out: &Path,
    tag: Option<String>,
) -> Result<()> {
    tracing::info!(masters, runs = anneal.runs, seed = anneal.seed, tag = ?tag, "symmetric");
    let geom = GeomCfg::default();
    let objective = MirroredObjective::new(geom);
    let cfg = anneal.cfg();
    let seed_masters = match start.load(&geom)? {
        Some((id, arr)) => {
            let m = symmetrize(&arr, &geom)
                .with_context(|| format!("record {id}: extracting master lines"))?;
            let start_score = objective.evaluate(&m).score;
            tracing::info!(masters = m.len(), score = start_score, "symmetrized start");
            Some(m)
        }
        None => None,
    };
    let runs = match &seed_masters {
        Some(m) => multistart_from(m, anneal.runs, anneal.seed, &cfg, &objective, None),
        None => multistart(masters, anneal.runs, anneal.seed, &cfg, &objective, None),
    }
    .context("mirrored search")?;
    let file = RecordFile::new(run_records(&runs, &objective));
    if let Some(best) = file.best() {
        tracing::info!(lines = best.lines.len(), score = best.score, "best mirrored arrangement");
    }
    let params = json!({
        "masters": seed_masters.as_ref().map_or(masters, Arrangement::len),
        "anneal": anneal.params(),
        "start": start.params(),
    });
    save_with_sidecar(&file, out, Payload::new("symmetric", params).with_tag(tag))
}

/// Record `id`, or the best-scoring record.
fn select_record<'f>(
    file: &'f RecordFile,
    input: &Path,
    id: Option<usize>,
) -> Result<&'f Record> {
    match id {
        Some(id) => file
            .get(id)
            .with_context(|| format!("{}: no record with id {id}", input.display())),
        None => file
            .best()
            .with_context(|| format!("{}: empty record file", input.display())),
    }
}

fn entries_of(file: &RecordFile, geom: &GeomCfg) -> Result<Vec<Entry>> {
    file.records
        .iter()
        .map(|r| {
            Ok(Entry {
                id: r.id,
                arrangement: r.arrangement(geom)?,
                score: r.score,
            })
        })
        .collect()
}

/// Copy fingerprints and family ids of `c` onto the matching records.
fn annotate(file: &mut RecordFile, c: &Classification) {
    let mut by_id: BTreeMap<usize, (String, usize)> = BTreeMap::new();
    for f in &c.families {
        for &m in &f.members {
            by_id.insert(m, (f.fingerprint.to_string(), f.id));
        }
    }
    for r in file.records.iter_mut() {
        match by_id.get(&r.id) {
            Some((fp, fam)) => {
                r.fingerprint = Some(fp.clone());
                r.family = Some(*fam);
            }
            None => {
                r.fingerprint = None;
                r.family = None;
            }
        }
    }
}

fn write_summary(c: &Classification, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        let mut df = tables::family_frame(c)?;
        tables::write_csv(&mut df, path)?;
    }
    Ok(())
}

fn classify_cmd(
    input: &Path,
    rounds: usize,
    exact: bool,
    out: &Path,
    summary: Option<&Path>,
    tag: Option<String>,
) -> Result<()> {
    tracing::info!(input = %input.display(), rounds, exact, tag = ?tag, "classify");
    let mut file = RecordFile::load(input)?;
    let cfg = ClassifyCfg {
        wl: WlCfg { rounds },
        exact_check: exact,
        ..ClassifyCfg::default()
    };
    let entries = entries_of(&file, &cfg.geom)?;
    let c = classify(&entries, &cfg);
    annotate(&mut file, &c);
    write_summary(&c, summary)?;
    let params = json!({
        "input": input.to_string_lossy(),
        "rounds": rounds,
        "exact": exact,
        "families": c.family_count(),
        "excluded": c.excluded.iter().map(|x| x.id).collect::<Vec<_>>(),
    });
    save_with_sidecar(&file, out, Payload::new("classify", params).with_tag(tag))
}

fn breather(
    input: &Path,
    id: Option<usize>,
    cfg: &BreatherCfg,
    out: &Path,
    tag: Option<String>,
) -> Result<()> {
    let file = RecordFile::load(input)?;
    let rec = select_record(&file, input, id)?;
    tracing::info!(id = rec.id, score = rec.score, tag = ?tag, "breather");
    let arr = rec.arrangement(&cfg.geom)?;
    let curve = kobon::api::breather_scan(&arr, cfg).context("breather scan")?;
    for k in [0.98, 0.99, 1.0, 1.01, 1.02] {
        if let Some(s) = curve.score_at(k) {
            tracing::info!(k, score = s, "breather point");
        }
    }
    tracing::info!(fwhm = curve.fwhm(), peak = ?curve.peak(), "breather summary");
    let mut df = tables::curve_frame(&curve)?;
    tables::write_csv(&mut df, out)?;
    let params = json!({
        "input": input.to_string_lossy(),
        "id": rec.id,
        "k_min": cfg.k_min,
        "k_max": cfg.k_max,
        "step": cfg.step,
        "inner": curve.inner,
        "fwhm": curve.fwhm(),
    });
    write_sidecar(out, Payload::new("breather", params).with_tag(tag))?;
    Ok(())
}

fn discover_cmd(
    cfg: &PipelineCfg,
    params: serde_json::Value,
    out: &Path,
    summary: Option<&Path>,
    tag: Option<String>,
) -> Result<()> {
    tracing::info!(lines = cfg.n_lines, runs = cfg.runs, seed = cfg.seed, tag = ?tag, "discover");
    let objective = EnergyFunction::new(cfg.classify.geom);
    let d = discover(cfg, &objective, None).context("discovery pipeline")?;
    let records = d
        .entries
        .iter()
        .map(|e| Record::new(e.id, &e.arrangement, e.score))
        .collect();
    let mut file = RecordFile::new(records);
    annotate(&mut file, &d.classification);
    write_summary(&d.classification, summary)?;
    save_with_sidecar(&file, out, Payload::new("discover", params).with_tag(tag))
}

/// Triangle list of an arrangement, for plotting.
fn triangle_json(arr: &Arrangement, geom: &GeomCfg) -> serde_json::Value {
    let tris: Vec<_> = valid_triangles(arr, geom)
        .iter()
        .map(|t| {
            json!({
                "lines": t.lines,
                "vertices": t.vertices.iter().map(|v| [v.x, v.y]).collect::<Vec<_>>(),
            })
        })
        .collect();
    json!(tris)
}

fn report(input: &Path) -> Result<()> {
    let geom = GeomCfg::default();
    let file = RecordFile::load(input)?;
    let mut hist: BTreeMap<usize, usize> = BTreeMap::new();
    for r in &file.records {
        *hist.entry(r.score).or_insert(0) += 1;
    }
    let families: std::collections::BTreeSet<usize> =
        file.records.iter().filter_map(|r| r.family).collect();
    let best = match file.best() {
        Some(rec) => {
            let arr = rec.arrangement(&geom)?;
            let graph = build_graph(&arr, &geom).ok();
            json!({
                "id": rec.id,
                "score": rec.score,
                "recomputed_score": score(&arr, &geom),
                "graph": graph.map(|g| json!({"vertices": g.n_vertices(), "edges": g.n_edges()})),
                "symmetries": rank_symmetries(&arr, &geom)
                    .iter()
                    .map(|(kind, err)| json!({"kind": kind.to_string(), "error": err}))
                    .collect::<Vec<_>>(),
                "triangles": triangle_json(&arr, &geom),
            })
        }
        None => serde_json::Value::Null,
    };
    let obj = json!({
        "code_rev": provenance::code_rev(),
        "kobon_version": kobon::VERSION,
        "input": input.to_string_lossy(),
        "records": file.records.len(),
        "n_lines": file.n_lines,
        "score_histogram": hist,
        "families": families.len(),
        "best": best,
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kobon::api::{optimum_10, OPTIMUM_SCORE_10};
    use tempfile::tempdir;

    fn quick_anneal() -> AnnealArgs {
        AnnealArgs {
            runs: 2,
            seed: 4,
            iters: 200,
            t0: 1.0,
            tf: 1e-3,
            sigma: 0.1,
            deadline_secs: None,
        }
    }

    /// A record file holding one known 10-line optimum (id 7).
    fn optimum_file(dir: &Path) -> PathBuf {
        let geom = GeomCfg::default();
        let arr = optimum_10(0, &geom).unwrap();
        let path = dir.join("optimum.json");
        RecordFile::new(vec![Record::new(7, &arr, OPTIMUM_SCORE_10)])
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn id_flag_needs_an_input() {
        let bad = Cmd::try_parse_from(["kobon", "symmetric", "--id", "3", "--out", "x.json"]);
        assert!(bad.is_err());
        let ok = Cmd::try_parse_from([
            "kobon", "search", "--input", "r.json", "--id", "3", "--symmetry-weight", "0.01",
            "--out", "x.json",
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn soft_search_starts_from_a_stored_record() {
        let dir = tempdir().unwrap();
        let start = StartArgs {
            input: Some(optimum_file(dir.path())),
            id: Some(7),
        };
        let (id, arr) = start.load(&GeomCfg::default()).unwrap().unwrap();
        assert_eq!((id, arr.len()), (7, 10));

        let out = dir.path().join("soft.json");
        search(3, &quick_anneal(), &start, Some(0.01), &out, None).unwrap();
        let file = RecordFile::load(&out).unwrap();
        assert_eq!(file.records.len(), 2);
        // The stored line count wins over --lines; the stored optimum is never lost.
        assert!(file.records.iter().all(|r| r.lines.len() == 10));
        assert!(file.records.iter().all(|r| r.score >= OPTIMUM_SCORE_10));

        let sidecar: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("soft.provenance.json")).unwrap())
                .unwrap();
        let pairs = sidecar["params"]["pairs"].as_array().unwrap();
        let mut covered: Vec<u64> = pairs
            .iter()
            .flat_map(|p| p.as_array().unwrap().iter().map(|x| x.as_u64().unwrap()))
            .collect();
        covered.sort_unstable();
        covered.dedup();
        assert_eq!(covered, (0..10).collect::<Vec<u64>>());
    }

    #[test]
    fn symmetric_search_starts_from_symmetrized_record() {
        let dir = tempdir().unwrap();
        let start = StartArgs {
            input: Some(optimum_file(dir.path())),
            id: None,
        };
        let out = dir.path().join("mirrored.json");
        symmetric(2, &quick_anneal(), &start, &out, None).unwrap();
        let file = RecordFile::load(&out).unwrap();
        assert_eq!(file.n_lines, 10);
        assert!(file.records.iter().all(|r| r.score <= OPTIMUM_SCORE_10));

        let missing = StartArgs {
            input: Some(dir.path().join("optimum.json")),
            id: Some(99),
        };
        assert!(symmetric(2, &quick_anneal(), &missing, &out, None).is_err());
    }
}
