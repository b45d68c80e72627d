//! Batch sweep over a directory of animations.
//!
//! Each input is compressed once per frame floor, from the most permissive
//! floor down to the most aggressive. The largest result that met the
//! target is kept; inputs with no such result are skipped.

use crate::search::{CompressionTarget, Orchestrator, RunReport, RunStatus};
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Floors to try, in percent, from `from` down to `to` in `step` decrements.
pub fn floors(from: u32, to: u32, step: u32) -> Result<Vec<u32>> {
    if step == 0 {
        return Err(Error::InvalidTarget("sweep step must be at least 1".into()));
    }
    if to == 0 || from > 100 || to > from {
        return Err(Error::InvalidTarget(format!(
            "sweep range must satisfy 100 >= from >= to > 0, got {from}..{to}"
        )));
    }

    let mut floors = Vec::new();
    let mut current = from;
    while current >= to {
        floors.push(current);
        match current.checked_sub(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(floors)
}

/// `.gif` files directly inside `dir`, sorted by path.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| Error::input(dir, e.to_string()))?;
        let is_gif = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("gif"));
        if entry.file_type().is_file() && is_gif {
            inputs.push(entry.into_path());
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// What happened to one input.
#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    pub input: PathBuf,
    /// Floor, in percent, that produced the kept result.
    pub floor_percent: Option<u32>,
    pub report: Option<RunReport>,
    /// Why the input was skipped, if it was.
    pub skipped: Option<String>,
}

/// Run the engine over `inputs` for every floor and write each winner to
/// `out_dir` under its original file name.
///
/// Per-input failures (unreadable input, every strategy failing) skip that
/// input. Failures that would affect every input, like a missing encoder,
/// abort the sweep.
pub async fn sweep(
    orchestrator: &Orchestrator,
    inputs: &[PathBuf],
    out_dir: &Path,
    floors: &[u32],
    target_bytes: u64,
    threads: usize,
) -> Result<Vec<SweepEntry>> {
    std::fs::create_dir_all(out_dir).map_err(Error::resource)?;
    let staging = tempfile::Builder::new()
        .prefix(".gifsqueeze-sweep-")
        .tempdir_in(out_dir)
        .map_err(Error::resource)?;

    let mut entries = Vec::with_capacity(inputs.len());
    for input in inputs {
        let Some(name) = input.file_name() else {
            continue;
        };
        let mut best: Option<(u32, RunReport)> = None;
        let mut skipped = None;

        for &floor in floors {
            let target = CompressionTarget::new(target_bytes, floor as f64 / 100.0, threads)?;
            let staged = staging.path().join(format!("{floor}-{}", name.to_string_lossy()));

            info!("Sweeping {} at {}% floor", input.display(), floor);
            let report = match orchestrator.run(input, &staged, &target).await {
                Ok(report) => report,
                Err(e @ (Error::Input { .. } | Error::AllStrategiesFailed { .. })) => {
                    warn!("Skipping {}: {}", input.display(), e);
                    skipped = Some(e.to_string());
                    break;
                }
                Err(e) => return Err(e),
            };

            let better = report.status == RunStatus::Success
                && best
                    .as_ref()
                    .map_or(true, |(_, kept)| report.achieved_bytes > kept.achieved_bytes);
            if better {
                if let Some((_, previous)) = best.take() {
                    std::fs::remove_file(&previous.output).map_err(Error::resource)?;
                }
                best = Some((floor, report));
            } else {
                std::fs::remove_file(&report.output).map_err(Error::resource)?;
            }
        }

        let entry = match best {
            Some((floor, mut report)) => {
                let dest = out_dir.join(name);
                std::fs::rename(&report.output, &dest).map_err(Error::resource)?;
                info!(
                    "{} -> {} ({} bytes at {}% floor)",
                    input.display(),
                    dest.display(),
                    report.achieved_bytes,
                    floor
                );
                report.output = dest;
                SweepEntry {
                    input: input.clone(),
                    floor_percent: Some(floor),
                    report: Some(report),
                    skipped: None,
                }
            }
            None => {
                let reason = skipped.unwrap_or_else(|| "no result under target".to_string());
                warn!("No output for {}: {}", input.display(), reason);
                SweepEntry {
                    input: input.clone(),
                    floor_percent: None,
                    report: None,
                    skipped: Some(reason),
                }
            }
        };
        entries.push(entry);
    }

    staging.close().map_err(Error::resource)?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn floors_descend_inclusive() {
        assert_eq!(floors(50, 5, 5).unwrap(), vec![50, 45, 40, 35, 30, 25, 20, 15, 10, 5]);
        assert_eq!(floors(50, 10, 15).unwrap(), vec![50, 35, 20]);
        assert_eq!(floors(10, 10, 5).unwrap(), vec![10]);
    }

    #[test]
    fn floors_reject_bad_ranges() {
        assert!(floors(50, 5, 0).is_err());
        assert!(floors(5, 50, 5).is_err());
        assert!(floors(50, 0, 5).is_err());
        assert!(floors(150, 5, 5).is_err());
    }

    #[test]
    fn discovers_only_top_level_gifs() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.gif"), b"").unwrap();
        std::fs::write(dir.path().join("a.GIF"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.gif"), b"").unwrap();

        let inputs = discover_inputs(dir.path()).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.GIF", "b.gif"]);
    }
}
