//! Run orchestration.
//!
//! ```text
//! Init -> BaselineRun -> (Done | Searching) -> Finalized
//! ```
//!
//! The baseline runs alone, before any worker starts; a baseline already
//! under target finishes the run. Otherwise the remaining strategies go to
//! the [`WorkerPool`] and every dispatched evaluation is allowed to finish
//! before the winner is resolved and promoted.

use super::aggregator::{EvaluationResult, ResultAggregator, Winner};
use super::encoder::Encoder;
use super::pool::{Evaluator, JobQueue, WorkerPool};
use super::strategy::{Stage, Strategy, StrategyGenerator, DEFAULT_LOSSY_LEVELS};
use super::target::CompressionTarget;
use crate::{Error, Result};
use gifsqueeze_av::{probe_animation, AnimationInfo, Workspace};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How a finished run relates to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The output is strictly below the target.
    Success,
    /// Nothing met the target; the output is the smallest result found.
    BestEffort,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub target_bytes: u64,
    pub achieved_bytes: u64,
    pub original_bytes: u64,
    pub original_frames: usize,
    pub retained_frames: usize,
    pub winner: Strategy,
    pub stage: Stage,
    /// Strategies evaluated, baseline included.
    pub evaluated: usize,
    /// Evaluated strategies whose encode failed.
    pub failed: usize,
    pub output: PathBuf,
}

/// Engine knobs that are not part of the target.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Ordered lossy ladder for the lossy sweep.
    pub lossy_levels: Vec<u32>,
    /// Optional cap on frame skipping, on top of the frame floor.
    pub max_skip: Option<u32>,
    /// Stop handing out new strategies once a qualifying result reaches
    /// `target * (1 - margin)`. Zero disables.
    pub early_stop_margin: f64,
    /// Parent directory for the run workspace; system temp dir when `None`.
    pub temp_dir: Option<PathBuf>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            lossy_levels: DEFAULT_LOSSY_LEVELS.to_vec(),
            max_skip: None,
            early_stop_margin: 0.0,
            temp_dir: None,
        }
    }
}

impl SearchOptions {
    /// Size at which early-stop kicks in, if enabled.
    fn early_stop_bytes(&self, target_bytes: u64) -> Option<u64> {
        (self.early_stop_margin > 0.0)
            .then(|| (target_bytes as f64 * (1.0 - self.early_stop_margin)).ceil() as u64)
    }
}

/// Drives one compression run from input to promoted output.
pub struct Orchestrator {
    encoder: Arc<dyn Encoder>,
    options: SearchOptions,
}

impl Orchestrator {
    /// Create an orchestrator using `encoder`.
    pub fn new(encoder: Arc<dyn Encoder>, options: SearchOptions) -> Self {
        Self { encoder, options }
    }

    /// Compress `input` into `output` under `target`.
    ///
    /// # Errors
    ///
    /// [`Error::Input`], [`Error::EncoderUnavailable`] and
    /// [`Error::InvalidTarget`] before any strategy runs;
    /// [`Error::Resource`] if an artifact cannot be created, deleted or
    /// promoted; [`Error::AllStrategiesFailed`] if nothing encoded.
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        target: &CompressionTarget,
    ) -> Result<RunReport> {
        // Init
        let source = probe(input).await?;
        self.encoder
            .ensure_available()
            .map_err(Error::encoder_unavailable)?;
        let generator =
            StrategyGenerator::new(target, source.frame_count(), &self.options.lossy_levels)?
                .with_max_skip(self.options.max_skip);

        info!(
            "Compressing {} ({} bytes, {} frames) to under {} bytes; floor {} frames, max skip {}",
            input.display(),
            source.file_size,
            source.frame_count(),
            target.target_size_bytes(),
            generator.min_frames(),
            generator.max_skip()
        );

        let workspace = match &self.options.temp_dir {
            Some(dir) => Workspace::new_in(dir),
            None => Workspace::new(),
        }
        .map_err(Error::resource)?;

        let original_bytes = source.file_size;
        let original_frames = source.frame_count();
        let evaluator = Arc::new(Evaluator::new(
            Arc::clone(&self.encoder),
            source,
            workspace.path().to_path_buf(),
        ));
        let mut aggregator = ResultAggregator::new(target.target_size_bytes());

        // BaselineRun
        let baseline = evaluator.evaluate(generator.baseline()).await?;
        match baseline.size_bytes() {
            Some(size) => info!("Baseline optimization: {} bytes", size),
            None => warn!("Baseline optimization failed; continuing with search"),
        }
        aggregator.offer(baseline);

        // Searching
        if aggregator.qualifying_size().is_none() {
            aggregator = self
                .search(&generator, target, Arc::clone(&evaluator), aggregator)
                .await?;
        } else {
            info!("Baseline already under target; skipping search");
        }

        // Finalized
        let evaluated = aggregator.offered();
        let failed = aggregator.failed();
        let winner = aggregator
            .resolve()?
            .ok_or(Error::AllStrategiesFailed {
                attempted: evaluated,
            })?;

        let report = finalize(
            winner,
            output,
            target,
            original_bytes,
            original_frames,
            evaluated,
            failed,
        )?;
        workspace.close().map_err(Error::resource)?;
        Ok(report)
    }

    async fn search(
        &self,
        generator: &StrategyGenerator,
        target: &CompressionTarget,
        evaluator: Arc<Evaluator>,
        mut aggregator: ResultAggregator,
    ) -> Result<ResultAggregator> {
        let jobs = generator.search_jobs();
        if jobs.is_empty() {
            return Ok(aggregator);
        }

        info!(
            "Searching {} strategies with {} workers",
            jobs.len(),
            target.worker_count()
        );

        let queue = Arc::new(JobQueue::new(jobs));
        let pool = WorkerPool::new(target.worker_count());
        let (tx, mut rx) = mpsc::channel::<EvaluationResult>(pool.workers() * 2);
        let early_stop = self.options.early_stop_bytes(target.target_size_bytes());

        let collector_queue = Arc::clone(&queue);
        let collector = tokio::spawn(async move {
            while let Some(result) = rx.recv().await {
                let generation = result.job.generation;
                let decision = aggregator.offer(result);
                debug!("[gen {}] {:?}", generation, decision);

                if aggregator.is_faulted() {
                    collector_queue.close();
                }
                if let (Some(threshold), Some(best)) = (early_stop, aggregator.qualifying_size()) {
                    if best >= threshold && !collector_queue.is_closed() {
                        info!(
                            "{} bytes is within the early-stop margin; no new strategies will start",
                            best
                        );
                        collector_queue.close();
                    }
                }
            }
            aggregator
        });

        let pooled = pool.run(evaluator, queue, tx).await;
        let aggregator = collector
            .await
            .map_err(|e| Error::Internal(format!("aggregator task failed: {e}")))?;
        pooled?;
        Ok(aggregator)
    }
}

/// Decoding composites every frame, so it runs off the async workers.
async fn probe(input: &Path) -> Result<AnimationInfo> {
    let path = input.to_path_buf();
    tokio::task::spawn_blocking(move || probe_animation(&path))
        .await
        .map_err(|e| Error::Internal(format!("probe task failed: {e}")))?
        .map_err(|e| Error::input(input, e.to_string()))
}

#[allow(clippy::too_many_arguments)]
fn finalize(
    winner: Winner,
    output: &Path,
    target: &CompressionTarget,
    original_bytes: u64,
    original_frames: usize,
    evaluated: usize,
    failed: usize,
) -> Result<RunReport> {
    let status = if winner.met_target {
        RunStatus::Success
    } else {
        RunStatus::BestEffort
    };
    let strategy = winner.job.strategy;
    let output = winner.artifact.promote(output).map_err(Error::resource)?;

    let report = RunReport {
        status,
        target_bytes: target.target_size_bytes(),
        achieved_bytes: winner.size_bytes,
        original_bytes,
        original_frames,
        retained_frames: strategy.retained_frames(original_frames),
        winner: strategy,
        stage: winner.job.stage,
        evaluated,
        failed,
        output,
    };

    match status {
        RunStatus::Success => info!(
            "Done: {} bytes (target {}) with {}",
            report.achieved_bytes, report.target_bytes, strategy
        ),
        RunStatus::BestEffort => warn!(
            "Target {} bytes unreachable; closest result is {} bytes with {}",
            report.target_bytes, report.achieved_bytes, strategy
        ),
    }

    Ok(report)
}
