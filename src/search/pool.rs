//! Worker pool.
//!
//! A fixed number of tokio tasks pull jobs from a shared [`JobQueue`], run
//! each through the [`Evaluator`], and send the [`EvaluationResult`] to the
//! aggregator over a channel. An encoder failure only affects its own job.
//! A resource failure closes the queue: in-flight jobs finish, nothing new
//! starts, and the error is returned once the pool drains.

use super::aggregator::{EvaluationResult, Outcome};
use super::encoder::Encoder;
use super::strategy::Job;
use crate::{Error, Result};
use gifsqueeze_av::{AnimationInfo, TempArtifact};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Shared queue of jobs waiting for a worker.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<Job>>,
    closed: AtomicBool,
}

impl JobQueue {
    /// Create a queue holding `jobs` in order.
    pub fn new(jobs: impl IntoIterator<Item = Job>) -> Self {
        Self {
            jobs: Mutex::new(jobs.into_iter().collect()),
            closed: AtomicBool::new(false),
        }
    }

    /// Take the next job, or `None` when empty or closed.
    pub fn next(&self) -> Option<Job> {
        if self.is_closed() {
            return None;
        }
        self.jobs.lock().pop_front()
    }

    /// Stop handing out jobs. Jobs already taken are unaffected.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Jobs not yet handed out.
    pub fn remaining(&self) -> usize {
        self.jobs.lock().len()
    }
}

/// Runs one job: acquire an artifact, encode into it, measure it.
pub struct Evaluator {
    encoder: Arc<dyn Encoder>,
    source: AnimationInfo,
    artifact_dir: PathBuf,
}

impl Evaluator {
    /// Create an evaluator writing artifacts to `artifact_dir`.
    pub fn new(encoder: Arc<dyn Encoder>, source: AnimationInfo, artifact_dir: PathBuf) -> Self {
        Self {
            encoder,
            source,
            artifact_dir,
        }
    }

    /// Evaluate `job`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resource`] if the artifact cannot be created or, after
    /// a failed encode, deleted. Encoder failures are reported through
    /// [`Outcome::EncodeFailed`].
    pub async fn evaluate(&self, job: Job) -> Result<EvaluationResult> {
        let artifact = TempArtifact::create_in(&self.artifact_dir).map_err(Error::resource)?;

        let encoded = self
            .encoder
            .encode(&self.source, &job.strategy, artifact.path())
            .await
            .map_err(|e| e.to_string())
            .and_then(|()| match artifact.size() {
                Ok(0) => Err("encoder produced an empty file".to_string()),
                Ok(size) => Ok(size),
                Err(e) => Err(format!("cannot measure output: {e}")),
            });

        let outcome = match encoded {
            Ok(size_bytes) => {
                debug!(
                    "[gen {}] {} -> {} bytes",
                    job.generation, job.strategy, size_bytes
                );
                Outcome::Encoded {
                    size_bytes,
                    artifact,
                }
            }
            Err(reason) => {
                warn!("[gen {}] {} failed: {}", job.generation, job.strategy, reason);
                artifact.discard().map_err(Error::resource)?;
                Outcome::EncodeFailed { reason }
            }
        };

        Ok(EvaluationResult { job, outcome })
    }
}

/// Fixed-size pool of concurrent evaluators.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Create a pool with `workers` units (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Number of execution units.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Drain `queue`, sending every result to `results`.
    ///
    /// Returns the number of jobs evaluated once every worker has stopped.
    pub async fn run(
        &self,
        evaluator: Arc<Evaluator>,
        queue: Arc<JobQueue>,
        results: mpsc::Sender<EvaluationResult>,
    ) -> Result<usize> {
        let workers = self.workers.min(queue.remaining()).max(1);
        debug!("Starting {} workers for {} jobs", workers, queue.remaining());

        let mut set = JoinSet::new();
        for worker_id in 0..workers {
            let evaluator = Arc::clone(&evaluator);
            let queue = Arc::clone(&queue);
            let results = results.clone();

            set.spawn(async move {
                let mut evaluated = 0usize;
                while let Some(job) = queue.next() {
                    debug!("worker {} took gen {}", worker_id, job.generation);
                    let result = match evaluator.evaluate(job).await {
                        Ok(result) => result,
                        Err(e) => {
                            queue.close();
                            return Err(e);
                        }
                    };
                    evaluated += 1;
                    if results.send(result).await.is_err() {
                        // Aggregator is gone; nothing left to report to.
                        queue.close();
                        break;
                    }
                }
                Ok(evaluated)
            });
        }
        drop(results);

        let mut evaluated = 0usize;
        let mut first_error = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(n)) => evaluated += n,
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    queue.close();
                    first_error.get_or_insert(Error::Internal(format!("worker panicked: {e}")));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(evaluated),
        }
    }
}
