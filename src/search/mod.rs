//! Compression-strategy search engine.
//!
//! A run probes the input, evaluates the baseline strategy, and if that is
//! not already under target, fans the remaining strategies out to a worker
//! pool. Results flow to a single aggregator that keeps the best artifact
//! and deletes the rest.

pub mod aggregator;
pub mod encoder;
pub mod orchestrator;
pub mod pool;
pub mod strategy;
pub mod target;

pub use aggregator::{Decision, EvaluationResult, Outcome, ResultAggregator, Winner};
pub use encoder::{Encoder, GifsicleEncoder};
pub use orchestrator::{Orchestrator, RunReport, RunStatus, SearchOptions};
pub use pool::{Evaluator, JobQueue, WorkerPool};
pub use strategy::{
    validate_lossy_levels, Job, Stage, Strategy, StrategyGenerator, DEFAULT_LOSSY_LEVELS,
    MAX_LOSSY_LEVEL, MIN_LOSSY_LEVEL,
};
pub use target::{resolve_worker_count, CompressionTarget};
