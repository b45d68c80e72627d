//! Compression target: size budget, frame floor, and worker count.

use crate::{Error, Result};
use serde::Serialize;

/// Float error tolerated when turning the frame ratio into a frame count.
/// `0.1 * 30.0` is `3.0000000000000004`, which must still yield a floor of 3 frames.
const RATIO_EPSILON: f64 = 1e-9;

/// Immutable parameters of one compression run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionTarget {
    target_size_bytes: u64,
    min_frame_ratio: f64,
    worker_count: usize,
}

impl CompressionTarget {
    /// Build and validate a target.
    ///
    /// A `worker_count` of zero is resolved to the number of logical cores.
    pub fn new(target_size_bytes: u64, min_frame_ratio: f64, worker_count: usize) -> Result<Self> {
        if target_size_bytes == 0 {
            return Err(Error::InvalidTarget(
                "target size must be greater than zero".into(),
            ));
        }
        if !(min_frame_ratio > 0.0 && min_frame_ratio <= 1.0) {
            return Err(Error::InvalidTarget(format!(
                "minimum frame ratio must be in (0, 1], got {min_frame_ratio}"
            )));
        }

        Ok(Self {
            target_size_bytes,
            min_frame_ratio,
            worker_count: resolve_worker_count(worker_count),
        })
    }

    /// Build a target from CLI units: kilobytes, percent of frames, threads.
    pub fn from_cli_units(target_kb: f64, min_frames_percent: f64, threads: usize) -> Result<Self> {
        if !target_kb.is_finite() || target_kb <= 0.0 {
            return Err(Error::InvalidTarget(format!(
                "target must be a positive number of KB, got {target_kb}"
            )));
        }
        let bytes = (target_kb * 1024.0).round() as u64;
        Self::new(bytes, min_frames_percent / 100.0, threads)
    }

    /// Size budget in bytes. Results must be strictly below it to qualify.
    pub fn target_size_bytes(&self) -> u64 {
        self.target_size_bytes
    }

    /// Minimum fraction of the original frames every strategy must keep.
    pub fn min_frame_ratio(&self) -> f64 {
        self.min_frame_ratio
    }

    /// Number of concurrent workers (always at least one).
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// The frame floor for an animation of `frame_count` frames:
    /// `ceil(min_frame_ratio * frame_count)`, never below one.
    pub fn min_retained_frames(&self, frame_count: usize) -> usize {
        let raw = self.min_frame_ratio * frame_count as f64;
        let floor = (raw - RATIO_EPSILON).ceil().max(1.0);
        (floor as usize).min(frame_count.max(1))
    }
}

/// Resolve a requested worker count; zero means one per logical core.
pub fn resolve_worker_count(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get().max(1)
    } else {
        requested
    }
}
