//! Candidate strategies and the generator that enumerates them.
//!
//! Strategies are produced in escalating aggressiveness:
//!
//! 1. **Baseline** -- optimization only, every frame, lossless.
//! 2. **Frame reduction** -- keep every `s`-th frame for each legal `s >= 2`.
//! 3. **Lossy sweep** -- every legal skip count (including 1) crossed with
//!    the lossy ladder.
//!
//! A skip count `s` is legal when `frame_count / s` (integer division) is at
//! least the frame floor of the [`CompressionTarget`].

use super::target::CompressionTarget;
use crate::{Error, Result};
use gifsqueeze_av::{EncodePlan, FrameSpec};
use serde::Serialize;
use std::fmt;

/// Lowest lossy level the encoder accepts.
pub const MIN_LOSSY_LEVEL: u32 = 30;

/// Highest lossy level in the ladder.
pub const MAX_LOSSY_LEVEL: u32 = 240;

/// Default lossy ladder.
pub const DEFAULT_LOSSY_LEVELS: [u32; 8] = [30, 60, 90, 120, 150, 180, 210, 240];

/// A concrete compression strategy.
///
/// `delay_scale` is not a tunable; it always equals `skip_count` so a kept
/// frame is displayed for as long as the frames it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Strategy {
    skip_count: u32,
    lossy_level: u32,
    delay_scale: f64,
}

impl Strategy {
    /// Optimization only.
    pub const BASELINE: Strategy = Strategy {
        skip_count: 1,
        lossy_level: 0,
        delay_scale: 1.0,
    };

    /// Create a strategy. A `skip_count` of zero is treated as one.
    pub fn new(skip_count: u32, lossy_level: u32) -> Self {
        let skip_count = skip_count.max(1);
        Self {
            skip_count,
            lossy_level,
            delay_scale: f64::from(skip_count),
        }
    }

    /// Keep every `skip_count`-th frame; one keeps them all.
    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    /// Lossy threshold; zero means lossless.
    pub fn lossy_level(&self) -> u32 {
        self.lossy_level
    }

    /// Multiplier applied to each kept frame's delay.
    pub fn delay_scale(&self) -> f64 {
        self.delay_scale
    }

    /// Whether this is the optimization-only baseline.
    pub fn is_baseline(&self) -> bool {
        self.skip_count == 1 && self.lossy_level == 0
    }

    /// Frames left after skipping: indices `0, s, 2s, ...`.
    pub fn retained_frames(&self, frame_count: usize) -> usize {
        frame_count.div_ceil(self.skip_count as usize)
    }

    /// Scale a delay, rounding to the nearest centisecond tick, minimum one.
    pub fn scaled_delay(&self, delay_cs: u16) -> u16 {
        let scaled = (f64::from(delay_cs) * self.delay_scale).round();
        scaled.clamp(1.0, f64::from(u16::MAX)) as u16
    }

    /// Translate this strategy into an encoder plan for the given delays.
    pub fn plan(&self, frame_delays_cs: &[u16]) -> EncodePlan {
        let frames = if self.skip_count == 1 {
            Vec::new()
        } else {
            frame_delays_cs
                .iter()
                .enumerate()
                .step_by(self.skip_count as usize)
                .map(|(index, &delay)| FrameSpec {
                    index,
                    delay_cs: self.scaled_delay(delay),
                })
                .collect()
        };

        EncodePlan {
            frames,
            lossy: (self.lossy_level > 0).then_some(self.lossy_level),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skip={} lossy={} delay_scale={}",
            self.skip_count, self.lossy_level, self.delay_scale
        )
    }
}

/// Generator stage a strategy belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Baseline,
    FrameReduction,
    LossySweep,
}

/// A strategy tagged with its position in generator order.
///
/// The generation number breaks ties during selection, so it must not depend
/// on when a result arrives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Job {
    pub generation: u64,
    pub stage: Stage,
    pub strategy: Strategy,
}

/// Check a lossy ladder: every level in range, strictly increasing.
pub fn validate_lossy_levels(levels: &[u32]) -> Result<()> {
    if let Some(bad) = levels
        .iter()
        .find(|&&l| !(MIN_LOSSY_LEVEL..=MAX_LOSSY_LEVEL).contains(&l))
    {
        return Err(Error::InvalidTarget(format!(
            "lossy level {bad} outside [{MIN_LOSSY_LEVEL}, {MAX_LOSSY_LEVEL}]"
        )));
    }
    if levels.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::InvalidTarget(
            "lossy levels must be strictly increasing".into(),
        ));
    }
    Ok(())
}

/// Enumerates strategies for one animation.
///
/// Pure and restartable: [`jobs`](Self::jobs) returns the same sequence every
/// time it is called.
#[derive(Debug, Clone)]
pub struct StrategyGenerator {
    frame_count: usize,
    min_frames: usize,
    max_skip: u32,
    lossy_levels: Vec<u32>,
}

impl StrategyGenerator {
    /// Create a generator for an animation with `frame_count` frames.
    pub fn new(
        target: &CompressionTarget,
        frame_count: usize,
        lossy_levels: &[u32],
    ) -> Result<Self> {
        validate_lossy_levels(lossy_levels)?;
        let min_frames = target.min_retained_frames(frame_count);
        let max_skip = u32::try_from(frame_count.max(1) / min_frames).unwrap_or(u32::MAX);

        Ok(Self {
            frame_count,
            min_frames,
            max_skip: max_skip.max(1),
            lossy_levels: lossy_levels.to_vec(),
        })
    }

    /// Narrow frame reduction to at most `cap` (values below one are ignored).
    pub fn with_max_skip(mut self, cap: Option<u32>) -> Self {
        if let Some(cap) = cap {
            self.max_skip = self.max_skip.min(cap.max(1));
        }
        self
    }

    /// Frame count of the source animation.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// The frame floor no strategy may go below.
    pub fn min_frames(&self) -> usize {
        self.min_frames
    }

    /// Largest legal skip count.
    pub fn max_skip(&self) -> u32 {
        self.max_skip
    }

    /// Stage 1.
    pub fn baseline(&self) -> Job {
        Job {
            generation: 0,
            stage: Stage::Baseline,
            strategy: Strategy::BASELINE,
        }
    }

    /// Stages 2 and 3, numbered after the baseline.
    pub fn search_jobs(&self) -> Vec<Job> {
        let reductions =
            (2..=self.max_skip).map(|skip| (Stage::FrameReduction, Strategy::new(skip, 0)));
        let lossy = (1..=self.max_skip).flat_map(|skip| {
            self.lossy_levels
                .iter()
                .map(move |&level| (Stage::LossySweep, Strategy::new(skip, level)))
        });

        reductions
            .chain(lossy)
            .zip(1u64..)
            .map(|((stage, strategy), generation)| Job {
                generation,
                stage,
                strategy,
            })
            .collect()
    }

    /// Every job, baseline first.
    pub fn jobs(&self) -> Vec<Job> {
        std::iter::once(self.baseline())
            .chain(self.search_jobs())
            .collect()
    }
}
