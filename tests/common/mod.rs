//! Shared test harness for integration tests.
//!
//! Provides [`ModelEncoder`], a deterministic in-memory stand-in for gifsicle
//! whose output size is a pure function of the strategy, and GIF fixture
//! helpers built on the `image` crate.

#![allow(dead_code)]

use async_trait::async_trait;
use gifsqueeze::search::{Encoder, Strategy};
use gifsqueeze_av::{AnimationInfo, Error as AvError};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Output size for a strategy given the source frame count; `None` fails the encode.
pub type SizeModel = Arc<dyn Fn(&Strategy, usize) -> Option<u64> + Send + Sync>;

/// Size scales with retained frames and drops linearly with the lossy level.
///
/// Integer arithmetic keeps ties exact: skip 4 with no lossy and skip 2 at
/// lossy 240 both give `base / 4` on 40 frames.
pub fn linear_model(base: u64) -> SizeModel {
    Arc::new(move |strategy, frames| {
        let retained = strategy.retained_frames(frames) as u64;
        let quality = 480 - strategy.lossy_level() as u64;
        Some(base * retained * quality / (frames as u64 * 480))
    })
}

pub fn failing_model() -> SizeModel {
    Arc::new(|_, _| None)
}

pub struct ModelEncoder {
    model: SizeModel,
    available: bool,
    jitter_seed: Option<u64>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Strategy>>,
}

impl ModelEncoder {
    pub fn new(model: SizeModel) -> Self {
        Self {
            model,
            available: true,
            jitter_seed: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Add a pseudo-random per-strategy delay so completion order varies by seed.
    pub fn with_jitter(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Strategy> {
        self.seen.lock().clone()
    }

    fn jitter(&self, strategy: &Strategy) -> Option<Duration> {
        let seed = self.jitter_seed?;
        let mut x = seed
            ^ (strategy.skip_count() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (strategy.lossy_level() as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        x ^= x >> 33;
        x = x.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
        x ^= x >> 33;
        Some(Duration::from_micros(x % 3_000))
    }
}

#[async_trait]
impl Encoder for ModelEncoder {
    fn name(&self) -> &str {
        "model"
    }

    fn ensure_available(&self) -> gifsqueeze_av::Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(AvError::tool_not_found("model"))
        }
    }

    async fn encode(
        &self,
        source: &AnimationInfo,
        strategy: &Strategy,
        output: &Path,
    ) -> gifsqueeze_av::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(*strategy);

        if let Some(delay) = self.jitter(strategy) {
            tokio::time::sleep(delay).await;
        }

        let size = (self.model)(strategy, source.frame_count())
            .ok_or_else(|| AvError::tool_failed("model", "refused strategy"))?;
        let file = std::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(output)?;
        file.set_len(size)?;
        Ok(())
    }
}

/// Write a small looping GIF with `frames` frames of 100ms each.
pub fn write_gif(path: &Path, frames: usize) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GifEncoder::new(file);
    encoder.set_repeat(Repeat::Infinite).unwrap();
    for i in 0..frames {
        let shade = (i * 255 / frames.max(1)) as u8;
        let buffer = RgbaImage::from_pixel(6, 6, Rgba([shade, 64, 255 - shade, 255]));
        let frame = Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1));
        encoder.encode_frame(frame).unwrap();
    }
}

/// Number of entries left in a directory.
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
