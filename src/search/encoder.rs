//! Encoder capability.
//!
//! The search engine treats encoding as a black box: given the source
//! animation and a strategy, produce a file at `output` or fail. Sizes are
//! measured by the caller.

use super::strategy::Strategy;
use async_trait::async_trait;
use gifsqueeze_av::{resolve_tool, AnimationInfo, Gifsicle, GIFSICLE};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Something that can turn a strategy into an output file.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Human-readable encoder name.
    fn name(&self) -> &str;

    /// Check that the encoder can run at all, before any work is dispatched.
    fn ensure_available(&self) -> gifsqueeze_av::Result<()>;

    /// Encode `source` with `strategy`, writing the result to `output`.
    ///
    /// On error the content of `output` is unspecified and must not be used.
    async fn encode(
        &self,
        source: &AnimationInfo,
        strategy: &Strategy,
        output: &Path,
    ) -> gifsqueeze_av::Result<()>;
}

/// [`Encoder`] backed by the gifsicle CLI.
#[derive(Debug)]
pub struct GifsicleEncoder {
    configured: Option<PathBuf>,
    timeout: Duration,
    resolved: OnceLock<Gifsicle>,
}

impl GifsicleEncoder {
    /// Use gifsicle from `configured`, or from `PATH` when `None`.
    pub fn new(configured: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            configured,
            timeout,
            resolved: OnceLock::new(),
        }
    }

    fn tool(&self) -> gifsqueeze_av::Result<&Gifsicle> {
        if let Some(tool) = self.resolved.get() {
            return Ok(tool);
        }
        let program = resolve_tool(GIFSICLE, self.configured.as_deref())?;
        tracing::debug!("Using gifsicle at {}", program.display());
        Ok(self
            .resolved
            .get_or_init(|| Gifsicle::new(program).with_timeout(self.timeout)))
    }
}

#[async_trait]
impl Encoder for GifsicleEncoder {
    fn name(&self) -> &str {
        GIFSICLE
    }

    fn ensure_available(&self) -> gifsqueeze_av::Result<()> {
        self.tool().map(|_| ())
    }

    async fn encode(
        &self,
        source: &AnimationInfo,
        strategy: &Strategy,
        output: &Path,
    ) -> gifsqueeze_av::Result<()> {
        let plan = strategy.plan(&source.frame_delays_cs);
        self.tool()?.encode(&source.path, &plan, output).await
    }
}
