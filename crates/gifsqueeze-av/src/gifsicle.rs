//! gifsicle invocation.
//!
//! [`Gifsicle::args`] turns an [`EncodePlan`] into the encoder's flag grammar:
//! maximal optimization, the unconditional safety/performance flags, an
//! optional lossy threshold, and one `--delay=<cs> #<index>` pair per kept
//! frame.

use crate::command::{ToolCommand, DEFAULT_TIMEOUT};
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Flags passed to every invocation.
const BASE_FLAGS: &[&str] = &["-O3", "--no-warnings", "--no-conserve-memory", "--careful"];

/// One frame kept in the output, with its display delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpec {
    /// Zero-based index of the frame in the input.
    pub index: usize,
    /// Display delay in centiseconds.
    pub delay_cs: u16,
}

/// What the encoder should produce from an input animation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodePlan {
    /// Frames to keep, in output order. Empty keeps every frame untouched.
    pub frames: Vec<FrameSpec>,
    /// Lossy threshold; `None` omits the flag.
    pub lossy: Option<u32>,
}

impl EncodePlan {
    /// Plan that only optimizes: every frame, original delays, lossless.
    pub fn optimize_only() -> Self {
        Self::default()
    }
}

/// Handle on a resolved gifsicle executable.
#[derive(Debug, Clone)]
pub struct Gifsicle {
    program: PathBuf,
    timeout: Duration,
}

impl Gifsicle {
    /// Create a handle for the executable at `program`.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path to the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the argument list for one invocation.
    pub fn args(input: &Path, plan: &EncodePlan, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = BASE_FLAGS.iter().map(|s| s.to_string()).collect();

        if let Some(level) = plan.lossy.filter(|&l| l > 0) {
            args.push(format!("--lossy={level}"));
        }

        args.push(input.to_string_lossy().to_string());

        for frame in &plan.frames {
            args.push(format!("--delay={}", frame.delay_cs));
            args.push(format!("#{}", frame.index));
        }

        args.push("-o".to_string());
        args.push(output.to_string_lossy().to_string());
        args
    }

    /// Encode `input` according to `plan`, writing to `output`.
    pub async fn encode(&self, input: &Path, plan: &EncodePlan, output: &Path) -> Result<()> {
        let args = Self::args(input, plan, output);
        tracing::trace!("gifsicle {}", args.join(" "));

        ToolCommand::new(self.program.clone())
            .args(args)
            .timeout(self.timeout)
            .execute()
            .await?;
        Ok(())
    }
}
