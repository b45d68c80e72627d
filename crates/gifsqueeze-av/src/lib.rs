//! # gifsqueeze-av
//!
//! External encoder tooling for gifsqueeze.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`check_tool`], [`resolve_tool`]) -- find the
//!   gifsicle executable on `PATH` or at a configured location.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Probing** ([`probe_animation`]) -- frame count, delays, and canvas size
//!   of a GIF.
//! - **Workspace management** ([`Workspace`], [`TempArtifact`]) -- a per-run
//!   temp directory whose files are deleted unless explicitly promoted.
//! - **Encoding** ([`Gifsicle`], [`EncodePlan`]) -- the gifsicle flag grammar.
//!
//! ## Example
//!
//! ```no_run
//! use gifsqueeze_av::{probe_animation, resolve_tool, EncodePlan, Gifsicle, Workspace};
//!
//! # async fn example() -> gifsqueeze_av::Result<()> {
//! let input = std::path::Path::new("/path/to/anim.gif");
//! let info = probe_animation(input)?;
//! println!("{} frames", info.frame_count());
//!
//! let gifsicle = Gifsicle::new(resolve_tool("gifsicle", None)?);
//! let workspace = Workspace::new()?;
//! let artifact = workspace.artifact()?;
//! gifsicle
//!     .encode(input, &EncodePlan::optimize_only(), artifact.path())
//!     .await?;
//! println!("optimized to {} bytes", artifact.size()?);
//! # Ok(())
//! # }
//! ```

pub mod command;
mod error;
pub mod gifsicle;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use gifsicle::{EncodePlan, FrameSpec, Gifsicle};
pub use probe::{probe_animation, AnimationInfo};
pub use tools::{check_tool, check_tool_at, require_tool, resolve_tool, ToolInfo, GIFSICLE};
pub use workspace::{TempArtifact, Workspace};
