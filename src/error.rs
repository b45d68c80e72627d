//! Error taxonomy for a compression run.
//!
//! Per-strategy encoder failures are not errors at this level: they are
//! recorded as [`Outcome::EncodeFailed`](crate::search::Outcome) and never
//! leave the worker that produced them. Everything here aborts the run.

use std::path::PathBuf;

/// Fatal errors surfaced by the search engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input is missing, unreadable, or not an animation.
    #[error("input error: {}: {message}", path.display())]
    Input {
        /// Offending input path.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The external encoder cannot be found or executed.
    #[error("encoder unavailable: {tool}")]
    EncoderUnavailable {
        /// Tool name or configured path.
        tool: String,
    },

    /// A temp artifact could not be created, deleted, or promoted.
    #[error("resource error: {message}")]
    Resource {
        /// Human-readable error description.
        message: String,
    },

    /// Every strategy, baseline included, failed to encode.
    #[error("all {attempted} strategies failed to encode")]
    AllStrategiesFailed {
        /// Number of strategies evaluated.
        attempted: usize,
    },

    /// The compression target is out of range.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short name of the error category, for user-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Input { .. } => "InputError",
            Error::EncoderUnavailable { .. } => "EncoderUnavailable",
            Error::Resource { .. } => "ResourceError",
            Error::AllStrategiesFailed { .. } => "AllStrategiesFailed",
            Error::InvalidTarget(_) => "InvalidTarget",
            Error::Internal(_) => "Internal",
        }
    }

    /// Convenience constructor for [`Error::Input`].
    pub fn input(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Input {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Resource`].
    pub fn resource(message: impl ToString) -> Self {
        Error::Resource {
            message: message.to_string(),
        }
    }

    /// Classify an encoder availability check failure.
    pub fn encoder_unavailable(err: gifsqueeze_av::Error) -> Self {
        match err {
            gifsqueeze_av::Error::ToolNotFound { tool } => Error::EncoderUnavailable { tool },
            other => Error::EncoderUnavailable {
                tool: other.to_string(),
            },
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
