//! gifsqueeze - compress animated GIFs to a target byte budget
//!
//! The library exposes the search engine, configuration, and the batch
//! sweep driver so the binary and integration tests share one code path.

pub mod config;
mod error;
pub mod passthrough;
pub mod search;
pub mod sweep;

pub use error::{Error, Result};
