use crate::search::{SearchOptions, DEFAULT_LOSSY_LEVELS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Engine options derived from `[search]` and `[output]`.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            lossy_levels: self.search.lossy_levels.clone(),
            max_skip: self.search.max_skip,
            early_stop_margin: self.search.early_stop_margin,
            temp_dir: self.output.temp_dir.clone(),
        }
    }

    pub fn encoder_timeout(&self) -> Duration {
        Duration::from_secs(self.search.encoder_timeout_secs)
    }
}

/// Values used when the matching CLI flag is absent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_target_kb")]
    pub target_kb: f64,

    #[serde(default = "default_min_frames_percent")]
    pub min_frames_percent: f64,

    /// 0 = one worker per logical core
    #[serde(default)]
    pub threads: usize,
}

fn default_target_kb() -> f64 {
    500.0
}
fn default_min_frames_percent() -> f64 {
    10.0
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            target_kb: default_target_kb(),
            min_frames_percent: default_min_frames_percent(),
            threads: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_lossy_levels")]
    pub lossy_levels: Vec<u32>,

    #[serde(default)]
    pub max_skip: Option<u32>,

    /// Fraction of the target; 0 disables early stop
    #[serde(default)]
    pub early_stop_margin: f64,

    #[serde(default = "default_encoder_timeout")]
    pub encoder_timeout_secs: u64,
}

fn default_lossy_levels() -> Vec<u32> {
    DEFAULT_LOSSY_LEVELS.to_vec()
}
fn default_encoder_timeout() -> u64 {
    300
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lossy_levels: default_lossy_levels(),
            max_skip: None,
            early_stop_margin: 0.0,
            encoder_timeout_secs: default_encoder_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub gifsicle: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Copy inputs that are already under target instead of re-encoding
    #[serde(default = "default_true")]
    pub passthrough_small_inputs: bool,

    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            passthrough_small_inputs: true,
            temp_dir: None,
        }
    }
}
