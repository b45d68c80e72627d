mod types;

pub use types::*;

use crate::search::validate_lossy_levels;
use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./gifsqueeze.toml", "~/.config/gifsqueeze/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_lossy_levels(&config.search.lossy_levels)
        .context("Invalid [search] lossy_levels")?;

    if config.search.max_skip == Some(0) {
        anyhow::bail!("[search] max_skip must be at least 1");
    }

    let margin = config.search.early_stop_margin;
    if !(0.0..1.0).contains(&margin) {
        anyhow::bail!("[search] early_stop_margin must be in [0, 1), got {}", margin);
    }

    if config.search.encoder_timeout_secs == 0 {
        anyhow::bail!("[search] encoder_timeout_secs cannot be 0");
    }

    if config.defaults.target_kb <= 0.0 {
        anyhow::bail!("[defaults] target_kb must be positive");
    }

    if let Some(dir) = &config.output.temp_dir {
        if !dir.is_dir() {
            tracing::warn!("Temp dir does not exist yet: {:?}", dir);
        }
    }

    Ok(())
}
