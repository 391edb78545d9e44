//! CLI configuration: thin wrapper around `devpick_config`.
//!
//! Loads the file named by `--config` (or the platform default) and lays
//! the `GlobalOpts` flag overrides on top.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use devpick_config::{Config, config_path, load_config_from, save_config_to};

/// The config file this invocation reads and writes.
pub fn active_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config file and apply flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config_from(&active_path(global))?;
    apply_overrides(&mut cfg, global);
    cfg.validate()?;
    Ok(cfg)
}

/// Flags win over file and environment values.
pub fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(adb) = &global.adb {
        cfg.adb_path = Some(adb.clone());
    }
    if let Some(home) = &global.avd_home {
        cfg.avd_home = Some(home.clone());
    }
    if let Some(min_sdk) = global.min_sdk {
        cfg.min_sdk = Some(min_sdk);
    }
    if let Some(timeout) = global.timeout {
        cfg.ready_timeout_secs = timeout;
    }
}

pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global
        .output
        .clone()
        .or_else(|| OutputFormat::from_str(&cfg.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

pub fn color_mode(global: &GlobalOpts, cfg: &Config) -> ColorMode {
    global
        .color
        .clone()
        .or_else(|| ColorMode::from_str(&cfg.color, true).ok())
        .unwrap_or(ColorMode::Auto)
}
