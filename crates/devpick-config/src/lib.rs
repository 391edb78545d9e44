//! Configuration for devpick.
//!
//! A flat TOML file, overridden by `DEVPICK_`-prefixed environment
//! variables, translated into `devpick_bridge::BridgeConfig` and
//! `devpick_core::DiscoveryConfig`. Android SDK locations fall back to
//! the usual `ANDROID_*` variables when the file leaves them unset.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use devpick_bridge::BridgeConfig;
use devpick_core::DiscoveryConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Output formats the CLI understands.
pub const OUTPUT_FORMATS: &[&str] = &["table", "json", "json-compact", "yaml", "plain"];

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// `adb` executable. Unset: `$ANDROID_HOME/platform-tools/adb`, else `adb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adb_path: Option<PathBuf>,

    /// AVD home. Unset: `$ANDROID_AVD_HOME`, `$ANDROID_USER_HOME/avd`, `~/.android/avd`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avd_home: Option<PathBuf>,

    /// SDK root. Unset: `$ANDROID_HOME`, else `$ANDROID_SDK_ROOT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_root: Option<PathBuf>,

    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,

    /// Devices below this API level are flagged incompatible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sdk: Option<u32>,

    /// `tracing` filter used when neither `RUST_LOG` nor `-v` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adb_path: None,
            avd_home: None,
            sdk_root: None,
            command_timeout_secs: default_command_timeout(),
            poll_interval_ms: default_poll_interval(),
            ready_timeout_secs: default_ready_timeout(),
            min_sdk: None,
            log_level: None,
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_command_timeout() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    250
}
fn default_ready_timeout() -> u64 {
    30
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

impl Config {
    /// Reject values that would make discovery hang or spin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("command_timeout_secs", self.command_timeout_secs),
            ("poll_interval_ms", self.poll_interval_ms),
            ("ready_timeout_secs", self.ready_timeout_secs),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }
        if !OUTPUT_FORMATS.contains(&self.output.as_str()) {
            return Err(ConfigError::Validation {
                field: "output".into(),
                reason: format!(
                    "expected one of {}, got '{}'",
                    OUTPUT_FORMATS.join(", "),
                    self.output
                ),
            });
        }
        if !matches!(self.color.as_str(), "auto" | "always" | "never") {
            return Err(ConfigError::Validation {
                field: "color".into(),
                reason: format!("expected auto, always or never, got '{}'", self.color),
            });
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "devpick", "devpick").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    home_dir().join(".config").join("devpick")
}

fn home_dir() -> PathBuf {
    BaseDirs::new().map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf())
}

// ── Config loading ──────────────────────────────────────────────────

/// Load defaults, then `path` (if it exists), then `DEVPICK_*` variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DEVPICK_"))
        .extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parent dirs.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Environment lookup, injectable so resolution can be tested without
/// touching the process environment.
pub trait EnvLookup {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

impl<F: Fn(&str) -> Option<String>> EnvLookup for F {
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

pub fn resolve_avd_home(cfg: &Config, env: &impl EnvLookup) -> PathBuf {
    if let Some(dir) = &cfg.avd_home {
        return dir.clone();
    }
    if let Some(dir) = env.var("ANDROID_AVD_HOME") {
        return PathBuf::from(dir);
    }
    if let Some(dir) = env.var("ANDROID_USER_HOME") {
        return PathBuf::from(dir).join("avd");
    }
    home_dir().join(".android").join("avd")
}

pub fn resolve_sdk_root(cfg: &Config, env: &impl EnvLookup) -> Option<PathBuf> {
    cfg.sdk_root.clone().or_else(|| {
        env.var("ANDROID_HOME")
            .or_else(|| env.var("ANDROID_SDK_ROOT"))
            .map(PathBuf::from)
    })
}

pub fn resolve_adb_path(cfg: &Config, env: &impl EnvLookup) -> PathBuf {
    if let Some(path) = &cfg.adb_path {
        return path.clone();
    }
    resolve_sdk_root(cfg, env).map_or_else(
        || PathBuf::from("adb"),
        |root| root.join("platform-tools").join("adb"),
    )
}

/// Build the bridge configuration, filling SDK locations from `env`.
pub fn to_bridge_config(cfg: &Config, env: &impl EnvLookup) -> BridgeConfig {
    BridgeConfig {
        adb_path: resolve_adb_path(cfg, env),
        avd_home: resolve_avd_home(cfg, env),
        sdk_root: resolve_sdk_root(cfg, env),
        command_timeout: Duration::from_secs(cfg.command_timeout_secs),
    }
}

pub fn to_discovery_config(cfg: &Config) -> DiscoveryConfig {
    DiscoveryConfig {
        poll_interval: Duration::from_millis(cfg.poll_interval_ms),
        ready_timeout: Duration::from_secs(cfg.ready_timeout_secs),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.command_timeout_secs, 10);
        assert_eq!(cfg.poll_interval_ms, 250);
        assert_eq!(cfg.output, "table");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "avd_home = \"/data/avd\"\nready_timeout_secs = 5\nmin_sdk = 26\noutput = \"json\"\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.avd_home, Some(PathBuf::from("/data/avd")));
        assert_eq!(cfg.ready_timeout_secs, 5);
        assert_eq!(cfg.min_sdk, Some(26));
        assert_eq!(cfg.output, "json");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "command_timeout_secs = 0\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "command_timeout_secs"));
    }

    #[test]
    fn unknown_output_is_rejected() {
        let cfg = Config {
            output: "xml".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            adb_path: Some("/opt/sdk/platform-tools/adb".into()),
            log_level: Some("debug".into()),
            ..Config::default()
        };

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn avd_home_precedence() {
        let cfg = Config::default();
        assert_eq!(
            resolve_avd_home(&cfg, &env(&[("ANDROID_AVD_HOME", "/a"), ("ANDROID_USER_HOME", "/u")])),
            PathBuf::from("/a")
        );
        assert_eq!(
            resolve_avd_home(&cfg, &env(&[("ANDROID_USER_HOME", "/u")])),
            PathBuf::from("/u/avd")
        );
        assert!(resolve_avd_home(&cfg, &env(&[])).ends_with(".android/avd"));

        let pinned = Config {
            avd_home: Some("/pinned".into()),
            ..Config::default()
        };
        assert_eq!(
            resolve_avd_home(&pinned, &env(&[("ANDROID_AVD_HOME", "/a")])),
            PathBuf::from("/pinned")
        );
    }

    #[test]
    fn adb_path_prefers_sdk_platform_tools() {
        let cfg = Config::default();
        assert_eq!(
            resolve_adb_path(&cfg, &env(&[("ANDROID_HOME", "/sdk")])),
            PathBuf::from("/sdk/platform-tools/adb")
        );
        assert_eq!(resolve_adb_path(&cfg, &env(&[])), PathBuf::from("adb"));
    }

    #[test]
    fn translates_into_runtime_configs() {
        let cfg = Config {
            command_timeout_secs: 3,
            poll_interval_ms: 100,
            ready_timeout_secs: 7,
            ..Config::default()
        };
        let bridge = to_bridge_config(&cfg, &env(&[]));
        assert_eq!(bridge.command_timeout, Duration::from_secs(3));

        let discovery = to_discovery_config(&cfg);
        assert_eq!(discovery.poll_interval, Duration::from_millis(100));
        assert_eq!(discovery.ready_timeout, Duration::from_secs(7));
    }
}
