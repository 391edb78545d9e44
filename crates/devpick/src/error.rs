//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use devpick_config::ConfigError;
use devpick_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNAVAILABLE: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Bridge ───────────────────────────────────────────────────────
    #[error("adb is not available: {message}")]
    #[diagnostic(
        code(devpick::bridge_unavailable),
        help(
            "Install the Android SDK platform tools, or point devpick at adb with\n\
             --adb <path>, DEVPICK_ADB_PATH, or `adb_path` in the config file."
        )
    )]
    BridgeUnavailable { message: String },

    #[error("adb error: {message}")]
    #[diagnostic(
        code(devpick::bridge),
        help("Run `adb devices` to check that the adb server is healthy.")
    )]
    Bridge { message: String },

    #[error("Could not read the AVD catalog: {message}")]
    #[diagnostic(
        code(devpick::catalog),
        help("Check --avd-home, ANDROID_AVD_HOME, or `avd_home` in the config file.")
    )]
    Catalog { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(devpick::not_found),
        help("Run: devpick {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out after {seconds}s waiting for {what}")]
    #[diagnostic(
        code(devpick::timeout),
        help("Increase the wait with --timeout, or check that adb responds with `adb devices`.")
    )]
    Timeout { what: String, seconds: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(devpick::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(devpick::config),
        help("Run `devpick config path` to locate the file, or `devpick config init --force` to reset it.")
    )]
    Config(#[from] ConfigError),

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(code(devpick::config_exists), help("Pass --force to overwrite it."))]
    ConfigExists { path: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {message}")]
    #[diagnostic(code(devpick::internal))]
    Internal { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(devpick::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(devpick::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BridgeUnavailable { .. } => exit_code::UNAVAILABLE,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config(_) | Self::ConfigExists { .. } => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::BridgeUnavailable { message } => CliError::BridgeUnavailable { message },
            CoreError::Bridge { message } => CliError::Bridge { message },
            CoreError::DeviceQuery { serial, message } => CliError::Bridge {
                message: format!("{serial}: {message}"),
            },
            CoreError::Catalog { message } => CliError::Catalog { message },
            CoreError::Timeout { what, timeout_secs } => CliError::Timeout {
                what,
                seconds: timeout_secs,
            },
            CoreError::Validation { field, reason } => CliError::Validation { field, reason },
            e @ (CoreError::Interrupted { .. } | CoreError::ProducerPanicked { .. }) => {
                CliError::Internal {
                    message: e.to_string(),
                }
            }
            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}
