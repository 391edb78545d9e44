//! Clap derive structures for the `devpick` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Kept
//! free of crate-internal imports so `build.rs` can include it directly.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// devpick -- find the devices an app can be deployed to
#[derive(Debug, Parser)]
#[command(
    name = "devpick",
    version,
    about = "Discover Android deployment targets: running devices, emulators and AVDs",
    long_about = "Lists every device an app can be deployed to: hardware and running\n\
        emulators reported by adb, merged with the AVDs found on disk, together\n\
        with the ways each one can be booted.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, env = "DEVPICK_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the adb executable
    #[arg(long, global = true, value_name = "PATH")]
    pub adb: Option<PathBuf>,

    /// Directory holding the AVD `.ini` files
    #[arg(long, global = true, value_name = "DIR")]
    pub avd_home: Option<PathBuf>,

    /// Flag devices below this API level as incompatible
    #[arg(long, global = true, value_name = "LEVEL")]
    pub min_sdk: Option<u32>,

    /// Output format (defaults to the config file's `output`)
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Seconds to wait for the first device list
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List deployable devices
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show the ways a device can be booted or deployed to
    #[command(alias = "t")]
    Targets(TargetsArgs),

    /// Keep the device list on screen, reprinting when it changes
    Watch(WatchArgs),

    /// Manage devpick configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Device selection ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Args)]
pub struct DeviceFilter {
    /// Only devices that are running right now
    #[arg(long, conflicts_with = "virtual_only")]
    pub connected_only: bool,

    /// Only emulators and AVDs
    #[arg(long)]
    pub virtual_only: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: DeviceFilter,
}

#[derive(Debug, Args)]
pub struct TargetsArgs {
    /// Device key, AVD name, serial, or display name
    pub device: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub filter: DeviceFilter,

    /// Refresh interval in milliseconds (defaults to `poll_interval_ms`)
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
