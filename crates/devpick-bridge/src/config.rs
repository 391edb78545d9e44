// ── Bridge configuration ──
//
// Where to find the external tools. Built by the front end (usually from
// `devpick-config`) and handed in; the bridge never reads config files.

use std::path::PathBuf;
use std::time::Duration;

/// Locations and limits for talking to `adb` and reading the AVD catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Path to the `adb` executable (bare `adb` resolves through `PATH`).
    pub adb_path: PathBuf,
    /// Directory holding `<name>.ini` AVD pointer files.
    pub avd_home: PathBuf,
    /// SDK root, used to resolve relative system image directories.
    pub sdk_root: Option<PathBuf>,
    /// Upper bound for any single `adb` invocation.
    pub command_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            adb_path: PathBuf::from("adb"),
            avd_home: PathBuf::from(".android/avd"),
            sdk_root: None,
            command_timeout: Duration::from_secs(10),
        }
    }
}
