// ── Boot targets ──
//
// How to bring a device to the running state, or a reference to an
// instance that is already running. Each target carries its device's key.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::key::Key;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Target {
    /// Boot from scratch, ignoring any saved state.
    ColdBoot { device: Key },
    /// Boot from the quick-boot state (cold boot if none exists).
    QuickBoot { device: Key },
    /// Boot from a named snapshot, identified by its directory.
    BootWithSnapshot { device: Key, snapshot: PathBuf },
    /// Deploy to the instance that is already running.
    RunningDevice { device: Key },
}

impl Target {
    pub fn device_key(&self) -> &Key {
        match self {
            Self::ColdBoot { device }
            | Self::QuickBoot { device }
            | Self::BootWithSnapshot { device, .. }
            | Self::RunningDevice { device } => device,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColdBoot { .. } => f.write_str("Cold Boot"),
            Self::QuickBoot { .. } => f.write_str("Quick Boot"),
            Self::BootWithSnapshot { snapshot, .. } => {
                let name = snapshot
                    .file_name()
                    .map_or_else(|| snapshot.display().to_string(), |n| n.to_string_lossy().into_owned());
                write!(f, "Boot from snapshot '{name}'")
            }
            Self::RunningDevice { .. } => f.write_str("Running Device"),
        }
    }
}
