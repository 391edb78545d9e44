// ── Device identity ──
//
// Three identity schemes with distinct provenance. A catalog data-folder
// path is the strongest identity for virtual devices; the AVD name is a
// back-compat fallback for bridges that cannot report the path; the
// connection serial identifies physical devices and anything else.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identity of a deployable device.
///
/// Compared by value only. There is no ordering across variants; sort by
/// the `Display` string when a stable presentation order is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Key {
    /// AVD data folder as known to the catalog.
    VirtualDevicePath(PathBuf),
    /// AVD name as reported by the bridge.
    VirtualDeviceName(String),
    /// Bridge connection serial.
    SerialNumber(String),
}

impl Key {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::VirtualDevicePath(path.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::VirtualDeviceName(name.into())
    }

    pub fn serial(serial: impl Into<String>) -> Self {
        Self::SerialNumber(serial.into())
    }

    /// Short label for the identity scheme.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VirtualDevicePath(_) => "path",
            Self::VirtualDeviceName(_) => "name",
            Self::SerialNumber(_) => "serial",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VirtualDevicePath(p) => write!(f, "{}", p.display()),
            Self::VirtualDeviceName(n) => write!(f, "{n}"),
            Self::SerialNumber(s) => write!(f, "{s}"),
        }
    }
}
