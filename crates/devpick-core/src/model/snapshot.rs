use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A persisted full-VM state a virtual device can boot from.
///
/// Field order drives the derived ordering: by name, then directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    /// Snapshot directory; also the snapshot's identity.
    pub directory: PathBuf,
}

impl Snapshot {
    pub fn new(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
        }
    }
}
