// ── AVD catalog ──
//
// Reads Android Virtual Device definitions straight from disk:
// `<avd_home>/<name>.ini` pointer files, each naming a data folder that
// holds `config.ini` and an optional `snapshots/` directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::error::Error;

/// Snapshot directory name the emulator uses for its quick-boot state.
pub const QUICK_BOOT_SNAPSHOT: &str = "default_boot";

const SNAPSHOT_PROTOBUF: &str = "snapshot.pb";

/// Where the system image of an AVD lives, and whether it is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SystemImage {
    Present(PathBuf),
    Missing(PathBuf),
    /// No `image.sysdir.1` entry, or a relative one with no SDK root to resolve it.
    Unknown,
}

/// A named snapshot stored under `<data folder>/snapshots/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvdSnapshot {
    pub name: String,
    pub directory: PathBuf,
}

/// One AVD as found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvdInfo {
    /// AVD name (the pointer file stem, e.g. `Pixel_7_API_34`).
    pub name: String,
    /// Absolute data folder path.
    pub data_folder: PathBuf,
    /// `avd.ini.displayname`, or the name with underscores turned into spaces.
    pub display_name: String,
    pub tag_id: Option<String>,
    pub abi: Option<String>,
    pub system_image: SystemImage,
    pub snapshots: Vec<AvdSnapshot>,
}

/// Reader for the on-disk AVD catalog.
#[derive(Debug, Clone)]
pub struct AvdCatalog {
    avd_home: PathBuf,
    sdk_root: Option<PathBuf>,
}

impl AvdCatalog {
    pub fn new(avd_home: impl Into<PathBuf>) -> Self {
        Self {
            avd_home: avd_home.into(),
            sdk_root: None,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            avd_home: config.avd_home.clone(),
            sdk_root: config.sdk_root.clone(),
        }
    }

    #[must_use]
    pub fn with_sdk_root(mut self, sdk_root: impl Into<PathBuf>) -> Self {
        self.sdk_root = Some(sdk_root.into());
        self
    }

    pub fn avd_home(&self) -> &Path {
        &self.avd_home
    }

    /// Scan the catalog on the blocking pool.
    pub async fn list(&self) -> Result<Vec<AvdInfo>, Error> {
        let catalog = self.clone();
        tokio::task::spawn_blocking(move || catalog.scan())
            .await
            .map_err(|e| Error::ScanAborted(e.to_string()))?
    }

    /// Synchronous scan. AVDs with a missing data folder are skipped.
    pub fn scan(&self) -> Result<Vec<AvdInfo>, Error> {
        if !self.avd_home.is_dir() {
            return Err(Error::AvdHomeMissing {
                path: self.avd_home.display().to_string(),
            });
        }

        let mut pointers: Vec<PathBuf> = fs::read_dir(&self.avd_home)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "ini") && p.is_file())
            .collect();
        pointers.sort();

        let mut avds = Vec::with_capacity(pointers.len());
        for pointer in pointers {
            match self.read_avd(&pointer) {
                Ok(Some(avd)) => avds.push(avd),
                Ok(None) => {}
                Err(e) => warn!(file = %pointer.display(), error = %e, "skipping unreadable AVD"),
            }
        }
        debug!(count = avds.len(), home = %self.avd_home.display(), "scanned AVD catalog");
        Ok(avds)
    }

    fn read_avd(&self, pointer: &Path) -> Result<Option<AvdInfo>, Error> {
        let Some(name) = pointer.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            return Ok(None);
        };
        let entries = parse_ini(&fs::read_to_string(pointer)?);

        let Some(data_folder) = self.resolve_data_folder(&entries) else {
            warn!(avd = %name, "AVD data folder is missing, skipping");
            return Ok(None);
        };

        let config_path = data_folder.join("config.ini");
        let config = if config_path.is_file() {
            parse_ini(&fs::read_to_string(&config_path)?)
        } else {
            HashMap::new()
        };

        let display_name = config
            .get("avd.ini.displayname")
            .filter(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| name.replace('_', " "));

        Ok(Some(AvdInfo {
            display_name,
            tag_id: config.get("tag.id").cloned(),
            abi: config.get("abi.type").cloned(),
            system_image: self.resolve_system_image(config.get("image.sysdir.1")),
            snapshots: read_snapshots(&data_folder),
            data_folder,
            name,
        }))
    }

    fn resolve_data_folder(&self, entries: &HashMap<String, String>) -> Option<PathBuf> {
        let absolute = entries.get("path").map(PathBuf::from);
        if let Some(path) = absolute.filter(|p| p.is_dir()) {
            return Some(path);
        }
        // `path.rel` is relative to the Android user home (the parent of avd_home).
        let relative = entries.get("path.rel")?;
        let base = self.avd_home.parent()?;
        let path = base.join(relative);
        path.is_dir().then_some(path)
    }

    fn resolve_system_image(&self, sysdir: Option<&String>) -> SystemImage {
        let Some(sysdir) = sysdir else {
            return SystemImage::Unknown;
        };
        let raw = PathBuf::from(sysdir);
        let resolved = if raw.is_absolute() {
            raw
        } else if let Some(root) = &self.sdk_root {
            root.join(raw)
        } else {
            return SystemImage::Unknown;
        };
        if resolved.is_dir() {
            SystemImage::Present(resolved)
        } else {
            SystemImage::Missing(resolved)
        }
    }
}

fn read_snapshots(data_folder: &Path) -> Vec<AvdSnapshot> {
    let Ok(entries) = fs::read_dir(data_folder.join("snapshots")) else {
        return Vec::new();
    };
    let mut snapshots: Vec<AvdSnapshot> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.join(SNAPSHOT_PROTOBUF).is_file())
        .filter_map(|directory| {
            let name = directory.file_name()?.to_string_lossy().into_owned();
            (name != QUICK_BOOT_SNAPSHOT).then_some(AvdSnapshot { name, directory })
        })
        .collect();
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));
    snapshots
}

/// Minimal `key=value` parser for AVD ini files.
pub fn parse_ini(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with(';'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
        .collect()
}
