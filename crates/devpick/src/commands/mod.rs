//! Command dispatch and the wiring shared by the device commands.

pub mod config_cmd;
pub mod list;
pub mod targets;
pub mod watch;

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::debug;

use devpick_bridge::{AdbClient, AvdCatalog};
use devpick_config::ProcessEnv;
use devpick_core::{
    AdbDeviceEnumerator, AvdCatalogEnumerator, CompatibilityState, CoreError, Device,
    DeviceListGetter, DeviceType, DiscoveryConfig, Key, MinSdkCompatibility,
};

use crate::cli::{Command, DeviceFilter, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;

/// Dispatch a device command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    match cmd {
        Command::List(args) => list::handle(args, &cfg, global).await,
        Command::Targets(args) => targets::handle(args, &cfg, global).await,
        Command::Watch(args) => watch::handle(args, &cfg, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "config and completions are handled before dispatch".into(),
        }),
    }
}

// ── Discovery wiring ────────────────────────────────────────────────

/// A ready-to-poll getter plus the timing it should be polled with.
pub struct Discovery {
    pub getter: DeviceListGetter,
    pub timing: DiscoveryConfig,
}

/// Build the getter over adb and the AVD catalog.
///
/// Runs `adb version` first so a missing executable is reported at once
/// instead of as a timeout.
pub async fn discovery(cfg: &Config) -> Result<Discovery, CliError> {
    let bridge = devpick_config::to_bridge_config(cfg, &ProcessEnv);
    debug!(adb = %bridge.adb_path.display(), avd_home = %bridge.avd_home.display(), "bridge configuration");

    let client = Arc::new(AdbClient::new(bridge.clone()));
    let version = client.version().await.map_err(CoreError::from)?;
    debug!(%version, "adb is available");

    let catalog = AvdCatalog::from_config(&bridge);
    let mut getter = DeviceListGetter::new(
        Handle::current(),
        Arc::new(AvdCatalogEnumerator::new(catalog)),
        Arc::new(AdbDeviceEnumerator::new(client)),
    );
    if let Some(min_sdk) = cfg.min_sdk {
        getter = getter.with_compatibility_checker(Arc::new(MinSdkCompatibility::new(min_sdk)));
    }

    Ok(Discovery {
        getter,
        timing: devpick_config::to_discovery_config(cfg),
    })
}

pub fn apply_filter(devices: Vec<Device>, filter: &DeviceFilter) -> Vec<Device> {
    devices
        .into_iter()
        .filter(|d| !filter.connected_only || d.is_connected())
        .filter(|d| !filter.virtual_only || d.is_virtual())
        .collect()
}

// ── Serializable device view ────────────────────────────────────────

/// What the CLI prints for one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceView {
    pub key: Key,
    pub name: String,
    pub kind: &'static str,
    pub device_type: DeviceType,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_for_secs: Option<u64>,
    pub compatibility: CompatibilityState,
    pub snapshots: Vec<String>,
    pub targets: Vec<String>,
    pub default_target: String,
}

impl DeviceView {
    pub fn new(device: &Device, now: Instant) -> Self {
        Self {
            key: device.key().clone(),
            name: device.name().to_owned(),
            kind: if device.is_virtual() { "virtual" } else { "physical" },
            device_type: device.device_type(),
            connected: device.is_connected(),
            connected_for_secs: device
                .connection_time()
                .map(|since| now.saturating_duration_since(since).as_secs()),
            compatibility: device.compatibility().clone(),
            snapshots: device.snapshots().iter().map(|s| s.name.clone()).collect(),
            targets: device.targets().iter().map(ToString::to_string).collect(),
            default_target: device.default_target().to_string(),
        }
    }

    /// Everything but the elapsed time, for spotting real changes.
    pub fn same_state(&self, other: &Self) -> bool {
        Self {
            connected_for_secs: None,
            ..self.clone()
        } == Self {
            connected_for_secs: None,
            ..other.clone()
        }
    }
}

pub fn views(devices: &[Device]) -> Vec<DeviceView> {
    let now = Instant::now();
    devices.iter().map(|d| DeviceView::new(d, now)).collect()
}

/// `1h 2m 3s` style, or `-` for devices that are not running.
pub fn format_uptime(secs: Option<u64>) -> String {
    secs.map_or_else(
        || "-".into(),
        |s| humantime::format_duration(std::time::Duration::from_secs(s)).to_string(),
    )
}
