// ── Device domain types ──
//
// A device is a tagged union over virtual and physical variants sharing
// one capability set (key, icon, type, compatibility, connection state,
// name, snapshots, targets, bridge handle). Instances are immutable and
// rebuilt on every reconciliation pass; builders validate mandatory
// fields up front.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::icon::{BaseIcon, DecoratedIcon};
use super::key::Key;
use super::snapshot::Snapshot;
use super::target::Target;
use crate::error::CoreError;
use crate::provider::DeviceHandle;

/// Form factor.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum DeviceType {
    #[default]
    Phone,
    Wear,
    #[strum(to_string = "TV")]
    Tv,
}

/// Whether the app under deployment can run on a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CompatibilityState {
    #[default]
    Ok,
    Warning {
        reason: String,
    },
    Error {
        reason: String,
    },
}

impl CompatibilityState {
    pub fn warning(reason: impl Into<String>) -> Self {
        Self::Warning {
            reason: reason.into(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::Warning { reason } | Self::Error { reason } => Some(reason),
        }
    }
}

impl fmt::Display for CompatibilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::Warning { reason } => write!(f, "Warning: {reason}"),
            Self::Error { reason } => write!(f, "Error: {reason}"),
        }
    }
}

// ── BridgeHandle ────────────────────────────────────────────────────

/// Shared reference to the bridge's live handle for a connected device.
///
/// Two handles are equal only if they point at the same bridge object.
#[derive(Clone)]
pub struct BridgeHandle(Arc<dyn DeviceHandle>);

impl BridgeHandle {
    pub fn new(handle: Arc<dyn DeviceHandle>) -> Self {
        Self(handle)
    }

    pub fn get(&self) -> &Arc<dyn DeviceHandle> {
        &self.0
    }
}

impl PartialEq for BridgeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BridgeHandle").field(&self.0.label()).finish()
    }
}

// ── VirtualDevice ───────────────────────────────────────────────────

/// An AVD, either a catalog template or a running emulator instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualDevice {
    key: Key,
    /// Secondary identity used to match bridges that only report AVD names.
    name_key: Option<Key>,
    name: String,
    device_type: DeviceType,
    icon: DecoratedIcon,
    compatibility: CompatibilityState,
    connected: bool,
    #[serde(skip)]
    connection_time: Option<Instant>,
    snapshots: Vec<Snapshot>,
    #[serde(skip)]
    handle: Option<BridgeHandle>,
}

impl VirtualDevice {
    pub fn builder() -> VirtualDeviceBuilder {
        VirtualDeviceBuilder::default()
    }

    /// Builder pre-populated with this device's fields.
    pub fn to_builder(&self) -> VirtualDeviceBuilder {
        VirtualDeviceBuilder {
            key: Some(self.key.clone()),
            name_key: self.name_key.clone(),
            name: Some(self.name.clone()),
            device_type: self.device_type,
            icon: Some(self.icon),
            compatibility: self.compatibility.clone(),
            connected: self.connected,
            connection_time: self.connection_time,
            snapshots: self.snapshots.clone(),
            handle: self.handle.clone(),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn name_key(&self) -> Option<&Key> {
        self.name_key.as_ref()
    }

    /// Whether `key` names this device, by primary or secondary identity.
    pub fn matches(&self, key: &Key) -> bool {
        self.key == *key || self.name_key.as_ref() == Some(key)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    pub fn icon(&self) -> DecoratedIcon {
        self.icon
    }

    pub fn compatibility(&self) -> &CompatibilityState {
        &self.compatibility
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn connection_time(&self) -> Option<Instant> {
        self.connection_time
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn handle(&self) -> Option<&BridgeHandle> {
        self.handle.as_ref()
    }

    /// Legal boot actions right now.
    ///
    /// A running instance can only be deployed to. A stopped AVD without
    /// snapshots offers quick boot alone; with snapshots it offers cold
    /// boot, quick boot, and one target per snapshot.
    pub fn targets(&self) -> Vec<Target> {
        let device = self.key.clone();
        if self.connected {
            return vec![Target::RunningDevice { device }];
        }
        if self.snapshots.is_empty() {
            return vec![Target::QuickBoot { device }];
        }
        let mut targets = Vec::with_capacity(self.snapshots.len() + 2);
        targets.push(Target::ColdBoot {
            device: device.clone(),
        });
        targets.push(Target::QuickBoot {
            device: device.clone(),
        });
        targets.extend(self.snapshots.iter().map(|s| Target::BootWithSnapshot {
            device: device.clone(),
            snapshot: s.directory.clone(),
        }));
        targets
    }

    pub fn default_target(&self) -> Target {
        let device = self.key.clone();
        if self.connected {
            Target::RunningDevice { device }
        } else {
            Target::QuickBoot { device }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VirtualDeviceBuilder {
    key: Option<Key>,
    name_key: Option<Key>,
    name: Option<String>,
    device_type: DeviceType,
    icon: Option<DecoratedIcon>,
    compatibility: CompatibilityState,
    connected: bool,
    connection_time: Option<Instant>,
    snapshots: Vec<Snapshot>,
    handle: Option<BridgeHandle>,
}

impl VirtualDeviceBuilder {
    #[must_use]
    pub fn key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn name_key(mut self, key: Option<Key>) -> Self {
        self.name_key = key;
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: DecoratedIcon) -> Self {
        self.icon = Some(icon);
        self
    }

    #[must_use]
    pub fn compatibility(mut self, compatibility: CompatibilityState) -> Self {
        self.compatibility = compatibility;
        self
    }

    /// Mark the device connected through `handle`, first seen at `since`.
    #[must_use]
    pub fn connected(mut self, handle: BridgeHandle, since: Instant) -> Self {
        self.connected = true;
        self.handle = Some(handle);
        self.connection_time = Some(since);
        self
    }

    /// Clear any connection state, leaving a template.
    #[must_use]
    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self.handle = None;
        self.connection_time = None;
        self
    }

    #[must_use]
    pub fn snapshots(mut self, snapshots: Vec<Snapshot>) -> Self {
        self.snapshots = snapshots;
        self
    }

    pub fn build(self) -> Result<VirtualDevice, CoreError> {
        let key = self.key.ok_or_else(|| CoreError::missing("key"))?;
        let name = validate_name(self.name)?;
        let mut snapshots = self.snapshots;
        snapshots.sort();
        Ok(VirtualDevice {
            icon: self
                .icon
                .unwrap_or_else(|| DecoratedIcon::plain(BaseIcon::for_device(self.device_type, true))),
            key,
            name_key: self.name_key,
            name,
            device_type: self.device_type,
            compatibility: self.compatibility,
            connected: self.connected,
            connection_time: self.connection_time,
            snapshots,
            handle: self.handle,
        })
    }
}

// ── PhysicalDevice ──────────────────────────────────────────────────

/// A hardware device attached to the bridge. Always connected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalDevice {
    key: Key,
    name: String,
    device_type: DeviceType,
    icon: DecoratedIcon,
    compatibility: CompatibilityState,
    #[serde(skip)]
    connection_time: Instant,
    #[serde(skip)]
    handle: BridgeHandle,
}

impl PhysicalDevice {
    pub fn builder() -> PhysicalDeviceBuilder {
        PhysicalDeviceBuilder::default()
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    pub fn icon(&self) -> DecoratedIcon {
        self.icon
    }

    pub fn compatibility(&self) -> &CompatibilityState {
        &self.compatibility
    }

    pub fn connection_time(&self) -> Instant {
        self.connection_time
    }

    pub fn handle(&self) -> &BridgeHandle {
        &self.handle
    }

    pub fn targets(&self) -> Vec<Target> {
        vec![self.default_target()]
    }

    pub fn default_target(&self) -> Target {
        Target::RunningDevice {
            device: self.key.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhysicalDeviceBuilder {
    key: Option<Key>,
    name: Option<String>,
    device_type: DeviceType,
    icon: Option<DecoratedIcon>,
    compatibility: CompatibilityState,
    connection_time: Option<Instant>,
    handle: Option<BridgeHandle>,
}

impl PhysicalDeviceBuilder {
    #[must_use]
    pub fn key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: DecoratedIcon) -> Self {
        self.icon = Some(icon);
        self
    }

    #[must_use]
    pub fn compatibility(mut self, compatibility: CompatibilityState) -> Self {
        self.compatibility = compatibility;
        self
    }

    #[must_use]
    pub fn connected(mut self, handle: BridgeHandle, since: Instant) -> Self {
        self.handle = Some(handle);
        self.connection_time = Some(since);
        self
    }

    pub fn build(self) -> Result<PhysicalDevice, CoreError> {
        let key = self.key.ok_or_else(|| CoreError::missing("key"))?;
        let name = validate_name(self.name)?;
        let handle = self.handle.ok_or_else(|| CoreError::missing("handle"))?;
        let connection_time = self
            .connection_time
            .ok_or_else(|| CoreError::missing("connection_time"))?;
        Ok(PhysicalDevice {
            icon: self
                .icon
                .unwrap_or_else(|| DecoratedIcon::plain(BaseIcon::for_device(self.device_type, false))),
            key,
            name,
            device_type: self.device_type,
            compatibility: self.compatibility,
            connection_time,
            handle,
        })
    }
}

// ── ConnectedDescriptor ─────────────────────────────────────────────

/// Raw merge input assembled from one bridge handle.
///
/// Lives for a single reconciliation pass; never handed to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectedDescriptor {
    pub key: Key,
    pub name: String,
    pub device_type: DeviceType,
    pub icon: BaseIcon,
    pub compatibility: CompatibilityState,
    pub is_virtual: bool,
    pub handle: BridgeHandle,
}

impl ConnectedDescriptor {
    pub fn is_physical(&self) -> bool {
        !self.is_virtual
    }
}

// ── Device ──────────────────────────────────────────────────────────

/// A deployable device as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Device {
    Virtual(VirtualDevice),
    Physical(PhysicalDevice),
}

impl Device {
    pub fn key(&self) -> &Key {
        match self {
            Self::Virtual(d) => d.key(),
            Self::Physical(d) => d.key(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Virtual(d) => d.name(),
            Self::Physical(d) => d.name(),
        }
    }

    pub fn device_type(&self) -> DeviceType {
        match self {
            Self::Virtual(d) => d.device_type(),
            Self::Physical(d) => d.device_type(),
        }
    }

    pub fn icon(&self) -> DecoratedIcon {
        match self {
            Self::Virtual(d) => d.icon(),
            Self::Physical(d) => d.icon(),
        }
    }

    pub fn compatibility(&self) -> &CompatibilityState {
        match self {
            Self::Virtual(d) => d.compatibility(),
            Self::Physical(d) => d.compatibility(),
        }
    }

    pub fn is_connected(&self) -> bool {
        match self {
            Self::Virtual(d) => d.is_connected(),
            Self::Physical(_) => true,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }

    pub fn connection_time(&self) -> Option<Instant> {
        match self {
            Self::Virtual(d) => d.connection_time(),
            Self::Physical(d) => Some(d.connection_time()),
        }
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        match self {
            Self::Virtual(d) => d.snapshots(),
            Self::Physical(_) => &[],
        }
    }

    pub fn handle(&self) -> Option<&BridgeHandle> {
        match self {
            Self::Virtual(d) => d.handle(),
            Self::Physical(d) => Some(d.handle()),
        }
    }

    pub fn targets(&self) -> Vec<Target> {
        match self {
            Self::Virtual(d) => d.targets(),
            Self::Physical(d) => d.targets(),
        }
    }

    pub fn default_target(&self) -> Target {
        match self {
            Self::Virtual(d) => d.default_target(),
            Self::Physical(d) => d.default_target(),
        }
    }

    /// Whether `query` names this device by key, secondary key, or display name.
    pub fn answers_to(&self, query: &str) -> bool {
        if self.key().to_string() == query || self.name() == query {
            return true;
        }
        match self {
            Self::Virtual(d) => d.name_key().is_some_and(|k| k.to_string() == query),
            Self::Physical(_) => false,
        }
    }
}

impl From<VirtualDevice> for Device {
    fn from(d: VirtualDevice) -> Self {
        Self::Virtual(d)
    }
}

impl From<PhysicalDevice> for Device {
    fn from(d: PhysicalDevice) -> Self {
        Self::Physical(d)
    }
}

/// Find a device by key.
pub fn find_device<'a>(devices: &'a [Device], key: &Key) -> Option<&'a Device> {
    devices.iter().find(|d| d.key() == key)
}

fn validate_name(name: Option<String>) -> Result<String, CoreError> {
    let name = name.ok_or_else(|| CoreError::missing("name"))?;
    if name.trim().is_empty() {
        return Err(CoreError::Validation {
            field: "name".into(),
            reason: "must not be blank".into(),
        });
    }
    Ok(name)
}
