// ── Collaborator traits ──
//
// The two slow data sources and the optional per-device checks, seen
// only at their boundary. Methods return boxed futures so the traits
// stay object-safe and can be shared as `Arc<dyn ...>` across the
// background tasks that drive them.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::CoreError;
use crate::model::{CompatibilityState, DeviceType, VirtualDevice};

/// AVD metadata reported by a running emulator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvdMetadata {
    pub name: Option<String>,
    /// Data folder; absent on bridges too old to report it.
    pub path: Option<PathBuf>,
}

/// System properties used for naming and classifying a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProperties {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    /// `ro.build.characteristics`, e.g. `nosdcard,watch`.
    pub characteristics: Option<String>,
    pub api_level: Option<u32>,
}

impl DeviceProperties {
    /// Form factor implied by the build characteristics.
    pub fn device_type(&self) -> DeviceType {
        let Some(chars) = self.characteristics.as_deref() else {
            return DeviceType::Phone;
        };
        let mut tags = chars.split(',').map(str::trim);
        if tags.clone().any(|t| t == "watch") {
            DeviceType::Wear
        } else if tags.any(|t| t == "tv") {
            DeviceType::Tv
        } else {
            DeviceType::Phone
        }
    }

    /// `"<Manufacturer> <Model>"`, or whichever half is known.
    pub fn display_name(&self) -> Option<String> {
        let manufacturer = self.manufacturer.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let model = self.model.as_deref().map(str::trim).filter(|s| !s.is_empty());
        match (manufacturer, model) {
            (Some(m), Some(model)) if model.starts_with(m) => Some(model.to_owned()),
            (Some(m), Some(model)) => Some(format!("{m} {model}")),
            (None, Some(model)) => Some(model.to_owned()),
            (Some(m), None) => Some(m.to_owned()),
            (None, None) => None,
        }
    }
}

/// One device currently visible to the bridge.
pub trait DeviceHandle: Send + Sync {
    /// Cheap, synchronous label for logs (usually the serial).
    fn label(&self) -> String;

    fn serial(&self) -> BoxFuture<'_, Result<String, CoreError>>;

    fn is_emulator(&self) -> BoxFuture<'_, Result<bool, CoreError>>;

    /// `Ok(None)` when the bridge cannot provide AVD metadata.
    fn avd_metadata(&self) -> BoxFuture<'_, Result<Option<AvdMetadata>, CoreError>>;

    fn properties(&self) -> BoxFuture<'_, Result<DeviceProperties, CoreError>>;
}

/// Produces the catalog's virtual-device templates.
pub trait VirtualDeviceEnumerator: Send + Sync {
    fn virtual_devices(&self) -> BoxFuture<'_, Result<Vec<VirtualDevice>, CoreError>>;
}

/// Produces handles for every device the bridge currently sees.
pub trait ConnectedDeviceEnumerator: Send + Sync {
    fn connected_devices(&self) -> BoxFuture<'_, Result<Vec<Arc<dyn DeviceHandle>>, CoreError>>;
}

/// Optional launch-compatibility check for a connected device.
///
/// `properties` are the ones already read for the descriptor.
pub trait CompatibilityChecker: Send + Sync {
    fn check<'a>(
        &'a self,
        device: &'a dyn DeviceHandle,
        properties: &'a DeviceProperties,
    ) -> BoxFuture<'a, Result<CompatibilityState, CoreError>>;
}
