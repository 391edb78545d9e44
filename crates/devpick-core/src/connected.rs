// ── Connected-device assembly ──
//
// Turns every handle the bridge reports into a `ConnectedDescriptor`.
// Identity and properties are queried concurrently per device, then the
// compatibility check grades the fetched properties; all devices of a batch
// are assembled concurrently. Identity is mandatory, and so are properties
// for hardware since they name it: failure drops the device. Emulator
// properties and the compatibility check fall back to defaults.

use std::sync::Arc;

use futures_util::future::{join, join_all};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::cache::AsyncResultCache;
use crate::error::CoreError;
use crate::model::{BaseIcon, BridgeHandle, CompatibilityState, ConnectedDescriptor, Key};
use crate::provider::{
    AvdMetadata, CompatibilityChecker, ConnectedDeviceEnumerator, DeviceHandle, DeviceProperties,
};

/// AVD name some bridges report for locally built system images.
pub const UNKNOWN_AVD_NAME: &str = "<build>";

/// Derive the identity and display name of a connected device.
///
/// Precedence: a non-emulator or an emulator without metadata is keyed by
/// serial; otherwise the data-folder path, then the AVD name, then the
/// serial. The display name is the AVD name for emulators and the
/// manufacturer/model for hardware, falling back to the serial, which is
/// also used whenever the AVD name is the `<build>` placeholder.
pub fn derive_key_and_name(
    serial: &str,
    is_emulator: bool,
    metadata: Option<&AvdMetadata>,
    properties: &DeviceProperties,
) -> (Key, String) {
    if !is_emulator {
        let name = properties
            .display_name()
            .unwrap_or_else(|| serial.to_owned());
        return (Key::serial(serial), name);
    }

    let Some(metadata) = metadata else {
        return (Key::serial(serial), serial.to_owned());
    };

    let avd_name = metadata
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let placeholder = avd_name == Some(UNKNOWN_AVD_NAME);
    let usable_name = avd_name.filter(|_| !placeholder);

    let key = match (&metadata.path, usable_name) {
        (Some(path), _) => Key::path(path.clone()),
        (_, Some(name)) => Key::name(name),
        _ => Key::serial(serial),
    };
    let name = usable_name.unwrap_or(serial).to_owned();
    (key, name)
}

/// Build the descriptor for one handle.
pub async fn assemble(
    handle: Arc<dyn DeviceHandle>,
    checker: Option<&dyn CompatibilityChecker>,
) -> Result<ConnectedDescriptor, CoreError> {
    let identity = async {
        let serial = handle.serial().await?;
        let is_emulator = handle.is_emulator().await?;
        let metadata = if is_emulator {
            handle.avd_metadata().await?
        } else {
            None
        };
        Ok::<_, CoreError>((serial, is_emulator, metadata))
    };

    let (identity, properties) = join(identity, handle.properties()).await;
    let (serial, is_emulator, metadata) = identity?;
    let properties = match properties {
        Ok(properties) => properties,
        Err(e) if is_emulator => {
            debug!(device = %handle.label(), error = %e, "property query failed, using defaults");
            DeviceProperties::default()
        }
        Err(e) => return Err(e),
    };

    let compatibility = match checker {
        Some(checker) => checker
            .check(handle.as_ref(), &properties)
            .await
            .unwrap_or_else(|e| {
                debug!(device = %handle.label(), error = %e, "compatibility check failed, assuming ok");
                CompatibilityState::Ok
            }),
        None => CompatibilityState::Ok,
    };

    let (key, name) = derive_key_and_name(&serial, is_emulator, metadata.as_ref(), &properties);
    let device_type = properties.device_type();
    Ok(ConnectedDescriptor {
        key,
        name,
        device_type,
        icon: BaseIcon::for_device(device_type, is_emulator),
        compatibility,
        is_virtual: is_emulator,
        handle: BridgeHandle::new(handle),
    })
}

/// Assemble every handle concurrently, dropping the ones that fail.
pub async fn assemble_all(
    handles: Vec<Arc<dyn DeviceHandle>>,
    checker: Option<&dyn CompatibilityChecker>,
) -> Vec<ConnectedDescriptor> {
    let labels: Vec<String> = handles.iter().map(|h| h.label()).collect();
    let results = join_all(handles.into_iter().map(|h| assemble(h, checker))).await;

    results
        .into_iter()
        .zip(labels)
        .filter_map(|(result, label)| match result {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!(device = %label, error = %e, "dropping device that could not be identified");
                None
            }
        })
        .collect()
}

// ── Cached source ───────────────────────────────────────────────────

/// The bridge's device set, assembled in the background and cached.
pub struct ConnectedDeviceSource {
    enumerator: Arc<dyn ConnectedDeviceEnumerator>,
    checker: Option<Arc<dyn CompatibilityChecker>>,
    cache: AsyncResultCache<Vec<ConnectedDescriptor>>,
}

impl ConnectedDeviceSource {
    pub fn new(runtime: Handle, enumerator: Arc<dyn ConnectedDeviceEnumerator>) -> Self {
        Self {
            enumerator,
            checker: None,
            cache: AsyncResultCache::new("connected devices", runtime),
        }
    }

    pub fn set_checker(&mut self, checker: Option<Arc<dyn CompatibilityChecker>>) {
        self.checker = checker;
    }

    /// Latest assembled descriptors, refreshing in the background.
    pub fn poll(&self) -> Result<Option<Vec<ConnectedDescriptor>>, CoreError> {
        let enumerator = Arc::clone(&self.enumerator);
        let checker = self.checker.clone();
        self.cache.poll(move || async move {
            let handles = enumerator.connected_devices().await?;
            let descriptors = assemble_all(handles, checker.as_deref()).await;
            debug!(count = descriptors.len(), "assembled connected devices");
            Ok::<_, CoreError>(descriptors)
        })
    }
}
