// ── Collaborators over devpick-bridge ──
//
// Implements the provider traits on top of the on-disk AVD catalog and
// the `adb` client, plus a minimum-API compatibility checker.

use std::sync::Arc;

use devpick_bridge::{AdbClient, AvdCatalog, AvdInfo, SystemImage, is_emulator_serial};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join, join4};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{CompatibilityState, DeviceType, Key, Snapshot, VirtualDevice};
use crate::provider::{
    AvdMetadata, CompatibilityChecker, ConnectedDeviceEnumerator, DeviceHandle, DeviceProperties,
    VirtualDeviceEnumerator,
};

// ── AVD catalog ─────────────────────────────────────────────────────

/// Form factor from an AVD's `tag.id`.
pub fn device_type_for_tag(tag: Option<&str>) -> DeviceType {
    match tag.map(str::trim) {
        Some("android-wear" | "wear") => DeviceType::Wear,
        Some("android-tv" | "google-tv") => DeviceType::Tv,
        _ => DeviceType::Phone,
    }
}

/// Build the template for one catalog entry.
pub fn template_from_avd(info: &AvdInfo) -> Result<VirtualDevice, CoreError> {
    let compatibility = match &info.system_image {
        SystemImage::Missing(path) => {
            CompatibilityState::error(format!("Missing system image {}", path.display()))
        }
        SystemImage::Present(_) | SystemImage::Unknown => CompatibilityState::Ok,
    };
    let snapshots = info
        .snapshots
        .iter()
        .map(|s| Snapshot::new(s.directory.clone(), s.name.clone()))
        .collect();

    VirtualDevice::builder()
        .key(Key::path(info.data_folder.clone()))
        .name_key(Some(Key::name(info.name.clone())))
        .name(info.display_name.clone())
        .device_type(device_type_for_tag(info.tag_id.as_deref()))
        .compatibility(compatibility)
        .snapshots(snapshots)
        .build()
}

/// Templates read from the AVD home directory.
pub struct AvdCatalogEnumerator {
    catalog: AvdCatalog,
}

impl AvdCatalogEnumerator {
    pub fn new(catalog: AvdCatalog) -> Self {
        Self { catalog }
    }
}

impl VirtualDeviceEnumerator for AvdCatalogEnumerator {
    fn virtual_devices(&self) -> BoxFuture<'_, Result<Vec<VirtualDevice>, CoreError>> {
        async move {
            let avds = match self.catalog.list().await {
                Ok(avds) => avds,
                // No AVD home simply means no AVDs have been created yet.
                Err(devpick_bridge::Error::AvdHomeMissing { path }) => {
                    debug!(%path, "AVD home does not exist");
                    return Ok(Vec::new());
                }
                Err(e) => return Err(e.into()),
            };
            Ok(avds
                .iter()
                .filter_map(|info| match template_from_avd(info) {
                    Ok(template) => Some(template),
                    Err(e) => {
                        warn!(avd = %info.name, error = %e, "skipping invalid AVD");
                        None
                    }
                })
                .collect())
        }
        .boxed()
    }
}

// ── adb ─────────────────────────────────────────────────────────────

/// Every online device `adb` reports.
pub struct AdbDeviceEnumerator {
    client: Arc<AdbClient>,
}

impl AdbDeviceEnumerator {
    pub fn new(client: Arc<AdbClient>) -> Self {
        Self { client }
    }
}

impl ConnectedDeviceEnumerator for AdbDeviceEnumerator {
    fn connected_devices(&self) -> BoxFuture<'_, Result<Vec<Arc<dyn DeviceHandle>>, CoreError>> {
        async move {
            let devices = self.client.devices().await?;
            Ok(devices
                .into_iter()
                .map(|d| {
                    Arc::new(AdbDeviceHandle::new(Arc::clone(&self.client), d.serial))
                        as Arc<dyn DeviceHandle>
                })
                .collect())
        }
        .boxed()
    }
}

/// One `adb` serial.
#[derive(Debug)]
pub struct AdbDeviceHandle {
    client: Arc<AdbClient>,
    serial: String,
}

impl AdbDeviceHandle {
    pub fn new(client: Arc<AdbClient>, serial: String) -> Self {
        Self { client, serial }
    }

    fn query_error(&self, e: &devpick_bridge::Error) -> CoreError {
        CoreError::DeviceQuery {
            serial: self.serial.clone(),
            message: e.to_string(),
        }
    }
}

impl DeviceHandle for AdbDeviceHandle {
    fn label(&self) -> String {
        self.serial.clone()
    }

    fn serial(&self) -> BoxFuture<'_, Result<String, CoreError>> {
        futures_util::future::ready(Ok(self.serial.clone())).boxed()
    }

    fn is_emulator(&self) -> BoxFuture<'_, Result<bool, CoreError>> {
        futures_util::future::ready(Ok(is_emulator_serial(&self.serial))).boxed()
    }

    fn avd_metadata(&self) -> BoxFuture<'_, Result<Option<AvdMetadata>, CoreError>> {
        async move {
            if !is_emulator_serial(&self.serial) {
                return Ok(None);
            }
            let (name, path) = join(
                self.client.avd_name(&self.serial),
                self.client.avd_path(&self.serial),
            )
            .await;

            let name = match name {
                Ok(name) => name,
                // The console answered with an error: no metadata, not a broken device.
                Err(e @ devpick_bridge::Error::CommandFailed { .. }) => {
                    debug!(serial = %self.serial, error = %e, "emulator console reported no AVD");
                    return Ok(None);
                }
                Err(e) => return Err(self.query_error(&e)),
            };
            let path = path.unwrap_or_else(|e| {
                debug!(serial = %self.serial, error = %e, "emulator cannot report AVD path");
                None
            });
            Ok(Some(AvdMetadata { name, path }))
        }
        .boxed()
    }

    fn properties(&self) -> BoxFuture<'_, Result<DeviceProperties, CoreError>> {
        async move {
            let (model, manufacturer, characteristics, sdk) = join4(
                self.client.property(&self.serial, "ro.product.model"),
                self.client.property(&self.serial, "ro.product.manufacturer"),
                self.client.property(&self.serial, "ro.build.characteristics"),
                self.client.property(&self.serial, "ro.build.version.sdk"),
            )
            .await;
            let model = model.map_err(|e| self.query_error(&e))?;
            let manufacturer = manufacturer.map_err(|e| self.query_error(&e))?;
            let characteristics = characteristics.map_err(|e| self.query_error(&e))?;
            let api_level = sdk
                .map_err(|e| self.query_error(&e))?
                .and_then(|v| v.parse().ok());
            Ok(DeviceProperties {
                manufacturer,
                model,
                characteristics,
                api_level,
            })
        }
        .boxed()
    }
}

// ── Compatibility ───────────────────────────────────────────────────

/// Flags devices whose API level is below what the app supports.
#[derive(Debug, Clone, Copy)]
pub struct MinSdkCompatibility {
    min_api: u32,
}

impl MinSdkCompatibility {
    pub fn new(min_api: u32) -> Self {
        Self { min_api }
    }

    pub fn evaluate(&self, api_level: Option<u32>) -> CompatibilityState {
        match api_level {
            None => CompatibilityState::warning("Unknown API level"),
            Some(level) if level < self.min_api => CompatibilityState::error(format!(
                "API level {level} is lower than the minimum {}",
                self.min_api
            )),
            Some(_) => CompatibilityState::Ok,
        }
    }
}

impl CompatibilityChecker for MinSdkCompatibility {
    fn check<'a>(
        &'a self,
        _device: &'a dyn DeviceHandle,
        properties: &'a DeviceProperties,
    ) -> BoxFuture<'a, Result<CompatibilityState, CoreError>> {
        futures_util::future::ready(Ok(self.evaluate(properties.api_level))).boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use devpick_bridge::AvdSnapshot;
    use pretty_assertions::assert_eq;

    use crate::model::Target;
    use crate::testing::StubHandle;

    fn avd(system_image: SystemImage) -> AvdInfo {
        AvdInfo {
            name: "Pixel_7_API_34".into(),
            data_folder: PathBuf::from("/home/me/.android/avd/Pixel_7_API_34.avd"),
            display_name: "Pixel 7 API 34".into(),
            tag_id: Some("google_apis".into()),
            abi: Some("x86_64".into()),
            system_image,
            snapshots: vec![AvdSnapshot {
                name: "clean".into(),
                directory: PathBuf::from("/home/me/.android/avd/Pixel_7_API_34.avd/snapshots/clean"),
            }],
        }
    }

    #[test]
    fn catalog_entry_becomes_path_keyed_template() {
        let t = template_from_avd(&avd(SystemImage::Unknown)).unwrap();
        assert_eq!(t.key(), &Key::path("/home/me/.android/avd/Pixel_7_API_34.avd"));
        assert_eq!(t.name_key(), Some(&Key::name("Pixel_7_API_34")));
        assert_eq!(t.name(), "Pixel 7 API 34");
        assert_eq!(t.device_type(), DeviceType::Phone);
        assert!(!t.is_connected());
        assert_eq!(t.targets().len(), 3);
        assert!(matches!(t.targets()[2], Target::BootWithSnapshot { .. }));
    }

    #[test]
    fn missing_system_image_is_an_error() {
        let t = template_from_avd(&avd(SystemImage::Missing("/sdk/system-images/x".into()))).unwrap();
        assert!(matches!(t.compatibility(), CompatibilityState::Error { .. }));
    }

    #[test]
    fn tags_select_form_factor() {
        assert_eq!(device_type_for_tag(Some("android-wear")), DeviceType::Wear);
        assert_eq!(device_type_for_tag(Some("wear")), DeviceType::Wear);
        assert_eq!(device_type_for_tag(Some("google-tv")), DeviceType::Tv);
        assert_eq!(device_type_for_tag(Some("google_apis_playstore")), DeviceType::Phone);
        assert_eq!(device_type_for_tag(None), DeviceType::Phone);
    }

    #[test]
    fn min_sdk_grades_api_levels() {
        let check = MinSdkCompatibility::new(26);
        assert_eq!(check.evaluate(Some(34)), CompatibilityState::Ok);
        assert!(matches!(check.evaluate(Some(21)), CompatibilityState::Error { .. }));
        assert!(matches!(check.evaluate(None), CompatibilityState::Warning { .. }));
    }

    #[tokio::test]
    async fn min_sdk_grades_the_given_properties_without_querying() {
        let handle = StubHandle::physical("R58M");
        let properties = DeviceProperties {
            api_level: Some(23),
            ..DeviceProperties::default()
        };
        let state = MinSdkCompatibility::new(26)
            .check(&handle, &properties)
            .await
            .unwrap();
        assert_eq!(state.reason(), Some("API level 23 is lower than the minimum 26"));
        assert_eq!(handle.property_queries(), 0);
    }

    #[tokio::test]
    async fn catalog_without_avd_home_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let enumerator = AvdCatalogEnumerator::new(AvdCatalog::new(dir.path().join("missing")));
        assert!(enumerator.virtual_devices().await.unwrap().is_empty());
    }
}
