// ── DeviceListGetter ──
//
// Facade over the two cached sources. Each `get()` polls both caches
// without blocking; when both have produced at least once the latest
// values are reconciled and sorted. Owns the connection-time table, and
// takes `&mut self` so passes cannot overlap.

use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::connected::ConnectedDeviceSource;
use crate::connection_time::ConnectionTimeTable;
use crate::error::CoreError;
use crate::model::{Device, IconDecorator, StandardIconDecorator};
use crate::ordering::sort_devices;
use crate::provider::{CompatibilityChecker, ConnectedDeviceEnumerator, VirtualDeviceEnumerator};
use crate::reconcile::reconcile;
use crate::templates::VirtualTemplateSource;

/// The device list a deployment picker shows.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use devpick_core::{DeviceListGetter, VirtualDeviceEnumerator, ConnectedDeviceEnumerator};
/// # fn demo(v: Arc<dyn VirtualDeviceEnumerator>, c: Arc<dyn ConnectedDeviceEnumerator>) {
/// let mut getter = DeviceListGetter::new(tokio::runtime::Handle::current(), v, c);
/// match getter.get() {
///     Ok(Some(devices)) => println!("{} devices", devices.len()),
///     Ok(None) => println!("loading"),
///     Err(e) => eprintln!("{e}"),
/// }
/// # }
/// ```
pub struct DeviceListGetter {
    templates: VirtualTemplateSource,
    connected: ConnectedDeviceSource,
    decorator: Arc<dyn IconDecorator>,
    connection_times: ConnectionTimeTable,
}

impl DeviceListGetter {
    /// Producers are spawned on `runtime`; `get()` itself may be called
    /// from any thread.
    pub fn new(
        runtime: Handle,
        virtual_enumerator: Arc<dyn VirtualDeviceEnumerator>,
        connected_enumerator: Arc<dyn ConnectedDeviceEnumerator>,
    ) -> Self {
        Self {
            templates: VirtualTemplateSource::new(runtime.clone(), virtual_enumerator),
            connected: ConnectedDeviceSource::new(runtime, connected_enumerator),
            decorator: Arc::new(StandardIconDecorator),
            connection_times: ConnectionTimeTable::new(),
        }
    }

    #[must_use]
    pub fn with_icon_decorator(mut self, decorator: Arc<dyn IconDecorator>) -> Self {
        self.decorator = decorator;
        self
    }

    #[must_use]
    pub fn with_compatibility_checker(mut self, checker: Arc<dyn CompatibilityChecker>) -> Self {
        self.connected.set_checker(Some(checker));
        self
    }

    /// The ordered device list, or `None` while either source is still loading.
    ///
    /// Never waits on a producer. Stale data from a source whose latest
    /// refresh failed is served as if it were fresh.
    pub fn get(&mut self) -> Result<Option<Vec<Device>>, CoreError> {
        let templates = self.templates.poll();
        let descriptors = self.connected.poll();
        let (Some(templates), Some(descriptors)) = (templates?, descriptors?) else {
            return Ok(None);
        };

        let mut devices = reconcile(
            &templates,
            &descriptors,
            &mut self.connection_times,
            self.decorator.as_ref(),
            Instant::now(),
        );
        sort_devices(&mut devices);
        Ok(Some(devices))
    }

    /// Call [`get`](Self::get) every `poll_interval` until a list is available.
    pub async fn wait_for_devices(
        &mut self,
        config: &DiscoveryConfig,
    ) -> Result<Vec<Device>, CoreError> {
        let deadline = tokio::time::Instant::now() + config.ready_timeout;
        loop {
            if let Some(devices) = self.get()? {
                debug!(count = devices.len(), "device list ready");
                return Ok(devices);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CoreError::Timeout {
                    what: "the device list".into(),
                    timeout_secs: config.ready_timeout.as_secs(),
                });
            }
            tokio::time::sleep(config.poll_interval).await;
        }
    }

    pub fn connection_times(&self) -> &ConnectionTimeTable {
        &self.connection_times
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use futures_util::FutureExt;
    use futures_util::future::BoxFuture;
    use pretty_assertions::assert_eq;

    use crate::model::{CompatibilityState, Key, VirtualDevice};
    use crate::testing::{StubChecker, StubConnected, StubHandle, StubTemplates};

    fn pixel() -> VirtualDevice {
        VirtualDevice::builder()
            .key(Key::path("/avd/Pixel"))
            .name_key(Some(Key::name("Pixel")))
            .name("Pixel")
            .build()
            .unwrap()
    }

    fn fast() -> DiscoveryConfig {
        DiscoveryConfig {
            poll_interval: Duration::from_millis(1),
            ready_timeout: Duration::from_secs(5),
        }
    }

    /// Poll until the list satisfies `done`.
    async fn get_until(getter: &mut DeviceListGetter, done: impl Fn(&[Device]) -> bool) -> Vec<Device> {
        for _ in 0..500 {
            if let Some(devices) = getter.get().unwrap() {
                if done(&devices) {
                    return devices;
                }
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("device list never reached the expected state");
    }

    struct Failing;

    impl VirtualDeviceEnumerator for Failing {
        fn virtual_devices(&self) -> BoxFuture<'_, Result<Vec<VirtualDevice>, CoreError>> {
            async {
                Err(CoreError::Catalog {
                    message: "avd home unreadable".into(),
                })
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn first_get_reports_loading() {
        let mut getter = DeviceListGetter::new(
            Handle::current(),
            Arc::new(StubTemplates::new(vec![pixel()])),
            Arc::new(StubConnected::default()),
        );
        assert_eq!(getter.get().unwrap(), None);
    }

    #[tokio::test]
    async fn wait_returns_reconciled_list() {
        let templates = Arc::new(StubTemplates::new(vec![pixel()]));
        let connected = Arc::new(StubConnected::new(vec![
            StubHandle::physical("R58M")
                .with_properties("samsung", "SM-G991B")
                .into_arc(),
        ]));
        let mut getter = DeviceListGetter::new(Handle::current(), templates.clone(), connected)
            .with_compatibility_checker(Arc::new(StubChecker(Ok(CompatibilityState::Ok))));

        let devices = getter.wait_for_devices(&fast()).await.unwrap();

        let names: Vec<&str> = devices.iter().map(Device::name).collect();
        assert_eq!(names, vec!["samsung SM-G991B", "Pixel"]);
        assert_eq!(getter.connection_times().len(), 1);
        assert!(templates.calls() >= 1);
    }

    #[tokio::test]
    async fn emulator_coming_and_going_updates_table() {
        let connected = Arc::new(StubConnected::default());
        let mut getter = DeviceListGetter::new(
            Handle::current(),
            Arc::new(StubTemplates::new(vec![pixel()])),
            connected.clone(),
        );
        getter.wait_for_devices(&fast()).await.unwrap();

        // Older bridge: only the AVD name is known.
        connected.set(vec![
            StubHandle::emulator("emulator-5554", Some("Pixel"), None).into_arc(),
        ]);
        let devices = get_until(&mut getter, |d| d.iter().any(Device::is_connected)).await;
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].key(), &Key::path("/avd/Pixel"));
        assert!(getter.connection_times().get(&Key::path("/avd/Pixel")).is_some());

        connected.set(Vec::new());
        let devices = get_until(&mut getter, |d| !d.iter().any(Device::is_connected)).await;
        assert_eq!(devices.len(), 1);
        assert!(getter.connection_times().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_when_a_source_never_succeeds() {
        let mut getter = DeviceListGetter::new(
            Handle::current(),
            Arc::new(Failing),
            Arc::new(StubConnected::default()),
        );
        let config = DiscoveryConfig {
            poll_interval: Duration::from_millis(100),
            ready_timeout: Duration::from_secs(2),
        };

        let err = getter.wait_for_devices(&config).await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 2, .. }));
    }
}
