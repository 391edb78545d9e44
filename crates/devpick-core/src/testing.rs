// ── Test doubles for the collaborator traits ──

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::CoreError;
use crate::model::{BridgeHandle, CompatibilityState, VirtualDevice};
use crate::provider::{
    AvdMetadata, CompatibilityChecker, ConnectedDeviceEnumerator, DeviceHandle, DeviceProperties,
    VirtualDeviceEnumerator,
};

/// Scriptable `DeviceHandle`.
#[derive(Debug, Clone)]
pub struct StubHandle {
    pub serial: Result<String, CoreError>,
    pub emulator: bool,
    pub metadata: Result<Option<AvdMetadata>, CoreError>,
    pub properties: Result<DeviceProperties, CoreError>,
    property_queries: Arc<AtomicUsize>,
}

impl StubHandle {
    pub fn physical(serial: &str) -> Self {
        Self {
            serial: Ok(serial.to_owned()),
            emulator: false,
            metadata: Ok(None),
            properties: Ok(DeviceProperties::default()),
            property_queries: Arc::default(),
        }
    }

    /// Emulator reporting the given AVD name and data folder.
    pub fn emulator(serial: &str, name: Option<&str>, path: Option<&str>) -> Self {
        Self {
            emulator: true,
            metadata: Ok(Some(AvdMetadata {
                name: name.map(Into::into),
                path: path.map(PathBuf::from),
            })),
            ..Self::physical(serial)
        }
    }

    #[must_use]
    pub fn with_properties(mut self, manufacturer: &str, model: &str) -> Self {
        self.properties = Ok(DeviceProperties {
            manufacturer: Some(manufacturer.into()),
            model: Some(model.into()),
            ..DeviceProperties::default()
        });
        self
    }

    /// How many times `properties` has been awaited, shared across clones.
    pub fn property_queries(&self) -> usize {
        self.property_queries.load(Ordering::SeqCst)
    }

    pub fn into_arc(self) -> Arc<dyn DeviceHandle> {
        Arc::new(self)
    }

    pub fn into_bridge(self) -> BridgeHandle {
        BridgeHandle::new(self.into_arc())
    }
}

impl DeviceHandle for StubHandle {
    fn label(&self) -> String {
        self.serial.clone().unwrap_or_else(|_| "<unknown>".into())
    }

    fn serial(&self) -> BoxFuture<'_, Result<String, CoreError>> {
        futures_util::future::ready(self.serial.clone()).boxed()
    }

    fn is_emulator(&self) -> BoxFuture<'_, Result<bool, CoreError>> {
        futures_util::future::ready(Ok(self.emulator)).boxed()
    }

    fn avd_metadata(&self) -> BoxFuture<'_, Result<Option<AvdMetadata>, CoreError>> {
        futures_util::future::ready(self.metadata.clone()).boxed()
    }

    fn properties(&self) -> BoxFuture<'_, Result<DeviceProperties, CoreError>> {
        self.property_queries.fetch_add(1, Ordering::SeqCst);
        futures_util::future::ready(self.properties.clone()).boxed()
    }
}

/// Checker answering from a fixed result.
pub struct StubChecker(pub Result<CompatibilityState, CoreError>);

impl CompatibilityChecker for StubChecker {
    fn check<'a>(
        &'a self,
        _device: &'a dyn DeviceHandle,
        _properties: &'a DeviceProperties,
    ) -> BoxFuture<'a, Result<CompatibilityState, CoreError>> {
        futures_util::future::ready(self.0.clone()).boxed()
    }
}

/// Enumerator over a fixed template list, counting calls.
#[derive(Default)]
pub struct StubTemplates {
    pub devices: Vec<VirtualDevice>,
    pub calls: AtomicUsize,
}

impl StubTemplates {
    pub fn new(devices: Vec<VirtualDevice>) -> Self {
        Self {
            devices,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VirtualDeviceEnumerator for StubTemplates {
    fn virtual_devices(&self) -> BoxFuture<'_, Result<Vec<VirtualDevice>, CoreError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        futures_util::future::ready(Ok(self.devices.clone())).boxed()
    }
}

/// Enumerator over a fixed set of handles.
#[derive(Default)]
pub struct StubConnected {
    pub handles: std::sync::Mutex<Vec<Arc<dyn DeviceHandle>>>,
}

impl StubConnected {
    pub fn new(handles: Vec<Arc<dyn DeviceHandle>>) -> Self {
        Self {
            handles: std::sync::Mutex::new(handles),
        }
    }

    /// Replace what the next enumeration reports.
    pub fn set(&self, handles: Vec<Arc<dyn DeviceHandle>>) {
        *self.handles.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = handles;
    }
}

impl ConnectedDeviceEnumerator for StubConnected {
    fn connected_devices(&self) -> BoxFuture<'_, Result<Vec<Arc<dyn DeviceHandle>>, CoreError>> {
        let handles = self
            .handles
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        futures_util::future::ready(Ok(handles)).boxed()
    }
}
