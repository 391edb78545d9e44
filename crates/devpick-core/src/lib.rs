//! Non-blocking discovery of deployable devices.
//!
//! Two slow sources feed one reconciled list:
//!
//! - **Virtual-device templates** from the AVD catalog
//!   ([`VirtualDeviceEnumerator`]), cached by [`VirtualTemplateSource`].
//! - **Connected devices** from the bridge ([`ConnectedDeviceEnumerator`]),
//!   assembled into descriptors and cached by [`ConnectedDeviceSource`].
//!
//! Each source sits behind an [`AsyncResultCache`], which never blocks the
//! caller: it hands back the latest successful value while refreshing in
//! the background. [`DeviceListGetter::get`] polls both, merges them with
//! [`reconcile`], and orders the result with [`sort_devices`].
//!
//! Concrete collaborators over `adb` and the on-disk catalog live in
//! [`adapters`].

pub mod adapters;
pub mod cache;
pub mod config;
pub mod connected;
pub mod connection_time;
pub mod error;
pub mod getter;
pub mod model;
pub mod ordering;
pub mod provider;
pub mod reconcile;
pub mod templates;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapters::{AdbDeviceEnumerator, AdbDeviceHandle, AvdCatalogEnumerator, MinSdkCompatibility};
pub use cache::AsyncResultCache;
pub use config::DiscoveryConfig;
pub use connected::{ConnectedDeviceSource, derive_key_and_name};
pub use connection_time::ConnectionTimeTable;
pub use error::CoreError;
pub use getter::DeviceListGetter;
pub use model::{
    BaseIcon, BridgeHandle, CompatibilityState, ConnectedDescriptor, DecoratedIcon, Device,
    DeviceType, IconBadge, IconDecorator, Key, PhysicalDevice, Snapshot, StandardIconDecorator,
    Target, VirtualDevice, find_device,
};
pub use ordering::sort_devices;
pub use provider::{
    AvdMetadata, CompatibilityChecker, ConnectedDeviceEnumerator, DeviceHandle, DeviceProperties,
    VirtualDeviceEnumerator,
};
pub use reconcile::reconcile;
pub use templates::VirtualTemplateSource;
