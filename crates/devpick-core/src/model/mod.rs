// ── Domain model ──
//
// Immutable identity and value types, rebuilt on every pass.

pub mod device;
pub mod icon;
pub mod key;
pub mod snapshot;
pub mod target;

pub use device::{
    BridgeHandle, CompatibilityState, ConnectedDescriptor, Device, DeviceType, PhysicalDevice,
    PhysicalDeviceBuilder, VirtualDevice, VirtualDeviceBuilder, find_device,
};
pub use icon::{BaseIcon, DecoratedIcon, IconBadge, IconDecorator, StandardIconDecorator};
pub use key::Key;
pub use snapshot::Snapshot;
pub use target::Target;
