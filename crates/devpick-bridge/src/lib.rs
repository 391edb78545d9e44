// devpick-bridge: async access to adb and the on-disk AVD catalog.
//
// This crate only speaks the external tools' formats. It knows nothing
// about device keys, boot targets, or reconciliation; `devpick-core`
// adapts these types into its collaborator traits.

pub mod adb;
pub mod avd;
pub mod config;
pub mod error;

pub use adb::{AdbClient, AdbDevice, AdbState, is_emulator_serial};
pub use avd::{AvdCatalog, AvdInfo, AvdSnapshot, SystemImage};
pub use config::BridgeConfig;
pub use error::Error;
