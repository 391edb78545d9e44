// ── Discovery configuration ──
//
// Runtime knobs for callers that wait on the facade. Built by the front
// end; the core never reads config files.

use std::time::Duration;

/// Timing for [`DeviceListGetter::wait_for_devices`](crate::DeviceListGetter::wait_for_devices)
/// and watch loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Pause between successive `get()` calls.
    pub poll_interval: Duration,
    /// Give up waiting for the first list after this long.
    pub ready_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            ready_timeout: Duration::from_secs(30),
        }
    }
}
