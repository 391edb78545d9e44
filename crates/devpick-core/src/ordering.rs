// ── Presentation order ──
//
// Problems first, then most recently connected, virtual before physical,
// then by name.

use std::cmp::{Ordering, Reverse};

use crate::model::{CompatibilityState, Device};

fn severity_rank(state: &CompatibilityState) -> u8 {
    match state {
        CompatibilityState::Error { .. } => 0,
        CompatibilityState::Warning { .. } => 1,
        CompatibilityState::Ok => 2,
    }
}

/// Total order used for every list handed to callers.
pub fn compare(a: &Device, b: &Device) -> Ordering {
    severity_rank(a.compatibility())
        .cmp(&severity_rank(b.compatibility()))
        // `None < Some`, so reversing puts never-connected last.
        .then_with(|| Reverse(a.connection_time()).cmp(&Reverse(b.connection_time())))
        .then_with(|| b.is_virtual().cmp(&a.is_virtual()))
        .then_with(|| a.name().cmp(b.name()))
}

pub fn sort_devices(devices: &mut [Device]) {
    devices.sort_by(compare);
}
