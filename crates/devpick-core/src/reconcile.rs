// ── Reconciliation ──
//
// Merges the catalog's templates with the bridge's descriptors into one
// duplicate-free list. Pure apart from the connection-time table, whose
// key set is replaced by the connected keys of the result.

use std::collections::HashSet;
use std::time::Instant;

use tracing::warn;

use crate::connection_time::ConnectionTimeTable;
use crate::error::CoreError;
use crate::model::{
    BaseIcon, ConnectedDescriptor, Device, IconDecorator, Key, PhysicalDevice, VirtualDevice,
};

/// Merge one pass. `now` stamps devices seen connected for the first time.
pub fn reconcile(
    templates: &[VirtualDevice],
    descriptors: &[ConnectedDescriptor],
    table: &mut ConnectionTimeTable,
    decorator: &dyn IconDecorator,
    now: Instant,
) -> Vec<Device> {
    let mut result = Vec::with_capacity(templates.len() + descriptors.len());

    // Running emulators, matched to their template where one exists.
    for descriptor in descriptors.iter().filter(|d| d.is_virtual) {
        let template = templates.iter().find(|t| t.matches(&descriptor.key));
        let built = match template {
            Some(template) => merge_with_template(template, descriptor, table, decorator, now),
            None => bare_virtual(descriptor, table, decorator, now),
        };
        push_or_log(&mut result, built, &descriptor.key);
    }

    for descriptor in descriptors.iter().filter(|d| d.is_physical()) {
        let since = table.get_or_insert(&descriptor.key, now);
        let icon = decorator.decorate(descriptor.icon, &descriptor.compatibility, true);
        let built = PhysicalDevice::builder()
            .key(descriptor.key.clone())
            .name(descriptor.name.clone())
            .device_type(descriptor.device_type)
            .icon(icon)
            .compatibility(descriptor.compatibility.clone())
            .connected(descriptor.handle.clone(), since)
            .build()
            .map(Device::from);
        push_or_log(&mut result, built, &descriptor.key);
    }

    let running: HashSet<&Key> = descriptors
        .iter()
        .filter(|d| d.is_virtual)
        .map(|d| &d.key)
        .collect();
    for template in templates {
        let claimed = running.contains(template.key())
            || template.name_key().is_some_and(|k| running.contains(k));
        if claimed {
            continue;
        }
        let icon = decorator.decorate(template.icon().base, template.compatibility(), false);
        let built = template.to_builder().disconnected().icon(icon).build().map(Device::from);
        push_or_log(&mut result, built, template.key());
    }

    let connected: HashSet<&Key> = result
        .iter()
        .filter(|d| d.is_connected())
        .map(Device::key)
        .collect();
    table.retain_only(&connected);

    result
}

fn merge_with_template(
    template: &VirtualDevice,
    descriptor: &ConnectedDescriptor,
    table: &mut ConnectionTimeTable,
    decorator: &dyn IconDecorator,
    now: Instant,
) -> Result<Device, CoreError> {
    let since = table.get_or_insert(template.key(), now);
    let base = BaseIcon::for_device(template.device_type(), true);
    template
        .to_builder()
        .compatibility(descriptor.compatibility.clone())
        .icon(decorator.decorate(base, &descriptor.compatibility, true))
        .connected(descriptor.handle.clone(), since)
        .build()
        .map(Device::from)
}

fn bare_virtual(
    descriptor: &ConnectedDescriptor,
    table: &mut ConnectionTimeTable,
    decorator: &dyn IconDecorator,
    now: Instant,
) -> Result<Device, CoreError> {
    let since = table.get_or_insert(&descriptor.key, now);
    VirtualDevice::builder()
        .key(descriptor.key.clone())
        .name(descriptor.name.clone())
        .device_type(descriptor.device_type)
        .icon(decorator.decorate(descriptor.icon, &descriptor.compatibility, true))
        .compatibility(descriptor.compatibility.clone())
        .connected(descriptor.handle.clone(), since)
        .build()
        .map(Device::from)
}

fn push_or_log(result: &mut Vec<Device>, built: Result<Device, CoreError>, key: &Key) {
    match built {
        Ok(device) => result.push(device),
        Err(e) => warn!(key = %key, error = %e, "skipping device that failed validation"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{CompatibilityState, DeviceType, Snapshot, StandardIconDecorator, Target};
    use crate::testing::StubHandle;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn template(path: &str, name: &str) -> VirtualDevice {
        VirtualDevice::builder()
            .key(Key::path(path))
            .name(name)
            .build()
            .unwrap()
    }

    fn descriptor(key: Key, name: &str, is_virtual: bool) -> ConnectedDescriptor {
        ConnectedDescriptor {
            key,
            name: name.into(),
            device_type: DeviceType::Phone,
            icon: BaseIcon::for_device(DeviceType::Phone, is_virtual),
            compatibility: CompatibilityState::Ok,
            is_virtual,
            handle: StubHandle::physical(name).into_bridge(),
        }
    }

    fn run(
        templates: &[VirtualDevice],
        descriptors: &[ConnectedDescriptor],
        table: &mut ConnectionTimeTable,
    ) -> Vec<Device> {
        reconcile(
            templates,
            descriptors,
            table,
            &StandardIconDecorator,
            Instant::now(),
        )
    }

    #[test]
    fn lone_template_is_a_disconnected_quick_boot_device() {
        let mut table = ConnectionTimeTable::new();
        let out = run(&[template("/avd/Pixel", "Pixel")], &[], &mut table);

        assert_eq!(out.len(), 1);
        assert!(!out[0].is_connected());
        assert_eq!(
            out[0].targets(),
            vec![Target::QuickBoot {
                device: Key::path("/avd/Pixel")
            }]
        );
        assert!(table.is_empty());
    }

    #[test]
    fn running_emulator_merges_into_its_template() {
        let mut table = ConnectionTimeTable::new();
        let snap = Snapshot::new("/avd/Pixel/snapshots/clean", "clean");
        let t = template("/avd/Pixel", "Pixel")
            .to_builder()
            .snapshots(vec![snap.clone()])
            .build()
            .unwrap();
        let mut d = descriptor(Key::path("/avd/Pixel"), "emulator-5554", true);
        d.compatibility = CompatibilityState::warning("old API");

        let out = run(&[t], &[d], &mut table);

        assert_eq!(out.len(), 1);
        let merged = &out[0];
        assert!(merged.is_virtual());
        assert!(merged.is_connected());
        assert_eq!(merged.name(), "Pixel");
        assert_eq!(merged.snapshots(), &[snap]);
        assert_eq!(merged.compatibility(), &CompatibilityState::warning("old API"));
        assert_eq!(
            merged.targets(),
            vec![Target::RunningDevice {
                device: Key::path("/avd/Pixel")
            }]
        );
        assert!(merged.icon().live);
        assert!(table.get(&Key::path("/avd/Pixel")).is_some());
    }

    #[test]
    fn name_key_matches_older_bridges() {
        let mut table = ConnectionTimeTable::new();
        let t = template("/avd/Pixel_7.avd", "Pixel 7")
            .to_builder()
            .name_key(Some(Key::name("Pixel_7")))
            .build()
            .unwrap();
        let d = descriptor(Key::name("Pixel_7"), "Pixel_7", true);

        let out = run(&[t], &[d], &mut table);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key(), &Key::path("/avd/Pixel_7.avd"));
        assert!(out[0].is_connected());
        assert_eq!(table.keys().collect::<Vec<_>>(), vec![&Key::path("/avd/Pixel_7.avd")]);
    }

    #[test]
    fn unmatched_emulator_still_appears() {
        let mut table = ConnectionTimeTable::new();
        let d = descriptor(Key::serial("emulator-5554"), "emulator-5554", true);

        let out = run(&[template("/avd/Pixel", "Pixel")], &[d], &mut table);

        assert_eq!(out.len(), 2);
        let bare = find_by_key(&out, &Key::serial("emulator-5554"));
        assert!(bare.is_virtual());
        assert!(bare.snapshots().is_empty());
        assert_eq!(bare.name(), "emulator-5554");
    }

    #[test]
    fn disjoint_inputs_yield_one_device_per_key() {
        let mut table = ConnectionTimeTable::new();
        let templates = [template("/avd/A", "A"), template("/avd/B", "B")];
        let descriptors = [
            descriptor(Key::serial("R58M"), "Galaxy", false),
            descriptor(Key::serial("emulator-5556"), "emulator-5556", true),
        ];

        let out = run(&templates, &descriptors, &mut table);

        let mut keys: Vec<String> = out.iter().map(|d| d.key().to_string()).collect();
        keys.sort();
        assert_eq!(keys, vec!["/avd/A", "/avd/B", "R58M", "emulator-5556"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn table_is_pruned_to_connected_keys() {
        let mut table = ConnectionTimeTable::new();
        let gone = Key::serial("old-phone");
        let stays = Key::serial("R58M");
        let earlier = Instant::now();
        table.get_or_insert(&gone, earlier);
        table.get_or_insert(&stays, earlier);

        let out = reconcile(
            &[],
            &[descriptor(stays.clone(), "Galaxy", false)],
            &mut table,
            &StandardIconDecorator,
            earlier + Duration::from_secs(300),
        );

        assert!(table.get(&gone).is_none());
        assert_eq!(table.get(&stays), Some(earlier));
        assert_eq!(out[0].connection_time(), Some(earlier));
    }

    #[test]
    fn unmatched_templates_survive_passes_unchanged() {
        let mut table = ConnectionTimeTable::new();
        let t = template("/avd/Pixel", "Pixel")
            .to_builder()
            .snapshots(vec![Snapshot::new("/avd/Pixel/snapshots/s1", "s1")])
            .build()
            .unwrap();
        let descriptors = [descriptor(Key::serial("R58M"), "Galaxy", false)];

        let first = run(std::slice::from_ref(&t), &descriptors, &mut table);
        let second = run(std::slice::from_ref(&t), &descriptors, &mut table);

        let a = find_by_key(&first, t.key());
        let b = find_by_key(&second, t.key());
        assert_eq!(a, b);
        assert_eq!(a.targets(), b.targets());
    }

    fn find_by_key<'a>(devices: &'a [Device], key: &Key) -> &'a Device {
        crate::model::find_device(devices, key).unwrap()
    }
}
