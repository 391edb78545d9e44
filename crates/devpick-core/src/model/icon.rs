// ── Device icons ──
//
// Presentation hints only. A base icon follows from the device type and
// whether it is virtual; an `IconDecorator` adds state badges on top.

use serde::{Deserialize, Serialize};

use super::device::{CompatibilityState, DeviceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseIcon {
    Phone,
    Wear,
    Tv,
    VirtualPhone,
    VirtualWear,
    VirtualTv,
}

impl BaseIcon {
    pub fn for_device(device_type: DeviceType, is_virtual: bool) -> Self {
        match (device_type, is_virtual) {
            (DeviceType::Phone, false) => Self::Phone,
            (DeviceType::Wear, false) => Self::Wear,
            (DeviceType::Tv, false) => Self::Tv,
            (DeviceType::Phone, true) => Self::VirtualPhone,
            (DeviceType::Wear, true) => Self::VirtualWear,
            (DeviceType::Tv, true) => Self::VirtualTv,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconBadge {
    Warning,
    Error,
}

/// A base icon with its state decorations applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecoratedIcon {
    pub base: BaseIcon,
    pub badge: Option<IconBadge>,
    /// Drawn with the "running" overlay.
    pub live: bool,
}

impl DecoratedIcon {
    /// An undecorated icon.
    pub fn plain(base: BaseIcon) -> Self {
        Self {
            base,
            badge: None,
            live: false,
        }
    }
}

/// Pure `(base icon, compatibility, connected) -> decorated icon` mapping.
pub trait IconDecorator: Send + Sync {
    fn decorate(
        &self,
        base: BaseIcon,
        compatibility: &CompatibilityState,
        connected: bool,
    ) -> DecoratedIcon;
}

/// Badges warnings and errors, marks connected devices live.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardIconDecorator;

impl IconDecorator for StandardIconDecorator {
    fn decorate(
        &self,
        base: BaseIcon,
        compatibility: &CompatibilityState,
        connected: bool,
    ) -> DecoratedIcon {
        let badge = match compatibility {
            CompatibilityState::Ok => None,
            CompatibilityState::Warning { .. } => Some(IconBadge::Warning),
            CompatibilityState::Error { .. } => Some(IconBadge::Error),
        };
        DecoratedIcon {
            base,
            badge,
            live: connected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_decorator_badges_by_severity() {
        let d = StandardIconDecorator;
        let err = CompatibilityState::error("API too low");
        let icon = d.decorate(BaseIcon::VirtualPhone, &err, true);
        assert_eq!(icon.badge, Some(IconBadge::Error));
        assert!(icon.live);

        let ok = d.decorate(BaseIcon::Tv, &CompatibilityState::Ok, false);
        assert_eq!(ok, DecoratedIcon::plain(BaseIcon::Tv));
    }
}
