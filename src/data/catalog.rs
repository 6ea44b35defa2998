//! Smart device type catalog.
//!
//! Maps the type code carried in a device UID to a display label and icon.
//! Codes the console does not know about are not an error; they resolve to
//! [`DeviceType::Unknown`] and display with a generic label.

use robowatch_types::{DeviceId, PeripheralKind};

/// Display information for a known device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLabel {
    pub name: &'static str,
    pub icon: &'static str,
}

/// Result of a catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Known(DeviceLabel),
    Unknown,
}

impl DeviceType {
    /// Label to show, with the generic fallback for unknown codes.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceType::Known(label) => label.name,
            DeviceType::Unknown => "Unknown Device",
        }
    }

    /// Icon to show, with the generic fallback for unknown codes.
    pub fn icon(&self) -> &'static str {
        match self {
            DeviceType::Known(label) => label.icon,
            DeviceType::Unknown => "?",
        }
    }
}

const fn known(name: &'static str, icon: &'static str) -> DeviceLabel {
    DeviceLabel { name, icon }
}

/// Type codes assigned by the smart device firmware.
const CATALOG: &[(u16, DeviceLabel)] = &[
    (0x00, known("Limit Switch", "⏼")),
    (0x01, known("Line Follower", "≋")),
    (0x02, known("Battery Buzzer", "⚡")),
    (0x03, known("Servo Controller", "⟳")),
    (0x04, known("Polar Bear", "◉")),
    (0x05, known("Koala Bear", "◎")),
    (0x07, known("Yogi Bear", "⊙")),
    (0x0a, known("RFID", "⌁")),
    (0x0c, known("Motor Controller", "⚙")),
];

/// Look up a type code.
pub fn lookup(type_code: u16) -> DeviceType {
    CATALOG
        .iter()
        .find(|(code, _)| *code == type_code)
        .map_or(DeviceType::Unknown, |(_, label)| DeviceType::Known(*label))
}

/// Resolve the display type of a peripheral.
pub fn classify(kind: PeripheralKind, id: DeviceId) -> DeviceType {
    match kind {
        PeripheralKind::Gamepad => DeviceType::Known(known("Gamepad", "🎮")),
        PeripheralKind::SmartDevice => lookup(id.type_code()),
    }
}
