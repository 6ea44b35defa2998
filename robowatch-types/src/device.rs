//! Peripheral identity: device class plus controller-assigned unique id.

use core::fmt;
use core::num::ParseIntError;
use core::str::FromStr;

/// Class of peripheral reported by the controller.
///
/// Variant order is the display order: gamepads sort before smart devices
/// regardless of their names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PeripheralKind {
    Gamepad,
    SmartDevice,
}

impl PeripheralKind {
    /// Returns the display label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            PeripheralKind::Gamepad => "Gamepad",
            PeripheralKind::SmartDevice => "Smart Device",
        }
    }
}

/// Unique device identifier as reported by the controller.
///
/// Smart device UIDs are 88 bits wide: a 16-bit type code, an 8-bit year,
/// and a 64-bit random part, packed most-significant first. They do not fit
/// in an `f64` mantissa, so they travel as decimal strings on the wire and
/// are held as `u128` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DeviceId(u128);

/// Bits occupied by the random part of a UID.
const RANDOM_BITS: u32 = 64;
/// Bits occupied by the year part of a UID.
const YEAR_BITS: u32 = 8;
/// Mask selecting the 16-bit type code once shifted down.
const TYPE_CODE_MASK: u128 = 0xffff;

impl DeviceId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Pack a UID from its three components.
    pub const fn from_parts(type_code: u16, year: u8, random: u64) -> Self {
        let raw = ((type_code as u128) << (YEAR_BITS + RANDOM_BITS))
            | ((year as u128) << RANDOM_BITS)
            | random as u128;
        Self(raw)
    }

    /// The raw identifier.
    pub const fn get(&self) -> u128 {
        self.0
    }

    /// The device type code carried in the upper 16 bits of the UID.
    pub const fn type_code(&self) -> u16 {
        ((self.0 >> (YEAR_BITS + RANDOM_BITS)) & TYPE_CODE_MASK) as u16
    }

    /// The manufacturing year byte.
    pub const fn year(&self) -> u8 {
        ((self.0 >> RANDOM_BITS) & 0xff) as u8
    }

    /// The random 64-bit suffix.
    pub const fn random(&self) -> u64 {
        self.0 as u64
    }
}

impl From<u128> for DeviceId {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl From<u64> for DeviceId {
    fn from(raw: u64) -> Self {
        Self(raw as u128)
    }
}

impl FromStr for DeviceId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u128>().map(Self)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DeviceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DeviceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DeviceIdVisitor;

        impl serde::de::Visitor<'_> for DeviceIdVisitor {
            type Value = DeviceId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a decimal string")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<DeviceId, E> {
                Ok(DeviceId::from(v))
            }

            fn visit_u128<E: serde::de::Error>(self, v: u128) -> Result<DeviceId, E> {
                Ok(DeviceId::new(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<DeviceId, E> {
                u128::try_from(v)
                    .map(DeviceId::new)
                    .map_err(|_| E::custom("device id must be non-negative"))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<DeviceId, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DeviceIdVisitor)
    }
}
