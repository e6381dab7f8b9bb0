//! Grid profile decoder
//!
//! Turns the profile type bytes and `(item id, raw value)` pairs read from an
//! inverter into named, unit-tagged physical values. Unknown profiles,
//! sections, and items resolve to explicit fallback entries, so every
//! supplied item produces exactly one decoded entry.

use crate::parser::tables::{item_definition, profile_type, section_for_item};
use alloc::vec::Vec;
use core::fmt;

/// One decoded grid profile value
#[derive(Debug, Clone, PartialEq)]
pub struct GridProfileEntry {
    pub profile: &'static str,
    pub section: &'static str,
    pub item_id: u8,
    pub name: &'static str,
    pub unit: &'static str,
    pub divider: u8,
    pub raw: i16,
    /// `raw / divider`
    pub value: f32,
}

/// Decode every item against the static tables, preserving input order.
pub fn decode(profile: (u8, u8), items: &[(u8, i16)]) -> Vec<GridProfileEntry> {
    let profile = profile_type(profile.0, profile.1);

    items
        .iter()
        .map(|&(item_id, raw)| {
            let definition = item_definition(item_id);
            GridProfileEntry {
                profile: profile.name,
                section: section_for_item(item_id).name,
                item_id,
                name: definition.name,
                unit: definition.unit,
                divider: definition.divider,
                raw,
                value: f32::from(raw) / f32::from(definition.divider),
            }
        })
        .collect()
}

/// Firmware version of the stored profile, packed as `major.minor.patch`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl ProfileVersion {
    /// Byte 0 carries major and minor in its nibbles, byte 1 the patch level
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            major: bytes[0] >> 4,
            minor: bytes[0] & 0x0F,
            patch: bytes[1],
        }
    }
}

impl fmt::Display for ProfileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A fully decoded grid profile
#[derive(Debug, Clone, PartialEq)]
pub struct GridProfile {
    pub name: &'static str,
    pub type_bytes: (u8, u8),
    pub version: ProfileVersion,
    pub entries: Vec<GridProfileEntry>,
}

impl GridProfile {
    pub fn new(type_bytes: (u8, u8), version: ProfileVersion, items: &[(u8, i16)]) -> Self {
        Self {
            name: profile_type(type_bytes.0, type_bytes.1).name,
            type_bytes,
            version,
            entries: decode(type_bytes, items),
        }
    }

    /// First entry with the given item id
    pub fn entry(&self, item_id: u8) -> Option<&GridProfileEntry> {
        self.entries.iter().find(|e| e.item_id == item_id)
    }
}
