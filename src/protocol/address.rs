//! Device serial numbers and the radio addresses derived from them

use core::fmt;

/// Full 64-bit serial number of a DTU or inverter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceSerial(u64);

impl DeviceSerial {
    pub const fn new(serial: u64) -> Self {
        Self(serial)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Short over-the-air address of this device.
    ///
    /// Only the low 32 bits of the serial survive, most significant byte first.
    pub const fn radio_id(&self) -> RadioId {
        RadioId((self.0 as u32).to_be_bytes())
    }
}

impl From<u64> for DeviceSerial {
    fn from(serial: u64) -> Self {
        Self(serial)
    }
}

impl fmt::Display for DeviceSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:012X}", self.0)
    }
}

/// Four byte radio address as it appears in the packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RadioId([u8; 4]);

impl RadioId {
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Compare against an address field taken from a packet
    pub fn matches(&self, field: &[u8]) -> bool {
        field == self.0.as_slice()
    }
}

impl fmt::Display for RadioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}{:02X}{:02X}{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}
