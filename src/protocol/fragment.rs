//! Radio packet layout
//!
//! Every packet exchanged with an inverter has the same shape:
//!
//! ```text
//! [main_cmd: u8][inverter id: 4][dtu id: 4][fragment id: u8][payload...][crc8: u8]
//! ```
//!
//! - `main_cmd`: request type; responses echo it with bit 7 set
//! - `inverter id` / `dtu id`: [`RadioId`]s of both ends, inverter first
//! - `fragment id`: 1-based index, bit 7 marks the last fragment
//! - `crc8`: CRC-8 over all preceding bytes
//!
//! The whole packet never exceeds [`MAX_RF_PAYLOAD_SIZE`] bytes.

use crate::config::protocol::{
    HEADER_LEN, LAST_FRAGMENT_FLAG, MAIN_CMD_MULTI_DATA, MAX_RF_PAYLOAD_SIZE, MIN_PACKET_LEN,
};
use crate::protocol::address::RadioId;
use crate::protocol::crc::{check_crc8, crc8};
use heapless::Vec;

/// Outbound packet bytes, CRC-8 included
pub type Packet = Vec<u8, MAX_RF_PAYLOAD_SIZE>;

/// One received radio packet with reception metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Raw packet bytes including the trailing CRC-8
    pub data: Vec<u8, MAX_RF_PAYLOAD_SIZE>,
    /// Received signal strength in dBm
    pub rssi: i16,
    /// Hardware channel the packet arrived on
    pub channel: u8,
}

impl Fragment {
    /// Wrap raw bytes; anything beyond the maximum packet size is cut off
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let len = bytes.len().min(MAX_RF_PAYLOAD_SIZE);
        let mut data = Vec::new();
        let _ = data.extend_from_slice(&bytes[..len]);
        Self {
            data,
            rssi: 0,
            channel: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Main command byte
    pub fn main_cmd(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// 1-based fragment index with the last-fragment flag masked off
    pub fn index(&self) -> Option<u8> {
        self.data.get(9).map(|id| id & !LAST_FRAGMENT_FLAG)
    }

    /// Whether this is the final fragment of a response
    pub fn is_last(&self) -> bool {
        self.data
            .get(9)
            .is_some_and(|id| id & LAST_FRAGMENT_FLAG != 0)
    }

    /// Inverter address field
    pub fn inverter_id(&self) -> Option<&[u8]> {
        self.data.get(1..5)
    }

    /// DTU address field
    pub fn dtu_id(&self) -> Option<&[u8]> {
        self.data.get(5..9)
    }

    /// Long enough to carry a header and a checksum
    pub fn is_well_formed(&self) -> bool {
        self.data.len() >= MIN_PACKET_LEN
    }

    /// Verify the trailing CRC-8
    pub fn crc_valid(&self) -> bool {
        self.is_well_formed() && check_crc8(&self.data)
    }

    /// Payload bytes between header and CRC-8
    pub fn payload(&self) -> &[u8] {
        if self.data.len() < MIN_PACKET_LEN {
            return &[];
        }
        &self.data[HEADER_LEN..self.data.len() - 1]
    }
}

/// Builder for outbound packets
///
/// The header is written on construction, payload bytes are appended, and
/// [`PacketBuilder::finish`] closes the packet with its CRC-8.
pub struct PacketBuilder {
    packet: Packet,
}

impl PacketBuilder {
    /// Start a packet addressed from `dtu` to `inverter`
    pub fn new(main_cmd: u8, inverter: RadioId, dtu: RadioId, fragment_id: u8) -> Self {
        let mut packet = Packet::new();
        let _ = packet.push(main_cmd);
        let _ = packet.extend_from_slice(inverter.as_bytes());
        let _ = packet.extend_from_slice(dtu.as_bytes());
        let _ = packet.push(fragment_id);
        Self { packet }
    }

    /// Append payload bytes; silently truncated at the packet size limit,
    /// leaving room for the CRC-8
    pub fn payload(mut self, bytes: &[u8]) -> Self {
        let room = (MAX_RF_PAYLOAD_SIZE - 1).saturating_sub(self.packet.len());
        let len = bytes.len().min(room);
        let _ = self.packet.extend_from_slice(&bytes[..len]);
        self
    }

    /// Append a single payload byte
    pub fn byte(self, byte: u8) -> Self {
        self.payload(&[byte])
    }

    /// Close the packet with its CRC-8
    pub fn finish(mut self) -> Packet {
        let crc = crc8(&self.packet);
        let _ = self.packet.push(crc);
        self.packet
    }
}

/// Request a single missing or corrupted fragment again
pub fn retransmit_request(inverter: RadioId, dtu: RadioId, index: u8) -> Packet {
    PacketBuilder::new(
        MAIN_CMD_MULTI_DATA,
        inverter,
        dtu,
        LAST_FRAGMENT_FLAG | (index & !LAST_FRAGMENT_FLAG),
    )
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::address::DeviceSerial;

    const INVERTER: DeviceSerial = DeviceSerial::new(0x1164_8012_3456);
    const DTU: DeviceSerial = DeviceSerial::new(0x1998_7856_3412);

    fn response(index: u8, payload: &[u8]) -> Fragment {
        let packet = PacketBuilder::new(0x95, INVERTER.radio_id(), DTU.radio_id(), index)
            .payload(payload)
            .finish();
        Fragment::from_bytes(&packet)
    }

    #[test]
    fn test_builder_layout() {
        let packet = PacketBuilder::new(0x15, INVERTER.radio_id(), DTU.radio_id(), 0x80)
            .payload(&[0x10, 0x00])
            .finish();

        assert_eq!(packet.len(), 13);
        assert_eq!(packet[0], 0x15);
        assert_eq!(&packet[1..5], &[0x80, 0x12, 0x34, 0x56]);
        assert_eq!(&packet[5..9], &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(packet[9], 0x80);
        assert_eq!(&packet[10..12], &[0x10, 0x00]);
        assert_eq!(packet[12], crc8(&packet[..12]));
    }

    #[test]
    fn test_builder_truncates_payload() {
        let packet = PacketBuilder::new(0x15, INVERTER.radio_id(), DTU.radio_id(), 0x80)
            .payload(&[0xAA; 64])
            .finish();
        assert_eq!(packet.len(), MAX_RF_PAYLOAD_SIZE);
        assert!(check_crc8(&packet));
    }

    #[test]
    fn test_fragment_fields() {
        let fragment = response(0x83, &[0x01, 0x02, 0x03]);

        assert!(fragment.crc_valid());
        assert_eq!(fragment.main_cmd(), Some(0x95));
        assert_eq!(fragment.index(), Some(3));
        assert!(fragment.is_last());
        assert!(INVERTER.radio_id().matches(fragment.inverter_id().unwrap()));
        assert!(DTU.radio_id().matches(fragment.dtu_id().unwrap()));
        assert_eq!(fragment.payload(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_fragment_corrupted() {
        let mut fragment = response(0x01, &[0x01, 0x02]);
        let last = fragment.len() - 1;
        fragment.data[last] ^= 0xFF;

        assert!(!fragment.crc_valid());
        assert_eq!(fragment.index(), Some(1));
        assert!(!fragment.is_last());
    }

    #[test]
    fn test_fragment_too_short() {
        let fragment = Fragment::from_bytes(&[0x95, 0x01, 0x02]);
        assert!(!fragment.is_well_formed());
        assert!(!fragment.crc_valid());
        assert_eq!(fragment.index(), None);
        assert!(fragment.payload().is_empty());
    }

    #[test]
    fn test_retransmit_request() {
        let packet = retransmit_request(INVERTER.radio_id(), DTU.radio_id(), 2);
        assert_eq!(packet.len(), 11);
        assert_eq!(packet[0], MAIN_CMD_MULTI_DATA);
        assert_eq!(packet[9], 0x82);
        assert!(check_crc8(&packet));
    }
}
