//! Read the grid compliance profile stored in an inverter
//!
//! Request: multi-data command with data type 0x10.
//!
//! Response payload (after reassembly and CRC-16 removal):
//! ```text
//! [l_idx: u8][h_idx: u8][version: 2][(item_id: u8, raw: i16 BE)...]
//! ```

use crate::commands::types::{
    reassemble_payload, Command, CommandError, FailureReason,
};
use crate::config::protocol::{LAST_FRAGMENT_FLAG, MAIN_CMD_MULTI_DATA};
use crate::parser::{GridProfile, ProfileVersion};
use crate::protocol::crc::crc16;
use crate::protocol::{DeviceSerial, Fragment, Packet, PacketBuilder, RadioId};
use alloc::sync::Arc;
use alloc::vec::Vec;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Multi-data type selecting the grid profile
const DATA_TYPE_GRID_PROFILE: u8 = 0x10;

/// Profile type and version bytes before the item records
const PROFILE_HEADER_LEN: usize = 4;

/// Item id plus big-endian raw value
const RECORD_LEN: usize = 3;

pub type GridProfileResult = Result<GridProfile, FailureReason>;

/// Where a [`GridProfileCommand`] publishes its result
pub type GridProfileSignal = Signal<CriticalSectionRawMutex, GridProfileResult>;

/// Fetch and decode an inverter's grid profile
pub struct GridProfileCommand {
    target: DeviceSerial,
    timestamp: u32,
    result: Arc<GridProfileSignal>,
}

impl GridProfileCommand {
    /// `timestamp` is the current unix time, echoed by the inverter
    pub fn new(target: DeviceSerial, timestamp: u32, result: Arc<GridProfileSignal>) -> Self {
        Self {
            target,
            timestamp,
            result,
        }
    }

    /// Split the profile payload into type bytes, version, and item records.
    ///
    /// A trailing partial record is ignored.
    pub fn parse_payload(payload: &[u8]) -> Result<GridProfile, CommandError> {
        if payload.len() < PROFILE_HEADER_LEN {
            return Err(CommandError::ResponseTooShort);
        }

        let type_bytes = (payload[0], payload[1]);
        let version = ProfileVersion::from_bytes([payload[2], payload[3]]);
        let items: Vec<(u8, i16)> = payload[PROFILE_HEADER_LEN..]
            .chunks_exact(RECORD_LEN)
            .map(|record| (record[0], i16::from_be_bytes([record[1], record[2]])))
            .collect();

        Ok(GridProfile::new(type_bytes, version, &items))
    }
}

impl Command for GridProfileCommand {
    fn name(&self) -> &'static str {
        "GridProfile"
    }

    fn target(&self) -> DeviceSerial {
        self.target
    }

    fn build_initial_packet(&self, dtu: RadioId) -> Packet {
        let mut body = [0u8; 14];
        body[0] = DATA_TYPE_GRID_PROFILE;
        body[2..6].copy_from_slice(&self.timestamp.to_be_bytes());
        // bytes 6..10 gap, 10..14 password, all zero

        PacketBuilder::new(
            MAIN_CMD_MULTI_DATA,
            self.target.radio_id(),
            dtu,
            LAST_FRAGMENT_FLAG,
        )
        .payload(&body)
        .payload(&crc16(&body).to_be_bytes())
        .finish()
    }

    fn on_fragment_complete(&mut self, fragments: &[Fragment]) -> Result<(), CommandError> {
        let expected = MAIN_CMD_MULTI_DATA | 0x80;
        if fragments.iter().any(|f| f.main_cmd() != Some(expected)) {
            return Err(CommandError::UnexpectedResponse);
        }

        let payload = reassemble_payload(fragments)?;
        let profile = Self::parse_payload(&payload)?;
        log::info!(
            "Grid profile of {}: {} v{} ({} values)",
            self.target,
            profile.name,
            profile.version,
            profile.entries.len()
        );
        self.result.signal(Ok(profile));
        Ok(())
    }

    fn on_final_failure(&mut self, reason: FailureReason) {
        self.result.signal(Err(reason));
    }
}
