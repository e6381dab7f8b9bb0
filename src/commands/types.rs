//! Command abstraction consumed by the radio protocol engine
//!
//! A command owns its request bytes and the interpretation of the response.
//! The engine only sees this trait: it sends [`Command::build_initial_packet`],
//! collects CRC-verified fragments, and then calls exactly one of
//! [`Command::on_fragment_complete`] or [`Command::on_final_failure`].

use crate::config::engine::{
    DEFAULT_MAX_RESEND_COUNT, DEFAULT_MAX_RETRANSMIT_COUNT, DEFAULT_TIMEOUT_MS,
};
use crate::config::protocol::{MAX_RF_FRAGMENT_COUNT, MAX_RF_PAYLOAD_SIZE};
use crate::protocol::crc::check_crc16;
use crate::protocol::{DeviceSerial, Fragment, Packet, RadioId};
use alloc::boxed::Box;
use heapless::Vec;

/// Largest reassembled response payload
pub const MAX_RESPONSE_SIZE: usize = MAX_RF_FRAGMENT_COUNT * MAX_RF_PAYLOAD_SIZE;

/// Reasons a command cannot make sense of its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Reassembled payload shorter than the command expects
    ResponseTooShort,
    /// CRC-16 over the reassembled payload does not match
    CrcMismatch,
    /// Response main command does not belong to this request
    UnexpectedResponse,
}

/// Why a command ended without a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Nothing arrived, even after resending the whole request
    NoResponse,
    /// Single-fragment re-requests ran out before the response was complete
    RetransmitExhausted,
    /// The maximum number of fragments arrived without a last one
    Unterminated,
    /// The response was complete but the command rejected it
    InvalidResponse(CommandError),
}

/// Report handed back by the engine when a command leaves it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    pub name: &'static str,
    pub target: DeviceSerial,
    pub result: Result<(), FailureReason>,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// A request to one inverter and the handling of its response
pub trait Command {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Inverter the request is addressed to
    fn target(&self) -> DeviceSerial;

    /// Request packet sent from `dtu` to the target
    fn build_initial_packet(&self, dtu: RadioId) -> Packet;

    /// How long to wait for the next fragment
    fn timeout_ms(&self) -> u32 {
        DEFAULT_TIMEOUT_MS
    }

    /// How often the whole request may be repeated when nothing arrives
    fn max_resend_count(&self) -> u8 {
        DEFAULT_MAX_RESEND_COUNT
    }

    /// How many single fragments may be re-requested
    fn max_retransmit_count(&self) -> u8 {
        DEFAULT_MAX_RETRANSMIT_COUNT
    }

    /// Interpret the complete response, fragments ordered by index
    fn on_fragment_complete(&mut self, fragments: &[Fragment]) -> Result<(), CommandError>;

    /// Terminal failure notification
    fn on_final_failure(&mut self, reason: FailureReason);
}

/// Commands travel through the queue as trait objects
pub type BoxedCommand = Box<dyn Command + Send>;

/// Concatenate fragment payloads and strip the trailing CRC-16.
pub fn reassemble_payload(
    fragments: &[Fragment],
) -> Result<Vec<u8, MAX_RESPONSE_SIZE>, CommandError> {
    let mut payload: Vec<u8, MAX_RESPONSE_SIZE> = Vec::new();
    for fragment in fragments {
        payload
            .extend_from_slice(fragment.payload())
            .map_err(|_| CommandError::ResponseTooShort)?;
    }

    if payload.len() < 2 {
        return Err(CommandError::ResponseTooShort);
    }
    if !check_crc16(&payload) {
        return Err(CommandError::CrcMismatch);
    }

    payload.truncate(payload.len() - 2);
    Ok(payload)
}
