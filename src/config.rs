//! Hardware and protocol configuration for the CMT2300A based DTU

use crate::protocol::DeviceSerial;
use crate::radio::country::CountryMode;

/// CMT2300A channel grid
pub mod cmt {
    /// Frequency step of the fast hopping register (2.5 kHz)
    pub const ONE_STEP_SIZE_HZ: u32 = 2_500;

    /// Hop steps between two adjacent channels
    pub const FH_OFFSET: u32 = 100;

    /// Width of one channel in Hz
    pub const CHANNEL_WIDTH_HZ: u32 = FH_OFFSET * ONE_STEP_SIZE_HZ;

    /// Channel 0 of the 860 MHz band
    pub const BASE_FREQ_860_HZ: u32 = 860_000_000;

    /// Channel 0 of the 900 MHz band
    pub const BASE_FREQ_900_HZ: u32 = 900_000_000;
}

/// Protocol constants
pub mod protocol {
    /// Maximum size of a single radio packet, including header and CRC-8
    pub const MAX_RF_PAYLOAD_SIZE: usize = 32;

    /// Maximum number of fragments in one response
    pub const MAX_RF_FRAGMENT_COUNT: usize = 16;

    /// Header length: main command, two radio ids, fragment id
    pub const HEADER_LEN: usize = 10;

    /// Smallest valid packet: header plus CRC-8
    pub const MIN_PACKET_LEN: usize = HEADER_LEN + 1;

    /// Bit in the fragment id marking the last fragment
    pub const LAST_FRAGMENT_FLAG: u8 = 0x80;

    /// Main command used for multi-data requests and fragment re-requests
    pub const MAIN_CMD_MULTI_DATA: u8 = 0x15;

    /// Main command of the channel change request
    pub const MAIN_CMD_CHANNEL_CHANGE: u8 = 0x56;
}

/// Protocol engine tuning
pub mod engine {
    /// Response timeout if a command does not specify its own
    pub const DEFAULT_TIMEOUT_MS: u32 = 500;

    /// How often the whole request is sent again when nothing was received
    pub const DEFAULT_MAX_RESEND_COUNT: u8 = 3;

    /// How many single fragments may be re-requested per command
    pub const DEFAULT_MAX_RETRANSMIT_COUNT: u8 = 5;

    /// Inbound fragments buffered by the transport before parsing
    pub const FRAGMENT_BUFFER_SIZE: usize = 30;
}

/// Default radio configuration
pub mod radio_defaults {
    /// Working frequency of a factory-fresh DTU
    pub const WORK_FREQUENCY_HZ: u32 = 865_000_000;

    pub const DTU_SERIAL: u64 = 0x0001_9978_5634_1200;

    pub const PA_LEVEL_DBM: i8 = 0;

    /// Poll cadence of the embedded radio task
    pub const POLL_INTERVAL_MS: u64 = 5;
}

/// Runtime radio configuration, supplied once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioConfig {
    /// Serial of this DTU, used as the over-the-air source address
    pub dtu_serial: DeviceSerial,
    /// Regulatory domain
    pub country_mode: CountryMode,
    /// Initial target frequency; `None` keeps the working default
    pub target_frequency_hz: Option<u32>,
    /// Transmit power in dBm
    pub pa_level_dbm: i8,
    /// Poll cadence of the radio task in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            dtu_serial: DeviceSerial::new(radio_defaults::DTU_SERIAL),
            country_mode: CountryMode::Eu,
            target_frequency_hz: None,
            pa_level_dbm: radio_defaults::PA_LEVEL_DBM,
            poll_interval_ms: radio_defaults::POLL_INTERVAL_MS,
        }
    }
}

impl RadioConfig {
    /// Frequency the radio should start on
    pub fn initial_frequency_hz(&self) -> u32 {
        self.target_frequency_hz
            .unwrap_or(radio_defaults::WORK_FREQUENCY_HZ)
    }
}
