//! Move an inverter to another radio channel
//!
//! Inverters start up on the country's boot frequency. The transport sends
//! this request on that frequency and then returns to the target frequency,
//! where the inverter answers.

use crate::commands::types::{Command, CommandError, FailureReason};
use crate::config::protocol::MAIN_CMD_CHANNEL_CHANGE;
use crate::protocol::{DeviceSerial, Fragment, Packet, PacketBuilder, RadioId};

/// Tell an inverter which channel to hop to
pub struct ChannelChangeCommand {
    target: DeviceSerial,
    channel: u8,
}

impl ChannelChangeCommand {
    pub fn new(target: DeviceSerial, channel: u8) -> Self {
        Self { target, channel }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl Command for ChannelChangeCommand {
    fn name(&self) -> &'static str {
        "ChannelChange"
    }

    fn target(&self) -> DeviceSerial {
        self.target
    }

    fn build_initial_packet(&self, dtu: RadioId) -> Packet {
        PacketBuilder::new(MAIN_CMD_CHANNEL_CHANGE, self.target.radio_id(), dtu, 0x02)
            .payload(&[0x15, 0x21, self.channel, 0x14])
            .finish()
    }

    // Short window, many resends
    fn timeout_ms(&self) -> u32 {
        10
    }

    fn max_resend_count(&self) -> u8 {
        10
    }

    fn on_fragment_complete(&mut self, _fragments: &[Fragment]) -> Result<(), CommandError> {
        log::info!("{} now on channel {}", self.target, self.channel);
        Ok(())
    }

    fn on_final_failure(&mut self, reason: FailureReason) {
        log::warn!(
            "{} did not confirm channel {}: {:?}",
            self.target,
            self.channel,
            reason
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::crc::check_crc8;

    #[test]
    fn test_request_packet() {
        let inverter = DeviceSerial::new(0x1164_8012_3456);
        let dtu = DeviceSerial::new(0x1998_7856_3412);
        let command = ChannelChangeCommand::new(inverter, 20);

        let packet = command.build_initial_packet(dtu.radio_id());
        assert_eq!(packet.len(), 15);
        assert_eq!(packet[0], MAIN_CMD_CHANNEL_CHANGE);
        assert_eq!(packet[9], 0x02);
        assert_eq!(&packet[10..14], &[0x15, 0x21, 20, 0x14]);
        assert!(check_crc8(&packet));
    }

    #[test]
    fn test_any_response_accepted() {
        let mut command = ChannelChangeCommand::new(DeviceSerial::new(1), 20);
        assert_eq!(command.on_fragment_complete(&[]), Ok(()));
    }
}
