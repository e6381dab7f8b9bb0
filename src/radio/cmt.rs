//! Frequency-hopping transport for the CMT2300A sub-GHz radio
//!
//! Keeps the DTU's target frequency inside the active country's legal limits
//! and maps it onto the chip's channel grid:
//!
//! ```text
//! frequency = band base + channel * CHANNEL_WIDTH_HZ
//! ```
//!
//! The chip refuses channel changes while receiving, so every retune is a
//! stop-listening / set-channel / start-listening sequence.

use crate::config::cmt::CHANNEL_WIDTH_HZ;
use crate::config::engine::FRAGMENT_BUFFER_SIZE;
use crate::config::protocol::{MAIN_CMD_CHANNEL_CHANGE, MAX_RF_PAYLOAD_SIZE};
use crate::config::RadioConfig;
use crate::protocol::Fragment;
use crate::radio::country::{
    CountryFrequencyDefinition, CountryFrequencyList, CountryMode, FrequencyBand,
    COUNTRY_FREQUENCY_LIST,
};
use crate::radio::irq::IrqFlags;
use crate::radio::traits::{Transport, TransportError};
use heapless::{Deque, Vec};
use log::{debug, info, trace, warn};

/// Errors reported by the chip driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipError {
    /// Chip did not answer on SPI
    NotConnected,
    /// SPI transfer failed
    SpiError,
    /// Target frequency has no channel in the active band
    InvalidFrequency,
}

/// Rejected frequency input; state is left untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyError {
    /// Outside the active country's legal limits
    OutOfLegalRange,
    /// Outside what the hardware can tune to
    OutOfHardwareRange,
    /// Chip failed while retuning
    Chip(ChipError),
}

impl From<ChipError> for FrequencyError {
    fn from(error: ChipError) -> Self {
        FrequencyError::Chip(error)
    }
}

/// Register-level CMT2300A driver
///
/// Implemented per board; the SPI and GPIO details live behind this trait.
pub trait CmtChip {
    /// Reset and configure the chip
    fn begin(&mut self) -> Result<(), ChipError>;

    fn is_chip_connected(&mut self) -> bool;

    fn start_listening(&mut self) -> Result<(), ChipError>;

    fn stop_listening(&mut self) -> Result<(), ChipError>;

    /// A packet is waiting in the RX FIFO
    fn available(&mut self) -> bool;

    /// PKT_OK status flag, polled when the interrupt line is not wired
    fn rx_fifo_available(&mut self) -> bool;

    /// Length of the packet at the head of the RX FIFO
    fn dynamic_payload_size(&mut self) -> u8;

    /// Read the packet at the head of the RX FIFO
    fn read(&mut self, buf: &mut [u8]);

    fn write(&mut self, data: &[u8]) -> Result<(), ChipError>;

    fn set_channel(&mut self, channel: u8) -> Result<(), ChipError>;

    fn channel(&mut self) -> u8;

    fn rssi_dbm(&mut self) -> i16;

    fn set_pa_level(&mut self, level_dbm: i8) -> Result<(), ChipError>;

    fn set_frequency_band(&mut self, band: FrequencyBand) -> Result<(), ChipError>;

    fn flush_rx(&mut self);
}

/// CMT2300A transport with country-aware frequency management
pub struct CmtRadio<'a, C: CmtChip> {
    chip: C,
    irq: Option<&'a IrqFlags>,
    rx_buffer: Deque<Fragment, FRAGMENT_BUFFER_SIZE>,
    country_mode: CountryMode,
    target_frequency_hz: u32,
    pa_level_dbm: i8,
    initialised: bool,
}

impl<'a, C: CmtChip> CmtRadio<'a, C> {
    /// Create an uninitialised radio.
    ///
    /// An initial frequency that is illegal for the configured country is
    /// replaced by that country's default.
    pub fn new(chip: C, config: &RadioConfig) -> Self {
        let definition = config.country_mode.definition();
        let requested = config.initial_frequency_hz();
        let target_frequency_hz = if definition.is_legal(requested) {
            requested
        } else {
            warn!(
                "{} Hz is not legal in {:?}, using {} Hz",
                requested, config.country_mode, definition.freq_default_hz
            );
            definition.freq_default_hz
        };

        Self {
            chip,
            irq: None,
            rx_buffer: Deque::new(),
            country_mode: config.country_mode,
            target_frequency_hz,
            pa_level_dbm: config.pa_level_dbm,
            initialised: false,
        }
    }

    /// Use the interrupt lines instead of polling the RX FIFO flag
    pub fn with_interrupts(mut self, irq: &'a IrqFlags) -> Self {
        self.irq = Some(irq);
        self
    }

    /// Bring up the chip and tune to the target frequency
    pub fn init(&mut self) -> Result<(), ChipError> {
        self.chip.begin()?;
        if !self.chip.is_chip_connected() {
            warn!("CMT2300A not connected");
            return Err(ChipError::NotConnected);
        }

        self.chip.set_frequency_band(self.definition().band)?;
        self.chip.set_pa_level(self.pa_level_dbm)?;

        let channel = self
            .channel_from_frequency(self.target_frequency_hz)
            .map_err(|_| ChipError::InvalidFrequency)?;
        self.chip.set_channel(channel)?;
        self.chip.start_listening()?;

        self.initialised = true;
        info!(
            "CMT2300A ready, {:?} at {} Hz (channel {})",
            self.country_mode, self.target_frequency_hz, channel
        );
        Ok(())
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn is_connected(&mut self) -> bool {
        self.initialised && self.chip.is_chip_connected()
    }

    pub fn set_pa_level(&mut self, level_dbm: i8) -> Result<(), ChipError> {
        self.pa_level_dbm = level_dbm;
        if !self.initialised {
            return Ok(());
        }
        self.chip.set_pa_level(level_dbm)
    }

    pub fn country_mode(&self) -> CountryMode {
        self.country_mode
    }

    /// Switch regulatory domain.
    ///
    /// Falls back to the new domain's default frequency if the current
    /// target is not legal there. Never fails; chip errors are logged.
    pub fn set_country_mode(&mut self, mode: CountryMode) {
        self.country_mode = mode;
        let definition = mode.definition();

        if !definition.is_legal(self.target_frequency_hz) {
            info!(
                "{} Hz not legal in {:?}, switching to {} Hz",
                self.target_frequency_hz, mode, definition.freq_default_hz
            );
            self.target_frequency_hz = definition.freq_default_hz;
        }

        if !self.initialised {
            return;
        }
        if let Err(e) = self.chip.set_frequency_band(definition.band) {
            warn!("Setting frequency band failed: {:?}", e);
        }
        if let Err(e) = self.switch_dtu_frequency(self.target_frequency_hz) {
            warn!("Retuning after country change failed: {:?}", e);
        }
    }

    pub fn target_frequency(&self) -> u32 {
        self.target_frequency_hz
    }

    /// Move the DTU to `frequency_hz`.
    ///
    /// Rejected without touching any state if the frequency is outside the
    /// legal limits of the active country.
    pub fn set_target_frequency(&mut self, frequency_hz: u32) -> Result<(), FrequencyError> {
        if !self.definition().is_legal(frequency_hz) {
            warn!(
                "{} Hz rejected, {:?} allows {}..={} Hz",
                frequency_hz,
                self.country_mode,
                self.definition().freq_legal_min_hz,
                self.definition().freq_legal_max_hz
            );
            return Err(FrequencyError::OutOfLegalRange);
        }

        if self.initialised {
            self.switch_dtu_frequency(frequency_hz)?;
        }
        self.target_frequency_hz = frequency_hz;
        Ok(())
    }

    /// Lowest frequency the hardware supports in the active country
    pub fn min_frequency(&self) -> u32 {
        self.definition().freq_min_hz
    }

    /// Highest frequency the hardware supports in the active country
    pub fn max_frequency(&self) -> u32 {
        self.definition().freq_max_hz
    }

    pub const fn channel_width() -> u32 {
        CHANNEL_WIDTH_HZ
    }

    /// Frequency a freshly started inverter listens on
    pub fn inverter_boot_frequency(&self) -> u32 {
        self.definition().freq_startup_hz
    }

    /// Frequency of a channel, clamped to the hardware limits
    pub fn frequency_from_channel(&self, channel: u8) -> u32 {
        let base = self.definition().band.base_frequency_hz();
        let frequency = base.saturating_add(u32::from(channel) * CHANNEL_WIDTH_HZ);
        frequency.clamp(self.min_frequency(), self.max_frequency())
    }

    /// Channel for a frequency, rounding down to the channel boundary
    pub fn channel_from_frequency(&self, frequency_hz: u32) -> Result<u8, FrequencyError> {
        let definition = self.definition();
        if !definition.in_hardware_range(frequency_hz) {
            return Err(FrequencyError::OutOfHardwareRange);
        }
        if !definition.is_legal(frequency_hz) {
            return Err(FrequencyError::OutOfLegalRange);
        }

        let offset = frequency_hz
            .checked_sub(definition.band.base_frequency_hz())
            .ok_or(FrequencyError::OutOfHardwareRange)?;
        u8::try_from(offset / CHANNEL_WIDTH_HZ).map_err(|_| FrequencyError::OutOfHardwareRange)
    }

    /// All supported regulatory domains
    pub fn country_frequency_list() -> &'static [CountryFrequencyList] {
        &COUNTRY_FREQUENCY_LIST
    }

    pub fn chip(&self) -> &C {
        &self.chip
    }

    pub fn chip_mut(&mut self) -> &mut C {
        &mut self.chip
    }

    fn definition(&self) -> &'static CountryFrequencyDefinition {
        self.country_mode.definition()
    }

    /// Stop listening, retune, and resume.
    ///
    /// Listening resumes even if the retune fails.
    fn switch_dtu_frequency(&mut self, frequency_hz: u32) -> Result<(), FrequencyError> {
        let channel = self.channel_from_frequency(frequency_hz)?;
        self.chip.stop_listening()?;
        let tuned = self.chip.set_channel(channel);
        self.chip.start_listening()?;
        tuned?;
        debug!("DTU on {} Hz (channel {})", frequency_hz, channel);
        Ok(())
    }

    /// Retune while already stopped
    fn tune(&mut self, frequency_hz: u32) -> Result<(), FrequencyError> {
        let channel = self.channel_from_frequency(frequency_hz)?;
        self.chip.set_channel(channel)?;
        Ok(())
    }

    /// Move everything the chip has received into the fragment buffer
    fn service(&mut self) {
        if !self.initialised {
            return;
        }

        let received = match self.irq {
            Some(flags) => {
                if flags.take_packet_sent() {
                    trace!("TX done");
                }
                flags.take_packet_received()
            }
            None => self.chip.rx_fifo_available(),
        };
        if !received {
            return;
        }

        while self.chip.available() {
            if self.rx_buffer.is_full() {
                warn!("RX buffer full, dropping packets");
                break;
            }

            let len = usize::from(self.chip.dynamic_payload_size()).min(MAX_RF_PAYLOAD_SIZE);
            let mut buf = [0u8; MAX_RF_PAYLOAD_SIZE];
            self.chip.read(&mut buf[..len]);

            let mut data = Vec::new();
            let _ = data.extend_from_slice(&buf[..len]);
            let fragment = Fragment {
                data,
                rssi: self.chip.rssi_dbm(),
                channel: self.chip.channel(),
            };
            let _ = self.rx_buffer.push_back(fragment);
        }
        self.chip.flush_rx();
    }
}

impl<C: CmtChip> Transport for CmtRadio<'_, C> {
    fn send(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        if !self.initialised {
            return Err(TransportError::NotInitialised);
        }

        self.chip
            .stop_listening()
            .map_err(|_| TransportError::SpiError)?;

        // Inverters only hear channel change requests on their boot frequency
        let channel_change = packet.first() == Some(&MAIN_CMD_CHANNEL_CHANGE);
        if channel_change {
            let boot = self.inverter_boot_frequency();
            if let Err(e) = self.tune(boot) {
                warn!("Tuning to boot frequency {} Hz failed: {:?}", boot, e);
            }
        }

        let result = self
            .chip
            .write(packet)
            .map_err(|_| TransportError::TransmitFailed);

        if channel_change {
            if let Err(e) = self.tune(self.target_frequency_hz) {
                warn!("Returning to {} Hz failed: {:?}", self.target_frequency_hz, e);
            }
        }
        self.chip
            .start_listening()
            .map_err(|_| TransportError::SpiError)?;

        result
    }

    fn receive_available(&mut self) -> bool {
        self.service();
        !self.rx_buffer.is_empty()
    }

    fn receive(&mut self) -> Result<Fragment, TransportError> {
        self.rx_buffer
            .pop_front()
            .ok_or(TransportError::NothingReceived)
    }

    fn frequency_hz(&self) -> u32 {
        self.target_frequency_hz
    }
}


#[cfg(test)]
mod tests {
    use super::mock::{ChipCall, MockCmtChip};
    use super::*;

    fn radio(mode: CountryMode) -> CmtRadio<'static, MockCmtChip> {
        let config = RadioConfig {
            country_mode: mode,
            ..RadioConfig::default()
        };
        CmtRadio::new(MockCmtChip::new(), &config)
    }

    fn ready_radio(mode: CountryMode) -> CmtRadio<'static, MockCmtChip> {
        let mut radio = radio(mode);
        radio.init().unwrap();
        radio.chip_mut().calls.clear();
        radio
    }

    #[test]
    fn test_init_tunes_target() {
        let mut radio = radio(CountryMode::Eu);
        radio.init().unwrap();

        let chip = radio.chip();
        assert_eq!(chip.band, Some(FrequencyBand::Band860));
        assert_eq!(chip.pa_level_dbm, Some(0));
        // 865 MHz = 860 MHz + 20 * 250 kHz
        assert_eq!(chip.channel, 20);
        assert!(chip.listening);
        assert!(radio.is_initialised());
    }

    #[test]
    fn test_init_not_connected() {
        let mut radio = radio(CountryMode::Eu);
        radio.chip_mut().connected = false;
        assert_eq!(radio.init(), Err(ChipError::NotConnected));
        assert!(!radio.is_initialised());
    }

    #[test]
    fn test_illegal_configured_frequency_replaced() {
        let config = RadioConfig {
            country_mode: CountryMode::Us,
            target_frequency_hz: Some(868_000_000),
            ..RadioConfig::default()
        };
        let radio = CmtRadio::new(MockCmtChip::new(), &config);
        assert_eq!(radio.target_frequency(), 918_000_000);
    }

    #[test]
    fn test_channel_round_trip_over_legal_range() {
        for mode in CountryMode::ALL {
            let radio = radio(mode);
            let d = mode.definition();
            let first = radio.channel_from_frequency(d.freq_legal_min_hz).unwrap();
            let last = radio.channel_from_frequency(d.freq_legal_max_hz).unwrap();

            for channel in first..=last {
                let frequency = radio.frequency_from_channel(channel);
                assert_eq!(radio.channel_from_frequency(frequency), Ok(channel), "{:?}", mode);
            }
        }
    }

    #[test]
    fn test_channel_rounds_down() {
        let radio = radio(CountryMode::Eu);
        assert_eq!(radio.channel_from_frequency(868_000_000), Ok(32));
        assert_eq!(radio.channel_from_frequency(868_249_999), Ok(32));
        assert_eq!(radio.channel_from_frequency(868_250_000), Ok(33));
    }

    #[test]
    fn test_channel_from_illegal_frequency() {
        let radio = radio(CountryMode::Eu);
        assert_eq!(
            radio.channel_from_frequency(862_000_000),
            Err(FrequencyError::OutOfLegalRange)
        );
        assert_eq!(
            radio.channel_from_frequency(950_000_000),
            Err(FrequencyError::OutOfHardwareRange)
        );
    }

    #[test]
    fn test_frequency_from_channel_clamped() {
        let radio = radio(CountryMode::Us);
        assert_eq!(radio.frequency_from_channel(0), 905_000_000);
        assert_eq!(radio.frequency_from_channel(72), 918_000_000);
        assert_eq!(radio.frequency_from_channel(255), 925_000_000);
    }

    #[test]
    fn test_set_target_frequency_retunes() {
        let mut radio = ready_radio(CountryMode::Eu);

        radio.set_target_frequency(868_000_000).unwrap();

        assert_eq!(radio.target_frequency(), 868_000_000);
        assert_eq!(
            radio.chip().calls,
            [
                ChipCall::StopListening,
                ChipCall::SetChannel(32),
                ChipCall::StartListening
            ]
        );
    }

    #[test]
    fn test_set_target_frequency_rejects_illegal() {
        let mut radio = ready_radio(CountryMode::Eu);

        for frequency in [862_750_000, 870_250_000, 915_000_000] {
            assert_eq!(
                radio.set_target_frequency(frequency),
                Err(FrequencyError::OutOfLegalRange)
            );
            assert_eq!(radio.target_frequency(), 865_000_000);
        }
        assert!(radio.chip().calls.is_empty());
    }

    #[test]
    fn test_failed_retune_keeps_target_and_listens() {
        let mut radio = ready_radio(CountryMode::Eu);
        radio.chip_mut().fail_next_set_channel = true;

        assert_eq!(
            radio.set_target_frequency(868_000_000),
            Err(FrequencyError::Chip(ChipError::SpiError))
        );
        assert_eq!(radio.target_frequency(), 865_000_000);
        assert!(radio.chip().listening);
        assert_eq!(radio.chip().channel, 20);

        radio.set_target_frequency(868_000_000).unwrap();
        assert_eq!(radio.target_frequency(), 868_000_000);
        assert_eq!(radio.chip().channel, 32);
    }

    #[test]
    fn test_failed_retune_on_country_change_keeps_listening() {
        let mut radio = ready_radio(CountryMode::Eu);
        radio.chip_mut().fail_next_set_channel = true;

        radio.set_country_mode(CountryMode::Us);

        assert_eq!(radio.target_frequency(), 918_000_000);
        assert!(radio.chip().listening);
        assert_eq!(
            radio.chip().calls,
            [ChipCall::StopListening, ChipCall::StartListening]
        );
    }

    #[test]
    fn test_set_target_frequency_before_init() {
        let mut radio = radio(CountryMode::Eu);
        radio.set_target_frequency(869_000_000).unwrap();
        assert_eq!(radio.target_frequency(), 869_000_000);
        assert!(radio.chip().calls.is_empty());
    }

    #[test]
    fn test_country_change_resets_illegal_frequency() {
        let mut radio = ready_radio(CountryMode::Eu);

        radio.set_country_mode(CountryMode::Us);

        assert_eq!(radio.country_mode(), CountryMode::Us);
        assert_eq!(radio.target_frequency(), CountryMode::Us.definition().freq_default_hz);
        assert_eq!(radio.chip().band, Some(FrequencyBand::Band900));
        assert_eq!(radio.chip().channel, 72);
    }

    #[test]
    fn test_country_change_keeps_legal_frequency() {
        let mut radio = ready_radio(CountryMode::Us);
        radio.set_target_frequency(920_000_000).unwrap();

        radio.set_country_mode(CountryMode::Br);
        assert_eq!(radio.target_frequency(), 920_000_000);
    }

    #[test]
    fn test_country_list() {
        let list = CmtRadio::<MockCmtChip>::country_frequency_list();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].mode, CountryMode::Eu);
    }

    #[test]
    fn test_send_requires_init() {
        let mut radio = radio(CountryMode::Eu);
        assert_eq!(radio.send(&[0x15]), Err(TransportError::NotInitialised));
    }

    #[test]
    fn test_send_on_target_channel() {
        let mut radio = ready_radio(CountryMode::Eu);
        radio.send(&[0x15, 0x01]).unwrap();

        assert_eq!(radio.chip().writes, [(20, std::vec![0x15, 0x01])]);
        assert!(radio.chip().listening);
    }

    #[test]
    fn test_channel_change_sent_on_boot_frequency() {
        let mut radio = ready_radio(CountryMode::Eu);
        radio.send(&[MAIN_CMD_CHANNEL_CHANGE, 0x01]).unwrap();

        // 868 MHz boot frequency is channel 32, target 865 MHz is channel 20
        assert_eq!(radio.chip().writes[0].0, 32);
        assert_eq!(
            radio.chip().calls,
            [
                ChipCall::StopListening,
                ChipCall::SetChannel(32),
                ChipCall::Write(32),
                ChipCall::SetChannel(20),
                ChipCall::StartListening
            ]
        );
    }

    #[test]
    fn test_send_failure_still_resumes_listening() {
        let mut radio = ready_radio(CountryMode::Eu);
        radio.chip_mut().fail_next_write = true;

        assert_eq!(radio.send(&[0x15]), Err(TransportError::TransmitFailed));
        assert!(radio.chip().listening);
    }

    #[test]
    fn test_receive_polling_fifo() {
        let mut radio = ready_radio(CountryMode::Eu);
        radio.chip_mut().inject(&[0x95, 0x01, 0x02]);
        radio.chip_mut().inject(&[0x95, 0x03]);

        assert!(radio.receive_available());
        let first = radio.receive().unwrap();
        assert_eq!(first.data.as_slice(), &[0x95, 0x01, 0x02]);
        assert_eq!(first.rssi, -70);
        assert_eq!(first.channel, 20);
        assert_eq!(radio.receive().unwrap().data.as_slice(), &[0x95, 0x03]);
        assert_eq!(radio.receive(), Err(TransportError::NothingReceived));
    }

    #[test]
    fn test_receive_waits_for_interrupt() {
        static FLAGS: IrqFlags = IrqFlags::new();

        let mut radio = radio(CountryMode::Eu).with_interrupts(&FLAGS);
        radio.init().unwrap();
        radio.chip_mut().inject(&[0x95, 0x01]);

        assert!(!radio.receive_available());

        FLAGS.on_packet_received();
        assert!(radio.receive_available());
        assert_eq!(radio.receive().unwrap().data.as_slice(), &[0x95, 0x01]);
    }

    #[test]
    fn test_rx_buffer_overflow_flushes() {
        let mut radio = ready_radio(CountryMode::Eu);
        for i in 0..(FRAGMENT_BUFFER_SIZE + 5) {
            radio.chip_mut().inject(&[0x95, i as u8]);
        }

        assert!(radio.receive_available());
        assert!(radio.chip().rx_fifo.is_empty());
        assert_eq!(radio.chip().flush_count, 1);

        let mut count = 0;
        while radio.receive().is_ok() {
            count += 1;
        }
        assert_eq!(count, FRAGMENT_BUFFER_SIZE);
    }
}
