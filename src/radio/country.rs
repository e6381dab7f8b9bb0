//! Regulatory frequency profiles per country

use crate::config::cmt::{BASE_FREQ_860_HZ, BASE_FREQ_900_HZ};

/// Frequency band the CMT2300A is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyBand {
    Band860,
    Band900,
}

impl FrequencyBand {
    /// Frequency of channel 0
    pub const fn base_frequency_hz(self) -> u32 {
        match self {
            FrequencyBand::Band860 => BASE_FREQ_860_HZ,
            FrequencyBand::Band900 => BASE_FREQ_900_HZ,
        }
    }
}

/// Regulatory domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryMode {
    Eu,
    Us,
    Br,
}

impl CountryMode {
    pub const ALL: [CountryMode; 3] = [CountryMode::Eu, CountryMode::Us, CountryMode::Br];

    /// Static frequency profile of this domain
    pub fn definition(self) -> &'static CountryFrequencyDefinition {
        &COUNTRY_FREQUENCY_LIST[self as usize].definition
    }
}

/// Frequency limits of one regulatory domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryFrequencyDefinition {
    pub band: FrequencyBand,
    /// Hardware limits
    pub freq_min_hz: u32,
    pub freq_max_hz: u32,
    /// Legal limits, always inside the hardware limits
    pub freq_legal_min_hz: u32,
    pub freq_legal_max_hz: u32,
    /// Used when the current frequency is illegal in this domain
    pub freq_default_hz: u32,
    /// Frequency a freshly started inverter listens on
    pub freq_startup_hz: u32,
}

impl CountryFrequencyDefinition {
    pub fn is_legal(&self, frequency_hz: u32) -> bool {
        (self.freq_legal_min_hz..=self.freq_legal_max_hz).contains(&frequency_hz)
    }

    pub fn in_hardware_range(&self, frequency_hz: u32) -> bool {
        (self.freq_min_hz..=self.freq_max_hz).contains(&frequency_hz)
    }
}

/// Table row pairing a mode with its limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryFrequencyList {
    pub mode: CountryMode,
    pub definition: CountryFrequencyDefinition,
}

/// Ordered by [`CountryMode`] discriminant
pub static COUNTRY_FREQUENCY_LIST: [CountryFrequencyList; 3] = [
    CountryFrequencyList {
        mode: CountryMode::Eu,
        definition: CountryFrequencyDefinition {
            band: FrequencyBand::Band860,
            freq_min_hz: 860_250_000,
            freq_max_hz: 923_500_000,
            freq_legal_min_hz: 863_000_000,
            freq_legal_max_hz: 870_000_000,
            freq_default_hz: 865_000_000,
            freq_startup_hz: 868_000_000,
        },
    },
    CountryFrequencyList {
        mode: CountryMode::Us,
        definition: CountryFrequencyDefinition {
            band: FrequencyBand::Band900,
            freq_min_hz: 905_000_000,
            freq_max_hz: 925_000_000,
            freq_legal_min_hz: 905_000_000,
            freq_legal_max_hz: 925_000_000,
            freq_default_hz: 918_000_000,
            freq_startup_hz: 915_000_000,
        },
    },
    CountryFrequencyList {
        mode: CountryMode::Br,
        definition: CountryFrequencyDefinition {
            band: FrequencyBand::Band900,
            freq_min_hz: 915_000_000,
            freq_max_hz: 928_000_000,
            freq_legal_min_hz: 915_000_000,
            freq_legal_max_hz: 928_000_000,
            freq_default_hz: 918_000_000,
            freq_startup_hz: 915_000_000,
        },
    },
];
