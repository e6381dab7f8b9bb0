//! Static grid profile lookup tables
//!
//! Linear scans with an explicit fallback entry; the largest table has 66 rows.

/// Country profile identified by its two index bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileType {
    pub l_idx: u8,
    pub h_idx: u8,
    pub name: &'static str,
}

/// Functional section of a grid profile, keyed by the high nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub id: u8,
    pub name: &'static str,
}

/// Display name, unit, and scale of one profile value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDefinition {
    pub id: u8,
    pub name: &'static str,
    pub unit: &'static str,
    pub divider: u8,
}

const fn profile(l_idx: u8, h_idx: u8, name: &'static str) -> ProfileType {
    ProfileType { l_idx, h_idx, name }
}

const fn section(id: u8, name: &'static str) -> Section {
    Section { id, name }
}

const fn item(id: u8, name: &'static str, unit: &'static str, divider: u8) -> ItemDefinition {
    ItemDefinition {
        id,
        name,
        unit,
        divider,
    }
}

/// Returned when the profile bytes match no known profile
pub const UNKNOWN_PROFILE: ProfileType = profile(0xFF, 0xFF, "Unknown");

/// Returned when an item's section nibble matches no known section
pub const UNKNOWN_SECTION: Section = section(0xFF, "Unknown");

/// Returned when the item id is not defined
pub const UNKNOWN_ITEM: ItemDefinition = item(0xFF, "Unknown Value", "", 1);

pub static PROFILE_TYPES: [ProfileType; 10] = [
    profile(0x02, 0x00, "US - NA_IEEE1547_240V"),
    profile(0x03, 0x00, "DE - DE_VDE4105_2018"),
    profile(0x03, 0x01, "XX - unknown"),
    profile(0x0a, 0x00, "XX - EN 50549-1:2019"),
    profile(0x0c, 0x00, "AT - AT_TOR_Erzeuger_default"),
    profile(0x0d, 0x04, "FR -"),
    profile(0x10, 0x00, "ES - ES_RD1699"),
    profile(0x12, 0x00, "PL - EU_EN50438"),
    profile(0x29, 0x00, "NL - NL_NEN-EN50549-1_2019"),
    profile(0x37, 0x00, "CH - CH_NA EEA-NE7-CH2020"),
];

pub static SECTIONS: [Section; 12] = [
    section(0x00, "Voltage (H/LVRT)"),
    section(0x10, "Frequency (H/LFRT)"),
    section(0x20, "Island Detection (ID)"),
    section(0x30, "Reconnection (RT)"),
    section(0x40, "Ramp Rates (RR)"),
    section(0x50, "Frequency Watt (FW)"),
    section(0x60, "Volt Watt (VW)"),
    section(0x70, "Active Power Control (APC)"),
    section(0x80, "Volt Var (VV)"),
    section(0x90, "Specified Power Factor (SPF)"),
    section(0xA0, "Reactive Power Control (RPC)"),
    section(0xB0, "Watt Power Factor (WPF)"),
];

pub static ITEM_DEFINITIONS: [ItemDefinition; 66] = [
    item(0x01, "Nominale Voltage (NV)", "V", 10),
    item(0x02, "Low Voltage 1 (LV1)", "V", 10),
    item(0x03, "LV1 Maximum Trip Time (MTT)", "s", 10),
    item(0x04, "High Voltage 1 (HV1)", "V", 10),
    item(0x05, "HV1 Maximum Trip Time (MTT)", "s", 10),
    item(0x06, "Low Voltage 2 (LV2)", "V", 10),
    item(0x07, "LV2 Maximum Trip Time (MTT)", "s", 100),
    item(0x08, "High Voltage 2 (HV2)", "V", 10),
    item(0x09, "HV2 Maximum Trip Time (MTT)", "s", 100),
    item(0x0A, "10mins Average High Voltage (AHV)", "V", 10),
    item(0x0B, "High Voltage 3 (HV3)", "V", 10),
    item(0x0C, "HV3 Maximum Trip Time (MTT)", "s", 100),
    item(0x0D, "Nominal Frequency", "Hz", 100),
    item(0x0E, "Low Frequency 1 (LF1)", "Hz", 100),
    item(0x0F, "LF1 Maximum Trip Time (MTT)", "s", 10),
    item(0x10, "High Frequency 1 (HF1)", "Hz", 100),
    item(0x11, "HF1 Maximum Trip time (MTT)", "s", 10),
    item(0x12, "Low Frequency 2 (LF2)", "Hz", 100),
    item(0x13, "LF2 Maximum Trip Time (MTT)", "s", 10),
    item(0x14, "High Frequency 2 (HF2)", "Hz", 100),
    item(0x15, "HF2 Maximum Trip time (MTT)", "s", 10),
    item(0x16, "ID Function Activated", "bool", 1),
    item(0x17, "Reconnect Time (RT)", "s", 10),
    item(0x18, "Reconnect High Voltage (RHV)", "V", 10),
    item(0x19, "Reconnect Low Voltage (RLV)", "V", 10),
    item(0x1A, "Reconnect High Frequency (RHF)", "Hz", 100),
    item(0x1B, "Reconnect Low Frequency (RLF)", "Hz", 100),
    item(0x1C, "Normal Ramp up Rate (RUR_NM)", "% Rated/s", 100),
    item(0x1D, "Soft Start Ramp up Rate (RUR_SS)", "% Rated/s", 100),
    item(0x1E, "FW Function Activated", "bool", 1),
    item(0x1F, "Start of Frequency Watt Droop (Fstart)", "Hz", 100),
    item(0x20, "FW Droop Slope (Kpower_Freq)", "%Pn/Hz", 10),
    item(0x21, "Recovery Ramp Rate (RRR)", "%Pn/s", 100),
    item(0x22, "Recovery High Frequency (RVHF)", "Hz", 100),
    item(0x23, "Recovery Low Frequency (RVLF)", "Hz", 100),
    item(0x24, "VW Function Activated", "bool", 1),
    item(0x25, "Start of Voltage Watt Droop (Vstart)", "V", 10),
    item(0x26, "End of Voltage Watt Droop (Vend)", "V", 10),
    item(0x27, "Droop Slope (Kpower_Volt)", "%Pn/V", 100),
    item(0x28, "APC Function Activated", "bool", 1),
    item(0x29, "Power Ramp Rate (PRR)", "%Pn/s", 100),
    item(0x2A, "VV Function Activated", "bool", 1),
    item(0x2B, "Voltage Set Point V1", "V", 10),
    item(0x2C, "Reactive Set Point Q1", "%Pn", 10),
    item(0x2D, "Voltage Set Point V2", "V", 10),
    item(0x2E, "Voltage Set Point V3", "V", 10),
    item(0x2F, "Voltage Set Point V4", "V", 10),
    item(0x30, "Reactive Set Point Q4", "%Pn", 10),
    item(0x31, "VV Setting Time (Tr)", "s", 10),
    item(0x32, "SPF Function Activated", "bool", 1),
    item(0x33, "Power Factor (PF)", "", 100),
    item(0x34, "RPC Function Activated", "bool", 1),
    item(0x35, "Reactive Power (VAR)", "%Sn", 1),
    item(0x36, "WPF Function Activated", "bool", 1),
    item(0x37, "Start of Power of WPF (Pstart)", "%Pn", 10),
    item(0x38, "Power Factor at Rated Power (PFRP)", "", 100),
    item(0x39, "Low Voltage 3 (LV3)", "V", 10),
    item(0x3A, "LV3 Maximum Trip Time (MTT)", "s", 100),
    item(0x3B, "Momentary Cessation Low Voltage", "V", 10),
    item(0x3C, "Momentary Cessation High Voltage", "V", 10),
    item(0x3D, "FW Settling Time (Tr)", "s", 10),
    item(0x3E, "LF2 Maximum Trip Time (MTT)", "s", 100),
    item(0x3F, "HF2 Maximum Trip Time (MTT)", "s", 100),
    item(0x40, "Short Interruption Reconnect Time (SRT)", "s", 10),
    item(0x41, "Short Interruption Time (SIT)", "s", 10),
    UNKNOWN_ITEM,
];

/// Profile for an index byte pair, or [`UNKNOWN_PROFILE`]
pub fn profile_type(l_idx: u8, h_idx: u8) -> &'static ProfileType {
    PROFILE_TYPES
        .iter()
        .find(|p| p.l_idx == l_idx && p.h_idx == h_idx)
        .unwrap_or(&UNKNOWN_PROFILE)
}

/// Section an item id belongs to, by its high nibble, or [`UNKNOWN_SECTION`]
pub fn section_for_item(item_id: u8) -> &'static Section {
    let id = item_id & 0xF0;
    SECTIONS
        .iter()
        .find(|s| s.id == id)
        .unwrap_or(&UNKNOWN_SECTION)
}

/// Definition of an item id, or [`UNKNOWN_ITEM`]
pub fn item_definition(item_id: u8) -> &'static ItemDefinition {
    ITEM_DEFINITIONS
        .iter()
        .find(|i| i.id == item_id)
        .unwrap_or(&UNKNOWN_ITEM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup() {
        assert_eq!(profile_type(0x03, 0x00).name, "DE - DE_VDE4105_2018");
        assert_eq!(profile_type(0x03, 0x01).name, "XX - unknown");
        assert_eq!(profile_type(0xFF, 0xFF), &UNKNOWN_PROFILE);
        assert_eq!(profile_type(0x00, 0x03), &UNKNOWN_PROFILE);
    }

    #[test]
    fn test_section_by_nibble() {
        assert_eq!(section_for_item(0x01).name, "Voltage (H/LVRT)");
        assert_eq!(section_for_item(0x1F).name, "Frequency (H/LFRT)");
        assert_eq!(section_for_item(0xB3).name, "Watt Power Factor (WPF)");
        assert_eq!(section_for_item(0xC0), &UNKNOWN_SECTION);
    }

    #[test]
    fn test_item_lookup() {
        let nv = item_definition(0x01);
        assert_eq!(nv.unit, "V");
        assert_eq!(nv.divider, 10);

        assert_eq!(item_definition(0x99), &UNKNOWN_ITEM);
        assert_eq!(item_definition(0xFF).name, "Unknown Value");
    }

    #[test]
    fn test_item_ids_unique_and_dividers_nonzero() {
        for (i, a) in ITEM_DEFINITIONS.iter().enumerate() {
            assert!(a.divider > 0, "{} has zero divider", a.name);
            for b in &ITEM_DEFINITIONS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }
}
