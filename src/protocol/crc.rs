//! Checksums used on the inverter radio link
//!
//! - CRC-8 (polynomial 0x01, init 0x00) closes every radio packet.
//! - CRC-16/MODBUS closes the reassembled payload of a multi-fragment
//!   exchange, transmitted big-endian.

use crc::{Algorithm, Crc, CRC_16_MODBUS};

/// CRC-8 variant used by the inverters (not part of the CRC catalogue)
const CRC_8_HOYMILES: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x01,
    init: 0x00,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0x31,
    residue: 0x00,
};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_HOYMILES);
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Packet checksum over `data`
pub fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// Payload checksum over `data`
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Check that the last byte of `packet` is the CRC-8 of everything before it
pub fn check_crc8(packet: &[u8]) -> bool {
    match packet.split_last() {
        Some((&crc, body)) => crc8(body) == crc,
        None => false,
    }
}

/// Check that the last two bytes of `payload` are its big-endian CRC-16
pub fn check_crc16(payload: &[u8]) -> bool {
    if payload.len() < 2 {
        return false;
    }
    let (body, tail) = payload.split_at(payload.len() - 2);
    crc16(body) == u16::from_be_bytes([tail[0], tail[1]])
}
