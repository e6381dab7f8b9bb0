//! Interrupt to poll-loop hand-off
//!
//! The chip's two interrupt lines only set a flag here. All protocol work
//! happens later, when the poll loop takes the flag. No locks are taken.

use core::sync::atomic::{AtomicBool, Ordering};

/// Flags raised by the "packet received" and "packet sent" interrupt lines
pub struct IrqFlags {
    packet_received: AtomicBool,
    packet_sent: AtomicBool,
}

impl IrqFlags {
    pub const fn new() -> Self {
        Self {
            packet_received: AtomicBool::new(false),
            packet_sent: AtomicBool::new(false),
        }
    }

    /// Interrupt handler for the "packet received" line
    pub fn on_packet_received(&self) {
        self.packet_received.store(true, Ordering::Release);
    }

    /// Interrupt handler for the "packet sent" line
    pub fn on_packet_sent(&self) {
        self.packet_sent.store(true, Ordering::Release);
    }

    /// Read and clear the "packet received" flag
    pub fn take_packet_received(&self) -> bool {
        self.packet_received.swap(false, Ordering::AcqRel)
    }

    /// Read and clear the "packet sent" flag
    pub fn take_packet_sent(&self) -> bool {
        self.packet_sent.swap(false, Ordering::AcqRel)
    }
}

impl Default for IrqFlags {
    fn default() -> Self {
        Self::new()
    }
}
