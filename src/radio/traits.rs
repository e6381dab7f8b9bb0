//! Radio transport trait for abstraction and testability
//!
//! The protocol engine only ever talks to the radio through this trait,
//! so the CMT2300A frequency-hopping radio can be swapped for a mock.

use crate::protocol::Fragment;

/// Errors that can occur on the radio link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Chip did not accept the packet
    TransmitFailed,
    /// Nothing buffered to read
    NothingReceived,
    /// Radio not initialised
    NotInitialised,
    /// SPI communication error
    SpiError,
}

/// Packet level radio interface used by the protocol engine
///
/// None of these calls may block beyond a single hardware access.
pub trait Transport {
    /// Transmit one complete packet (CRC-8 included)
    fn send(&mut self, packet: &[u8]) -> Result<(), TransportError>;

    /// Whether a received fragment is waiting
    fn receive_available(&mut self) -> bool;

    /// Take the oldest received fragment
    fn receive(&mut self) -> Result<Fragment, TransportError>;

    /// Frequency currently used, for logging
    fn frequency_hz(&self) -> u32 {
        0
    }
}

#[cfg(test)]
pub mod mock {
    //! Mock transport for testing

    use super::*;
    use crate::protocol::Packet;
    use core::cell::RefCell;
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Mock transport for unit testing
    pub struct MockTransport {
        /// Fragments returned by receive()
        rx_queue: RefCell<VecDeque<Fragment>>,
        /// Record of transmitted packets
        tx_history: RefCell<Vec<Packet>>,
        /// Error to return on next send
        next_tx_error: RefCell<Option<TransportError>>,
    }

    impl MockTransport {
        /// Create a new mock transport
        pub fn new() -> Self {
            Self {
                rx_queue: RefCell::new(VecDeque::new()),
                tx_history: RefCell::new(Vec::new()),
                next_tx_error: RefCell::new(None),
            }
        }

        /// Queue raw bytes to be received
        pub fn queue_rx(&self, bytes: &[u8]) {
            self.rx_queue
                .borrow_mut()
                .push_back(Fragment::from_bytes(bytes));
        }

        /// Set an error to be returned by the next send() call
        pub fn set_next_tx_error(&self, error: TransportError) {
            *self.next_tx_error.borrow_mut() = Some(error);
        }

        /// Get all transmitted packets
        pub fn tx_history(&self) -> Vec<Packet> {
            self.tx_history.borrow().clone()
        }

        /// Most recently transmitted packet
        pub fn last_tx(&self) -> Option<Packet> {
            self.tx_history.borrow().last().cloned()
        }

        pub fn tx_count(&self) -> usize {
            self.tx_history.borrow().len()
        }

        pub fn pending_rx(&self) -> usize {
            self.rx_queue.borrow().len()
        }
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for MockTransport {
        fn send(&mut self, packet: &[u8]) -> Result<(), TransportError> {
            // Failed sends are still recorded as attempts
            let mut copy = Packet::new();
            let _ = copy.extend_from_slice(packet);
            self.tx_history.borrow_mut().push(copy);

            match self.next_tx_error.borrow_mut().take() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }

        fn receive_available(&mut self) -> bool {
            !self.rx_queue.borrow().is_empty()
        }

        fn receive(&mut self) -> Result<Fragment, TransportError> {
            self.rx_queue
                .borrow_mut()
                .pop_front()
                .ok_or(TransportError::NothingReceived)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_send() {
            let mut transport = MockTransport::new();
            transport.send(&[0x01, 0x02, 0x03]).unwrap();

            let history = transport.tx_history();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].as_slice(), &[0x01, 0x02, 0x03]);
        }

        #[test]
        fn test_mock_receive_fifo() {
            let mut transport = MockTransport::new();
            assert!(!transport.receive_available());

            transport.queue_rx(&[0x01]);
            transport.queue_rx(&[0x02]);

            assert!(transport.receive_available());
            assert_eq!(transport.receive().unwrap().data.as_slice(), &[0x01]);
            assert_eq!(transport.receive().unwrap().data.as_slice(), &[0x02]);
            assert_eq!(transport.receive(), Err(TransportError::NothingReceived));
        }

        #[test]
        fn test_mock_tx_error() {
            let mut transport = MockTransport::new();
            transport.set_next_tx_error(TransportError::TransmitFailed);

            assert_eq!(transport.send(&[0x01]), Err(TransportError::TransmitFailed));

            // Error should be cleared, next call should succeed
            transport.send(&[0x02]).unwrap();
            assert_eq!(transport.tx_count(), 2);
        }
    }
}
