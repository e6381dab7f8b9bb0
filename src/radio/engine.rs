//! Command/response protocol engine
//!
//! Runs one command at a time over a half-duplex [`Transport`]:
//!
//! ```text
//! Idle --pop + send--> AwaitingResponse --last fragment, complete--> Done --report--> Idle
//!                        |        ^
//!               timeout  |        | valid fragment
//!          or CRC error  v        |
//!                       Retransmitting
//! ```
//!
//! Every [`RadioEngine::poll`] performs at most one transition and at most
//! one transmission, so it never blocks beyond a single transport call.

use crate::commands::{BoxedCommand, CommandOutcome, FailureReason};
use crate::config::protocol::MAX_RF_FRAGMENT_COUNT;
use crate::config::RadioConfig;
use crate::protocol::fragment::retransmit_request;
use crate::protocol::{DeviceSerial, Fragment, FragmentBuffer, Packet, RadioId, Reassembly};
use crate::radio::traits::Transport;
use crate::util::{Clock, CommandQueue, TimeoutTracker};
use log::{debug, info, trace, warn};

/// Engine state machine position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No command in flight
    Idle,
    /// Request sent, collecting fragments
    AwaitingResponse,
    /// Request or single fragment asked for again, collecting fragments
    Retransmitting,
    /// Exchange finished, outcome not yet handed to the command
    Done,
}

/// Bookkeeping for the single command in flight
struct Session {
    command: BoxedCommand,
    inverter: RadioId,
    last_packet: Packet,
    fragments: FragmentBuffer,
    resend_count: u8,
    retransmit_count: u8,
    outcome: Option<Result<(), FailureReason>>,
}

/// Radio protocol engine
///
/// Owns the transport and the in-flight session; commands come in through a
/// shared [`CommandQueue`] that any context may push to.
pub struct RadioEngine<'q, T: Transport, K: Clock> {
    transport: T,
    queue: &'q CommandQueue<BoxedCommand>,
    dtu_serial: DeviceSerial,
    rx_timeout: TimeoutTracker<K>,
    state: EngineState,
    session: Option<Session>,
    /// Set once the current poll has sent something
    transmitted: bool,
}

impl<'q, T: Transport, K: Clock> RadioEngine<'q, T, K> {
    pub fn new(
        transport: T,
        queue: &'q CommandQueue<BoxedCommand>,
        clock: K,
        config: &RadioConfig,
    ) -> Self {
        Self {
            transport,
            queue,
            dtu_serial: config.dtu_serial,
            rx_timeout: TimeoutTracker::new(clock),
            state: EngineState::Idle,
            session: None,
            transmitted: false,
        }
    }

    /// Queue a command for transmission
    pub fn enqueue(&self, command: BoxedCommand) {
        self.queue.push(command);
    }

    /// Advance the exchange by one step.
    ///
    /// Returns the outcome of a command when it leaves the engine.
    pub fn poll(&mut self) -> Option<CommandOutcome> {
        match self.state {
            EngineState::Idle => {
                self.start_next();
                None
            }
            EngineState::AwaitingResponse | EngineState::Retransmitting => {
                self.service_exchange();
                None
            }
            EngineState::Done => self.finish(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// No command in flight
    pub fn is_idle(&self) -> bool {
        self.state == EngineState::Idle && self.session.is_none()
    }

    pub fn is_queue_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn dtu_serial(&self) -> DeviceSerial {
        self.dtu_serial
    }

    /// Change the source address; applies from the next command on
    pub fn set_dtu_serial(&mut self, serial: DeviceSerial) {
        info!("DTU serial set to {}", serial);
        self.dtu_serial = serial;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn start_next(&mut self) {
        let Some(command) = self.queue.pop() else {
            return;
        };

        // Anything still buffered belongs to an earlier exchange
        while self.transport.receive_available() {
            if self.transport.receive().is_err() {
                break;
            }
            trace!("Dropping stale fragment");
        }

        let dtu = self.dtu_serial.radio_id();
        let inverter = command.target().radio_id();
        let packet = command.build_initial_packet(dtu);

        debug!("{} -> {}", command.name(), command.target());
        transmit(&mut self.transport, &packet);
        self.rx_timeout.set(command.timeout_ms());

        self.session = Some(Session {
            command,
            inverter,
            last_packet: packet,
            fragments: FragmentBuffer::new(),
            resend_count: 0,
            retransmit_count: 0,
            outcome: None,
        });
        self.state = EngineState::AwaitingResponse;
    }

    fn service_exchange(&mut self) {
        let state = self.state;
        self.transmitted = false;
        while !self.transmitted && self.state == state && self.transport.receive_available() {
            match self.transport.receive() {
                Ok(fragment) => self.handle_fragment(fragment),
                Err(_) => break,
            }
        }

        if !self.transmitted && self.state == state && self.rx_timeout.occurred() {
            self.handle_timeout();
        }
    }

    fn handle_fragment(&mut self, fragment: Fragment) {
        let frequency = self.transport.frequency_hz();
        let dtu = self.dtu_serial.radio_id();
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if !fragment.is_well_formed() {
            trace!("Dropping runt packet ({} bytes)", fragment.len());
            return;
        }

        if !fragment.crc_valid() {
            match fragment.index() {
                Some(index) if (1..=MAX_RF_FRAGMENT_COUNT as u8).contains(&index) => {
                    warn!("CRC error in fragment {}", index);
                    self.request_fragment(index);
                }
                _ => warn!("CRC error, fragment id unusable"),
            }
            return;
        }

        let addressed_to_us = fragment.dtu_id().is_some_and(|id| dtu.matches(id))
            && fragment
                .inverter_id()
                .is_some_and(|id| session.inverter.matches(id));
        if !addressed_to_us {
            trace!("Ignoring foreign packet");
            return;
        }

        debug!(
            "RX {} Hz | {} dBm | {:02X?}",
            frequency,
            fragment.rssi,
            fragment.data.as_slice()
        );

        let last = fragment.is_last();
        if !session.fragments.insert(fragment) {
            trace!("Dropping fragment without index");
            return;
        }

        self.rx_timeout.reset();

        match session.fragments.status() {
            Reassembly::Complete => {
                debug!("Response complete, {} fragments", session.fragments.len());
                session.outcome = Some(Ok(()));
                self.state = EngineState::Done;
            }
            Reassembly::Missing(index) if last => {
                debug!("Last fragment seen, fragment {} missing", index);
                self.request_fragment(index);
            }
            Reassembly::Unterminated => {
                warn!("{} fragments without a last one", MAX_RF_FRAGMENT_COUNT);
                self.fail(FailureReason::Unterminated);
            }
            _ => self.state = EngineState::AwaitingResponse,
        }
    }

    fn handle_timeout(&mut self) {
        let Some(session) = self.session.as_mut() else {
            self.state = EngineState::Idle;
            return;
        };

        match session.fragments.status() {
            Reassembly::Empty => {
                session.resend_count += 1;
                if session.resend_count > session.command.max_resend_count() {
                    warn!("{}: no response from {}", session.command.name(), session.command.target());
                    self.fail(FailureReason::NoResponse);
                    return;
                }

                info!(
                    "{}: resending request ({}/{})",
                    session.command.name(),
                    session.resend_count,
                    session.command.max_resend_count()
                );
                transmit(&mut self.transport, &session.last_packet);
                self.transmitted = true;
                self.rx_timeout.set(session.command.timeout_ms());
                self.state = EngineState::Retransmitting;
            }
            Reassembly::Missing(index) => {
                debug!("Timeout, fragment {} missing", index);
                self.request_fragment(index);
            }
            Reassembly::Unterminated => self.fail(FailureReason::Unterminated),
            Reassembly::Complete => {
                session.outcome = Some(Ok(()));
                self.state = EngineState::Done;
            }
        }
    }

    /// Ask the inverter for a single fragment again
    fn request_fragment(&mut self, index: u8) {
        let dtu = self.dtu_serial.radio_id();
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.retransmit_count += 1;
        if session.retransmit_count > session.command.max_retransmit_count() {
            warn!(
                "{}: giving up on fragment {} after {} requests",
                session.command.name(),
                index,
                session.command.max_retransmit_count()
            );
            self.fail(FailureReason::RetransmitExhausted);
            return;
        }

        info!("Requesting fragment {}", index);
        let packet = retransmit_request(session.inverter, dtu, index);
        transmit(&mut self.transport, &packet);
        self.transmitted = true;
        session.last_packet = packet;
        self.rx_timeout.set(session.command.timeout_ms());
        self.state = EngineState::Retransmitting;
    }

    fn fail(&mut self, reason: FailureReason) {
        if let Some(session) = self.session.as_mut() {
            session.outcome = Some(Err(reason));
        }
        self.state = EngineState::Done;
    }

    /// Hand the result to the command and release the session
    fn finish(&mut self) -> Option<CommandOutcome> {
        self.state = EngineState::Idle;
        let mut session = self.session.take()?;

        let result = match session.outcome {
            Some(Ok(())) => {
                let ordered = session.fragments.ordered();
                match session.command.on_fragment_complete(&ordered) {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        let reason = FailureReason::InvalidResponse(e);
                        session.command.on_final_failure(reason);
                        Err(reason)
                    }
                }
            }
            Some(Err(reason)) => {
                session.command.on_final_failure(reason);
                Err(reason)
            }
            None => {
                session.command.on_final_failure(FailureReason::NoResponse);
                Err(FailureReason::NoResponse)
            }
        };

        let outcome = CommandOutcome {
            name: session.command.name(),
            target: session.command.target(),
            result,
        };
        match outcome.result {
            Ok(()) => info!("{} from {} succeeded", outcome.name, outcome.target),
            Err(reason) => warn!("{} from {} failed: {:?}", outcome.name, outcome.target, reason),
        }
        Some(outcome)
    }
}

fn transmit<T: Transport>(transport: &mut T, packet: &[u8]) {
    debug!("TX {} Hz | {:02X?}", transport.frequency_hz(), packet);
    if let Err(e) = transport.send(packet) {
        warn!("TX failed: {:?}", e);
    }
}
