//! The link state machine.
//!
//! [`LinkFramer`] performs no I/O and reads no clock. The owner feeds it
//! received bytes and the current time, drains the bytes it wants written
//! with [`LinkFramer::poll_transmit`], collects [`LinkEvent`]s with
//! [`LinkFramer::poll_event`], and calls [`LinkFramer::handle_timeout`] once
//! the instant returned by [`LinkFramer::poll_timeout`] has passed.
//!
//! # Reliability
//!
//! DATA frames carry a 3-bit frame number and piggyback the receiver's
//! acknowledgement number. Up to `window_size` frames may be unacknowledged.
//! The receiver acknowledges cumulatively, buffers out-of-order frames that
//! fall inside the window, and sends one NAK naming the first missing frame
//! until that frame arrives. The sender retransmits a NAK'd frame at once and
//! the oldest outstanding frame whenever the adaptive timeout expires.

use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use crate::config::LinkConfig;
use crate::constants::*;
use crate::control::Control;
use crate::error::{FramingError, LinkError};
use crate::frame::{AshFrame, FrameDecoder, Inbound};
use crate::timer::RetransmitTimer;

/// Externally visible link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No link has been established, or it was closed.
    Disconnected,
    /// A reset request is outstanding.
    Resetting,
    /// Connected with nothing queued or awaiting acknowledgement.
    Idle,
    /// Connected; payloads are queued but the peer is not ready for them.
    Held,
    /// Connected; the oldest unacknowledged frame has this number.
    AwaitingAck(u8),
    /// The link failed and must be reset.
    Failed,
}

/// Something the owner must act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The reset handshake completed. Seen again while connected, it means
    /// the peer reset and every outstanding frame was discarded.
    Connected { reset_code: u8 },
    /// A DATA payload arrived in order.
    Delivered(Vec<u8>),
    /// The link is dead.
    Failed(LinkError),
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub data_sent: u64,
    pub data_delivered: u64,
    pub retransmissions: u64,
    pub timeouts: u64,
    pub naks_sent: u64,
    pub naks_received: u64,
    pub framing_errors: u64,
    pub duplicates: u64,
    pub out_of_order: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Disconnected,
    Resetting { attempts: u32, deadline: Instant },
    Connected,
    Failed,
}

/// A DATA frame sent and not yet acknowledged.
#[derive(Debug, Clone)]
struct LinkPacket {
    seq: u8,
    payload: Vec<u8>,
    retries: u32,
    sent_at: Instant,
}

#[inline]
fn next_seq(seq: u8) -> u8 {
    (seq + 1) % SEQUENCE_MODULUS
}

#[inline]
fn seq_distance(from: u8, to: u8) -> u8 {
    to.wrapping_sub(from) % SEQUENCE_MODULUS
}

/// Sans-IO reliable link endpoint.
#[derive(Debug)]
pub struct LinkFramer {
    config: LinkConfig,
    phase: Phase,
    decoder: FrameDecoder,
    timer: RetransmitTimer,

    /// Number given to the next new DATA frame.
    next_frame: u8,
    /// Payloads waiting for window space.
    queue: VecDeque<Vec<u8>>,
    /// Sent and unacknowledged, oldest first; numbers are contiguous.
    outstanding: VecDeque<LinkPacket>,

    /// Next frame number expected from the peer.
    expected: u8,
    /// Out-of-order frames held until the gap fills.
    reorder: BTreeMap<u8, Vec<u8>>,
    /// A NAK has been sent for the current gap.
    reject: bool,
    /// An acknowledgement is owed to the peer.
    ack_pending: bool,

    local_ready: bool,
    /// Set while the peer is not ready; DATA resumes at this instant even
    /// if no ready signal arrives.
    peer_hold: Option<Instant>,

    transmit: VecDeque<Vec<u8>>,
    events: VecDeque<LinkEvent>,
    stats: LinkStats,
}

impl LinkFramer {
    /// Create a framer. Fails if the configuration is out of range.
    pub fn new(config: LinkConfig) -> Result<Self, LinkError> {
        config.validate()?;
        let timer = RetransmitTimer::new(
            config.ack_timeout_init(),
            config.ack_timeout_min(),
            config.ack_timeout_max(),
        );
        Ok(LinkFramer {
            config,
            phase: Phase::Disconnected,
            decoder: FrameDecoder::new(),
            timer,
            next_frame: 0,
            queue: VecDeque::new(),
            outstanding: VecDeque::new(),
            expected: 0,
            reorder: BTreeMap::new(),
            reject: false,
            ack_pending: false,
            local_ready: true,
            peer_hold: None,
            transmit: VecDeque::new(),
            events: VecDeque::new(),
            stats: LinkStats::default(),
        })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn state(&self) -> LinkState {
        match self.phase {
            Phase::Disconnected => LinkState::Disconnected,
            Phase::Resetting { .. } => LinkState::Resetting,
            Phase::Failed => LinkState::Failed,
            Phase::Connected => match self.outstanding.front() {
                Some(packet) => LinkState::AwaitingAck(packet.seq),
                None if !self.queue.is_empty() => LinkState::Held,
                None => LinkState::Idle,
            },
        }
    }

    pub fn is_connected(&self) -> bool {
        self.phase == Phase::Connected
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Payloads queued or awaiting acknowledgement.
    pub fn pending_len(&self) -> usize {
        self.queue.len() + self.outstanding.len()
    }

    // ========================================================================
    // Owner inputs
    // ========================================================================

    /// Start (or restart) the reset handshake.
    pub fn reset(&mut self, now: Instant) {
        log::debug!("link reset requested");
        self.clear_link();
        self.decoder.clear();
        self.transmit.clear();
        self.phase = Phase::Resetting {
            attempts: 1,
            deadline: now + self.config.reset_timeout(),
        };
        self.emit(AshFrame::rst());
    }

    /// Queue a payload for reliable delivery.
    pub fn send(&mut self, payload: &[u8], now: Instant) -> Result<(), LinkError> {
        if self.phase != Phase::Connected {
            return Err(LinkError::NotConnected);
        }
        if payload.is_empty() {
            return Err(LinkError::EmptyPayload);
        }
        if payload.len() > MAX_DATA_LEN {
            return Err(LinkError::PayloadTooLarge {
                length: payload.len(),
                max: MAX_DATA_LEN,
            });
        }
        self.queue.push_back(payload.to_vec());
        self.pump(now);
        Ok(())
    }

    /// Process bytes read from the channel.
    pub fn receive(&mut self, bytes: &[u8], now: Instant) {
        self.decoder.push(bytes);
        while let Some(inbound) = self.decoder.next() {
            match inbound {
                Inbound::Frame(frame) => {
                    self.stats.frames_received += 1;
                    self.handle_frame(frame, now);
                }
                Inbound::Malformed(err) => self.handle_malformed(err),
                Inbound::Xon => self.set_peer_ready(true, now),
                Inbound::Xoff => self.set_peer_ready(false, now),
            }
        }
        self.pump(now);
        self.flush_ack();
    }

    /// Drive timers. Call when [`Self::poll_timeout`] has passed.
    pub fn handle_timeout(&mut self, now: Instant) {
        match self.phase {
            Phase::Resetting { attempts, deadline } if now >= deadline => {
                if attempts >= self.config.max_reset_attempts {
                    log::warn!("no reset acknowledgement after {} attempts", attempts);
                    self.fail(LinkError::ResetFailed { attempts });
                    return;
                }
                log::debug!("reset attempt {} timed out, retrying", attempts);
                self.phase = Phase::Resetting {
                    attempts: attempts + 1,
                    deadline: now + self.config.reset_timeout(),
                };
                self.emit(AshFrame::rst());
            }
            Phase::Connected => {
                if self.peer_hold.is_some_and(|until| now >= until) {
                    log::debug!("peer not-ready expired, resuming");
                    self.peer_hold = None;
                    self.pump(now);
                }
                self.check_retransmit(now);
            }
            _ => {}
        }
    }

    /// Instant at which [`Self::handle_timeout`] should next be called.
    pub fn poll_timeout(&self) -> Option<Instant> {
        match self.phase {
            Phase::Resetting { deadline, .. } => Some(deadline),
            Phase::Connected => {
                let retransmit = self
                    .outstanding
                    .front()
                    .map(|packet| packet.sent_at + self.timer.timeout());
                let hold = self.peer_hold.filter(|_| !self.queue.is_empty());
                match (retransmit, hold) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                }
            }
            _ => None,
        }
    }

    /// Next chunk of bytes to write to the channel.
    pub fn poll_transmit(&mut self) -> Option<Vec<u8>> {
        self.transmit.pop_front()
    }

    /// Next event for the owner.
    pub fn poll_event(&mut self) -> Option<LinkEvent> {
        self.events.pop_front()
    }

    /// Tell the peer whether we can accept DATA frames.
    pub fn set_ready(&mut self, ready: bool) {
        if self.local_ready == ready {
            return;
        }
        self.local_ready = ready;
        if self.phase == Phase::Connected {
            self.emit(AshFrame::ack(self.expected, !ready));
        }
    }

    /// Drop all link state. Pending payloads are discarded.
    pub fn close(&mut self) {
        log::debug!(
            "link closed with {} payloads pending",
            self.queue.len() + self.outstanding.len()
        );
        self.clear_link();
        self.decoder.clear();
        self.transmit.clear();
        self.phase = Phase::Disconnected;
    }

    // ========================================================================
    // Inbound frames
    // ========================================================================

    fn handle_frame(&mut self, frame: AshFrame, now: Instant) {
        log::trace!("rx {}", frame.control);
        match frame.control {
            Control::Rst => self.handle_rst(),
            Control::RstAck => self.handle_rst_ack(&frame.data),
            Control::Error => self.handle_error(&frame.data),
            _ if self.phase != Phase::Connected => {
                log::debug!("ignoring {} while not connected", frame.control);
            }
            Control::Data {
                frame_number,
                ack_number,
                ..
            } => {
                self.process_ack(ack_number, now);
                self.handle_data(frame_number, frame.data);
            }
            Control::Ack {
                ack_number,
                not_ready,
            } => {
                self.set_peer_ready(!not_ready, now);
                self.process_ack(ack_number, now);
            }
            Control::Nak {
                ack_number,
                not_ready,
            } => {
                self.stats.naks_received += 1;
                self.set_peer_ready(!not_ready, now);
                self.process_ack(ack_number, now);
                self.retransmit(ack_number, now);
            }
        }
    }

    fn handle_malformed(&mut self, err: FramingError) {
        self.stats.framing_errors += 1;
        log::warn!("dropping malformed frame: {}", err);
        if self.phase == Phase::Connected {
            self.send_nak();
        }
    }

    /// The peer asked for a reset: acknowledge and start afresh.
    fn handle_rst(&mut self) {
        log::debug!("peer requested link reset");
        self.clear_link();
        self.phase = Phase::Connected;
        self.emit(AshFrame::rst_ack(RESET_SOFTWARE));
        self.events.push_back(LinkEvent::Connected {
            reset_code: RESET_SOFTWARE,
        });
    }

    fn handle_rst_ack(&mut self, data: &[u8]) {
        let (version, reset_code) = (data[0], data[1]);
        match self.phase {
            Phase::Resetting { .. } | Phase::Connected => {}
            _ => {
                log::debug!("ignoring RSTACK while {:?}", self.state());
                return;
            }
        }
        if version != ASH_VERSION {
            self.fail(LinkError::UnsupportedVersion(version));
            return;
        }
        if self.phase == Phase::Connected {
            log::warn!("peer reset (code 0x{:02X}), discarding window", reset_code);
            self.clear_link();
        } else {
            log::debug!("link connected (reset code 0x{:02X})", reset_code);
        }
        self.phase = Phase::Connected;
        self.events.push_back(LinkEvent::Connected { reset_code });
    }

    fn handle_error(&mut self, data: &[u8]) {
        let code = data[1];
        if self.phase == Phase::Failed {
            return;
        }
        log::warn!("peer reported error 0x{:02X}", code);
        self.fail(LinkError::PeerError { code });
    }

    fn handle_data(&mut self, frame_number: u8, data: Vec<u8>) {
        let distance = seq_distance(self.expected, frame_number);

        if distance == 0 {
            self.deliver(data);
            self.expected = next_seq(self.expected);
            while let Some(buffered) = self.reorder.remove(&self.expected) {
                self.deliver(buffered);
                self.expected = next_seq(self.expected);
            }
            self.reject = false;
            self.ack_pending = true;
        } else if distance < MAX_WINDOW {
            self.stats.out_of_order += 1;
            log::trace!(
                "buffering frame {} while expecting {}",
                frame_number,
                self.expected
            );
            self.reorder.entry(frame_number).or_insert(data);
            self.send_nak();
        } else {
            self.stats.duplicates += 1;
            log::trace!("duplicate frame {}, re-acknowledging", frame_number);
            self.ack_pending = true;
        }
    }

    fn deliver(&mut self, data: Vec<u8>) {
        self.stats.data_delivered += 1;
        self.events.push_back(LinkEvent::Delivered(data));
    }

    /// Release every outstanding frame numbered before `ack_number`.
    fn process_ack(&mut self, ack_number: u8, now: Instant) {
        let base = match self.outstanding.front() {
            Some(packet) => packet.seq,
            None => return,
        };
        let acked = seq_distance(base, ack_number) as usize;
        if acked > self.outstanding.len() {
            log::debug!(
                "ignoring ack {} outside window starting at {}",
                ack_number,
                base
            );
            return;
        }
        for packet in self.outstanding.drain(..acked) {
            if packet.retries == 0 {
                self.timer.on_ack(now.saturating_duration_since(packet.sent_at));
            }
        }
    }

    // ========================================================================
    // Outbound frames
    // ========================================================================

    /// A not-ready signal restarts the hold; a ready signal ends it.
    fn set_peer_ready(&mut self, ready: bool, now: Instant) {
        self.peer_hold = if ready {
            None
        } else {
            Some(now + self.config.not_ready_timeout())
        };
    }

    /// Send queued payloads while the window and the peer allow.
    fn pump(&mut self, now: Instant) {
        if self.phase != Phase::Connected || self.peer_hold.is_some() {
            return;
        }
        while self.outstanding.len() < self.config.window_size as usize {
            let Some(payload) = self.queue.pop_front() else {
                break;
            };
            let seq = self.next_frame;
            self.next_frame = next_seq(seq);
            self.stats.data_sent += 1;
            self.emit(AshFrame::data(seq, self.expected, false, payload.clone()));
            self.ack_pending = false;
            self.outstanding.push_back(LinkPacket {
                seq,
                payload,
                retries: 0,
                sent_at: now,
            });
        }
    }

    fn check_retransmit(&mut self, now: Instant) {
        let timeout = self.timer.timeout();
        let (seq, retries) = match self.outstanding.front() {
            Some(packet) if now >= packet.sent_at + timeout => (packet.seq, packet.retries),
            _ => return,
        };
        self.stats.timeouts += 1;
        if retries >= self.config.max_retries {
            log::warn!("frame {} unacknowledged after {} retries", seq, retries);
            self.emit(AshFrame::error(ERROR_EXCEEDED_MAX_ACK_TIMEOUTS));
            self.fail(LinkError::RetryLimitExceeded { seq, retries });
            return;
        }
        self.timer.on_timeout();
        self.retransmit(seq, now);
    }

    fn retransmit(&mut self, seq: u8, now: Instant) {
        let ack_number = self.expected;
        let Some(packet) = self.outstanding.iter_mut().find(|p| p.seq == seq) else {
            return;
        };
        packet.retries += 1;
        packet.sent_at = now;
        let frame = AshFrame::data(seq, ack_number, true, packet.payload.clone());
        log::debug!("retransmitting frame {} (retry {})", seq, packet.retries);
        self.stats.retransmissions += 1;
        self.ack_pending = false;
        self.emit(frame);
    }

    fn send_nak(&mut self) {
        if self.reject {
            return;
        }
        self.reject = true;
        self.stats.naks_sent += 1;
        self.emit(AshFrame::nak(self.expected, !self.local_ready));
    }

    fn flush_ack(&mut self) {
        if self.ack_pending && self.phase == Phase::Connected {
            self.ack_pending = false;
            self.emit(AshFrame::ack(self.expected, !self.local_ready));
        }
    }

    fn emit(&mut self, frame: AshFrame) {
        log::trace!("tx {}", frame.control);
        self.stats.frames_sent += 1;
        self.transmit.push_back(frame.encode());
    }

    fn fail(&mut self, err: LinkError) {
        self.clear_link();
        self.phase = Phase::Failed;
        self.events.push_back(LinkEvent::Failed(err));
    }

    /// Forget windows, queues and sequence numbers.
    fn clear_link(&mut self) {
        self.next_frame = 0;
        self.expected = 0;
        self.queue.clear();
        self.outstanding.clear();
        self.reorder.clear();
        self.reject = false;
        self.ack_pending = false;
        self.peer_hold = None;
        self.timer = RetransmitTimer::new(
            self.config.ack_timeout_init(),
            self.config.ack_timeout_min(),
            self.config.ack_timeout_max(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn connected_pair(now: Instant) -> (LinkFramer, LinkFramer) {
        let mut host = LinkFramer::new(LinkConfig::default()).unwrap();
        let mut ncp = LinkFramer::new(LinkConfig::default()).unwrap();
        host.reset(now);
        shuttle(&mut host, &mut ncp, now);
        assert!(host.is_connected());
        assert!(ncp.is_connected());
        drain_events(&mut host);
        drain_events(&mut ncp);
        (host, ncp)
    }

    fn shuttle(a: &mut LinkFramer, b: &mut LinkFramer, now: Instant) {
        loop {
            let mut moved = false;
            while let Some(bytes) = a.poll_transmit() {
                b.receive(&bytes, now);
                moved = true;
            }
            while let Some(bytes) = b.poll_transmit() {
                a.receive(&bytes, now);
                moved = true;
            }
            if !moved {
                break;
            }
        }
    }

    fn drain_events(framer: &mut LinkFramer) -> Vec<LinkEvent> {
        std::iter::from_fn(|| framer.poll_event()).collect()
    }

    #[test]
    fn test_reset_handshake() {
        let now = Instant::now();
        let mut host = LinkFramer::new(LinkConfig::default()).unwrap();
        let mut ncp = LinkFramer::new(LinkConfig::default()).unwrap();
        assert_eq!(host.state(), LinkState::Disconnected);
        assert_eq!(host.send(&[1], now), Err(LinkError::NotConnected));

        host.reset(now);
        assert_eq!(host.state(), LinkState::Resetting);
        assert_eq!(host.poll_timeout(), Some(now + Duration::from_millis(3200)));

        shuttle(&mut host, &mut ncp, now);
        assert_eq!(host.state(), LinkState::Idle);
        assert_eq!(
            drain_events(&mut host),
            vec![LinkEvent::Connected {
                reset_code: RESET_SOFTWARE
            }]
        );
        assert_eq!(host.poll_timeout(), None);
    }

    #[test]
    fn test_data_exchange_and_ack() {
        let now = Instant::now();
        let (mut host, mut ncp) = connected_pair(now);

        host.send(&[0x01, 0x02], now).unwrap();
        assert_eq!(host.state(), LinkState::AwaitingAck(0));
        shuttle(&mut host, &mut ncp, now);

        assert_eq!(
            drain_events(&mut ncp),
            vec![LinkEvent::Delivered(vec![0x01, 0x02])]
        );
        assert_eq!(host.state(), LinkState::Idle);
    }

    #[test]
    fn test_window_limits_outstanding() {
        let now = Instant::now();
        let (mut host, _ncp) = connected_pair(now);
        for i in 0..6u8 {
            host.send(&[i], now).unwrap();
        }
        let mut frames = 0;
        while host.poll_transmit().is_some() {
            frames += 1;
        }
        assert_eq!(frames, 4);
        assert_eq!(host.pending_len(), 6);
    }

    #[test]
    fn test_payload_limits() {
        let now = Instant::now();
        let (mut host, _ncp) = connected_pair(now);
        assert_eq!(host.send(&[], now), Err(LinkError::EmptyPayload));
        assert_eq!(
            host.send(&[0u8; 129], now),
            Err(LinkError::PayloadTooLarge {
                length: 129,
                max: 128
            })
        );
    }

    #[test]
    fn test_out_of_order_buffered_and_nakked() {
        let now = Instant::now();
        let (mut host, mut ncp) = connected_pair(now);

        host.send(&[0xA0], now).unwrap();
        host.send(&[0xA1], now).unwrap();
        let first = host.poll_transmit().unwrap();
        let second = host.poll_transmit().unwrap();

        // Frame 1 arrives before frame 0.
        ncp.receive(&second, now);
        let nak = ncp.poll_transmit().unwrap();
        assert_eq!(nak, AshFrame::nak(0, false).encode());
        assert!(drain_events(&mut ncp).is_empty());

        // The NAK triggers an immediate retransmission of frame 0.
        host.receive(&nak, now);
        let retx = host.poll_transmit().unwrap();
        assert_eq!(retx, AshFrame::data(0, 0, true, vec![0xA0]).encode());

        ncp.receive(&retx, now);
        assert_eq!(
            drain_events(&mut ncp),
            vec![
                LinkEvent::Delivered(vec![0xA0]),
                LinkEvent::Delivered(vec![0xA1])
            ]
        );
        assert_eq!(ncp.poll_transmit(), Some(AshFrame::ack(2, false).encode()));

        // The late original is now a duplicate.
        ncp.receive(&first, now);
        assert!(drain_events(&mut ncp).is_empty());
        assert_eq!(ncp.stats().duplicates, 1);
    }

    #[test]
    fn test_corrupt_frame_nakked_once() {
        let now = Instant::now();
        let (mut host, mut ncp) = connected_pair(now);
        host.send(&[0x10, 0x20], now).unwrap();
        let mut bytes = host.poll_transmit().unwrap();
        let last = bytes.len() - 2;
        bytes[last] ^= 0x01;

        ncp.receive(&bytes, now);
        ncp.receive(&bytes, now);
        assert_eq!(ncp.stats().framing_errors, 2);
        assert_eq!(ncp.stats().naks_sent, 1);
    }

    #[test]
    fn test_timeout_retransmits_then_fails() {
        let start = Instant::now();
        let (mut host, _ncp) = connected_pair(start);
        host.send(&[0x55], start).unwrap();
        host.poll_transmit();

        let mut now = start;
        for _ in 0..4 {
            now = host.poll_timeout().unwrap();
            host.handle_timeout(now);
            assert!(host.poll_transmit().is_some());
            assert!(drain_events(&mut host).is_empty());
        }

        now = host.poll_timeout().unwrap();
        host.handle_timeout(now);
        assert_eq!(
            host.poll_transmit(),
            Some(AshFrame::error(ERROR_EXCEEDED_MAX_ACK_TIMEOUTS).encode())
        );
        assert_eq!(
            drain_events(&mut host),
            vec![LinkEvent::Failed(LinkError::RetryLimitExceeded {
                seq: 0,
                retries: 4
            })]
        );
        assert_eq!(host.state(), LinkState::Failed);
        assert_eq!(host.poll_timeout(), None);
        assert_eq!(host.stats().retransmissions, 4);
    }

    #[test]
    fn test_peer_error_fails_link() {
        let now = Instant::now();
        let (mut host, _ncp) = connected_pair(now);
        host.receive(&AshFrame::error(0x51).encode(), now);
        assert_eq!(
            drain_events(&mut host),
            vec![LinkEvent::Failed(LinkError::PeerError { code: 0x51 })]
        );
    }

    #[test]
    fn test_not_ready_holds_queue() {
        let now = Instant::now();
        let (mut host, mut ncp) = connected_pair(now);

        ncp.set_ready(false);
        shuttle(&mut host, &mut ncp, now);
        host.send(&[0x01], now).unwrap();
        assert_eq!(host.poll_transmit(), None);
        assert_eq!(host.state(), LinkState::Held);

        ncp.set_ready(true);
        shuttle(&mut host, &mut ncp, now);
        assert_eq!(
            drain_events(&mut ncp),
            vec![LinkEvent::Delivered(vec![0x01])]
        );
    }

    #[test]
    fn test_xoff_holds_until_xon() {
        let now = Instant::now();
        let (mut host, mut ncp) = connected_pair(now);

        host.receive(&[XOFF], now);
        host.send(&[0x07], now).unwrap();
        assert_eq!(host.poll_transmit(), None);
        assert_eq!(host.state(), LinkState::Held);
        assert_eq!(host.poll_timeout(), Some(now + Duration::from_millis(1000)));

        host.receive(&[XON], now);
        assert_eq!(host.state(), LinkState::AwaitingAck(0));
        shuttle(&mut host, &mut ncp, now);
        assert_eq!(
            drain_events(&mut ncp),
            vec![LinkEvent::Delivered(vec![0x07])]
        );
        assert_eq!(host.state(), LinkState::Idle);
    }

    #[test]
    fn test_not_ready_hold_expires() {
        let now = Instant::now();
        let (mut host, _ncp) = connected_pair(now);

        host.receive(&AshFrame::ack(0, true).encode(), now);
        host.send(&[0x08], now).unwrap();
        assert_eq!(host.poll_transmit(), None);

        // A second not-ready ACK restarts the hold.
        let later = now + Duration::from_millis(600);
        host.receive(&AshFrame::ack(0, true).encode(), later);
        let expiry = later + Duration::from_millis(1000);
        assert_eq!(host.poll_timeout(), Some(expiry));

        host.handle_timeout(now + Duration::from_millis(1000));
        assert_eq!(host.state(), LinkState::Held);

        host.handle_timeout(expiry);
        assert_eq!(
            host.poll_transmit(),
            Some(AshFrame::data(0, 0, false, vec![0x08]).encode())
        );
        assert_eq!(host.state(), LinkState::AwaitingAck(0));
    }

    #[test]
    fn test_peer_reset_while_connected() {
        let now = Instant::now();
        let (mut host, _ncp) = connected_pair(now);
        host.send(&[0x01], now).unwrap();
        host.poll_transmit();

        host.receive(&AshFrame::rst_ack(RESET_WATCHDOG).encode(), now);
        assert_eq!(
            drain_events(&mut host),
            vec![LinkEvent::Connected {
                reset_code: RESET_WATCHDOG
            }]
        );
        assert_eq!(host.state(), LinkState::Idle);
        assert_eq!(host.pending_len(), 0);
    }
}
