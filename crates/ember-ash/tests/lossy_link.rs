//! Two link endpoints talking over a simulated serial line that loses and
//! corrupts frames. Time is virtual: the harness jumps straight to the next
//! timer deadline whenever the line goes quiet.

use std::time::{Duration, Instant};

use ember_ash::constants::{SUBSTITUTE, XOFF};
use ember_ash::{LinkConfig, LinkError, LinkEvent, LinkFramer, LinkState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fault pattern for one direction of the line.
#[derive(Default)]
struct Line {
    chunks: usize,
    drop_every: usize,
    corrupt_every: usize,
    drop_all: bool,
}

impl Line {
    fn new(drop_every: usize, corrupt_every: usize) -> Self {
        Line {
            drop_every,
            corrupt_every,
            ..Default::default()
        }
    }

    fn pass(&mut self, mut chunk: Vec<u8>) -> Option<Vec<u8>> {
        self.chunks += 1;
        if self.drop_all || (self.drop_every > 0 && self.chunks % self.drop_every == 0) {
            return None;
        }
        if self.corrupt_every > 0 && self.chunks % self.corrupt_every == 0 {
            // Receiver-side line error: the frame is marked bad before its flag.
            let at = chunk.len() - 1;
            chunk.insert(at, SUBSTITUTE);
        }
        Some(chunk)
    }
}

struct Harness {
    host: LinkFramer,
    ncp: LinkFramer,
    now: Instant,
    host_to_ncp: Line,
    ncp_to_host: Line,
    host_events: Vec<LinkEvent>,
    ncp_events: Vec<LinkEvent>,
}

impl Harness {
    fn new(config: LinkConfig, host_to_ncp: Line, ncp_to_host: Line) -> Self {
        Harness {
            host: LinkFramer::new(config.clone()).unwrap(),
            ncp: LinkFramer::new(config).unwrap(),
            now: Instant::now(),
            host_to_ncp,
            ncp_to_host,
            host_events: Vec::new(),
            ncp_events: Vec::new(),
        }
    }

    fn exchange(&mut self) -> bool {
        let mut moved = false;
        while let Some(chunk) = self.host.poll_transmit() {
            moved = true;
            if let Some(chunk) = self.host_to_ncp.pass(chunk) {
                self.ncp.receive(&chunk, self.now);
            }
        }
        while let Some(chunk) = self.ncp.poll_transmit() {
            moved = true;
            if let Some(chunk) = self.ncp_to_host.pass(chunk) {
                self.host.receive(&chunk, self.now);
            }
        }
        self.host_events.extend(std::iter::from_fn(|| self.host.poll_event()));
        self.ncp_events.extend(std::iter::from_fn(|| self.ncp.poll_event()));
        moved
    }

    /// Move bytes, or advance the clock to the next deadline. Returns false
    /// once nothing is left to do.
    fn step(&mut self) -> bool {
        if self.exchange() {
            return true;
        }
        let deadline = [self.host.poll_timeout(), self.ncp.poll_timeout()]
            .into_iter()
            .flatten()
            .min();
        match deadline {
            Some(deadline) => {
                self.now = self.now.max(deadline);
                self.host.handle_timeout(self.now);
                self.ncp.handle_timeout(self.now);
                true
            }
            None => false,
        }
    }

    fn run(&mut self) {
        for _ in 0..100_000 {
            if !self.step() {
                return;
            }
        }
        panic!("simulation did not settle");
    }

    fn connect(&mut self) {
        self.host.reset(self.now);
        while !self.host.is_connected() {
            assert!(self.step(), "link never connected");
        }
    }
}

fn delivered(events: &[LinkEvent]) -> Vec<Vec<u8>> {
    events
        .iter()
        .filter_map(|event| match event {
            LinkEvent::Delivered(payload) => Some(payload.clone()),
            _ => None,
        })
        .collect()
}

fn failures(events: &[LinkEvent]) -> Vec<LinkError> {
    events
        .iter()
        .filter_map(|event| match event {
            LinkEvent::Failed(err) => Some(err.clone()),
            _ => None,
        })
        .collect()
}

fn random_payloads(rng: &mut ChaCha8Rng, count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|_| {
            let len = rng.gen_range(1..=128);
            (0..len).map(|_| rng.gen::<u8>()).collect()
        })
        .collect()
}

fn exchange_payloads(seed: u64, config: LinkConfig, host_to_ncp: Line, ncp_to_host: Line) -> Harness {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let from_host = random_payloads(&mut rng, 40);
    let from_ncp = random_payloads(&mut rng, 40);

    let mut harness = Harness::new(config, host_to_ncp, ncp_to_host);
    harness.connect();
    for (a, b) in from_host.iter().zip(&from_ncp) {
        harness.host.send(a, harness.now).unwrap();
        harness.ncp.send(b, harness.now).unwrap();
    }
    harness.run();

    assert!(failures(&harness.host_events).is_empty());
    assert!(failures(&harness.ncp_events).is_empty());
    assert_eq!(delivered(&harness.ncp_events), from_host);
    assert_eq!(delivered(&harness.host_events), from_ncp);
    assert_eq!(harness.host.state(), LinkState::Idle);
    assert_eq!(harness.ncp.state(), LinkState::Idle);
    harness
}

#[test]
fn test_clean_line_delivers_in_order() {
    let harness = exchange_payloads(1, LinkConfig::default(), Line::default(), Line::default());
    assert_eq!(harness.host.stats().retransmissions, 0);
    assert_eq!(harness.ncp.stats().retransmissions, 0);
}

#[test]
fn test_dropped_frames_are_recovered() {
    let harness = exchange_payloads(2, LinkConfig::default(), Line::new(5, 0), Line::new(4, 0));
    assert!(harness.host.stats().retransmissions > 0);
}

#[test]
fn test_corrupted_frames_are_recovered() {
    let harness = exchange_payloads(3, LinkConfig::default(), Line::new(0, 7), Line::new(0, 7));
    assert!(harness.ncp.stats().framing_errors > 0);
    assert!(harness.host.stats().framing_errors > 0);
}

#[test]
fn test_drops_and_corruption_with_single_frame_window() {
    let config = LinkConfig::default()
        .with_window_size(1)
        .with_max_retries(8);
    exchange_payloads(4, config, Line::new(5, 7), Line::new(6, 7));
}

#[test]
fn test_drops_and_corruption_with_full_window() {
    let config = LinkConfig::default().with_max_retries(8);
    exchange_payloads(5, config, Line::new(5, 7), Line::new(6, 7));
}

#[test]
fn test_silent_peer_fails_once() {
    let mut harness = Harness::new(LinkConfig::default(), Line::default(), Line::default());
    harness.connect();
    harness.host_to_ncp.drop_all = true;

    let start = harness.now;
    harness.host.send(&[0x01, 0x02, 0x03], harness.now).unwrap();
    harness.run();

    assert_eq!(
        failures(&harness.host_events),
        vec![LinkError::RetryLimitExceeded { seq: 0, retries: 4 }]
    );
    assert_eq!(harness.host.state(), LinkState::Failed);
    assert_eq!(harness.host.stats().retransmissions, 4);
    // 1600 + 3200 * 4: the timeout doubles then saturates.
    assert_eq!(harness.now - start, Duration::from_millis(14_400));

    // A failed link refuses new work until it is reset.
    assert_eq!(
        harness.host.send(&[0x04], harness.now),
        Err(LinkError::NotConnected)
    );
    harness.host_to_ncp.drop_all = false;
    harness.connect();
    harness.host.send(&[0x04], harness.now).unwrap();
    harness.run();
    assert_eq!(delivered(&harness.ncp_events), vec![vec![0x04]]);
}

#[test]
fn test_unanswered_reset_gives_up() {
    let config = LinkConfig::default();
    let mut host = LinkFramer::new(config).unwrap();
    let start = Instant::now();
    let mut now = start;
    let mut resets_sent = 0;

    host.reset(now);
    loop {
        while host.poll_transmit().is_some() {
            resets_sent += 1;
        }
        match host.poll_timeout() {
            Some(deadline) => {
                now = deadline;
                host.handle_timeout(now);
            }
            None => break,
        }
    }

    assert_eq!(resets_sent, 5);
    assert_eq!(now - start, Duration::from_millis(5 * 3200));
    assert_eq!(
        host.poll_event(),
        Some(LinkEvent::Failed(LinkError::ResetFailed { attempts: 5 }))
    );
    assert_eq!(host.poll_event(), None);
    assert_eq!(host.state(), LinkState::Failed);
}

#[test]
fn test_lost_ready_ack_resumes_after_hold() {
    let mut harness = Harness::new(LinkConfig::default(), Line::default(), Line::default());
    harness.connect();

    harness.ncp.set_ready(false);
    harness.run();
    harness.host.send(&[0x01, 0x02], harness.now).unwrap();
    assert_eq!(harness.host.state(), LinkState::Held);
    assert!(harness.host.poll_transmit().is_none());

    // The ready ACK never reaches the host.
    harness.ncp_to_host.drop_all = true;
    harness.ncp.set_ready(true);
    harness.exchange();
    harness.ncp_to_host.drop_all = false;

    let start = harness.now;
    harness.run();
    assert_eq!(delivered(&harness.ncp_events), vec![vec![0x01, 0x02]]);
    assert!(failures(&harness.host_events).is_empty());
    assert_eq!(harness.now - start, Duration::from_millis(1000));
    assert_eq!(harness.host.state(), LinkState::Idle);
}

#[test]
fn test_lost_xon_resumes_after_hold() {
    let config = LinkConfig {
        not_ready_timeout_ms: 250,
        ..LinkConfig::default()
    };
    let mut harness = Harness::new(config, Line::default(), Line::default());
    harness.connect();

    let start = harness.now;
    harness.host.receive(&[XOFF], harness.now);
    harness.host.send(&[0x03], harness.now).unwrap();
    harness.host.send(&[0x04], harness.now).unwrap();
    assert_eq!(harness.host.state(), LinkState::Held);
    assert_eq!(harness.host.pending_len(), 2);
    assert_eq!(
        harness.host.poll_timeout(),
        Some(start + Duration::from_millis(250))
    );

    harness.run();
    assert_eq!(
        delivered(&harness.ncp_events),
        vec![vec![0x03], vec![0x04]]
    );
    assert!(failures(&harness.host_events).is_empty());
    assert_eq!(harness.now - start, Duration::from_millis(250));
    assert_eq!(harness.host.pending_len(), 0);
}
