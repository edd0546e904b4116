//! Adaptive acknowledgement timeout.

use std::time::Duration;

/// Retransmission timeout tracking the measured round trip time.
///
/// Only frames acknowledged on their first transmission contribute samples,
/// since the acknowledgement of a retransmitted frame is ambiguous.
#[derive(Debug, Clone)]
pub struct RetransmitTimer {
    current: Duration,
    min: Duration,
    max: Duration,
}

impl RetransmitTimer {
    pub fn new(initial: Duration, min: Duration, max: Duration) -> Self {
        RetransmitTimer {
            current: initial.clamp(min, max),
            min,
            max,
        }
    }

    /// Current timeout.
    pub fn timeout(&self) -> Duration {
        self.current
    }

    /// Fold in a round trip sample: `t = 7/8 t + 1/2 rtt`.
    pub fn on_ack(&mut self, rtt: Duration) {
        let next = self.current * 7 / 8 + rtt / 2;
        self.current = next.clamp(self.min, self.max);
    }

    /// Back off after a timeout.
    pub fn on_timeout(&mut self) {
        self.current = (self.current * 2).clamp(self.min, self.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> RetransmitTimer {
        RetransmitTimer::new(
            Duration::from_millis(1600),
            Duration::from_millis(400),
            Duration::from_millis(3200),
        )
    }

    #[test]
    fn test_smoothing() {
        let mut timer = timer();
        timer.on_ack(Duration::from_millis(200));
        assert_eq!(timer.timeout(), Duration::from_millis(1500));
        for _ in 0..50 {
            timer.on_ack(Duration::from_millis(10));
        }
        assert_eq!(timer.timeout(), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_capped() {
        let mut timer = timer();
        timer.on_timeout();
        assert_eq!(timer.timeout(), Duration::from_millis(3200));
        timer.on_timeout();
        assert_eq!(timer.timeout(), Duration::from_millis(3200));
    }
}
