use std::thread;
use std::time::Duration;

use super::channel::ChannelGateway;
use super::errors::ChannelError;
use super::transfer_config::{MAX_BUFFERED_THRESHOLD, MIN_BUFFERED_THRESHOLD};

/// Holds the sender back while the channel's outbound queue is too full.
#[derive(Debug, Clone, Copy)]
pub struct BackpressureGate {
    threshold: usize,
    poll_interval: Duration,
}

impl BackpressureGate {
    /// `threshold` is clamped to 64–512 KiB.
    pub fn new(threshold: usize, poll_interval: Duration) -> Self {
        Self {
            threshold: threshold.clamp(MIN_BUFFERED_THRESHOLD, MAX_BUFFERED_THRESHOLD),
            poll_interval,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Block until `buffered_amount() <= threshold`.
    ///
    /// Sleeps `poll_interval` between polls and runs `idle` each time so the
    /// caller can keep servicing inbound traffic. Returns how many polls had
    /// to wait.
    pub fn wait<C, F>(&self, channel: &C, mut idle: F) -> Result<u32, ChannelError>
    where
        C: ChannelGateway + ?Sized,
        F: FnMut(),
    {
        let mut waits = 0u32;
        while channel.buffered_amount() > self.threshold {
            if !channel.is_open() {
                return Err(ChannelError::Closed);
            }
            waits = waits.saturating_add(1);
            idle();
            thread::sleep(self.poll_interval);
        }
        Ok(waits)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::cell::Cell;

    /// Drains 32 KiB per poll.
    struct Draining {
        queued: Cell<usize>,
        open: bool,
    }

    impl ChannelGateway for Draining {
        fn send(&mut self, message: &[u8]) -> Result<(), ChannelError> {
            self.queued.set(self.queued.get() + message.len());
            Ok(())
        }

        fn buffered_amount(&self) -> usize {
            let q = self.queued.get();
            self.queued.set(q.saturating_sub(32 * 1024));
            q
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[test]
    fn passes_straight_through_below_threshold() {
        let gate = BackpressureGate::new(256 * 1024, Duration::from_millis(1));
        let ch = Draining {
            queued: Cell::new(1024),
            open: true,
        };
        assert_eq!(gate.wait(&ch, || {}).unwrap(), 0);
    }

    #[test]
    fn waits_and_runs_idle_hook_until_drained() {
        let gate = BackpressureGate::new(64 * 1024, Duration::from_millis(1));
        let ch = Draining {
            queued: Cell::new(160 * 1024),
            open: true,
        };
        let mut idles = 0;
        let waits = gate.wait(&ch, || idles += 1).unwrap();
        assert!(waits > 0);
        assert_eq!(waits, idles);
    }

    #[test]
    fn closed_channel_stops_the_wait() {
        let gate = BackpressureGate::new(64 * 1024, Duration::from_millis(1));
        let ch = Draining {
            queued: Cell::new(10 * 1024 * 1024),
            open: false,
        };
        assert_eq!(gate.wait(&ch, || {}), Err(ChannelError::Closed));
    }

    #[test]
    fn threshold_is_clamped() {
        assert_eq!(BackpressureGate::new(1, Duration::ZERO).threshold(), MIN_BUFFERED_THRESHOLD);
        assert_eq!(
            BackpressureGate::new(usize::MAX, Duration::ZERO).threshold(),
            MAX_BUFFERED_THRESHOLD
        );
    }
}
