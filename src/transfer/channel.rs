use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use super::errors::ChannelError;

/// An open, ordered, reliable message channel to the peer.
///
/// Implemented by whatever carries the direct connection. The transfer code
/// only needs to send whole messages and ask how much is still queued.
pub trait ChannelGateway {
    fn send(&mut self, message: &[u8]) -> Result<(), ChannelError>;

    /// Bytes handed to `send` that have not left the local queue yet.
    fn buffered_amount(&self) -> usize;

    fn is_open(&self) -> bool {
        true
    }
}

impl<C: ChannelGateway + ?Sized> ChannelGateway for &mut C {
    fn send(&mut self, message: &[u8]) -> Result<(), ChannelError> {
        (**self).send(message)
    }

    fn buffered_amount(&self) -> usize {
        (**self).buffered_amount()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

/// In-process channel endpoint, one half of [`memory_channel_pair`].
///
/// `buffered_amount` counts bytes sent by this end and not yet received by the
/// other, which models a data channel whose peer drains at its own pace.
pub struct MemoryChannel {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    outbound: Arc<AtomicUsize>,
    inbound: Arc<AtomicUsize>,
    open: Arc<AtomicBool>,
}

/// Two connected endpoints; messages sent on one arrive in order on the other.
pub fn memory_channel_pair() -> (MemoryChannel, MemoryChannel) {
    let (a_tx, b_rx) = mpsc::channel();
    let (b_tx, a_rx) = mpsc::channel();
    let a_to_b = Arc::new(AtomicUsize::new(0));
    let b_to_a = Arc::new(AtomicUsize::new(0));
    let open = Arc::new(AtomicBool::new(true));

    let a = MemoryChannel {
        tx: a_tx,
        rx: a_rx,
        outbound: a_to_b.clone(),
        inbound: b_to_a.clone(),
        open: open.clone(),
    };
    let b = MemoryChannel {
        tx: b_tx,
        rx: b_rx,
        outbound: b_to_a,
        inbound: a_to_b,
        open,
    };
    (a, b)
}

impl MemoryChannel {
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        match self.rx.recv_timeout(timeout) {
            Ok(m) => {
                self.inbound.fetch_sub(m.len(), Ordering::AcqRel);
                Some(m)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<Vec<u8>> {
        let m = self.rx.try_recv().ok()?;
        self.inbound.fetch_sub(m.len(), Ordering::AcqRel);
        Some(m)
    }

    /// Close both ends.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

impl ChannelGateway for MemoryChannel {
    fn send(&mut self, message: &[u8]) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }
        self.outbound.fetch_add(message.len(), Ordering::AcqRel);
        self.tx.send(message.to_vec()).map_err(|_| {
            self.outbound.fetch_sub(message.len(), Ordering::AcqRel);
            ChannelError::Closed
        })
    }

    fn buffered_amount(&self) -> usize {
        self.outbound.load(Ordering::Acquire)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}
