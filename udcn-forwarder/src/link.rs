//! The link-layer driver seam: spec.md treats the physical broadcast device
//! as an external collaborator, reachable only through "send frame / deliver
//! received frame". `LinkDriver` is that trait; `LoopbackDriver` is an
//! in-memory pair used by tests and the CLI demo, not a production driver.
//!
//! Re-expressed from the teacher's async `rust-udcn-quic::face` connection
//! wrapper as a blocking trait, matching spec.md §5's thread/mailbox model
//! instead of an async runtime (see DESIGN.md).

use std::sync::mpsc::{sync_channel, Receiver, RecvError, SyncSender};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("link send failed: {0}")]
    Send(String),
    #[error("link is closed")]
    Closed,
}

/// Send a complete NDN block as one link frame; receive one stripped of its
/// link header. Both calls block the reader/writer thread that owns them.
pub trait LinkDriver: Send + Sync {
    fn send_frame(&self, block: &[u8]) -> Result<(), LinkError>;
    fn recv_frame(&self) -> Result<Vec<u8>, LinkError>;
    fn mtu(&self) -> usize;
}

/// An in-memory loopback link: two drivers wired to each other's channels,
/// so that a frame sent on one is received on the other. Explicitly not a
/// production link-layer driver — the real driver is an external
/// collaborator (spec.md §1).
pub struct LoopbackDriver {
    tx: SyncSender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    mtu: usize,
}

impl LoopbackDriver {
    /// The default MTU used when callers don't care; generous enough for
    /// the demo and test packets this crate constructs.
    pub const DEFAULT_MTU: usize = 1500;

    /// Builds two drivers, `(a, b)`, cross-wired so a frame sent on `a` is
    /// received on `b` and vice versa.
    pub fn pair(mtu: usize) -> (LoopbackDriver, LoopbackDriver) {
        let (a_tx, b_rx) = sync_channel(64);
        let (b_tx, a_rx) = sync_channel(64);
        (
            LoopbackDriver { tx: a_tx, rx: a_rx, mtu },
            LoopbackDriver { tx: b_tx, rx: b_rx, mtu },
        )
    }
}

impl LinkDriver for LoopbackDriver {
    fn send_frame(&self, block: &[u8]) -> Result<(), LinkError> {
        if block.len() > self.mtu {
            return Err(LinkError::Send(format!("{} bytes exceeds mtu {}", block.len(), self.mtu)));
        }
        self.tx.send(block.to_vec()).map_err(|_| LinkError::Closed)
    }

    fn recv_frame(&self) -> Result<Vec<u8>, LinkError> {
        match self.rx.recv() {
            Ok(frame) => Ok(frame),
            Err(RecvError) => Err(LinkError::Closed),
        }
    }

    fn mtu(&self) -> usize {
        self.mtu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_delivers_sent_frame() {
        let (a, b) = LoopbackDriver::pair(LoopbackDriver::DEFAULT_MTU);
        a.send_frame(b"hello").unwrap();
        assert_eq!(b.recv_frame().unwrap(), b"hello");
    }

    #[test]
    fn oversized_frame_rejected_at_send() {
        let (a, _b) = LoopbackDriver::pair(4);
        assert!(a.send_frame(b"too long").is_err());
    }
}
