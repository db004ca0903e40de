//! A dedicated one-shot timer thread per owner (the forwarder, each app).
//!
//! Each PIT entry has exactly one live timer (spec.md §5); rather than a
//! pointer into the table the timer carries a stable `TimerId`/handle, per
//! spec.md §9's redesign note. The service runs on its own thread holding a
//! min-heap of deadlines and posts the fired message straight into the
//! owner's own mailbox, so all table mutation still happens on the owner
//! thread — single-writer, no locks.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Stable identifier for an armed timer, used to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

enum Command<M> {
    Schedule { id: TimerId, deadline: Instant, msg: M },
    Cancel(TimerId),
    Shutdown,
}

/// Owns a background thread that delivers one message per armed timer into
/// `out` when its deadline elapses. `M` is the owner's mailbox message type
/// (`ForwarderMessage` for the forwarder, the app's loop message for an
/// `AppHandle`).
pub struct TimerService<M: Send + 'static> {
    cmd_tx: Sender<Command<M>>,
    next_id: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

impl<M: Send + 'static> TimerService<M> {
    pub fn new(out: SyncSender<M>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command<M>>();
        let worker = thread::spawn(move || run_worker(cmd_rx, out));
        Self { cmd_tx, next_id: AtomicU64::new(1), worker: Some(worker) }
    }

    /// Arms a one-shot timer that posts `msg` to the owner's mailbox after
    /// `delay`. Returns the handle needed to cancel it.
    pub fn schedule(&self, delay: Duration, msg: M) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let deadline = Instant::now() + delay;
        let _ = self.cmd_tx.send(Command::Schedule { id, deadline, msg });
        id
    }

    /// Cancels a previously armed timer. A cancel racing a fire is
    /// harmless: the owner treats a fired message for an already-handled
    /// id as a no-op (see `Pit::remove`'s idempotence).
    pub fn cancel(&self, id: TimerId) {
        let _ = self.cmd_tx.send(Command::Cancel(id));
    }
}

impl<M: Send + 'static> Drop for TimerService<M> {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker<M: Send + 'static>(cmd_rx: std::sync::mpsc::Receiver<Command<M>>, out: SyncSender<M>) {
    let mut heap: BinaryHeap<Reverse<(Instant, TimerId)>> = BinaryHeap::new();
    let mut pending: std::collections::HashMap<TimerId, M> = std::collections::HashMap::new();
    let mut cancelled: std::collections::HashSet<TimerId> = std::collections::HashSet::new();

    loop {
        let next_deadline = heap.peek().map(|Reverse((deadline, _))| *deadline);

        let received = match next_deadline {
            None => cmd_rx.recv().ok(),
            Some(deadline) => {
                let now = Instant::now();
                if deadline <= now {
                    None
                } else {
                    match cmd_rx.recv_timeout(deadline - now) {
                        Ok(cmd) => Some(cmd),
                        Err(mpsc::RecvTimeoutError::Timeout) => None,
                        Err(mpsc::RecvTimeoutError::Disconnected) => return,
                    }
                }
            }
        };

        match received {
            Some(Command::Schedule { id, deadline, msg }) => {
                pending.insert(id, msg);
                heap.push(Reverse((deadline, id)));
            }
            Some(Command::Cancel(id)) => {
                cancelled.insert(id);
                pending.remove(&id);
            }
            Some(Command::Shutdown) => return,
            None => {
                // A deadline elapsed (or there was nothing to wait on and
                // recv failed because the sender side is gone).
                let Some(Reverse((deadline, id))) = heap.peek().copied() else { return };
                if deadline > Instant::now() {
                    continue;
                }
                heap.pop();
                if cancelled.remove(&id) {
                    continue;
                }
                if let Some(msg) = pending.remove(&id) {
                    if out.send(msg).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::sync_channel;

    #[test]
    fn fires_after_delay() {
        let (tx, rx) = sync_channel::<u32>(4);
        let svc = TimerService::new(tx);
        svc.schedule(Duration::from_millis(10), 42);
        let got = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(got, 42);
    }

    #[test]
    fn cancel_prevents_fire() {
        let (tx, rx) = sync_channel::<u32>(4);
        let svc = TimerService::new(tx);
        let id = svc.schedule(Duration::from_millis(50), 7);
        svc.cancel(id);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn fires_in_deadline_order() {
        let (tx, rx) = sync_channel::<u32>(4);
        let svc = TimerService::new(tx);
        svc.schedule(Duration::from_millis(40), 2);
        svc.schedule(Duration::from_millis(10), 1);
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), 1);
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), 2);
    }
}
