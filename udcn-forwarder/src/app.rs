//! The app-facing library surface: `AppHandle`.
//!
//! Grounded on `original_source/sys/net/ndn/app.c` (`ndn_app_create`,
//! `ndn_app_run`'s message-queue dispatch loop) and spec.md §4.8's three
//! registers (consumer table, producer table, mailbox). The source's manual
//! linked-list callback walk becomes a linear scan over `Vec`s here — the
//! same complexity, since selectors-ignoring aggregation and prefix-match
//! dispatch both require walking every entry regardless of representation.

use std::collections::HashMap;
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError};
use std::time::Duration;

use udcn_common::name::is_prefix_match;
use udcn_common::nonce::{NonceSource, Xorshift32};
use udcn_common::packet::{data, interest};
use udcn_common::{Name, SharedBlock};

use crate::error::AppError;
use crate::face::FaceId;
use crate::forwarder::ForwarderHandle;
use crate::message::{AppEvent, AppLoopMsg, ForwarderMessage};
use crate::timer::TimerService;

const APP_MAILBOX_CAPACITY: usize = 64;

/// What a callback tells `run()` to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Stop,
    Error,
}

type DataCallback = Box<dyn FnMut(&SharedBlock) -> Disposition + Send>;
type TimeoutCallback = Box<dyn FnMut() -> Disposition + Send>;
type InterestCallback = Box<dyn FnMut(&SharedBlock) -> Disposition + Send>;
type TimerCallback = Box<dyn FnOnce(&mut AppHandle) + Send>;

struct ConsumerEntry {
    name: Name,
    on_data: DataCallback,
    on_timeout: TimeoutCallback,
}

struct ProducerEntry {
    prefix: Name,
    on_interest: InterestCallback,
}

/// One application thread's handle into the forwarder: a consumer table, a
/// producer table, and the mailbox the forwarder delivers events into.
pub struct AppHandle {
    id: FaceId,
    to_forwarder: ForwarderHandle,
    inbox: Receiver<AppLoopMsg>,
    consumers: Vec<ConsumerEntry>,
    producers: Vec<ProducerEntry>,
    nonce_source: Box<dyn NonceSource>,
    timers: TimerService<AppLoopMsg>,
    scheduled: HashMap<u64, TimerCallback>,
    next_timer_token: u64,
}

impl AppHandle {
    /// Registers a new `APP` face with the forwarder (synchronous — blocks
    /// until acknowledged) and returns a handle seeded with a fresh
    /// `Xorshift32` nonce source.
    pub fn new(to_forwarder: ForwarderHandle) -> Result<Self, AppError> {
        Self::with_nonce_source(to_forwarder, Box::new(Xorshift32::from_entropy()))
    }

    pub fn with_nonce_source(
        to_forwarder: ForwarderHandle,
        nonce_source: Box<dyn NonceSource>,
    ) -> Result<Self, AppError> {
        let (self_tx, inbox) = sync_channel(APP_MAILBOX_CAPACITY);
        let (reply_tx, reply_rx) = sync_channel(1);
        to_forwarder
            .send(ForwarderMessage::AddFace { mailbox: self_tx.clone(), reply: reply_tx })
            .map_err(|_| AppError::Terminated)?;
        let id = reply_rx.recv().map_err(|_| AppError::Terminated)?.map_err(AppError::Forwarder)?;

        let timers = TimerService::new(self_tx);

        Ok(Self {
            id,
            to_forwarder,
            inbox,
            consumers: Vec::new(),
            producers: Vec::new(),
            nonce_source,
            timers,
            scheduled: HashMap::new(),
            next_timer_token: 1,
        })
    }

    pub fn id(&self) -> FaceId {
        self.id
    }

    /// Encodes the Interest, records the one-shot callback pair, and
    /// submits it to the forwarder.
    pub fn express_interest(
        &mut self,
        name: Name,
        lifetime_ms: u64,
        on_data: impl FnMut(&SharedBlock) -> Disposition + Send + 'static,
        on_timeout: impl FnMut() -> Disposition + Send + 'static,
    ) -> Result<(), AppError> {
        let nonce = self.nonce_source.next_nonce();
        let block = interest::create(&name, nonce, lifetime_ms);
        self.consumers.push(ConsumerEntry {
            name,
            on_data: Box::new(on_data),
            on_timeout: Box::new(on_timeout),
        });
        self.send_to_forwarder(block)
    }

    /// Inserts into the producer table and synchronously registers the
    /// prefix with the forwarder's FIB.
    pub fn register_prefix(
        &mut self,
        prefix: Name,
        on_interest: impl FnMut(&SharedBlock) -> Disposition + Send + 'static,
    ) -> Result<(), AppError> {
        let (reply_tx, reply_rx) = sync_channel(1);
        self.to_forwarder
            .send(ForwarderMessage::AddFib { face: self.id, prefix: prefix.clone(), reply: reply_tx })
            .map_err(|_| AppError::Terminated)?;
        reply_rx.recv().map_err(|_| AppError::Terminated)?.map_err(AppError::Forwarder)?;
        self.producers.push(ProducerEntry { prefix, on_interest: Box::new(on_interest) });
        Ok(())
    }

    /// Submits a Data block, transferring it to the forwarder/PIT path.
    pub fn put_data(&mut self, block: SharedBlock) -> Result<(), AppError> {
        self.send_to_forwarder(block)
    }

    /// Arms a one-shot timer that re-enters `run()`'s loop and invokes
    /// `callback` with `&mut self`.
    pub fn schedule(&mut self, delay_us: u64, callback: impl FnOnce(&mut AppHandle) + Send + 'static) {
        let token = self.next_timer_token;
        self.next_timer_token += 1;
        self.scheduled.insert(token, Box::new(callback));
        self.timers.schedule(Duration::from_micros(delay_us), AppLoopMsg::Timer(token));
    }

    fn send_to_forwarder(&self, block: SharedBlock) -> Result<(), AppError> {
        self.to_forwarder
            .try_send(ForwarderMessage::AppSend { face: self.id, packet: block })
            .map_err(|_| AppError::MailboxFull)
    }

    /// The dispatch loop. Blocks on the mailbox until a callback returns
    /// `Stop`/`Error`, or the mailbox disconnects (forwarder gone).
    pub fn run(&mut self) -> Disposition {
        loop {
            let msg = match self.inbox.recv() {
                Ok(msg) => msg,
                Err(_) => return Disposition::Error,
            };
            if let Some(done) = self.handle_one(msg) {
                return done;
            }
        }
    }

    /// Processes exactly one mailbox message, applying the callback
    /// dispatch rules of spec.md §4.8. Returns `Some(disposition)` when
    /// `run()` should stop, `None` to keep looping. Exposed so tests and
    /// embedders can drive the loop one message at a time.
    pub fn handle_one(&mut self, msg: AppLoopMsg) -> Option<Disposition> {
        match msg {
            AppLoopMsg::Terminate => Some(Disposition::Stop),
            AppLoopMsg::Timer(token) => {
                if let Some(cb) = self.scheduled.remove(&token) {
                    cb(self);
                }
                None
            }
            AppLoopMsg::Event(AppEvent::Data(block)) => self.dispatch_data(&block),
            AppLoopMsg::Event(AppEvent::Timeout(block)) => self.dispatch_timeout(&block),
            AppLoopMsg::Event(AppEvent::Interest(block)) => self.dispatch_interest(&block),
        }
    }

    fn dispatch_data(&mut self, block: &SharedBlock) -> Option<Disposition> {
        let name = match data::get_name(block) {
            Ok(n) => n,
            Err(_) => return None,
        };
        let mut i = 0;
        while i < self.consumers.len() {
            if self.consumers[i].name == name {
                let mut entry = self.consumers.remove(i);
                let disposition = (entry.on_data)(block);
                if disposition != Disposition::Continue {
                    return Some(disposition);
                }
            } else {
                i += 1;
            }
        }
        None
    }

    fn dispatch_timeout(&mut self, block: &SharedBlock) -> Option<Disposition> {
        let name = match interest::get_name(block) {
            Ok(n) => n,
            Err(_) => return None,
        };
        let mut i = 0;
        while i < self.consumers.len() {
            if self.consumers[i].name == name {
                let mut entry = self.consumers.remove(i);
                let disposition = (entry.on_timeout)();
                if disposition != Disposition::Continue {
                    return Some(disposition);
                }
            } else {
                i += 1;
            }
        }
        None
    }

    fn dispatch_interest(&mut self, block: &SharedBlock) -> Option<Disposition> {
        let name = match interest::get_name(block) {
            Ok(n) => n,
            Err(_) => return None,
        };
        for producer in self.producers.iter_mut() {
            if is_prefix_match(&producer.prefix, &name) {
                let disposition = (producer.on_interest)(block);
                if disposition != Disposition::Continue {
                    return Some(disposition);
                }
            }
        }
        None
    }

    /// Test/demo helper: blocks for at most `timeout` for the next mailbox
    /// message without running the full dispatch loop.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<AppLoopMsg, RecvTimeoutError> {
        self.inbox.recv_timeout(timeout)
    }
}

impl Drop for AppHandle {
    fn drop(&mut self) {
        let (reply_tx, _reply_rx) = sync_channel(1);
        let _ = self.to_forwarder.send(ForwarderMessage::RemoveFace { face: self.id, reply: reply_tx });
    }
}
