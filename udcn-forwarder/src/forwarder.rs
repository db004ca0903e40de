//! The single-threaded forwarder event loop (spec.md §4.7).
//!
//! Owns the PIT, FIB and face table exclusively; every other thread reaches
//! it only through `ForwarderMessage`s on a bounded mailbox. Grounded on
//! `original_source/sys/net/ndn/relay.c`'s dispatch-by-message-kind loop,
//! generalized off the teacher's global-singleton (`ndn_relay`, `fib`,
//! `pit`) layout into a forwarder-owned struct, per spec.md §9.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use udcn_common::metrics::UdcnMetrics;
use udcn_common::tlv::types;
use udcn_common::{packet::data, packet::interest, SharedBlock};

use crate::error::ForwarderError;
use crate::face::{FaceId, FaceKind, FaceRef, FaceTable};
use crate::fib::Fib;
use crate::link::LinkDriver;
use crate::message::{AppEvent, AppLoopMsg, ForwarderMessage};
use crate::pit::Pit;
use crate::timer::TimerService;

/// An Interest lifetime above this many milliseconds would overflow when
/// converted to microseconds in a 32-bit duration; spec.md §4.3/§4.7.
pub const MAX_LIFETIME_MS: u64 = 0x400000;

const MAILBOX_CAPACITY: usize = 256;

struct LinkFace {
    driver: Arc<dyn LinkDriver>,
}

/// A running forwarder's external handle: the mailbox apps and link reader
/// threads send into.
pub type ForwarderHandle = SyncSender<ForwarderMessage>;

pub struct Forwarder {
    pit: Pit,
    fib: Fib,
    faces: FaceTable,
    app_mailboxes: HashMap<FaceId, SyncSender<AppLoopMsg>>,
    links: HashMap<FaceId, LinkFace>,
    inbox: Receiver<ForwarderMessage>,
    inbox_tx: ForwarderHandle,
    timers: TimerService<ForwarderMessage>,
    metrics: Arc<UdcnMetrics>,
    reader_epoch: AtomicU64,
}

impl Forwarder {
    /// Builds a forwarder and returns it paired with the mailbox handle
    /// other threads use to reach it. Call `add_link` for each discovered
    /// network interface, then `run` (typically on its own thread).
    pub fn new(metrics: Arc<UdcnMetrics>) -> (Self, ForwarderHandle) {
        let (inbox_tx, inbox) = sync_channel(MAILBOX_CAPACITY);
        let timers = TimerService::new(inbox_tx.clone());
        let handle = inbox_tx.clone();
        let forwarder = Self {
            pit: Pit::new(),
            fib: Fib::new(),
            faces: FaceTable::new(),
            app_mailboxes: HashMap::new(),
            links: HashMap::new(),
            inbox,
            inbox_tx,
            timers,
            metrics,
            reader_epoch: AtomicU64::new(0),
        };
        (forwarder, handle)
    }

    pub fn handle(&self) -> ForwarderHandle {
        self.inbox_tx.clone()
    }

    /// Registers a link-layer driver as a new `LINK` face, auto-installs
    /// the default `/` FIB route for it (spec.md §4.6), and spawns a reader
    /// thread that blocks on `recv_frame` and feeds the forwarder's mailbox.
    pub fn add_link(&mut self, driver: Arc<dyn LinkDriver>) -> FaceId {
        let id = self.faces.add_face(FaceKind::Link);
        self.fib.add(udcn_common::Name::root(), FaceRef { id, kind: FaceKind::Link });
        self.metrics.fib_size.set(self.fib.len() as u64);
        self.links.insert(id, LinkFace { driver: Arc::clone(&driver) });

        let inbox_tx = self.inbox_tx.clone();
        thread::spawn(move || loop {
            match driver.recv_frame() {
                Ok(frame) => match udcn_common::tlv::extract_block(&frame) {
                    Ok((block, _)) => {
                        let packet = SharedBlock::from_vec(block.to_vec());
                        if inbox_tx.send(ForwarderMessage::FrameReceived { face: id, packet }).is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!("link {}: dropping malformed frame: {}", id, e),
                },
                Err(_) => {
                    debug!("link {}: driver closed, reader exiting", id);
                    return;
                }
            }
        });

        id
    }

    /// Runs the event loop until the mailbox is disconnected (every sender
    /// — all app handles, all link readers, the timer service — dropped).
    pub fn run(mut self) {
        while let Ok(msg) = self.inbox.recv() {
            self.dispatch(msg);
        }
        info!("forwarder event loop exiting: mailbox disconnected");
    }

    fn dispatch(&mut self, msg: ForwarderMessage) {
        match msg {
            ForwarderMessage::FrameReceived { face, packet } => self.on_frame(face, packet),
            ForwarderMessage::AppSend { face, packet } => self.on_frame(face, packet),
            ForwarderMessage::AddFace { mailbox, reply } => {
                let id = self.faces.add_face(FaceKind::App);
                self.app_mailboxes.insert(id, mailbox);
                let _ = reply.send(Ok(id));
            }
            ForwarderMessage::RemoveFace { face, reply } => {
                self.faces.remove_face(face);
                self.app_mailboxes.remove(&face);
                self.fib.remove_face(face);
                let _ = reply.send(Ok(()));
            }
            ForwarderMessage::AddFib { face, prefix, reply } => match self.faces.kind_of(face) {
                Some(kind) => {
                    self.fib.add(prefix, FaceRef { id: face, kind });
                    self.metrics.fib_size.set(self.fib.len() as u64);
                    let _ = reply.send(Ok(()));
                }
                None => {
                    let _ = reply.send(Err(ForwarderError::UnknownFace(face)));
                }
            },
            ForwarderMessage::TimerFired(handle) => self.on_timeout(handle),
        }
    }

    fn on_frame(&mut self, from: FaceId, packet: SharedBlock) {
        self.metrics.bytes_received.add(packet.len() as u64);
        let tlv_type = match packet.tlv_type() {
            Ok(t) => t,
            Err(e) => {
                warn!("dropping frame from {}: {}", from, e);
                return;
            }
        };
        match tlv_type {
            types::INTEREST => self.on_interest(from, packet),
            types::DATA => self.on_data(from, packet),
            other => warn!("dropping frame from {} with unknown outer type {}", from, other),
        }
    }

    fn on_interest(&mut self, from: FaceId, packet: SharedBlock) {
        let lifetime_ms = match interest::get_lifetime_ms(&packet) {
            Ok(l) => l,
            Err(e) => {
                warn!("dropping malformed interest from {}: {}", from, e);
                return;
            }
        };
        if lifetime_ms > MAX_LIFETIME_MS {
            let err = ForwarderError::LifetimeOverflow;
            warn!("dropping interest from {}: {}", from, err);
            self.metrics.lifetime_overflows.increment();
            return;
        }
        let name = match interest::get_name(&packet) {
            Ok(n) => n,
            Err(e) => {
                warn!("dropping malformed interest from {}: {}", from, e);
                return;
            }
        };

        let from_kind = self.faces.kind_of(from).unwrap_or(FaceKind::App);
        let incoming = FaceRef { id: from, kind: from_kind };
        let (handle, outcome) = self.pit.add(incoming, name.clone(), packet.clone());
        self.metrics.pit_inserts.increment();
        self.metrics.interests_received.increment();
        debug!("pit {:?} for {}: {:?}", handle, name.to_uri(), outcome);

        if let Some(old) = self.pit.get(handle).and_then(|e| e.timer) {
            self.timers.cancel(old);
        }
        let timer = self.timers.schedule(Duration::from_micros(lifetime_ms * 1000), ForwarderMessage::TimerFired(handle));
        self.pit.set_timer(handle, timer);
        self.metrics.pit_size.set(self.pit.len() as u64);

        let Some(fib_entry) = self.fib.lookup(&name) else {
            let err = ForwarderError::NoRoute;
            self.metrics.fib_misses.increment();
            debug!("dropping interest for {}: {}", name.to_uri(), err);
            return;
        };
        self.metrics.fib_hits.increment();

        let Some(next_hop) = fib_entry.faces.iter().find(|f| f.id != from) else {
            debug!("no next hop other than incoming face for {}", name.to_uri());
            return;
        };
        let next_hop = *next_hop;
        self.forward_to(next_hop, packet, true);
    }

    fn on_data(&mut self, from: FaceId, packet: SharedBlock) {
        let name = match data::get_name(&packet) {
            Ok(n) => n,
            Err(e) => {
                warn!("dropping malformed data from {}: {}", from, e);
                return;
            }
        };
        self.metrics.data_received.increment();

        let matched = self.pit.find_matching(&name);
        if matched.is_empty() {
            self.metrics.pit_misses.increment();
            debug!("unmatched data: {}", name.to_uri());
            return;
        }
        self.metrics.pit_hits.increment();

        for handle in matched {
            let Some(entry) = self.pit.remove(handle) else { continue };
            if let Some(timer) = entry.timer {
                self.timers.cancel(timer);
            }
            self.metrics.interests_satisfied.increment();
            for face in entry.faces {
                self.forward_to(face, packet.clone(), false);
            }
        }
        self.metrics.pit_size.set(self.pit.len() as u64);
    }

    fn on_timeout(&mut self, handle: crate::pit::PitHandle) {
        let Some(entry) = self.pit.remove(handle) else {
            // Already satisfied by Data (or a previous timeout); stray
            // timer fire is a harmless no-op.
            return;
        };
        self.metrics.pit_expirations.increment();
        self.metrics.pit_size.set(self.pit.len() as u64);

        for face in entry.faces {
            if face.kind != FaceKind::App {
                continue;
            }
            self.metrics.interests_timed_out.increment();
            if let Some(mailbox) = self.app_mailboxes.get(&face.id) {
                let event = AppLoopMsg::Event(AppEvent::Timeout(entry.interest.clone()));
                if mailbox.try_send(event).is_err() {
                    debug!("dropping timeout event: face {} mailbox full", face.id);
                }
            }
        }
    }

    fn forward_to(&mut self, face: FaceRef, packet: SharedBlock, is_interest: bool) {
        match face.kind {
            FaceKind::Link => {
                let Some(link) = self.links.get(&face.id) else { return };
                let mtu = link.driver.mtu();
                if packet.len() > mtu {
                    let err = ForwarderError::MtuExceeded { len: packet.len(), mtu };
                    warn!("dropping outbound packet on link {}: {}", face.id, err);
                    self.metrics.mtu_exceeded.increment();
                    return;
                }
                if let Err(e) = link.driver.send_frame(packet.as_slice()) {
                    warn!("link {} send failed: {}", face.id, e);
                    return;
                }
                if is_interest {
                    self.metrics.interests_forwarded.increment();
                } else {
                    self.metrics.data_sent.increment();
                }
                self.metrics.bytes_sent.add(packet.len() as u64);
            }
            FaceKind::App => {
                let Some(mailbox) = self.app_mailboxes.get(&face.id) else { return };
                let event = if is_interest { AppEvent::Interest(packet) } else { AppEvent::Data(packet) };
                if mailbox.try_send(AppLoopMsg::Event(event)).is_err() {
                    debug!("dropping event: face {} mailbox full", face.id);
                }
            }
        }
    }
}
