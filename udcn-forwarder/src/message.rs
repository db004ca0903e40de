//! Message shapes carried over the bounded mailboxes that connect the
//! forwarder thread, app threads, and the timer services.
//!
//! Mirrors the teacher's `FaceEvent` enum shape (`rust-udcn-quic::face`)
//! re-expressed for the blocking `std::sync::mpsc` mailbox model spec.md §5
//! requires instead of `tokio::sync::mpsc`.

use std::sync::mpsc::SyncSender;

use udcn_common::{Name, SharedBlock};

use crate::error::ForwarderError;
use crate::face::FaceId;
use crate::pit::PitHandle;

/// Events the forwarder delivers into an app face's mailbox.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Data(SharedBlock),
    Timeout(SharedBlock),
    Interest(SharedBlock),
}

/// Everything that can land in an app thread's own mailbox: forwarder
/// events, this app's own scheduled-callback timers, and termination.
pub enum AppLoopMsg {
    Event(AppEvent),
    Timer(u64),
    Terminate,
}

/// Messages the forwarder's single event loop processes (spec.md §4.7).
/// `AddFace`/`RemoveFace`/`AddFib` are synchronous: the sender blocks on
/// `reply` until the forwarder acknowledges, so that by the time
/// `register_prefix` returns, the FIB already reflects the registration.
pub enum ForwarderMessage {
    FrameReceived { face: FaceId, packet: SharedBlock },
    AppSend { face: FaceId, packet: SharedBlock },
    AddFace {
        mailbox: SyncSender<AppLoopMsg>,
        reply: SyncSender<Result<FaceId, ForwarderError>>,
    },
    RemoveFace {
        face: FaceId,
        reply: SyncSender<Result<(), ForwarderError>>,
    },
    AddFib {
        face: FaceId,
        prefix: Name,
        reply: SyncSender<Result<(), ForwarderError>>,
    },
    TimerFired(PitHandle),
}
