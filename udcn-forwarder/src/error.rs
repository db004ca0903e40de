//! Error kinds for the forwarder and the app-facing library surface.
//!
//! Split from `udcn_common`'s codec/crypto errors along the boundary
//! spec.md §7 draws: the forwarder never sees a crypto failure (signature
//! verification is an app-level concern), and the app surface adds its own
//! registration/mailbox failures on top of the codec errors it re-parses.

use thiserror::Error;

use udcn_common::CodecError;

#[derive(Debug, Error)]
pub enum ForwarderError {
    #[error("no route for interest")]
    NoRoute,
    #[error("interest lifetime overflows forwarding timer")]
    LifetimeOverflow,
    #[error("packet of {len} bytes exceeds link mtu {mtu}")]
    MtuExceeded { len: usize, mtu: usize },
    #[error("face {0:?} is not registered")]
    UnknownFace(crate::face::FaceId),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("app face is not registered with the forwarder")]
    NotRegistered,
    #[error("app has terminated")]
    Terminated,
    #[error("forwarder mailbox is full")]
    MailboxFull,
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Forwarder(#[from] ForwarderError),
}
