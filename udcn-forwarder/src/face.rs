//! Face identifiers and the face table: a mapping from face identifier to
//! face variant, owned exclusively by the forwarder thread.
//!
//! Generalized off the teacher's eBPF-oriented `rust-udcn-common::types`
//! (`FaceId` newtype, `FaceType` enum with `NetDevice`/`App`/`Quic` variants)
//! into the plain two-variant in-process table spec.md §3 describes: `LINK`
//! (one per network interface) and `APP` (one per application thread).

use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a face, assigned by the forwarder on `add_face`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u64);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaceId({})", self.0)
    }
}

/// The two face variants spec.md §3 recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceKind {
    /// The physical broadcast device; one per network interface.
    Link,
    /// An application thread.
    App,
}

/// `(id, variant)` pair as carried in PIT/FIB incoming- and next-hop-face
/// lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceRef {
    pub id: FaceId,
    pub kind: FaceKind,
}

/// Maps face identifier to face variant. Lives from `add_face` to
/// `remove_face`; owned exclusively by the forwarder thread (spec.md §5).
#[derive(Debug, Default)]
pub struct FaceTable {
    faces: HashMap<FaceId, FaceKind>,
    next_id: u64,
}

impl FaceTable {
    pub fn new() -> Self {
        Self { faces: HashMap::new(), next_id: 1 }
    }

    /// Registers a new face of the given kind and returns its freshly
    /// allocated identifier.
    pub fn add_face(&mut self, kind: FaceKind) -> FaceId {
        let id = FaceId(self.next_id);
        self.next_id += 1;
        self.faces.insert(id, kind);
        id
    }

    pub fn remove_face(&mut self, id: FaceId) -> Option<FaceKind> {
        self.faces.remove(&id)
    }

    pub fn kind_of(&self, id: FaceId) -> Option<FaceKind> {
        self.faces.get(&id).copied()
    }

    pub fn contains(&self, id: FaceId) -> bool {
        self.faces.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = FaceRef> + '_ {
        self.faces.iter().map(|(&id, &kind)| FaceRef { id, kind })
    }
}
