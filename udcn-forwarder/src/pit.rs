//! Pending Interest Table: aggregation, per-entry timers, and Data matching.
//!
//! Grounded directly on `original_source/sys/net/ndn/pit.c`: a linear scan
//! over entries on insertion (`ndn_pit_add`/`_pit_entry_add_face`), and
//! a linear scan on Data arrival. The doubly-linked list of raw pointers is
//! replaced by a slab keyed on a stable `PitHandle`, per spec.md §9's
//! redesign note — timers carry the handle, not a pointer, so a stray fire
//! after removal is a lookup miss rather than a dangling access.

use std::collections::HashMap;

use udcn_common::{Name, NameRelation, SharedBlock};

use crate::face::FaceRef;
use crate::timer::TimerId;

/// Stable identifier for a PIT entry, valid until the entry is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitHandle(u64);

/// A pending Interest: the originating Interest block, every face it has
/// arrived from, and its single expiration timer.
#[derive(Debug, Clone)]
pub struct PitEntry {
    pub interest: SharedBlock,
    pub name: Name,
    pub faces: Vec<FaceRef>,
    pub timer: Option<TimerId>,
}

#[derive(Debug, Default)]
pub struct Pit {
    entries: HashMap<PitHandle, PitEntry>,
    next_handle: u64,
}

/// Outcome of `add`: whether a fresh entry was created, or an existing one
/// was augmented with a new incoming face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Created,
    Aggregated,
}

impl Pit {
    pub fn new() -> Self {
        Self { entries: HashMap::new(), next_handle: 1 }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, handle: PitHandle) -> Option<&PitEntry> {
        self.entries.get(&handle)
    }

    /// `pit_add`: finds an entry whose Interest name equals `name` (selectors
    /// ignored by construction — matching is purely on the parsed name).
    /// If found, adds `incoming` to its face list unless already present and
    /// returns `Aggregated`; the *caller* is responsible for rearming the
    /// timer. Otherwise allocates a fresh entry with a single incoming face
    /// and `Created`.
    pub fn add(&mut self, incoming: FaceRef, name: Name, interest: SharedBlock) -> (PitHandle, AddOutcome) {
        for (&handle, entry) in self.entries.iter_mut() {
            if entry.name == name {
                if !entry.faces.iter().any(|f| f.id == incoming.id) {
                    entry.faces.push(incoming);
                }
                return (handle, AddOutcome::Aggregated);
            }
        }

        let handle = PitHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.insert(
            handle,
            PitEntry { interest, name, faces: vec![incoming], timer: None },
        );
        (handle, AddOutcome::Created)
    }

    /// Records the timer armed for `handle` so a later rearm/cancel can find it.
    pub fn set_timer(&mut self, handle: PitHandle, timer: TimerId) {
        if let Some(entry) = self.entries.get_mut(&handle) {
            entry.timer = Some(timer);
        }
    }

    /// Removes and returns the entry for `handle`, if still present. Used
    /// both by timer expiry and by Data matching; a miss here (the entry was
    /// already removed by the other path) is the mechanism that makes a
    /// stray timer fire after removal harmless.
    pub fn remove(&mut self, handle: PitHandle) -> Option<PitEntry> {
        self.entries.remove(&handle)
    }

    /// `pit_match_data`: handles of every entry whose name equals or is a
    /// prefix of `data_name`.
    pub fn find_matching(&self, data_name: &Name) -> Vec<PitHandle> {
        self.entries
            .iter()
            .filter_map(|(&handle, entry)| {
                let matches = matches!(
                    udcn_common::name::name_compare(&entry.name, data_name),
                    NameRelation::Equal | NameRelation::APrefixOfB
                );
                matches.then_some(handle)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::FaceKind;
    use udcn_common::packet::interest;

    fn interest_block(uri: &str, nonce: u32) -> (Name, SharedBlock) {
        let name = Name::from_uri(uri).unwrap();
        (name.clone(), interest::create(&name, nonce, 4000))
    }

    #[test]
    fn aggregates_duplicate_names_with_distinct_nonces() {
        let mut pit = Pit::new();
        let (name, block1) = interest_block("/a/b", 1);
        let (_, block2) = interest_block("/a/b", 2);

        let f1 = FaceRef { id: crate::face::FaceId(1), kind: FaceKind::App };
        let f2 = FaceRef { id: crate::face::FaceId(2), kind: FaceKind::App };

        let (h1, outcome1) = pit.add(f1, name.clone(), block1);
        assert_eq!(outcome1, AddOutcome::Created);
        let (h2, outcome2) = pit.add(f2, name, block2);
        assert_eq!(outcome2, AddOutcome::Aggregated);
        assert_eq!(h1, h2);

        assert_eq!(pit.len(), 1);
        assert_eq!(pit.get(h1).unwrap().faces.len(), 2);
    }

    #[test]
    fn duplicate_face_is_not_added_twice() {
        let mut pit = Pit::new();
        let (name, block) = interest_block("/a", 1);
        let f = FaceRef { id: crate::face::FaceId(9), kind: FaceKind::App };
        let (h, _) = pit.add(f, name.clone(), block.clone());
        let (h2, outcome) = pit.add(f, name, block);
        assert_eq!(h, h2);
        assert_eq!(outcome, AddOutcome::Aggregated);
        assert_eq!(pit.get(h).unwrap().faces.len(), 1);
    }

    #[test]
    fn match_on_data_finds_prefix_and_equal() {
        let mut pit = Pit::new();
        let (name, block) = interest_block("/x", 1);
        let f = FaceRef { id: crate::face::FaceId(1), kind: FaceKind::App };
        let (h, _) = pit.add(f, name, block);

        let data_name = Name::from_uri("/x/v1").unwrap();
        let matched = pit.find_matching(&data_name);
        assert_eq!(matched, vec![h]);
    }

    #[test]
    fn remove_twice_is_safe() {
        let mut pit = Pit::new();
        let (name, block) = interest_block("/a", 1);
        let f = FaceRef { id: crate::face::FaceId(1), kind: FaceKind::App };
        let (h, _) = pit.add(f, name, block);
        assert!(pit.remove(h).is_some());
        assert!(pit.remove(h).is_none());
    }
}
