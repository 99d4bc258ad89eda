//! `Frontier`: candidate vehicles ordered by predicted encounter time.
//!
//! The graph builder explores best-first: the candidate whose encounter is
//! predicted soonest is admitted next.  Several entries for the same vehicle
//! may be queued at once (discovered by different parents); the builder keeps
//! whichever pops first and discards the rest.
//!
//! Equal keys pop in insertion order.  Each entry carries a monotone sequence
//! number as a secondary key, so two builds over the same oracle answers pop
//! entries in exactly the same order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tpd_core::{SimTime, VehicleId};
use tpd_encounter::Encounter;

/// The encounter through which a candidate was discovered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParentLink {
    pub parent:    VehicleId,
    pub encounter: Encounter,
}

/// One candidate admission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierEntry {
    pub vehicle: VehicleId,
    /// Predicted encounter time; the root is keyed at the query time.
    pub key: SimTime,
    /// `None` only for the root.
    pub parent: Option<ParentLink>,
}

struct Queued {
    key:   SimTime,
    seq:   u64,
    entry: FrontierEntry,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.key, self.seq).cmp(&(other.key, other.seq))
    }
}

/// Min-key priority queue of [`FrontierEntry`]s.
#[derive(Default)]
pub struct Frontier {
    heap:   BinaryHeap<Reverse<Queued>>,
    next:   u64,
    pushes: usize,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FrontierEntry) {
        let seq = self.next;
        self.next += 1;
        self.pushes += 1;
        self.heap.push(Reverse(Queued { key: entry.key, seq, entry }));
    }

    /// Remove and return the entry with the smallest key.
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop().map(|Reverse(q)| q.entry)
    }

    pub fn peek_key(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse(q)| q.key)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Entries pushed since the last [`clear`](Self::clear).
    pub fn pushes(&self) -> usize {
        self.pushes
    }

    /// Empty the queue, keeping its allocation.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.next = 0;
        self.pushes = 0;
    }
}
