use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::record::RecordRef;

/// Per-instance identity of a shared record.
///
/// This is the address of the `Arc` allocation. It is totally ordered and
/// stays fixed for as long as the record is alive, which covers the whole
/// comparison that borrows it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(usize);

impl Identity {
    pub fn of(record: &RecordRef) -> Self {
        Identity(Arc::as_ptr(record) as *const () as usize)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Record pairs already entered during one comparison.
///
/// Pairs are unordered: entering `(a, b)` also marks `(b, a)`. A ledger lives
/// for exactly one top-level comparison and is never shared.
#[derive(Debug, Default)]
pub struct Ledger {
    visited: HashSet<(Identity, Identity)>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the pair as visited. Returns false if it was already present.
    pub fn enter(&mut self, a: Identity, b: Identity) -> bool {
        let pair = if a <= b { (a, b) } else { (b, a) };
        self.visited.insert(pair)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}
