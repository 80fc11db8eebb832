//! In-flight guard for cart mutations.
//!
//! Two rapid clicks on the same control would otherwise each apply the
//! optimistic counter update and each reach the server. The guard records
//! every rewritten mutation by its [`MutationKey`] until the response side
//! settles it.
//!
//! Each recorded mutation gets its own sequence number. Settling releases
//! only that entry, so a late or repeated settlement for an earlier request
//! cannot release a newer mutation with the same key.

use std::sync::atomic::{AtomicU64, Ordering};

use cartbox_core::MutationKey;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// What to do with a mutation whose key is already in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InFlightPolicy {
    /// Cancel the duplicate request: no rewrite, no counter update.
    #[default]
    Reject,
    /// Let duplicates through; each one is tracked and settled separately.
    Allow,
}

/// Set of unsettled cart mutations.
#[derive(Debug, Default)]
pub struct PendingMutations {
    entries: DashMap<MutationKey, Vec<u64>>,
    next_sequence: AtomicU64,
}

impl PendingMutations {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a mutation with `key` is unsettled.
    pub fn is_pending(&self, key: &MutationKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Records the start of a mutation and returns its sequence number.
    ///
    /// Returns `None` if `policy` is [`InFlightPolicy::Reject`] and `key`
    /// is already in flight; nothing is recorded in that case.
    pub fn begin(&self, key: MutationKey, policy: InFlightPolicy) -> Option<u64> {
        match (self.entries.entry(key), policy) {
            (Entry::Occupied(_), InFlightPolicy::Reject) => None,
            (Entry::Occupied(mut entry), InFlightPolicy::Allow) => {
                let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
                entry.get_mut().push(sequence);
                Some(sequence)
            }
            (Entry::Vacant(entry), _) => {
                let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
                entry.insert(vec![sequence]);
                Some(sequence)
            }
        }
    }

    /// Records that the mutation `sequence` with `key` settled.
    ///
    /// Returns `false` if that mutation was not in flight, either because it
    /// already settled or because it was never recorded.
    pub fn finish(&self, key: &MutationKey, sequence: u64) -> bool {
        match self.entries.entry(*key) {
            Entry::Occupied(mut entry) => {
                let sequences = entry.get_mut();
                let Some(position) = sequences.iter().position(|s| *s == sequence) else {
                    return false;
                };
                sequences.swap_remove(position);
                if sequences.is_empty() {
                    entry.remove();
                }
                true
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Number of distinct keys in flight.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
