// ── First-seen-connected timestamps ──
//
// The only state that outlives a reconciliation pass. After every pass the
// key set equals exactly the connected devices of that pass's result.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::model::Key;

#[derive(Debug, Clone, Default)]
pub struct ConnectionTimeTable {
    entries: HashMap<Key, Instant>,
}

impl ConnectionTimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded time for `key`, recording `now` if there was none.
    pub fn get_or_insert(&mut self, key: &Key, now: Instant) -> Instant {
        *self.entries.entry(key.clone()).or_insert(now)
    }

    pub fn get_or_insert_now(&mut self, key: &Key) -> Instant {
        self.get_or_insert(key, Instant::now())
    }

    /// Drop every entry whose key is not in `keep`.
    pub fn retain_only(&mut self, keep: &HashSet<&Key>) {
        self.entries.retain(|key, _| keep.contains(key));
    }

    pub fn get(&self, key: &Key) -> Option<Instant> {
        self.entries.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
