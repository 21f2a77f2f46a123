//! # Latest-value cache for "get" semantics.
//!
//! [`DataStore`] maps a [`TypeKey`] to the most recent payload emitted under
//! that key, together with a per-slot monotonically increasing sequence
//! number. `With`-style companion data is gathered from here at dispatch
//! time.
//!
//! ## Rules
//! - Writes replace the slot value and bump its sequence number.
//! - Reads are snapshots; a reader never observes a torn write.
//! - There is no cross-slot atomicity: two keys written "together" may be
//!   observed in either order.
//!
//! Slots are created lazily on first write. The slot map takes a short
//! read lock on the hot path; per-slot access serializes on the slot's own
//! lock, so unrelated keys never contend.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::key::{Payload, TypeKey};

/// One slot: latest payload plus its sequence number.
struct Slot {
    payload: Option<Payload>,
    seq: u64,
}

/// Process-wide (per runtime) latest-payload cache.
pub struct DataStore {
    slots: RwLock<HashMap<TypeKey, Arc<RwLock<Slot>>>>,
}

impl DataStore {
    pub(crate) fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the slot for `key`, returning the new sequence number.
    pub fn put(&self, key: TypeKey, payload: Payload) -> u64 {
        let slot = self.slot(key);
        let mut cell = slot.write();
        cell.seq += 1;
        cell.payload = Some(payload);
        cell.seq
    }

    /// Snapshot of the latest payload for `key`, if one was ever written.
    pub fn get(&self, key: TypeKey) -> Option<(Payload, u64)> {
        let slot = {
            let slots = self.slots.read();
            slots.get(&key).cloned()
        }?;
        let cell = slot.read();
        cell.payload.clone().map(|p| (p, cell.seq))
    }

    fn slot(&self, key: TypeKey) -> Arc<RwLock<Slot>> {
        if let Some(slot) = self.slots.read().get(&key) {
            return slot.clone();
        }
        let mut slots = self.slots.write();
        slots
            .entry(key)
            .or_insert_with(|| {
                Arc::new(RwLock::new(Slot {
                    payload: None,
                    seq: 0,
                }))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn never_written_key_reads_none() {
        let store = DataStore::new();
        assert!(store.get(TypeKey::of::<u64>()).is_none());
    }

    #[test]
    fn put_replaces_and_bumps_sequence() {
        let store = DataStore::new();
        let key = TypeKey::of::<String>();

        let s1 = store.put(key, Arc::new("first".to_string()));
        let s2 = store.put(key, Arc::new("second".to_string()));
        assert!(s2 > s1);

        let (payload, seq) = store.get(key).expect("slot written");
        assert_eq!(seq, s2);
        let value = payload.downcast::<String>().expect("stored type");
        assert_eq!(&*value, "second");
    }

    #[test]
    fn slots_are_independent() {
        let store = DataStore::new();
        let s1 = store.put(TypeKey::of::<u8>(), Arc::new(1u8));
        let s2 = store.put(TypeKey::of::<u16>(), Arc::new(1u16));
        assert_eq!(s1, 1);
        assert_eq!(s2, 1);
    }
}
