//! # Frozen argument bundles.
//!
//! [`Args`] is the immutable set of payloads handed to a reaction callback:
//! the triggering payload (when the fire had one; periodic fires do not)
//! plus one snapshot per `With` companion. The bundle is assembled once at
//! dispatch time and never changes afterwards, so a callback observes a
//! consistent view no matter how long it sits in the queue.
//!
//! Companion data is gathered by the emit pipeline; the bundle itself is
//! just typed storage with downcasting accessors.

use std::sync::Arc;

use crate::events::key::{Event, Payload, TypeKey};

/// Immutable argument bundle passed to reaction callbacks.
#[derive(Clone, Default)]
pub struct Args {
    entries: Vec<(TypeKey, Payload)>,
}

impl Args {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: TypeKey, payload: Payload) {
        self.entries.push((key, payload));
    }

    /// Returns the payload of type `T`, if this bundle carries one.
    ///
    /// The first matching entry wins; a bundle never carries the same key
    /// twice unless a type is both trigger and companion of one reaction.
    pub fn get<T: Event>(&self) -> Option<Arc<T>> {
        let key = TypeKey::of::<T>();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, p)| p.clone().downcast::<T>().ok())
    }

    /// True if the bundle carries a payload under `key`.
    pub fn contains(&self, key: TypeKey) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    /// Number of payloads in the bundle.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the fire carried no payload at all (periodic fires).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
