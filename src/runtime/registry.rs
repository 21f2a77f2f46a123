//! # Dispatch registry.
//!
//! Maps every trigger [`TypeKey`] to the ordered list of reactions it
//! fires. Bindings are rare and emits are hot, so lookups return an
//! `Arc` snapshot of the list and never hold the registry lock while the
//! caller iterates; writers clone-and-swap the list under a write lock.
//!
//! ## Rules
//! - List order is reaction-creation order; it is the tie-break for
//!   equal-priority tasks of one emit.
//! - Entries are append-only. Unbinding disables the reaction in place;
//!   disabled entries are skipped at dispatch, never removed, so handles
//!   stay valid for re-enabling.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::TypeKey;
use crate::reactions::Reaction;

type ReactionList = Arc<Vec<Arc<Reaction>>>;

/// TypeKey → ordered reaction list.
pub(crate) struct Registry {
    triggered_by: RwLock<HashMap<TypeKey, ReactionList>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            triggered_by: RwLock::new(HashMap::new()),
        }
    }

    /// Appends `reaction` to the list of every one of its triggers,
    /// atomically across all trigger keys.
    pub(crate) fn bind(&self, reaction: &Arc<Reaction>) {
        let mut lists = self.triggered_by.write();
        for key in reaction.triggers() {
            let list = lists.entry(*key).or_default();
            let mut next = Vec::with_capacity(list.len() + 1);
            next.extend(list.iter().cloned());
            next.push(Arc::clone(reaction));
            *list = Arc::new(next);
        }
    }

    /// Snapshot of the reactions triggered by `key`, safe to iterate
    /// without holding any registry lock.
    pub(crate) fn lookup(&self, key: TypeKey) -> Option<ReactionList> {
        self.triggered_by.read().get(&key).cloned()
    }
}
