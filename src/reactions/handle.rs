//! # Reaction handles.
//!
//! [`ReactionHandle`] is the stable token returned by a successful bind.
//! It enables and disables the reaction without unbinding it: disabling
//! prevents future scheduling from the point `disable` returns, while
//! tasks already running complete normally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Enable/disable token for one bound reaction.
#[derive(Clone)]
pub struct ReactionHandle {
    id: u64,
    enabled: Arc<AtomicBool>,
}

impl ReactionHandle {
    pub(crate) fn new(id: u64, enabled: Arc<AtomicBool>) -> Self {
        Self { id, enabled }
    }

    /// The reaction's process-unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Allows the reaction to be scheduled again.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Stops future scheduling. In-flight tasks complete; queued tasks
    /// are discarded when a worker pops them.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Current enabled state.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}
