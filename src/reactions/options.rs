//! # Reaction options: priority, sync group, single-in-flight.
//!
//! [`ReactionOptions`] is the fused result of the option words supplied at
//! binding time. Each word sets one field; unspecified words keep their
//! defaults (priority NORMAL, no sync group, parallel instances allowed).
//!
//! # Example
//! ```
//! use turbine::{Priority, ReactionOptions};
//!
//! let opts = ReactionOptions::default();
//! assert_eq!(opts.priority, Priority::Normal);
//! assert!(opts.sync.is_none());
//! assert!(!opts.single);
//! ```

use crate::events::TypeKey;

/// Scheduling priority of a reaction's tasks.
///
/// Priority affects queue pop order only; it gives no preemption and no
/// ordering guarantee across unrelated reactions beyond "higher pops
/// first".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Popped before everything else. Reserve for reactions that feed
    /// control loops.
    Realtime,
    /// Above normal.
    High,
    /// The default.
    Normal,
    /// Below normal.
    Low,
    /// Popped only when nothing else is queued.
    Lowest,
}

/// Number of priority buckets in the task queue.
pub(crate) const PRIORITY_LEVELS: usize = 5;

impl Priority {
    /// Queue bucket index, highest priority first.
    pub(crate) fn bucket(self) -> usize {
        match self {
            Priority::Realtime => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
            Priority::Lowest => 4,
        }
    }

    /// Short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            Priority::Realtime => "realtime",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
            Priority::Lowest => "lowest",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Fused runtime options of one reaction.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReactionOptions {
    /// Queue priority for tasks of this reaction.
    pub priority: Priority,
    /// Mutual-exclusion group: at most one task of any reaction sharing
    /// this key runs at a time.
    pub sync: Option<TypeKey>,
    /// At most one scheduled-or-running task for this reaction; extra
    /// submissions are dropped at emit time.
    pub single: bool,
}
