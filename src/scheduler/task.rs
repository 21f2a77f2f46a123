//! # Ready reaction tasks.
//!
//! A [`Task`] pairs one reaction with one frozen argument bundle and a
//! submission sequence number. Tasks are transient: created by the emit
//! pipeline, queued, possibly parked on a sync group, executed once, and
//! dropped.

use std::sync::Arc;

use crate::events::Args;
use crate::reactions::Reaction;

/// One scheduled fire of a reaction.
pub(crate) struct Task {
    pub reaction: Arc<Reaction>,
    pub args: Args,
    /// Global submission order; FIFO tie-break within a priority bucket
    /// and within a sync group.
    pub seq: u64,
    /// Set when the task was handed the sync-group slot on resume; the
    /// worker must skip admission or the task would park itself behind
    /// the slot it already holds.
    pub admitted: bool,
}

impl Task {
    pub(crate) fn new(reaction: Arc<Reaction>, args: Args, seq: u64) -> Self {
        Self {
            reaction,
            args,
            seq,
            admitted: false,
        }
    }
}
