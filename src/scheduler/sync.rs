//! # Sync-group admission.
//!
//! [`SyncScheduler`] enforces the `Sync<G>` option: across all reactions
//! sharing the group key `G`, at most one task executes at a time, and
//! tasks run in submission order.
//!
//! ## Admission protocol
//! Submission registers the task's sequence with its group; a worker
//! consults the scheduler immediately before executing. A task is
//! admitted only when the group is idle **and** it is the group's oldest
//! outstanding submission; otherwise it parks and the worker moves on.
//! Without the ordering check, two workers popping group tasks
//! back-to-back could race admission and invert FIFO order.
//!
//! On completion the finishing worker hands the group slot to the parked
//! task that is next in submission order (re-submitting it to the task
//! queue at its original priority), or idles the group when that task has
//! not been popped yet — it admits itself on arrival.
//!
//! ## Rules
//! - One lock per group; groups never contend with each other.
//! - Mutual exclusion is between members of the same group only.
//! - FIFO holds within a group; relative order across groups is not
//!   guaranteed.
//! - Dropped tasks (disabled reaction, dead owner, rejected push) must
//!   be forgotten or the group would wait for them forever.
//! - Direct-scope emits block on the group's condvar instead of
//!   parking, since the emitting thread has nothing else to do.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, RwLock};

use crate::events::TypeKey;
use crate::scheduler::task::Task;

/// Outcome of a queue-path admission attempt.
pub(crate) enum Admission {
    /// Run now; caller must release afterwards.
    Run(Task),
    /// Group busy or an older submission is still outstanding; the task
    /// was parked and resumes later.
    Parked,
}

struct Group {
    running: bool,
    /// Outstanding submissions in FIFO order.
    expected: VecDeque<u64>,
    /// Tasks that arrived out of turn, waiting for the slot.
    parked: Vec<Task>,
}

impl Group {
    /// Hands the slot to the parked task that is next in line, if it has
    /// already been popped. Keeps `running` claimed for it.
    fn hand_off(&mut self) -> Option<Task> {
        let next_seq = *self.expected.front()?;
        let pos = self.parked.iter().position(|t| t.seq == next_seq)?;
        self.expected.pop_front();
        let mut task = self.parked.remove(pos);
        task.admitted = true;
        self.running = true;
        Some(task)
    }
}

struct GroupCell {
    state: Mutex<Group>,
    idle: Condvar,
}

/// Per-group mutual exclusion with FIFO hand-off.
pub(crate) struct SyncScheduler {
    groups: RwLock<HashMap<TypeKey, Arc<GroupCell>>>,
}

impl SyncScheduler {
    pub(crate) fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Records a submission; called before the task enters the queue.
    pub(crate) fn register(&self, group: TypeKey, seq: u64) {
        let cell = self.cell(group);
        let mut state = cell.state.lock();
        state.expected.push_back(seq);
    }

    /// Queue-path admission: run the task or park it in the group.
    pub(crate) fn admit(&self, group: TypeKey, task: Task) -> Admission {
        let cell = self.cell(group);
        let mut state = cell.state.lock();
        if !state.running && state.expected.front() == Some(&task.seq) {
            state.running = true;
            state.expected.pop_front();
            Admission::Run(task)
        } else {
            state.parked.push(task);
            Admission::Parked
        }
    }

    /// Direct-path admission: block the emitting thread until the group
    /// is idle, then claim it. Direct emits carry no submission sequence
    /// and may overtake parked queue tasks.
    pub(crate) fn admit_blocking(&self, group: TypeKey) {
        let cell = self.cell(group);
        let mut state = cell.state.lock();
        while state.running {
            cell.idle.wait(&mut state);
        }
        state.running = true;
    }

    /// Releases the group after execution.
    ///
    /// Returns the next task in submission order if it is already
    /// parked; the caller re-submits it at its original priority. When
    /// the next task has not been popped yet (or nothing is outstanding)
    /// the group goes idle and blocked direct emitters are woken.
    pub(crate) fn release(&self, group: TypeKey) -> Option<Task> {
        let cell = self.cell(group);
        let mut state = cell.state.lock();
        match state.hand_off() {
            Some(task) => Some(task),
            None => {
                state.running = false;
                cell.idle.notify_one();
                None
            }
        }
    }

    /// Removes a dropped task's submission so the group never waits for
    /// it. May unblock a parked successor, which the caller re-submits.
    pub(crate) fn forget(&self, group: TypeKey, seq: u64) -> Option<Task> {
        let cell = self.cell(group);
        let mut state = cell.state.lock();
        state.expected.retain(|s| *s != seq);
        if state.running {
            return None;
        }
        state.hand_off()
    }

    fn cell(&self, group: TypeKey) -> Arc<GroupCell> {
        if let Some(cell) = self.groups.read().get(&group) {
            return cell.clone();
        }
        let mut groups = self.groups.write();
        groups
            .entry(group)
            .or_insert_with(|| {
                Arc::new(GroupCell {
                    state: Mutex::new(Group {
                        running: false,
                        expected: VecDeque::new(),
                        parked: Vec::new(),
                    }),
                    idle: Condvar::new(),
                })
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::events::Args;
    use crate::reactions::{OwnerToken, Reaction, ReactionIdent, ReactionOptions};

    struct Db;

    fn reaction() -> Arc<Reaction> {
        Reaction::new(
            ReactionIdent {
                label: None,
                fusion: "test".to_string(),
                callback: "test",
            },
            OwnerToken::new(),
            vec![TypeKey::of::<u8>()],
            vec![],
            ReactionOptions {
                sync: Some(TypeKey::of::<Db>()),
                ..ReactionOptions::default()
            },
            Box::new(|_: &Args| {}),
        )
    }

    fn task(reaction: &Arc<Reaction>, seq: u64) -> Task {
        Task::new(Arc::clone(reaction), Args::new(), seq)
    }

    #[test]
    fn oldest_submission_admitted_rest_parked() {
        let sync = SyncScheduler::new();
        let group = TypeKey::of::<Db>();
        let r = reaction();

        sync.register(group, 0);
        sync.register(group, 1);

        assert!(matches!(sync.admit(group, task(&r, 0)), Admission::Run(_)));
        assert!(matches!(sync.admit(group, task(&r, 1)), Admission::Parked));
    }

    #[test]
    fn out_of_turn_pop_waits_for_older_submission() {
        let sync = SyncScheduler::new();
        let group = TypeKey::of::<Db>();
        let r = reaction();

        sync.register(group, 0);
        sync.register(group, 1);

        // a worker pops seq 1 first: group is idle but seq 0 is still
        // outstanding, so seq 1 must park
        assert!(matches!(sync.admit(group, task(&r, 1)), Admission::Parked));
        assert!(matches!(sync.admit(group, task(&r, 0)), Admission::Run(_)));

        let resumed = sync.release(group).expect("seq 1 resumes in order");
        assert_eq!(resumed.seq, 1);
        assert!(resumed.admitted);
        assert!(sync.release(group).is_none());
    }

    #[test]
    fn release_hands_slot_in_fifo_order() {
        let sync = SyncScheduler::new();
        let group = TypeKey::of::<Db>();
        let r = reaction();

        for seq in 0..3 {
            sync.register(group, seq);
        }
        let running = match sync.admit(group, task(&r, 0)) {
            Admission::Run(t) => t,
            Admission::Parked => panic!("idle group must admit the head"),
        };
        assert!(matches!(sync.admit(group, task(&r, 1)), Admission::Parked));
        assert!(matches!(sync.admit(group, task(&r, 2)), Admission::Parked));
        drop(running);

        assert_eq!(sync.release(group).expect("head of pending").seq, 1);
        assert_eq!(sync.release(group).expect("next pending").seq, 2);
        assert!(sync.release(group).is_none());
    }

    #[test]
    fn forget_unblocks_parked_successor() {
        let sync = SyncScheduler::new();
        let group = TypeKey::of::<Db>();
        let r = reaction();

        sync.register(group, 0);
        sync.register(group, 1);
        assert!(matches!(sync.admit(group, task(&r, 1)), Admission::Parked));

        // seq 0 was dropped before execution; seq 1 takes the slot
        let resumed = sync.forget(group, 0).expect("successor unblocked");
        assert_eq!(resumed.seq, 1);
        assert!(resumed.admitted);
    }
}
