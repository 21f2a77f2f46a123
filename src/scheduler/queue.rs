//! # Priority task queue.
//!
//! [`TaskQueue`] holds ready tasks in five buckets, one per
//! [`Priority`](crate::Priority) level. Workers pop the highest non-empty
//! bucket; within a bucket order is FIFO by submission sequence, so two
//! tasks submitted from one emit keep their relative order at equal
//! priority.
//!
//! ## Rules
//! - `push` never blocks. On a bounded queue, overflow rejects the
//!   **newest** task and the caller reports it; nothing already queued is
//!   displaced.
//! - `pop` blocks until a task is available or the queue is closed;
//!   `pop_timeout` bounds the wait.
//! - `close` stops new submissions immediately but lets poppers drain
//!   what is already queued before they see [`Pop::Closed`].

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::reactions::PRIORITY_LEVELS;
use crate::scheduler::task::Task;

/// Result of a queue pop.
pub(crate) enum Pop {
    /// A ready task, highest priority first.
    Task(Task),
    /// Queue closed and fully drained; the worker exits.
    Closed,
}

/// Why a push was rejected. The task comes back to the caller so it can
/// reconcile counters and sync-group slots.
pub(crate) enum Rejected {
    /// Bounded queue at capacity; the newest task is refused.
    Overflow(Task),
    /// Queue already closed (runtime shutting down).
    Closed(Task),
}

impl std::fmt::Debug for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (kind, task) = match self {
            Rejected::Overflow(task) => ("Overflow", task),
            Rejected::Closed(task) => ("Closed", task),
        };
        write!(f, "Rejected::{kind}(seq {})", task.seq)
    }
}

struct QueueState {
    buckets: [VecDeque<Task>; PRIORITY_LEVELS],
    len: usize,
    closed: bool,
}

/// Shared five-bucket priority queue drained by the worker pool.
pub(crate) struct TaskQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
    /// 0 means unbounded.
    bound: usize,
}

impl TaskQueue {
    pub(crate) fn new(bound: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                buckets: Default::default(),
                len: 0,
                closed: false,
            }),
            ready: Condvar::new(),
            bound,
        }
    }

    /// Enqueues a task into its priority bucket.
    pub(crate) fn push(&self, task: Task) -> Result<(), Rejected> {
        let bucket = task.reaction.options().priority.bucket();
        let mut state = self.state.lock();
        if state.closed {
            return Err(Rejected::Closed(task));
        }
        if self.bound != 0 && state.len >= self.bound {
            return Err(Rejected::Overflow(task));
        }
        state.buckets[bucket].push_back(task);
        state.len += 1;
        drop(state);
        self.ready.notify_one();
        Ok(())
    }

    /// Blocks until a task is ready or the queue is closed and drained.
    pub(crate) fn pop(&self) -> Pop {
        let mut state = self.state.lock();
        loop {
            if let Some(task) = Self::take(&mut state) {
                return Pop::Task(task);
            }
            if state.closed {
                return Pop::Closed;
            }
            self.ready.wait(&mut state);
        }
    }

    /// Like [`pop`](Self::pop) but gives up after `wait`, returning `None`.
    pub(crate) fn pop_timeout(&self, wait: Duration) -> Option<Pop> {
        let deadline = std::time::Instant::now() + wait;
        let mut state = self.state.lock();
        loop {
            if let Some(task) = Self::take(&mut state) {
                return Some(Pop::Task(task));
            }
            if state.closed {
                return Some(Pop::Closed);
            }
            if self.ready.wait_until(&mut state, deadline).timed_out() {
                return None;
            }
        }
    }

    /// Closes the queue: rejects new pushes, wakes all poppers. Tasks
    /// already queued remain poppable until drained.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);
        self.ready.notify_all();
    }

    fn take(state: &mut QueueState) -> Option<Task> {
        for bucket in state.buckets.iter_mut() {
            if let Some(task) = bucket.pop_front() {
                state.len -= 1;
                return Some(task);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::events::{Args, TypeKey};
    use crate::reactions::{OwnerToken, Priority, Reaction, ReactionIdent, ReactionOptions};

    fn reaction(priority: Priority) -> Arc<Reaction> {
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
                priority,
                ..ReactionOptions::default()
            },
            Box::new(|_: &Args| {}),
        )
    }

    fn task(reaction: &Arc<Reaction>, seq: u64) -> Task {
        Task::new(Arc::clone(reaction), Args::new(), seq)
    }

    fn popped_priority(queue: &TaskQueue) -> Priority {
        match queue.pop() {
            Pop::Task(t) => t.reaction.options().priority,
            Pop::Closed => panic!("queue closed unexpectedly"),
        }
    }

    #[test]
    fn pops_highest_priority_first() {
        let queue = TaskQueue::new(0);
        let low = reaction(Priority::Low);
        let high = reaction(Priority::High);
        let normal = reaction(Priority::Normal);
        queue.push(task(&low, 0)).unwrap();
        queue.push(task(&high, 1)).unwrap();
        queue.push(task(&normal, 2)).unwrap();

        assert_eq!(popped_priority(&queue), Priority::High);
        assert_eq!(popped_priority(&queue), Priority::Normal);
        assert_eq!(popped_priority(&queue), Priority::Low);
    }

    #[test]
    fn fifo_within_one_bucket() {
        let queue = TaskQueue::new(0);
        let r = reaction(Priority::Normal);
        for seq in 0..4 {
            queue.push(task(&r, seq)).unwrap();
        }
        for expected in 0..4 {
            match queue.pop() {
                Pop::Task(t) => assert_eq!(t.seq, expected),
                Pop::Closed => panic!("queue closed unexpectedly"),
            }
        }
    }

    #[test]
    fn close_drains_queued_tasks_before_sentinel() {
        let queue = TaskQueue::new(0);
        let r = reaction(Priority::Normal);
        queue.push(task(&r, 0)).unwrap();
        queue.close();

        assert!(matches!(queue.pop(), Pop::Task(_)));
        assert!(matches!(queue.pop(), Pop::Closed));
        assert!(matches!(
            queue.push(task(&r, 1)),
            Err(Rejected::Closed(_))
        ));
    }

    #[test]
    fn bounded_queue_rejects_newest() {
        let queue = TaskQueue::new(1);
        let r = reaction(Priority::Normal);
        queue.push(task(&r, 0)).unwrap();
        match queue.push(task(&r, 1)) {
            Err(Rejected::Overflow(t)) => assert_eq!(t.seq, 1),
            _ => panic!("expected overflow of the newest task"),
        }
    }

    #[test]
    fn pop_timeout_expires_on_empty_queue() {
        let queue = TaskQueue::new(0);
        assert!(queue
            .pop_timeout(std::time::Duration::from_millis(20))
            .is_none());
    }
}
