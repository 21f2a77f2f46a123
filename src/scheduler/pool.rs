//! # Worker pool: task execution with failure isolation.
//!
//! N OS threads drain the shared [`TaskQueue`]. Each worker loops: pop,
//! lifecycle check, sync admission, invoke inside a panic boundary,
//! reconcile counters, hand off the sync-group slot. User callbacks run
//! to completion on the worker; the runtime never preempts them.
//!
//! ## Architecture
//! ```text
//! TaskQueue ──pop──► worker
//!                      ├─ disabled / owner dead ──► drop, reconcile
//!                      ├─ sync group busy ────────► park in group, next pop
//!                      └─ admitted ──► invoke (catch_unwind)
//!                                        ├─ panic ──► ERROR log, swallowed
//!                                        └─ done ───► release slot,
//!                                                     resume next in group
//! ```
//!
//! ## Rules
//! - Panics inside callbacks are captured, reported with the reaction
//!   identifier, and never kill the worker.
//! - A parked task costs the worker nothing; it pulls the next task
//!   immediately.
//! - Shutdown closes the queue; workers drain what is queued, then exit
//!   on the terminal sentinel.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::RuntimeError;
use crate::events::TypeKey;
use crate::logging::Logger;
use crate::scheduler::queue::{Pop, Rejected, TaskQueue};
use crate::scheduler::sync::{Admission, SyncScheduler};
use crate::scheduler::task::Task;

/// Reactions currently executing, keyed by task sequence.
///
/// Consulted during shutdown to report which callbacks exceeded the
/// grace period.
pub(crate) struct RunningSet {
    inner: Mutex<HashMap<u64, String>>,
}

impl RunningSet {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    fn insert(&self, seq: u64, ident: String) {
        self.inner.lock().insert(seq, ident);
    }

    fn remove(&self, seq: u64) {
        self.inner.lock().remove(&seq);
    }

    /// Sorted identifiers of reactions running right now.
    pub(crate) fn snapshot(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().values().cloned().collect();
        names.sort_unstable();
        names
    }
}

/// Everything a worker thread needs; cloned once per worker.
#[derive(Clone)]
pub(crate) struct WorkerCtx {
    pub queue: Arc<TaskQueue>,
    pub sync: Arc<SyncScheduler>,
    pub running: Arc<RunningSet>,
    pub logger: Logger,
}

struct Live {
    count: Mutex<usize>,
    all_done: Condvar,
}

/// Fixed-size pool of worker threads.
pub(crate) struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    live: Arc<Live>,
}

impl WorkerPool {
    /// Spawns `n` workers draining the queue in `ctx`.
    pub(crate) fn spawn(n: usize, ctx: WorkerCtx) -> Self {
        let live = Arc::new(Live {
            count: Mutex::new(n),
            all_done: Condvar::new(),
        });
        let handles = (0..n)
            .map(|i| {
                let ctx = ctx.clone();
                let live = Arc::clone(&live);
                std::thread::Builder::new()
                    .name(format!("turbine-worker-{i}"))
                    .spawn(move || {
                        worker_loop(&ctx);
                        let mut count = live.count.lock();
                        *count -= 1;
                        if *count == 0 {
                            live.all_done.notify_all();
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();
        Self { handles, live }
    }

    /// Waits for all workers to exit, up to `grace`.
    ///
    /// Call after closing the queue. On timeout the stuck callbacks are
    /// reported and the threads are left detached; they exit on their
    /// own when the callbacks return.
    pub(crate) fn join_with_grace(
        self,
        grace: Duration,
        running: &RunningSet,
    ) -> Result<(), RuntimeError> {
        let deadline = Instant::now() + grace;
        {
            let mut count = self.live.count.lock();
            while *count > 0 {
                if self
                    .live
                    .all_done
                    .wait_until(&mut count, deadline)
                    .timed_out()
                {
                    return Err(RuntimeError::GraceExceeded {
                        grace,
                        stuck: running.snapshot(),
                    });
                }
            }
        }
        for handle in self.handles {
            let _ = handle.join();
        }
        Ok(())
    }
}

fn worker_loop(ctx: &WorkerCtx) {
    loop {
        match ctx.queue.pop() {
            Pop::Closed => break,
            Pop::Task(task) => run_task(ctx, task),
        }
    }
}

/// Executes one popped task through the full lifecycle.
pub(crate) fn run_task(ctx: &WorkerCtx, task: Task) {
    let reaction = Arc::clone(&task.reaction);

    if !reaction.is_runnable() {
        reaction.release_slot();
        if let Some(group) = reaction.options().sync {
            if task.admitted {
                // the drop happens while holding the group slot
                hand_off_group(ctx, group);
            } else if let Some(resumed) = ctx.sync.forget(group, task.seq) {
                push_resumed(ctx, group, resumed);
            }
        }
        ctx.logger.debug(&format!(
            "discarding task of '{}': reaction disabled or owner gone",
            reaction.ident()
        ));
        return;
    }

    let task = match reaction.options().sync {
        Some(group) if !task.admitted => match ctx.sync.admit(group, task) {
            Admission::Parked => return,
            Admission::Run(task) => task,
        },
        _ => task,
    };

    let ident = reaction.ident().to_string();
    ctx.running.insert(task.seq, ident.clone());
    let outcome = catch_unwind(AssertUnwindSafe(|| reaction.invoke(&task.args)));
    ctx.running.remove(task.seq);

    if let Err(panic) = outcome {
        ctx.logger.error(&format!(
            "reaction '{}' panicked: {}",
            ident,
            panic_message(&*panic)
        ));
    }

    reaction.release_slot();
    if let Some(group) = reaction.options().sync {
        hand_off_group(ctx, group);
    }
}

/// Releases the group slot and passes it to the next task in submission
/// order, re-submitting it at its original priority.
pub(crate) fn hand_off_group(ctx: &WorkerCtx, group: TypeKey) {
    if let Some(task) = ctx.sync.release(group) {
        push_resumed(ctx, group, task);
    }
}

/// Re-queues a task that was handed the group slot. Tasks that can no
/// longer be queued release their slot and the hand-off continues down
/// the group's pending order.
pub(crate) fn push_resumed(ctx: &WorkerCtx, group: TypeKey, task: Task) {
    let mut next = Some(task);
    while let Some(task) = next {
        match ctx.queue.push(task) {
            Ok(()) => return,
            Err(Rejected::Overflow(task)) | Err(Rejected::Closed(task)) => {
                ctx.logger.warn(&format!(
                    "dropping resumed task of '{}': queue unavailable",
                    task.reaction.ident()
                ));
                task.reaction.release_slot();
                next = ctx.sync.release(group);
            }
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
