//! # Periodic fires.
//!
//! [`EveryScheduler`] owns the single timer thread behind the `every`
//! binding word. Registrations arrive over a channel; the thread sleeps
//! until the earliest deadline, fires due reactions by handing them to
//! the submit hook, and advances their deadlines.
//!
//! ## Rules
//! - Fires bypass the emit pipeline's store write: a periodic fire has
//!   no payload, only gathered companions.
//! - Missed ticks coalesce. When the thread falls more than one whole
//!   interval behind, the deadline jumps to the next future slot instead
//!   of firing a burst.
//! - Best-effort accuracy; no hard real-time guarantee.
//! - Entries of retired owners are dropped on the next pass.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::logging::Logger;
use crate::reactions::Reaction;

/// Hook that turns a due reaction into a queued task.
pub(crate) type SubmitFn = Arc<dyn Fn(&Arc<Reaction>) + Send + Sync>;

enum TimerCmd {
    Register {
        reaction: Arc<Reaction>,
        interval: Duration,
    },
    Shutdown,
}

struct Entry {
    next: Instant,
    interval: Duration,
    reaction: Arc<Reaction>,
}

/// Timer source feeding periodic reactions into the scheduler.
pub(crate) struct EveryScheduler {
    tx: Sender<TimerCmd>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl EveryScheduler {
    /// Starts the timer thread. It idles on the channel until the first
    /// registration arrives.
    pub(crate) fn spawn(submit: SubmitFn, logger: Logger) -> Self {
        let (tx, rx) = unbounded::<TimerCmd>();
        let handle = std::thread::Builder::new()
            .name("turbine-every".to_string())
            .spawn(move || {
                let mut entries: Vec<Entry> = Vec::new();
                loop {
                    let wait = entries
                        .iter()
                        .map(|e| e.next.saturating_duration_since(Instant::now()))
                        .min();
                    let cmd = match wait {
                        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                        Some(wait) => rx.recv_timeout(wait),
                    };
                    match cmd {
                        Ok(TimerCmd::Register { reaction, interval }) => {
                            logger.debug(&format!(
                                "periodic fire every {:?} for '{}'",
                                interval,
                                reaction.ident()
                            ));
                            entries.push(Entry {
                                next: Instant::now() + interval,
                                interval,
                                reaction,
                            });
                        }
                        Ok(TimerCmd::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => fire_due(&mut entries, &submit),
                    }
                }
            })
            .expect("failed to spawn timer thread");
        Self {
            tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Registers a periodic reaction; first fire is one interval from now.
    pub(crate) fn register(&self, reaction: Arc<Reaction>, interval: Duration) {
        let _ = self.tx.send(TimerCmd::Register { reaction, interval });
    }

    /// Stops the timer thread on its next wakeup and joins it.
    pub(crate) fn shutdown(&self) {
        let _ = self.tx.send(TimerCmd::Shutdown);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

fn fire_due(entries: &mut Vec<Entry>, submit: &SubmitFn) {
    let now = Instant::now();
    for entry in entries.iter_mut() {
        if entry.next > now {
            continue;
        }
        submit(&entry.reaction);
        entry.next += entry.interval;
        if now > entry.next + entry.interval {
            // more than one full slot behind: skip missed ticks
            while entry.next <= now {
                entry.next += entry.interval;
            }
        }
    }
    entries.retain(|e| e.reaction.owner_alive());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::events::Args;
    use crate::reactions::{OwnerToken, Reaction, ReactionIdent, ReactionOptions};

    fn reaction() -> Arc<Reaction> {
        Reaction::new(
            ReactionIdent {
                label: None,
                fusion: "test".to_string(),
                callback: "test",
            },
            OwnerToken::new(),
            vec![],
            vec![],
            ReactionOptions::default(),
            Box::new(|_: &Args| {}),
        )
    }

    #[test]
    fn missed_ticks_coalesce_to_one_fire() {
        let interval = Duration::from_millis(10);
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let submit: SubmitFn = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        // five intervals behind: one fire, deadline jumps past now
        let mut entries = vec![Entry {
            next: Instant::now() - 5 * interval,
            interval,
            reaction: reaction(),
        }];
        fire_due(&mut entries, &submit);

        assert_eq!(fired.load(Ordering::Relaxed), 1);
        assert!(entries[0].next > Instant::now() - interval);
    }

    #[test]
    fn future_deadline_does_not_fire() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let submit: SubmitFn = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let mut entries = vec![Entry {
            next: Instant::now() + Duration::from_secs(60),
            interval: Duration::from_secs(60),
            reaction: reaction(),
        }];
        fire_due(&mut entries, &submit);
        assert_eq!(fired.load(Ordering::Relaxed), 0);
    }
}
