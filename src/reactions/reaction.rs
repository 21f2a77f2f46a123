//! # Reaction descriptors.
//!
//! A [`Reaction`] is the immutable fusion of everything one `on(...)`
//! binding declared: trigger keys, companion (`With`) keys, options, the
//! callback, and bookkeeping state (active counter, enabled flag, owner
//! liveness). The registry stores reactions behind `Arc`; tasks reference
//! them until completion, so a reaction outlives its owner only as an
//! inert descriptor whose tasks drop at pop time.
//!
//! ## Rules
//! - Descriptor fields never change after binding; only the atomic
//!   bookkeeping state does.
//! - `active` counts scheduled-or-running tasks. `Single` reactions admit
//!   a task only by moving the counter 0 → 1.
//! - Transient companions remember the last value this reaction observed
//!   in a per-reaction cache, updated on every successful gather.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::{Args, DataStore, Payload, TypeKey};
use crate::reactions::options::ReactionOptions;

/// Process-wide reaction id sequence.
static REACTION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Callback wrapper: all callbacks are stored and invoked uniformly.
pub(crate) type Invoker = dyn Fn(&Args) + Send + Sync;

/// Liveness token shared between an installed reactor and its reactions.
///
/// The runtime owns reactors strongly; reactions hold only this token.
/// Retiring the reactor flips the flag, and every queued task of its
/// reactions is dropped at pop time.
#[derive(Clone)]
pub struct OwnerToken {
    alive: Arc<AtomicBool>,
}

impl OwnerToken {
    pub(crate) fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub(crate) fn retire(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// Three-element diagnostic identifier of a reaction.
///
/// Shown in logs whenever a callback fails: the user label (if any), a
/// description of the binding words, and the callback's type name.
#[derive(Clone)]
pub struct ReactionIdent {
    /// User-supplied label from `.label(...)`.
    pub label: Option<String>,
    /// Rendered binding words, e.g. `on<Ping> + with<Config> + sync<Db>`.
    pub fusion: String,
    /// Type name of the callback closure.
    pub callback: &'static str,
}

impl fmt::Display for ReactionIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({})", label, self.fusion),
            None => f.write_str(&self.fusion),
        }
    }
}

/// One companion-data requirement of a reaction.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WithSpec {
    pub key: TypeKey,
    /// Transient companions fall back to the last value this reaction
    /// observed when the source has nothing current.
    pub transient: bool,
}

/// Immutable binding of triggers + companions + options + callback.
pub struct Reaction {
    id: u64,
    ident: ReactionIdent,
    owner: OwnerToken,
    triggers: Vec<TypeKey>,
    withs: Vec<WithSpec>,
    options: ReactionOptions,
    invoker: Box<Invoker>,
    enabled: Arc<AtomicBool>,
    active: AtomicU32,
    transients: Mutex<HashMap<TypeKey, Payload>>,
}

impl Reaction {
    pub(crate) fn new(
        ident: ReactionIdent,
        owner: OwnerToken,
        triggers: Vec<TypeKey>,
        withs: Vec<WithSpec>,
        options: ReactionOptions,
        invoker: Box<Invoker>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: REACTION_SEQ.fetch_add(1, Ordering::Relaxed),
            ident,
            owner,
            triggers,
            withs,
            options,
            invoker,
            enabled: Arc::new(AtomicBool::new(true)),
            active: AtomicU32::new(0),
            transients: Mutex::new(HashMap::new()),
        })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn ident(&self) -> &ReactionIdent {
        &self.ident
    }

    pub(crate) fn triggers(&self) -> &[TypeKey] {
        &self.triggers
    }

    pub(crate) fn options(&self) -> &ReactionOptions {
        &self.options
    }

    pub(crate) fn enabled_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.enabled)
    }

    /// True when the reaction may still be scheduled and executed.
    pub(crate) fn is_runnable(&self) -> bool {
        self.enabled.load(Ordering::Acquire) && self.owner.is_alive()
    }

    /// True while the owning reactor is installed. Disabled reactions
    /// stay owned; dead owners never come back.
    pub(crate) fn owner_alive(&self) -> bool {
        self.owner.is_alive()
    }

    /// Claims one scheduled-or-running slot.
    ///
    /// For `Single` reactions this succeeds only while no other instance
    /// is in flight; the caller drops the submission on `false`.
    pub(crate) fn acquire_slot(&self) -> bool {
        if self.options.single {
            self.active
                .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        } else {
            self.active.fetch_add(1, Ordering::AcqRel);
            true
        }
    }

    /// Returns a previously acquired slot.
    pub(crate) fn release_slot(&self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }

    /// Current scheduled-or-running instance count.
    pub(crate) fn active(&self) -> u32 {
        self.active.load(Ordering::Acquire)
    }

    /// Runs the callback with a frozen bundle.
    pub(crate) fn invoke(&self, args: &Args) {
        (self.invoker)(args)
    }

    /// Assembles the frozen argument bundle for one fire.
    ///
    /// `trigger` is the payload that caused the fire (absent for periodic
    /// fires); `seeds` carry per-dispatch transient data such as a network
    /// source. Returns `None` when a mandatory companion is not ready,
    /// which skips the fire without error.
    pub(crate) fn gather(
        &self,
        trigger: Option<(TypeKey, Payload)>,
        seeds: &[(TypeKey, Payload)],
        store: &DataStore,
    ) -> Option<Args> {
        let mut args = Args::new();
        if let Some((key, payload)) = trigger {
            args.push(key, payload);
        }

        for with in &self.withs {
            let current = seeds
                .iter()
                .find(|(k, _)| *k == with.key)
                .map(|(_, p)| p.clone())
                .or_else(|| store.get(with.key).map(|(p, _)| p));

            let payload = match current {
                Some(p) => {
                    if with.transient {
                        self.transients.lock().insert(with.key, p.clone());
                    }
                    p
                }
                None if with.transient => self.transients.lock().get(&with.key).cloned()?,
                None => return None,
            };
            args.push(with.key, payload);
        }

        Some(args)
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("id", &self.id)
            .field("ident", &self.ident.to_string())
            .field("triggers", &self.triggers)
            .field("active", &self.active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Args;
    use crate::reactions::options::Priority;

    struct Trigger;
    struct Companion(u32);
    struct Flaky(u32);

    fn make(single: bool, withs: Vec<WithSpec>) -> Arc<Reaction> {
        Reaction::new(
            ReactionIdent {
                label: None,
                fusion: "test".to_string(),
                callback: "test",
            },
            OwnerToken::new(),
            vec![TypeKey::of::<Trigger>()],
            withs,
            ReactionOptions {
                priority: Priority::Normal,
                sync: None,
                single,
            },
            Box::new(|_: &Args| {}),
        )
    }

    #[test]
    fn single_admits_exactly_one_slot() {
        let r = make(true, vec![]);
        assert!(r.acquire_slot());
        assert!(!r.acquire_slot());
        r.release_slot();
        assert!(r.acquire_slot());
    }

    #[test]
    fn parallel_reaction_counts_slots() {
        let r = make(false, vec![]);
        assert!(r.acquire_slot());
        assert!(r.acquire_slot());
        assert_eq!(r.active(), 2);
    }

    #[test]
    fn gather_skips_when_companion_missing() {
        let store = DataStore::new();
        let r = make(
            false,
            vec![WithSpec {
                key: TypeKey::of::<Companion>(),
                transient: false,
            }],
        );
        let trigger: Payload = Arc::new(Trigger);
        assert!(r
            .gather(Some((TypeKey::of::<Trigger>(), trigger)), &[], &store)
            .is_none());
    }

    #[test]
    fn gather_bundles_trigger_and_companion() {
        let store = DataStore::new();
        store.put(TypeKey::of::<Companion>(), Arc::new(Companion(9)));
        let r = make(
            false,
            vec![WithSpec {
                key: TypeKey::of::<Companion>(),
                transient: false,
            }],
        );
        let trigger: Payload = Arc::new(Trigger);
        let args = r
            .gather(Some((TypeKey::of::<Trigger>(), trigger)), &[], &store)
            .expect("companion present");
        assert_eq!(args.len(), 2);
        assert_eq!(args.get::<Companion>().unwrap().0, 9);
    }

    #[test]
    fn transient_companion_falls_back_to_last_observed() {
        let store = DataStore::new();
        let r = make(
            false,
            vec![WithSpec {
                key: TypeKey::of::<Flaky>(),
                transient: true,
            }],
        );
        let trigger_key = TypeKey::of::<Trigger>();

        // nothing observed yet: skip
        let trigger: Payload = Arc::new(Trigger);
        assert!(r.gather(Some((trigger_key, trigger)), &[], &store).is_none());

        // seeded dispatch populates the per-reaction cache
        let trigger: Payload = Arc::new(Trigger);
        let seed: Payload = Arc::new(Flaky(5));
        let args = r
            .gather(
                Some((trigger_key, trigger)),
                &[(TypeKey::of::<Flaky>(), seed)],
                &store,
            )
            .expect("seed satisfies companion");
        assert_eq!(args.get::<Flaky>().unwrap().0, 5);

        // later fire without seed reuses the cached value
        let trigger: Payload = Arc::new(Trigger);
        let args = r
            .gather(Some((trigger_key, trigger)), &[], &store)
            .expect("cache satisfies companion");
        assert_eq!(args.get::<Flaky>().unwrap().0, 5);
    }
}
